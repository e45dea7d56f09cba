//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what to produce) and the [`backend`](super::backend)
//! (which does the actual pixel work). Swapping in a mock backend for tests
//! needs no change to operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`ResizeParams`]: Source bytes and format, target dimensions, quality. Output keeps the source format.
//! - [`EncodeParams`]: Source bytes and format, target format, quality. Dimensions are kept.

use super::formats::ImageKind;
use bytes::Bytes;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a downsample that keeps the source format.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: Bytes,
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Parameters for a format conversion at the source's dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub source: Bytes,
    pub source_kind: ImageKind,
    pub target: ImageKind,
    pub quality: Quality,
}
