//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the "platform" the pipeline needs: read
//! dimensions, downsample in place of format, convert between formats, and
//! answer whether an encoder actually works on this build.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! `MockBackend` in this module's `tests` submodule.

use super::formats::ImageKind;
use super::params::{EncodeParams, ResizeParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported image type: {0}")]
    Unsupported(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// All operations are synchronous and CPU-bound; async callers run them on
/// the blocking pool. Implementations must be shareable across threads.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without a full decode where the format allows.
    fn identify(&self, source: &[u8], kind: ImageKind) -> Result<Dimensions, BackendError>;

    /// Downsample to exact dimensions, re-encoding in the source format.
    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError>;

    /// Re-encode into another format at the source dimensions.
    fn encode(&self, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;

    /// Encode a 1×1 raster into `target` to check that the encoder works.
    fn probe(&self, target: ImageKind) -> Result<(), BackendError>;
}
