//! Image processing in pure Rust, no system codecs.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions`, `avif-parse` |
//! | **Resize** | Lanczos3, re-encoded in the source format |
//! | **Transcode → AVIF** | rav1e encoder via `image` |
//! | **Transcode → WebP** | libwebp via the `webp` crate |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Formats**: [`ImageKind`] and the "already efficient" rule table
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

mod avif;
pub mod backend;
mod calculations;
pub mod formats;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{fit_within, scale_factor};
pub use formats::{ImageKind, is_already_efficient};
pub use operations::{RESIZE_QUALITY, convert, get_dimensions, resize_to_fit};
pub use params::{EncodeParams, Quality, ResizeParams};
pub use rust_backend::RustBackend;
