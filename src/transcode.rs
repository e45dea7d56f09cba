//! Format conversion into modern compressed encodings.
//!
//! Each [`Transcoder`] turns one image into one target format. They are
//! independent: the selector tries every transcoder and silently discards
//! the ones that fail, so nothing here needs to be fatal.
//!
//! | Transcoder | Target | Default quality |
//! |---|---|---|
//! | [`AvifTranscoder`] | `image/avif` | 70 (advisory) |
//! | [`WebpTranscoder`] | `image/webp` | 82 |
//!
//! AVIF support is probed with a 1×1 encode before the full-size attempt.
//! The probe result is cached per transcoder (and shared between clones).

use crate::imaging::{self, BackendError, ImageBackend, ImageKind, Quality};
use crate::media::MediaFile;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_AVIF_QUALITY: Quality = Quality(70);
pub const DEFAULT_WEBP_QUALITY: Quality = Quality(82);

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("{0} encoding is not available")]
    UnsupportedFormat(ImageKind),
    #[error("{target} encoding failed: {reason}")]
    EncodeFailed { target: ImageKind, reason: String },
}

/// Converts an image into one target format.
pub trait Transcoder: Send + Sync {
    /// Format this transcoder produces.
    fn target(&self) -> ImageKind;

    /// Produce a new file in [`Self::target`] format.
    fn transcode(&self, file: &MediaFile) -> Result<MediaFile, TranscodeError>;
}

/// Shared conversion path: encode, then reject empty output.
fn run<B: ImageBackend>(
    backend: &B,
    file: &MediaFile,
    target: ImageKind,
    quality: Quality,
) -> Result<MediaFile, TranscodeError> {
    let failed = |reason: String| TranscodeError::EncodeFailed { target, reason };
    let out = imaging::convert(backend, file, target, quality).map_err(|e| match e {
        BackendError::Unsupported(_) if file.image_kind().is_some() => {
            TranscodeError::UnsupportedFormat(target)
        }
        other => failed(other.to_string()),
    })?;
    if out.size() == 0 {
        return Err(failed("encoder produced no data".to_string()));
    }
    Ok(out)
}

/// Produces `image/avif`.
///
/// The quality setting is passed to the encoder but nothing relies on it
/// being honored.
pub struct AvifTranscoder<B> {
    backend: Arc<B>,
    quality: Quality,
    supported: Arc<OnceLock<bool>>,
}

impl<B> Clone for AvifTranscoder<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            quality: self.quality,
            supported: Arc::clone(&self.supported),
        }
    }
}

impl<B: ImageBackend> AvifTranscoder<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_quality(backend, DEFAULT_AVIF_QUALITY)
    }

    pub fn with_quality(backend: Arc<B>, quality: Quality) -> Self {
        Self {
            backend,
            quality,
            supported: Arc::new(OnceLock::new()),
        }
    }

    /// Whether this runtime can encode AVIF. Probed once.
    pub fn is_supported(&self) -> bool {
        *self.supported.get_or_init(|| match self.backend.probe(ImageKind::Avif) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "AVIF encoder probe failed");
                false
            }
        })
    }
}

impl<B: ImageBackend> Transcoder for AvifTranscoder<B> {
    fn target(&self) -> ImageKind {
        ImageKind::Avif
    }

    fn transcode(&self, file: &MediaFile) -> Result<MediaFile, TranscodeError> {
        if !self.is_supported() {
            return Err(TranscodeError::UnsupportedFormat(ImageKind::Avif));
        }
        run(self.backend.as_ref(), file, ImageKind::Avif, self.quality)
    }
}

/// Produces `image/webp` at a fixed lossy quality.
pub struct WebpTranscoder<B> {
    backend: Arc<B>,
    quality: Quality,
}

impl<B> Clone for WebpTranscoder<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            quality: self.quality,
        }
    }
}

impl<B: ImageBackend> WebpTranscoder<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_quality(backend, DEFAULT_WEBP_QUALITY)
    }

    pub fn with_quality(backend: Arc<B>, quality: Quality) -> Self {
        Self { backend, quality }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }
}

impl<B: ImageBackend> Transcoder for WebpTranscoder<B> {
    fn target(&self) -> ImageKind {
        ImageKind::WebP
    }

    fn transcode(&self, file: &MediaFile) -> Result<MediaFile, TranscodeError> {
        run(self.backend.as_ref(), file, ImageKind::WebP, self.quality)
    }
}
