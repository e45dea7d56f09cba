//! Pick the smallest acceptable encoding of an image.
//!
//! ```text
//! file ──▶ not a raster image? ─────────────────────────▶ unchanged
//!   │
//!   ▼
//! resize_to_fit ──▶ base (original or *_resized)
//!   │
//!   ├── base < threshold, or already WebP/AVIF ──────────▶ base
//!   │
//!   ▼
//! ┌─ AVIF ─┐  ┌─ WebP ─┐   concurrent, failures dropped
//! └────────┘  └────────┘
//!   │
//!   ▼
//! smallest of [base, avif, webp]; ties keep the earlier one
//! ```
//!
//! The result is never larger than the base: the base is always a candidate
//! and it is the incumbent every other candidate must strictly beat.

use crate::config::ImagesConfig;
use crate::imaging::{self, BackendError, ImageBackend, Quality};
use crate::media::MediaFile;
use crate::transcode::{AvifTranscoder, Transcoder, WebpTranscoder};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Longest edge allowed before an image is downsampled.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// Base candidates smaller than this are not worth transcoding.
pub const TRANSCODE_THRESHOLD: u64 = 1024 * 1024;

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("resize failed: {0}")]
    Resize(#[from] BackendError),
    #[error("image worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateLabel {
    Original,
    Resized,
    Avif,
    Webp,
}

impl fmt::Display for CandidateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CandidateLabel::Original => "original",
            CandidateLabel::Resized => "resized",
            CandidateLabel::Avif => "avif",
            CandidateLabel::Webp => "webp",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub label: CandidateLabel,
    pub file: MediaFile,
}

impl Candidate {
    pub fn new(label: CandidateLabel, file: MediaFile) -> Self {
        Self { label, file }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    pub max_dim: u32,
    pub transcode_threshold: u64,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            max_dim: DEFAULT_MAX_DIMENSION,
            transcode_threshold: TRANSCODE_THRESHOLD,
        }
    }
}

impl From<&ImagesConfig> for SelectOptions {
    fn from(config: &ImagesConfig) -> Self {
        Self {
            max_dim: config.max_dimension,
            transcode_threshold: config.transcode_threshold,
        }
    }
}

/// Outcome of a selection with every candidate that was considered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub winner: Candidate,
    /// `(label, size)` in evaluation order, winner included.
    pub considered: Vec<(CandidateLabel, u64)>,
}

impl Selection {
    fn only(candidate: Candidate) -> Self {
        let considered = vec![(candidate.label, candidate.file.size())];
        Self {
            winner: candidate,
            considered,
        }
    }

    pub fn into_file(self) -> MediaFile {
        self.winner.file
    }
}

/// Strictly smallest candidate; on a tie the earlier one stays.
pub fn pick_smallest(candidates: impl IntoIterator<Item = Candidate>) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for candidate in candidates {
        match &best {
            Some(incumbent) if candidate.file.size() >= incumbent.file.size() => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Runs one transcoder on the blocking pool. Any failure becomes `None`.
async fn attempt<T>(transcoder: T, base: MediaFile) -> Option<MediaFile>
where
    T: Transcoder + 'static,
{
    let target = transcoder.target();
    match tokio::task::spawn_blocking(move || transcoder.transcode(&base)).await {
        Ok(Ok(file)) => Some(file),
        Ok(Err(e)) => {
            debug!(kind = %target, error = %e, "transcode skipped");
            None
        }
        Err(e) => {
            debug!(kind = %target, error = %e, "transcode worker failed");
            None
        }
    }
}

/// Resize, transcode and choose.
pub struct VariantSelector<B> {
    backend: Arc<B>,
    avif: AvifTranscoder<B>,
    webp: WebpTranscoder<B>,
    resize_quality: Quality,
}

impl<B: ImageBackend + 'static> VariantSelector<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            avif: AvifTranscoder::new(Arc::clone(&backend)),
            webp: WebpTranscoder::new(Arc::clone(&backend)),
            backend,
            resize_quality: imaging::RESIZE_QUALITY,
        }
    }

    pub fn from_config(backend: Arc<B>, config: &ImagesConfig) -> Self {
        Self {
            avif: AvifTranscoder::with_quality(
                Arc::clone(&backend),
                Quality::new(config.avif_quality),
            ),
            webp: WebpTranscoder::with_quality(
                Arc::clone(&backend),
                Quality::new(config.webp_quality),
            ),
            backend,
            resize_quality: Quality::new(config.resize_quality),
        }
    }

    /// The smallest acceptable file for `file`.
    pub async fn select_smallest(
        &self,
        file: MediaFile,
        options: SelectOptions,
    ) -> Result<MediaFile, SelectError> {
        Ok(self.select_candidates(file, options).await?.into_file())
    }

    /// Like [`select_smallest`](Self::select_smallest) but reports every candidate.
    #[instrument(skip_all, fields(name = file.name(), size = file.size()))]
    pub async fn select_candidates(
        &self,
        file: MediaFile,
        options: SelectOptions,
    ) -> Result<Selection, SelectError> {
        if !file.is_image() || file.image_kind().is_none() {
            debug!("not a raster image, left unchanged");
            return Ok(Selection::only(Candidate::new(CandidateLabel::Original, file)));
        }
        let efficient =
            imaging::is_already_efficient(file.content_type(), file.extension().as_deref());

        let backend = Arc::clone(&self.backend);
        let quality = self.resize_quality;
        let input = file.clone();
        let base = tokio::task::spawn_blocking(move || {
            imaging::resize_to_fit(backend.as_ref(), input, options.max_dim, quality)
        })
        .await
        .map_err(|e| SelectError::Worker(e.to_string()))??;

        let label = if base.shares_buffer_with(&file) {
            CandidateLabel::Original
        } else {
            CandidateLabel::Resized
        };
        let base = Candidate::new(label, base);

        if efficient || base.file.size() < options.transcode_threshold {
            debug!(
                efficient,
                base_size = base.file.size(),
                "transcoding not attempted"
            );
            return Ok(Selection::only(base));
        }

        let (avif, webp) = tokio::join!(
            attempt(self.avif.clone(), base.file.clone()),
            attempt(self.webp.clone(), base.file.clone()),
        );

        let candidates: Vec<Candidate> = std::iter::once(base)
            .chain(avif.map(|f| Candidate::new(CandidateLabel::Avif, f)))
            .chain(webp.map(|f| Candidate::new(CandidateLabel::Webp, f)))
            .collect();
        let considered = candidates
            .iter()
            .map(|c| (c.label, c.file.size()))
            .collect();
        let winner = pick_smallest(candidates)
            .ok_or_else(|| SelectError::Worker("no candidates".to_string()))?;

        debug!(winner = %winner.label, size = winner.file.size(), "selected");
        Ok(Selection { winner, considered })
    }
}
