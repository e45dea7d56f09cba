//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take a
//! [`MediaFile`], compute parameters, call the backend, and wrap the output
//! in a new `MediaFile`. Inputs are never modified.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::formats::ImageKind;
use super::params::{EncodeParams, Quality, ResizeParams};
use crate::media::MediaFile;
use crate::naming;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Quality used when re-encoding a downsampled image in its own format.
pub const RESIZE_QUALITY: Quality = Quality(92);

/// Raster format of `file`, from its declared MIME type.
fn kind_of(file: &MediaFile) -> Result<ImageKind> {
    file.image_kind().ok_or_else(|| {
        BackendError::Unsupported(file.content_type().unwrap_or("(none)").to_string())
    })
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, file: &MediaFile) -> Result<(u32, u32)> {
    let dims = backend.identify(file.bytes(), kind_of(file)?)?;
    Ok((dims.width, dims.height))
}

/// Downsample `file` so its longer edge is at most `max_dim`.
///
/// An image that already fits is returned as-is: the same buffer, no
/// re-encode. Otherwise the result keeps the content type and gets the
/// `_resized` suffix before its extension.
pub fn resize_to_fit(
    backend: &impl ImageBackend,
    file: MediaFile,
    max_dim: u32,
    quality: Quality,
) -> Result<MediaFile> {
    let kind = kind_of(&file)?;
    let original = get_dimensions(backend, &file)?;
    let Some((width, height)) = fit_within(original, max_dim) else {
        return Ok(file);
    };

    debug!(
        name = file.name(),
        from = ?original,
        to = ?(width, height),
        "resizing"
    );
    let bytes = backend.resize(&ResizeParams {
        source: file.bytes().clone(),
        kind,
        width,
        height,
        quality,
    })?;

    Ok(MediaFile::new(
        naming::append_suffix(file.name(), naming::RESIZED_SUFFIX),
        file.content_type(),
        bytes,
    ))
}

/// Re-encode `file` as `target`, keeping its dimensions.
///
/// The output is named after the input with the target's extension.
pub fn convert(
    backend: &impl ImageBackend,
    file: &MediaFile,
    target: ImageKind,
    quality: Quality,
) -> Result<MediaFile> {
    let bytes = backend.encode(&EncodeParams {
        source: file.bytes().clone(),
        source_kind: kind_of(file)?,
        target,
        quality,
    })?;
    Ok(MediaFile::new(
        naming::replace_extension(file.name(), target.extension()),
        Some(target.mime()),
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn jpeg(name: &str, len: usize) -> MediaFile {
        MediaFile::new(name, Some("image/jpeg"), vec![0u8; len])
    }

    #[test]
    fn get_dimensions_returns_width_height() {
        let backend = MockBackend::with_dimensions(1920, 1080);
        let dims = get_dimensions(&backend, &jpeg("a.jpg", 10)).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn get_dimensions_rejects_non_raster() {
        let backend = MockBackend::with_dimensions(1, 1);
        let pdf = MediaFile::new("a.pdf", Some("application/pdf"), vec![1]);
        assert!(matches!(
            get_dimensions(&backend, &pdf),
            Err(BackendError::Unsupported(_))
        ));
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // resize_to_fit
    // =========================================================================

    #[test]
    fn in_bounds_returns_identical_file() {
        let backend = MockBackend::with_dimensions(800, 600);
        let input = jpeg("small.jpg", 100);

        let out = resize_to_fit(&backend, input.clone(), 2048, RESIZE_QUALITY).unwrap();

        assert!(out.shares_buffer_with(&input));
        assert_eq!(out, input);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify(ImageKind::Jpeg)]
        );
    }

    #[test]
    fn exactly_max_dim_is_in_bounds() {
        let backend = MockBackend::with_dimensions(2048, 2048);
        let input = jpeg("edge.jpg", 100);
        let out = resize_to_fit(&backend, input.clone(), 2048, RESIZE_QUALITY).unwrap();
        assert!(out.shares_buffer_with(&input));
    }

    #[test]
    fn oversized_is_downsampled_and_renamed() {
        let backend = MockBackend::with_dimensions(3000, 2000).resize_output(40);
        let input = jpeg("photo.jpg", 100);

        let out = resize_to_fit(&backend, input, 2048, RESIZE_QUALITY).unwrap();

        assert_eq!(out.name(), "photo_resized.jpg");
        assert_eq!(out.content_type(), Some("image/jpeg"));
        assert_eq!(out.size(), 40);
        assert_eq!(
            backend.get_operations()[1],
            RecordedOp::Resize {
                kind: ImageKind::Jpeg,
                width: 2048,
                height: 1365,
                quality: 92,
            }
        );
    }

    #[test]
    fn resized_name_without_extension() {
        let backend = MockBackend::with_dimensions(5000, 100);
        let input = MediaFile::new("photo", Some("image/png"), vec![0u8; 10]);
        let out = resize_to_fit(&backend, input, 2048, RESIZE_QUALITY).unwrap();
        assert_eq!(out.name(), "photo_resized");
        assert_eq!(out.content_type(), Some("image/png"));
    }

    #[test]
    fn identify_failure_propagates() {
        let backend = MockBackend::new();
        assert!(resize_to_fit(&backend, jpeg("x.jpg", 10), 2048, RESIZE_QUALITY).is_err());
    }

    // =========================================================================
    // convert
    // =========================================================================

    #[test]
    fn convert_swaps_extension_and_type() {
        let backend = MockBackend::new().encode_output(ImageKind::Avif, 7);
        let out = convert(&backend, &jpeg("a.jpg", 50), ImageKind::Avif, Quality::new(70)).unwrap();

        assert_eq!(out.name(), "a.avif");
        assert_eq!(out.content_type(), Some("image/avif"));
        assert_eq!(out.size(), 7);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Encode {
                source_kind: ImageKind::Jpeg,
                target: ImageKind::Avif,
                source_len: 50,
                quality: 70,
            }]
        );
    }

    #[test]
    fn convert_appends_extension_when_missing() {
        let backend = MockBackend::new().encode_output(ImageKind::WebP, 3);
        let out = convert(&backend, &jpeg("scan", 5), ImageKind::WebP, Quality::new(82)).unwrap();
        assert_eq!(out.name(), "scan.webp");
    }
}
