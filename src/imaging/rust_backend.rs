//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary; no system codecs.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image` crate (pure Rust decoders) |
//! | Decode (AVIF) | [`avif`](super::avif): `avif-parse` + `rav1d` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG / PNG / GIF | `image` crate encoders |
//! | Encode → WebP (lossy) | `webp` crate (libwebp, statically built) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::avif;
use super::backend::{BackendError, Dimensions, ImageBackend};
use super::formats::ImageKind;
use super::params::{EncodeParams, Quality, ResizeParams};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;

/// rav1e speed preset: 1 (slowest, smallest) to 10 (fastest).
const AVIF_SPEED: u8 = 6;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(source: &[u8], kind: ImageKind) -> Result<DynamicImage, BackendError> {
    if kind == ImageKind::Avif {
        return avif::decode(source);
    }
    image::load_from_memory_with_format(source, kind.image_format())
        .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode {kind}: {e}")))
}

fn encode_failed(kind: ImageKind) -> impl FnOnce(image::ImageError) -> BackendError {
    move |e| BackendError::ProcessingFailed(format!("{kind} encode failed: {e}"))
}

/// Encode a raster as `kind`.
fn encode_image(
    img: &DynamicImage,
    kind: ImageKind,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    match kind {
        ImageKind::Jpeg => {
            // JPEG has no alpha channel.
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(encode_failed(kind))?;
        }
        ImageKind::Png => {
            img.write_with_encoder(PngEncoder::new(&mut buf))
                .map_err(encode_failed(kind))?;
        }
        ImageKind::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), kind.image_format())
                .map_err(encode_failed(kind))?;
        }
        ImageKind::WebP => {
            // The image crate only writes lossless WebP; lossy needs libwebp.
            let rgba = img.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            let encoded = encoder
                .encode_simple(false, quality.value() as f32)
                .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))?;
            buf.extend_from_slice(&encoded);
        }
        ImageKind::Avif => {
            let encoder =
                AvifEncoder::new_with_speed_quality(&mut buf, AVIF_SPEED, quality.value() as u8);
            img.write_with_encoder(encoder)
                .map_err(encode_failed(kind))?;
        }
    }
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8], kind: ImageKind) -> Result<Dimensions, BackendError> {
        if kind == ImageKind::Avif {
            return avif::identify(source);
        }
        let (width, height) = ImageReader::with_format(Cursor::new(source), kind.image_format())
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {e}"))
            })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(&params.source, params.kind)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode_image(&resized, params.kind, params.quality)
    }

    fn encode(&self, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(&params.source, params.source_kind)?;
        encode_image(&img, params.target, params.quality)
    }

    fn probe(&self, target: ImageKind) -> Result<(), BackendError> {
        let pixel = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let out = encode_image(&DynamicImage::ImageRgba8(pixel), target, Quality::default())
            .map_err(|e| BackendError::Unsupported(format!("{target}: {e}")))?;
        if out.is_empty() {
            return Err(BackendError::Unsupported(format!(
                "{target}: encoder produced no data"
            )));
        }
        Ok(())
    }
}
