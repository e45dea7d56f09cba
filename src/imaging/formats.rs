//! Raster formats the pipeline can decode and encode, and the rule table for
//! "already efficient" inputs.

use image::ImageFormat;
use std::fmt;

/// An encoded raster format, identified by MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
    Avif,
}

/// `(kind, MIME type, canonical extension, image crate format)`.
const KINDS: &[(ImageKind, &str, &str, ImageFormat)] = &[
    (ImageKind::Jpeg, "image/jpeg", "jpg", ImageFormat::Jpeg),
    (ImageKind::Png, "image/png", "png", ImageFormat::Png),
    (ImageKind::Gif, "image/gif", "gif", ImageFormat::Gif),
    (ImageKind::WebP, "image/webp", "webp", ImageFormat::WebP),
    (ImageKind::Avif, "image/avif", "avif", ImageFormat::Avif),
];

impl ImageKind {
    // KINDS is listed in declaration order.
    fn row(self) -> &'static (ImageKind, &'static str, &'static str, ImageFormat) {
        &KINDS[self as usize]
    }

    /// Look up a kind by exact MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        KINDS.iter().find(|(_, m, ..)| *m == mime).map(|(k, ..)| *k)
    }

    pub fn mime(self) -> &'static str {
        self.row().1
    }

    pub fn extension(self) -> &'static str {
        self.row().2
    }

    pub fn image_format(self) -> ImageFormat {
        self.row().3
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Gif => "GIF",
            ImageKind::WebP => "WebP",
            ImageKind::Avif => "AVIF",
        })
    }
}

/// Which piece of file metadata a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Declared MIME type, compared exactly.
    MimeType,
    /// Filename extension, compared case-insensitively.
    Extension,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EfficiencyRule {
    pub signal: Signal,
    pub value: &'static str,
}

/// Inputs matching any rule are already in a modern compressed format.
/// Re-encoding them gains little and risks a regression, so transcoding is
/// skipped (resizing still applies).
///
/// Browsers sometimes hand over an empty or generic MIME type, hence the
/// extension fallback.
pub const EFFICIENT_FORMATS: &[EfficiencyRule] = &[
    EfficiencyRule {
        signal: Signal::MimeType,
        value: "image/webp",
    },
    EfficiencyRule {
        signal: Signal::MimeType,
        value: "image/avif",
    },
    EfficiencyRule {
        signal: Signal::Extension,
        value: "webp",
    },
    EfficiencyRule {
        signal: Signal::Extension,
        value: "avif",
    },
];

/// Evaluate [`EFFICIENT_FORMATS`] against a file's MIME type and extension.
pub fn is_already_efficient(content_type: Option<&str>, extension: Option<&str>) -> bool {
    EFFICIENT_FORMATS.iter().any(|rule| match rule.signal {
        Signal::MimeType => content_type == Some(rule.value),
        Signal::Extension => extension.is_some_and(|e| e.eq_ignore_ascii_case(rule.value)),
    })
}
