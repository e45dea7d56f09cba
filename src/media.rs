//! The immutable file value that flows through the pipeline.
//!
//! A [`MediaFile`] is a byte blob plus the metadata a browser `File` would
//! carry: name, declared MIME type, size and last-modified time. Every
//! transform (resize, transcode) builds a *new* `MediaFile`; nothing mutates
//! one in place. The bytes live in a [`Bytes`] buffer, so clones are cheap
//! and share storage, which is how "returned the same file" is observed
//! ([`MediaFile::shares_buffer_with`]).

use crate::imaging::ImageKind;
use crate::naming;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Extension → MIME type for everything the upload policy accepts.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("gif", "image/gif"),
    ("pdf", "application/pdf"),
    ("mp4", "video/mp4"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
];

/// Guess a MIME type from a file name's extension.
pub fn guess_content_type(name: &str) -> Option<&'static str> {
    let ext = naming::extension(name)?;
    CONTENT_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    name: String,
    content_type: Option<String>,
    bytes: Bytes,
    last_modified: DateTime<Utc>,
}

impl MediaFile {
    /// Build a file stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        content_type: Option<impl Into<String>>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(Into::into),
            bytes: bytes.into(),
            last_modified: Utc::now(),
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    ///
    /// The timestamp comes from the filesystem when available.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let last_modified = tokio::fs::metadata(path)
            .await
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let content_type = guess_content_type(&name);
        Ok(Self::new(name, content_type, bytes).with_last_modified(last_modified))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// True when the declared MIME type is `image/*`.
    pub fn is_image(&self) -> bool {
        self.content_type().is_some_and(|t| t.starts_with("image/"))
    }

    /// Raster format implied by the declared MIME type.
    pub fn image_kind(&self) -> Option<ImageKind> {
        self.content_type().and_then(ImageKind::from_mime)
    }

    /// Lowercased filename extension.
    pub fn extension(&self) -> Option<String> {
        naming::extension(&self.name)
    }

    /// True when both files are views over the very same byte buffer.
    pub fn shares_buffer_with(&self, other: &MediaFile) -> bool {
        self.bytes.len() == other.bytes.len() && self.bytes.as_ptr() == other.bytes.as_ptr()
    }
}
