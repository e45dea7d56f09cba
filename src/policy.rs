//! Upload policy: which files may be uploaded at all.
//!
//! The allow-list and the size ceiling are a contract with the backend's
//! presign validation. Both sides must enforce the same literal values; if
//! one changes, the other changes in the same release.
//!
//! | Rule | Value |
//! |---|---|
//! | Max size | 20 MiB (20 × 1024 × 1024 bytes), inclusive |
//! | Min size | 1 byte |
//! | Types | jpeg, png, webp, avif, gif images; pdf; mp4; mpeg/wav audio |
//!
//! Type is checked before size, so an empty `.txt` reports the type problem.

use crate::media::MediaFile;
use thiserror::Error;

/// Largest accepted payload, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// MIME types the backend accepts.
pub const ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/avif",
    "image/gif",
    "application/pdf",
    "video/mp4",
    "audio/mpeg",
    "audio/wav",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported type: {}", .content_type.as_deref().unwrap_or("(none)"))]
    UnsupportedType { content_type: Option<String> },
    #[error("file size {:.1} MiB is outside the allowed range (max {} MiB)", mib(.size), mib(.max))]
    SizeExceeded { size: u64, max: u64 },
}

fn mib(bytes: &u64) -> f64 {
    *bytes as f64 / 1024.0 / 1024.0
}

/// Whether `content_type` is on the allow-list. Exact match, no parameters.
pub fn is_allowed_type(content_type: &str) -> bool {
    ALLOWED_TYPES.contains(&content_type)
}

/// Check a file against the shared policy before any processing or network I/O.
pub fn validate(file: &MediaFile) -> Result<(), ValidationError> {
    match file.content_type() {
        Some(t) if is_allowed_type(t) => {}
        other => {
            return Err(ValidationError::UnsupportedType {
                content_type: other.map(str::to_string),
            });
        }
    }

    let size = file.size();
    if size == 0 || size > MAX_UPLOAD_BYTES {
        return Err(ValidationError::SizeExceeded {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }

    Ok(())
}
