//! Content checksums for storage-side integrity verification.
//!
//! The digest is SHA-256 over the raw bytes, base64 encoded (standard
//! alphabet, padded). That is the form S3 expects in `x-amz-checksum-sha256`.
//!
//! Failing to compute a digest is not an error: [`digest`] returns `None` and
//! the upload proceeds without the checksum header.

use crate::media::MediaFile;
use base64::{Engine as _, engine::general_purpose};
use sha2::{Digest, Sha256};
use tracing::warn;

/// SHA-256 of `bytes`, base64 encoded.
pub fn sha256_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(Sha256::digest(bytes))
}

/// Digest a file's content on the blocking pool.
///
/// Returns `None` when the hashing task could not complete.
pub async fn digest(file: &MediaFile) -> Option<String> {
    let bytes = file.bytes().clone();
    match tokio::task::spawn_blocking(move || sha256_base64(&bytes)).await {
        Ok(digest) => Some(digest),
        Err(e) => {
            warn!(file = file.name(), error = %e, "checksum unavailable, skipping integrity check");
            None
        }
    }
}
