//! # mediadrop
//!
//! Client-side media normalization and presigned uploads. A file is checked
//! against the upload policy, shrunk and re-encoded when that makes it smaller,
//! and then sent straight to object storage through a URL the backend signed.
//! The backend never proxies the bytes.
//!
//! # Architecture: Two Independent Stages
//!
//! ```text
//! 1. Select   MediaFile  →  MediaFile   (resize → AVIF/WebP → smallest wins)
//! 2. Upload   MediaFile  →  receipt     (validate → presign → PUT → confirm)
//! ```
//!
//! The stages only share [`media::MediaFile`], so either can be used alone:
//! an app that already produced a tiny JPEG can upload it untouched, and a
//! batch job can optimize without ever talking to the network.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`media`] | `MediaFile`: name, MIME type, shared byte buffer, timestamp |
//! | [`policy`] | Upload policy: allowed MIME types and the size cap |
//! | [`naming`] | File-name rewriting for derived variants (`_resized`, new extensions) |
//! | [`checksum`] | SHA-256 (base64) integrity checksum sent with the PUT |
//! | [`imaging`] | Backend trait plus a pure-Rust implementation: identify, resize, encode |
//! | [`transcode`] | AVIF and WebP transcoders with capability probing |
//! | [`select`] | Candidate generation and smallest-variant selection |
//! | [`upload`] | Presign / PUT / confirm protocol with progress and abort |
//! | [`config`] | `mediadrop.toml` loading, merging, env overrides, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Best Effort, Never Worse
//!
//! Every optimization step may fail (an encoder is missing, the input is
//! corrupt) and the pipeline still produces a result: failed transcodes are
//! simply absent from the candidate list, and the smallest remaining candidate
//! wins. The original is always a candidate, so the output is never larger than
//! the input.
//!
//! ## Presigned PUT, Not Proxied Upload
//!
//! The API signs a storage URL and later confirms the object. The bytes go
//! directly to storage, and the PUT carries no API credentials: the signature
//! is the credential. Confirmation happens only after storage accepted the
//! object, so the backend never records files that do not exist.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resizing, and AVIF encoding use the `image` crate (Lanczos3,
//! `rav1e`) and `rav1d`, so the binary has no system imaging dependencies.
//! Lossy WebP goes through `libwebp` via the `webp` crate because `image`
//! only encodes lossless WebP.

pub mod checksum;
pub mod config;
pub mod imaging;
pub mod media;
pub mod naming;
pub mod output;
pub mod policy;
pub mod select;
pub mod transcode;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
