//! Shared test utilities for the mediadrop test suite.
//!
//! Provides synthetic image fixtures and recording fakes for the two upload
//! seams ([`FileApi`] and [`ObjectStore`]).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let api = MockApi::new().reject_confirm(409);
//! let store = MockStore::new(StoreBehavior::Succeed).with_etag("\"e1\"");
//! let uploader = PresignedUploader::new(api, store);
//! // ... run an upload ...
//! assert!(uploader.api.confirms().len() == 1);
//! ```

use crate::upload::{
    ConfirmRequest, ConfirmResponse, FileApi, ObjectStore, PresignRequest, PresignResponse,
    ProgressSink, PutRequest, StoredObject, UploadError, UploadHandle,
};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// =========================================================================
// Image fixtures
// =========================================================================

/// A gradient so encoders have something non-trivial to compress.
fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    }))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Jpeg)
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient(width, height), ImageFormat::Png)
}

// =========================================================================
// MockApi: records presign/confirm calls
// =========================================================================

#[derive(Default)]
pub struct MockApi {
    presigns: Mutex<Vec<PresignRequest>>,
    confirms: Mutex<Vec<ConfirmRequest>>,
    presign_status: Option<u16>,
    confirm_status: Option<u16>,
    echo_key: Option<String>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_presign(mut self, status: u16) -> Self {
        self.presign_status = Some(status);
        self
    }

    pub fn reject_confirm(mut self, status: u16) -> Self {
        self.confirm_status = Some(status);
        self
    }

    /// Echo `key` in every confirm response.
    pub fn echo_key(mut self, key: &str) -> Self {
        self.echo_key = Some(key.to_string());
        self
    }

    pub fn presigns(&self) -> Vec<PresignRequest> {
        self.presigns.lock().unwrap().clone()
    }

    pub fn confirms(&self) -> Vec<ConfirmRequest> {
        self.confirms.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileApi for MockApi {
    async fn presign(&self, request: &PresignRequest) -> Result<PresignResponse, UploadError> {
        self.presigns.lock().unwrap().push(request.clone());
        if let Some(status) = self.presign_status {
            return Err(UploadError::PresignRejected {
                status,
                body: "rejected".into(),
            });
        }
        let key = format!("uploads/{}", request.original_file_name);
        Ok(PresignResponse {
            upload_url: format!("https://storage.test/{key}?sig=1"),
            key,
            expires_in_sec: Some(300),
        })
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse, UploadError> {
        let n = {
            let mut confirms = self.confirms.lock().unwrap();
            confirms.push(request.clone());
            confirms.len()
        };
        if let Some(status) = self.confirm_status {
            return Err(UploadError::ConfirmRejected {
                status,
                body: "rejected".into(),
            });
        }
        Ok(ConfirmResponse {
            file_id: n.to_string(),
            view_url: format!("https://view.test/{}", request.key),
            key: self.echo_key.clone(),
        })
    }
}

// =========================================================================
// MockStore: records PUTs, behaves as configured
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBehavior {
    /// Report full progress and succeed.
    Succeed,
    /// Fail with this HTTP status.
    Status(u16),
    /// Signal [`MockStore::started`] and never finish.
    Hang,
    /// Abort the attached handle, then fail like a dropped connection.
    AbortThenFail,
}

pub struct MockStore {
    behavior: StoreBehavior,
    etag: Option<String>,
    puts: Mutex<Vec<PutRequest>>,
    started: Arc<Notify>,
    abort: Mutex<Option<UploadHandle>>,
}

impl MockStore {
    pub fn new(behavior: StoreBehavior) -> Self {
        Self {
            behavior,
            etag: None,
            puts: Mutex::new(Vec::new()),
            started: Arc::new(Notify::new()),
            abort: Mutex::new(None),
        }
    }

    pub fn with_etag(mut self, etag: &str) -> Self {
        self.etag = Some(etag.to_string());
        self
    }

    /// Notified when a PUT begins.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn attach_abort(&self, handle: UploadHandle) {
        *self.abort.lock().unwrap() = Some(handle);
    }

    pub fn puts(&self) -> Vec<PutRequest> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn put(
        &self,
        request: PutRequest,
        progress: ProgressSink,
    ) -> Result<StoredObject, UploadError> {
        let total = request.body.len() as u64;
        self.puts.lock().unwrap().push(request);
        self.started.notify_one();

        match self.behavior {
            StoreBehavior::Succeed => {
                progress.report(total / 2, Some(total));
                progress.report(total, Some(total));
                Ok(StoredObject {
                    etag: self.etag.clone(),
                })
            }
            StoreBehavior::Status(status) => Err(UploadError::StorageUploadFailed { status }),
            StoreBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            StoreBehavior::AbortThenFail => {
                if let Some(handle) = self.abort.lock().unwrap().as_ref() {
                    handle.abort();
                }
                Err(UploadError::NetworkError("connection reset".into()))
            }
        }
    }
}
