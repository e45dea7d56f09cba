//! Two-phase upload: presign → direct PUT → confirm.
//!
//! ```text
//! Idle ─▶ Presigning ─▶ Uploading ─▶ Confirming ─▶ Done
//!   └──────────┴────────────┴─────────────┴──────▶ Failed
//! ```
//!
//! The backend never sees the file bytes. It hands out a short-lived signed
//! URL and a storage key, the client PUTs straight to object storage, then
//! tells the backend the object is there. The key sent to confirm is exactly
//! the one presign returned.
//!
//! Each call owns an [`UploadHandle`] for abort and progress. Abort wins
//! against an in-flight PUT and is rechecked before confirm; once confirm has
//! been sent the upload runs to completion.
//!
//! | Trait | HTTP implementation |
//! |---|---|
//! | [`FileApi`] | [`ApiClient`] (auth, JSON) |
//! | [`ObjectStore`] | [`HttpObjectStore`] (no auth, chunked progress) |

mod api;
mod error;
mod session;
mod store;
mod types;

pub use api::{ApiClient, Auth, ENV_API_KEY, ENV_TOKEN, FileApi};
pub use error::UploadError;
pub use session::{ProgressFn, ProgressSink, UploadHandle, UploadStage};
pub use store::{CHECKSUM_HEADER, CHUNK_SIZE, HttpObjectStore, ObjectStore, SSE_HEADER};
pub use types::{
    ConfirmRequest, ConfirmResponse, FileType, PresignRequest, PresignResponse, PutRequest,
    StoredObject, UploadReceipt,
};

use crate::checksum;
use crate::config::MediadropConfig;
use crate::media::MediaFile;
use crate::policy;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Options for [`PresignedUploader::upload`].
#[derive(Clone, Default)]
pub struct UploadOptions {
    pub on_progress: Option<ProgressFn>,
}

impl UploadOptions {
    pub fn on_progress(callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            on_progress: Some(Arc::new(callback)),
        }
    }
}

/// Drives uploads against a backend API and an object store.
pub struct PresignedUploader<A, S> {
    api: A,
    store: S,
    server_side_encryption: Option<String>,
}

impl PresignedUploader<ApiClient, HttpObjectStore> {
    /// HTTP uploader built from configuration and environment credentials.
    pub fn from_config(config: &MediadropConfig) -> Result<Self, UploadError> {
        let api = ApiClient::new(&config.api, Auth::from_env())?;
        Ok(Self::new(api, HttpObjectStore::new())
            .with_server_side_encryption(config.upload.server_side_encryption.clone()))
    }
}

impl<A: FileApi, S: ObjectStore> PresignedUploader<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            server_side_encryption: None,
        }
    }

    /// Send `x-amz-server-side-encryption` with every PUT.
    pub fn with_server_side_encryption(mut self, value: Option<String>) -> Self {
        self.server_side_encryption = value;
        self
    }

    /// Prepare an upload. Nothing happens until [`PendingUpload::run`].
    pub fn begin(&self, file: MediaFile, file_type: FileType) -> PendingUpload<'_, A, S> {
        PendingUpload {
            uploader: self,
            file,
            file_type,
            handle: UploadHandle::new(),
            on_progress: None,
        }
    }

    /// Upload `file` and wait for the result.
    pub async fn upload(
        &self,
        file: MediaFile,
        file_type: FileType,
        options: UploadOptions,
    ) -> Result<UploadReceipt, UploadError> {
        let mut pending = self.begin(file, file_type);
        pending.on_progress = options.on_progress;
        pending.run().await
    }
}

/// One upload, ready to run. Grab [`handle`](Self::handle) first to abort or
/// observe it from elsewhere.
pub struct PendingUpload<'a, A, S> {
    uploader: &'a PresignedUploader<A, S>,
    file: MediaFile,
    file_type: FileType,
    handle: UploadHandle,
    on_progress: Option<ProgressFn>,
}

impl<A: FileApi, S: ObjectStore> PendingUpload<'_, A, S> {
    pub fn handle(&self) -> UploadHandle {
        self.handle.clone()
    }

    pub fn with_progress(mut self, callback: impl Fn(u8) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    #[instrument(skip_all, fields(name = self.file.name(), file_type = %self.file_type))]
    pub async fn run(self) -> Result<UploadReceipt, UploadError> {
        let handle = self.handle.clone();
        let result = self.execute().await;
        match &result {
            Ok(receipt) => {
                handle.set_stage(UploadStage::Done);
                info!(file_id = %receipt.file_id, key = %receipt.key, "upload complete");
            }
            Err(UploadError::Aborted) => {
                handle.set_stage(UploadStage::Failed);
                info!("upload aborted");
            }
            Err(e) => {
                handle.set_stage(UploadStage::Failed);
                warn!(error = %e, "upload failed");
            }
        }
        result
    }

    async fn execute(self) -> Result<UploadReceipt, UploadError> {
        let PendingUpload {
            uploader,
            file,
            file_type,
            handle,
            on_progress,
        } = self;

        policy::validate(&file)?;
        // validate() guarantees a content type
        let content_type = file.content_type().unwrap_or_default().to_string();
        let checksum = checksum::digest(&file).await;

        if handle.is_aborted() {
            return Err(UploadError::Aborted);
        }
        handle.set_stage(UploadStage::Presigning);
        let presigned = uploader
            .api
            .presign(&PresignRequest {
                file_type,
                original_file_name: file.name().to_string(),
                content_type: content_type.clone(),
                size: file.size(),
                checksum_sha256_base64: checksum.clone(),
            })
            .await?;
        debug!(key = %presigned.key, expires_in_sec = ?presigned.expires_in_sec, "presigned");

        if handle.is_aborted() {
            return Err(UploadError::Aborted);
        }
        handle.set_stage(UploadStage::Uploading);
        let put = uploader.store.put(
            PutRequest {
                url: presigned.upload_url.clone(),
                content_type: content_type.clone(),
                checksum,
                server_side_encryption: uploader.server_side_encryption.clone(),
                body: file.bytes().clone(),
            },
            ProgressSink::new(&handle, on_progress),
        );
        let stored = tokio::select! {
            biased;
            _ = handle.cancelled() => return Err(UploadError::Aborted),
            result = put => match result {
                Err(_) if handle.is_aborted() => return Err(UploadError::Aborted),
                other => other?,
            },
        };

        if handle.is_aborted() {
            return Err(UploadError::Aborted);
        }
        handle.set_stage(UploadStage::Confirming);
        let confirmed = uploader
            .api
            .confirm(&ConfirmRequest {
                key: presigned.key.clone(),
                content_type,
                size: file.size(),
                etag: stored.etag,
            })
            .await?;

        if let Some(echoed) = confirmed.key.filter(|k| *k != presigned.key) {
            return Err(UploadError::KeyMismatch {
                presigned: presigned.key,
                confirmed: echoed,
            });
        }

        Ok(UploadReceipt {
            file_id: confirmed.file_id,
            view_url: confirmed.view_url,
            key: presigned.key,
        })
    }
}
