//! Direct PUT to object storage through a presigned URL.

use super::error::UploadError;
use super::session::ProgressSink;
use super::types::{PutRequest, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use reqwest::{Body, Client};
use tracing::debug;

/// Granularity of progress reports.
pub const CHUNK_SIZE: usize = 64 * 1024;

pub const CHECKSUM_HEADER: &str = "x-amz-checksum-sha256";
pub const SSE_HEADER: &str = "x-amz-server-side-encryption";

/// Somewhere a presigned URL can be PUT to.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, request: PutRequest, progress: ProgressSink)
    -> Result<StoredObject, UploadError>;
}

/// Plain HTTP PUT. Sends no credentials: the signed URL is the credential,
/// and an extra `Authorization` header would break the signature.
#[derive(Clone, Debug, Default)]
pub struct HttpObjectStore {
    client: Client,
}

impl HttpObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Split `body` into chunks that report progress as they are pulled.
fn progress_stream(
    body: Bytes,
    progress: ProgressSink,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = body.len() as u64;
    let chunks: Vec<Bytes> = (0..body.len())
        .step_by(CHUNK_SIZE)
        .map(|start| body.slice(start..(start + CHUNK_SIZE).min(body.len())))
        .collect();

    let mut sent = 0u64;
    progress.report(0, Some(total));
    futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress.report(sent, Some(total));
        Ok(chunk)
    })
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        request: PutRequest,
        progress: ProgressSink,
    ) -> Result<StoredObject, UploadError> {
        let total = request.body.len() as u64;
        debug!(size = total, "storage PUT");

        let mut builder = self
            .client
            .put(&request.url)
            .header(CONTENT_TYPE, &request.content_type)
            .header(CONTENT_LENGTH, total);
        if let Some(checksum) = &request.checksum {
            builder = builder.header(CHECKSUM_HEADER, checksum);
        }
        if let Some(sse) = &request.server_side_encryption {
            builder = builder.header(SSE_HEADER, sse);
        }

        let response = builder
            .body(Body::wrap_stream(progress_stream(
                request.body,
                progress.clone(),
            )))
            .send()
            .await
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::StorageUploadFailed {
                status: status.as_u16(),
            });
        }
        progress.report(total, Some(total));

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!(?etag, "storage PUT complete");
        Ok(StoredObject { etag })
    }
}
