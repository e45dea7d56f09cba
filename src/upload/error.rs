use crate::policy::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("presign rejected ({status}): {body}")]
    PresignRejected { status: u16, body: String },
    #[error("storage upload failed with status {status}")]
    StorageUploadFailed { status: u16 },
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("confirm rejected ({status}): {body}")]
    ConfirmRejected { status: u16, body: String },
    #[error("upload aborted")]
    Aborted,
    #[error("confirm returned key {confirmed:?}, expected {presigned:?}")]
    KeyMismatch { presigned: String, confirmed: String },
}

impl UploadError {
    /// True when the file itself was fine and trying again may succeed.
    ///
    /// Validation failures and aborts are final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UploadError::PresignRejected { .. }
                | UploadError::StorageUploadFailed { .. }
                | UploadError::NetworkError(_)
                | UploadError::ConfirmRejected { .. }
                | UploadError::KeyMismatch { .. }
        )
    }
}
