//! Backend calls: presign and confirm.

use super::error::UploadError;
use super::types::{ConfirmRequest, ConfirmResponse, PresignRequest, PresignResponse};
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const ENV_TOKEN: &str = "MEDIADROP_TOKEN";
pub const ENV_API_KEY: &str = "MEDIADROP_API_KEY";

const PRESIGN_PATH: &str = "/files/presign";
const CONFIRM_PATH: &str = "/files/confirm";

/// The two backend calls that bracket a storage PUT.
#[async_trait]
pub trait FileApi: Send + Sync {
    async fn presign(&self, request: &PresignRequest) -> Result<PresignResponse, UploadError>;
    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse, UploadError>;
}

/// Authentication strategy for the API.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

impl Auth {
    /// `MEDIADROP_TOKEN` wins over `MEDIADROP_API_KEY`. Blank values are ignored.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let present = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        present(ENV_TOKEN)
            .map(Auth::Bearer)
            .or_else(|| present(ENV_API_KEY).map(Auth::XApiKey))
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Bearer(_) => f.write_str("Bearer(***)"),
            Auth::XApiKey(_) => f.write_str("XApiKey(***)"),
        }
    }
}

/// HTTP client for the presign/confirm endpoints.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    prefix: String,
    auth: Option<Auth>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, auth: Option<Auth>) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UploadError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            prefix: config.prefix.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(Auth::Bearer(token)) => request.bearer_auth(token),
            Some(Auth::XApiKey(key)) => request.header("X-API-Key", key.as_str()),
            None => request,
        }
    }

    /// POST a JSON body; `reject` builds the error for a non-success status.
    async fn post_json<T, B>(
        &self,
        path: &str,
        body: &B,
        reject: fn(u16, String) -> UploadError,
    ) -> Result<T, UploadError>
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync,
    {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));
        let response = request
            .send()
            .await
            .map_err(|e| UploadError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(reject(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| reject(status.as_u16(), format!("invalid response body: {e}")))
    }
}

#[async_trait]
impl FileApi for ApiClient {
    async fn presign(&self, request: &PresignRequest) -> Result<PresignResponse, UploadError> {
        debug!(name = %request.original_file_name, size = request.size, "presign");
        self.post_json(PRESIGN_PATH, request, |status, body| {
            UploadError::PresignRejected { status, body }
        })
        .await
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<ConfirmResponse, UploadError> {
        debug!(key = %request.key, "confirm");
        self.post_json(CONFIRM_PATH, request, |status, body| {
            UploadError::ConfirmRejected { status, body }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str, prefix: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            prefix: prefix.to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn build_url_joins_base_prefix_and_path() {
        let client = ApiClient::new(&config("https://api.example.com/", "/api/v1/"), None).unwrap();
        assert_eq!(
            client.build_url(PRESIGN_PATH),
            "https://api.example.com/api/v1/files/presign"
        );
    }

    #[test]
    fn build_url_without_prefix() {
        let client = ApiClient::new(&config("http://localhost:8080", ""), None).unwrap();
        assert_eq!(
            client.build_url(CONFIRM_PATH),
            "http://localhost:8080/files/confirm"
        );
    }

    #[test]
    fn auth_prefers_token() {
        let auth = Auth::from_lookup(|key| match key {
            ENV_TOKEN => Some("t".into()),
            ENV_API_KEY => Some("k".into()),
            _ => None,
        });
        assert!(matches!(auth, Some(Auth::Bearer(t)) if t == "t"));
    }

    #[test]
    fn auth_falls_back_to_api_key_and_ignores_blank() {
        let auth = Auth::from_lookup(|key| match key {
            ENV_TOKEN => Some("  ".into()),
            ENV_API_KEY => Some("k".into()),
            _ => None,
        });
        assert!(matches!(auth, Some(Auth::XApiKey(k)) if k == "k"));
        assert!(Auth::from_lookup(|_| None).is_none());
    }

    #[test]
    fn auth_debug_hides_secret() {
        let shown = format!("{:?}", Auth::Bearer("secret".into()));
        assert!(!shown.contains("secret"));
    }
}
