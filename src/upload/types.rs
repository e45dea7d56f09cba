//! Wire types for the presign / PUT / confirm protocol.
//!
//! JSON bodies are camelCase. The storage key is opaque: it is carried from
//! [`PresignResponse`] to [`ConfirmRequest`] untouched.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the upload is for. The backend files it accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    /// Symbol cards for augmentative and alternative communication.
    Aac,
    Profile,
    Record,
    Qualification,
    Filter,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Aac,
        FileType::Profile,
        FileType::Record,
        FileType::Qualification,
        FileType::Filter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Aac => "AAC",
            FileType::Profile => "PROFILE",
            FileType::Record => "RECORD",
            FileType::Qualification => "QUALIFICATION",
            FileType::Filter => "FILTER",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = FileType::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown file type {s:?} (expected one of {})", names.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub file_type: FileType,
    pub original_file_name: String,
    pub content_type: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum_sha256_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    pub upload_url: String,
    pub key: String,
    #[serde(default)]
    pub expires_in_sec: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub key: String,
    pub content_type: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    #[serde(deserialize_with = "id_as_string")]
    pub file_id: String,
    pub view_url: String,
    /// Some backends echo the confirmed key.
    #[serde(default)]
    pub key: Option<String>,
}

/// Accept a JSON number or string; normalize to a string.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Num(u64),
        Str(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Num(n) => n.to_string(),
        Id::Str(s) => s,
    })
}

/// What a finished upload hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub file_id: String,
    pub view_url: String,
    pub key: String,
}

/// A single storage PUT.
#[derive(Debug, Clone, PartialEq)]
pub struct PutRequest {
    pub url: String,
    pub content_type: String,
    /// Base64 SHA-256, sent as `x-amz-checksum-sha256`.
    pub checksum: Option<String>,
    /// Sent as `x-amz-server-side-encryption`.
    pub server_side_encryption: Option<String>,
    pub body: Bytes,
}

/// Result of a successful PUT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    /// `ETag` response header, quotes included, if the store sent one.
    pub etag: Option<String>,
}
