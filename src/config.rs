//! Client configuration module.
//!
//! Handles loading, validating, and merging `mediadrop.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of keys; a few
//! environment variables override the result.
//!
//! ## Config File Location
//!
//! `mediadrop.toml` in the working directory is picked up automatically.
//! `--config <path>` points somewhere else (and then the file must exist).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [api]
//! base_url = "http://localhost:8080"
//! prefix = "/api/v1"
//! timeout_secs = 60
//!
//! [images]
//! max_dimension = 2048          # Longest edge before downsampling
//! transcode_threshold = 1048576 # Bytes; smaller images are not transcoded
//! webp_quality = 82
//! avif_quality = 70
//! resize_quality = 92
//!
//! [upload]
//! server_side_encryption = "AES256"  # Omit to send no SSE header
//! ```
//!
//! ## Environment
//!
//! | Variable | Effect |
//! |---|---|
//! | `MEDIADROP_API_URL` | Overrides `api.base_url` |
//! | `MEDIADROP_TOKEN` | Bearer credential for the API |
//! | `MEDIADROP_API_KEY` | `X-API-Key` credential (used when no token is set) |
//!
//! Credentials are read by [`Auth::from_env`](crate::upload::Auth::from_env)
//! and never stored in the config file.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "mediadrop.toml";

/// Overrides `api.base_url`.
pub const ENV_API_URL: &str = "MEDIADROP_API_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from `mediadrop.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediadropConfig {
    /// Backend API location and timeouts.
    pub api: ApiConfig,
    /// Resize and transcode settings.
    pub images: ImagesConfig,
    /// Object storage PUT settings.
    pub upload: UploadConfig,
}

impl MediadropConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.api.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "api.base_url must be an http(s) URL, got {url:?}"
            )));
        }
        if !self.api.prefix.is_empty() && !self.api.prefix.starts_with('/') {
            return Err(ConfigError::Validation(
                "api.prefix must be empty or start with '/'".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs must be non-zero".into(),
            ));
        }
        if self.images.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "images.max_dimension must be non-zero".into(),
            ));
        }
        for (key, value) in [
            ("webp_quality", self.images.webp_quality),
            ("avif_quality", self.images.avif_quality),
            ("resize_quality", self.images.resize_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "images.{key} must be 1-100"
                )));
            }
        }
        if self
            .upload
            .server_side_encryption
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "upload.server_side_encryption must not be blank".into(),
            ));
        }
        Ok(())
    }
}

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Scheme, host and port of the backend.
    pub base_url: String,
    /// Path prepended to every endpoint, e.g. `/api/v1`.
    pub prefix: String,
    /// Per-request timeout for presign and confirm calls.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            prefix: "/api/v1".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Resize and transcode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Longest edge in pixels before an image is downsampled.
    pub max_dimension: u32,
    /// Base candidates below this many bytes are uploaded without transcoding.
    pub transcode_threshold: u64,
    /// WebP quality (1-100).
    pub webp_quality: u32,
    /// AVIF quality (1-100). Advisory.
    pub avif_quality: u32,
    /// Quality for re-encoding a downsampled image in its own format (1-100).
    pub resize_quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_dimension: crate::select::DEFAULT_MAX_DIMENSION,
            transcode_threshold: crate::select::TRANSCODE_THRESHOLD,
            webp_quality: crate::transcode::DEFAULT_WEBP_QUALITY.value(),
            avif_quality: crate::transcode::DEFAULT_AVIF_QUALITY.value(),
            resize_quality: crate::imaging::RESIZE_QUALITY.value(),
        }
    }
}

/// Object storage PUT settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Value for `x-amz-server-side-encryption`, e.g. `AES256`.
    /// Must match what the presigned URL was signed with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_side_encryption: Option<String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(MediadropConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MediadropConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MediadropConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Apply environment overrides using `lookup` (usually `std::env::var`).
pub fn apply_env_overrides(
    mut config: MediadropConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<MediadropConfig, ConfigError> {
    if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
        config.api.base_url = url.trim().trim_end_matches('/').to_string();
    }
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// With `Some(path)` the file must exist. With `None`, `mediadrop.toml` in
/// the working directory is used when present. User values are merged on top
/// of stock defaults, unknown keys are rejected, environment overrides are
/// applied, and the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<MediadropConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(toml::from_str(&fs::read_to_string(p)?)?),
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    let config = resolve_config(stock_defaults_value()?, overlay)?;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Returns a fully-commented stock `mediadrop.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mediadrop configuration
# =======================
#
# All keys are optional. Values shown are the stock defaults.
# Unknown keys are rejected.
#
# Credentials are never read from this file. Set one of:
#   MEDIADROP_TOKEN    bearer token
#   MEDIADROP_API_KEY  API key (sent as X-API-Key)

[api]
# Scheme, host and port of the backend. MEDIADROP_API_URL overrides this.
base_url = "http://localhost:8080"
# Prefix for the presign and confirm endpoints.
prefix = "/api/v1"
# Timeout for presign and confirm requests, in seconds.
timeout_secs = 60

[images]
# Images whose longer edge exceeds this are downsampled.
max_dimension = 2048
# Images at or above this many bytes (after resizing) are also tried as
# AVIF and WebP; the smallest result is uploaded.
transcode_threshold = 1048576
# Lossy quality, 1-100.
webp_quality = 82
# Advisory: some encoders ignore it.
avif_quality = 70
# Quality used when a downsampled image is re-encoded in its own format.
resize_quality = 92

[upload]
# Sent as x-amz-server-side-encryption on the storage PUT when set.
# Must match how the backend signs upload URLs.
# server_side_encryption = "AES256"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = MediadropConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.prefix, "/api/v1");
        assert_eq!(config.api.timeout_secs, 60);
        assert_eq!(config.images.max_dimension, 2048);
        assert_eq!(config.images.transcode_threshold, 1024 * 1024);
        assert_eq!(config.images.webp_quality, 82);
        assert_eq!(config.images.resize_quality, 92);
        assert_eq!(config.upload.server_side_encryption, None);
    }

    #[test]
    fn parse_partial_config() {
        let config: MediadropConfig = toml::from_str(
            r#"
[images]
max_dimension = 1600
"#,
        )
        .unwrap();
        assert_eq!(config.images.max_dimension, 1600);
        assert_eq!(config.images.webp_quality, 82);
        assert_eq!(config.api.prefix, "/api/v1");
    }

    #[test]
    fn parse_upload_section() {
        let config: MediadropConfig = toml::from_str(
            r#"
[upload]
server_side_encryption = "AES256"
"#,
        )
        .unwrap();
        assert_eq!(
            config.upload.server_side_encryption.as_deref(),
            Some("AES256")
        );
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"webp_quality = 82"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"webp_quality = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("webp_quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_table_merge_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[api]
base_url = "http://localhost:8080"
timeout_secs = 60
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[api]
timeout_secs = 5
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let api = merged.get("api").unwrap();
        assert_eq!(api.get("timeout_secs").unwrap().as_integer(), Some(5));
        assert_eq!(
            api.get("base_url").unwrap().as_str(),
            Some("http://localhost:8080")
        );
    }

    // =========================================================================
    // Unknown key rejection
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<MediadropConfig, _> = toml::from_str(
            r#"
[images]
max_dimensoin = 100
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<MediadropConfig, _> = toml::from_str("[thumbnails]\nsize = 1\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(MediadropConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = MediadropConfig::default();
        config.images.webp_quality = 100;
        assert!(config.validate().is_ok());
        config.images.webp_quality = 0;
        assert!(config.validate().is_err());
        config.images.webp_quality = 82;
        config.images.avif_quality = 101;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("avif_quality"));
    }

    #[test]
    fn validate_rejects_bad_api_settings() {
        let mut config = MediadropConfig::default();
        config.api.base_url = "ftp://example.com".into();
        assert!(config.validate().is_err());

        let mut config = MediadropConfig::default();
        config.api.prefix = "api/v1".into();
        assert!(config.validate().is_err());

        let mut config = MediadropConfig::default();
        config.api.prefix = String::new();
        assert!(config.validate().is_ok());
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_sse() {
        let mut config = MediadropConfig::default();
        config.upload.server_side_encryption = Some("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_dimension() {
        let mut config = MediadropConfig::default();
        config.images.max_dimension = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join("mediadrop.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_raw_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mediadrop.toml");
        fs::write(&path, "this is not [valid toml").unwrap();
        assert!(matches!(
            load_raw_config(&path),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "https://media.example.com"

[upload]
server_side_encryption = "AES256"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        // MEDIADROP_API_URL may be set in the environment running the tests
        if std::env::var(ENV_API_URL).is_err() {
            assert_eq!(config.api.base_url, "https://media.example.com");
        }
        assert_eq!(
            config.upload.server_side_encryption.as_deref(),
            Some("AES256")
        );
        assert_eq!(config.images.max_dimension, 2048);
    }

    #[test]
    fn load_config_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mediadrop.toml");
        fs::write(&path, "[images]\nwebp_quality = 0\n").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn resolve_config_with_overlay() {
        let overlay: toml::Value = toml::from_str("[images]\nmax_dimension = 1024\n").unwrap();
        let config = resolve_config(stock_defaults_value().unwrap(), Some(overlay)).unwrap();
        assert_eq!(config.images.max_dimension, 1024);
        assert_eq!(config.images.webp_quality, 82);
    }

    #[test]
    fn env_overrides_base_url() {
        let config = apply_env_overrides(MediadropConfig::default(), |key| {
            (key == ENV_API_URL).then(|| "https://up.example.com/".to_string())
        })
        .unwrap();
        assert_eq!(config.api.base_url, "https://up.example.com");
    }

    #[test]
    fn env_override_is_validated() {
        let result = apply_env_overrides(MediadropConfig::default(), |_| {
            Some("not a url".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn env_blank_value_is_ignored() {
        let config =
            apply_env_overrides(MediadropConfig::default(), |_| Some(String::new())).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: MediadropConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, MediadropConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value().unwrap();
        let table = value.as_table().unwrap();
        assert!(table.contains_key("api"));
        assert!(table.contains_key("images"));
        assert!(table.contains_key("upload"));
    }
}
