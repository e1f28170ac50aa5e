//! Configuration module
//!
//! [`UploaderConfig`] holds the intake limits and retry policy of one uploader;
//! [`RemoteConfig`] describes the image hosting endpoint. Both can be read from
//! the environment (a `.env` file is honoured).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ACCEPTED_TYPES, DEFAULT_API_BASE, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_SIZE, UPLOAD_TIMEOUT_SECS,
};
use crate::error::UploadError;

/// How previews are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// Inline `data:` URL derived from the file. Never needs releasing.
    #[default]
    DataUrl,
    /// Bytes held in the preview registry under an object key. Memory-resident;
    /// released when the owning image goes away.
    Object,
}

impl FromStr for PreviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "data-url" | "data_url" | "dataurl" => Ok(PreviewMode::DataUrl),
            "object" | "blob" => Ok(PreviewMode::Object),
            other => Err(format!("unknown preview mode: {}", other)),
        }
    }
}

/// Exponential backoff between upload attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay after failed attempt `attempt` (0-based): `2^attempt * base_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt.min(16)))
    }
}

/// Intake limits and upload behaviour of one uploader
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub max_files: usize,
    /// Bytes
    pub max_file_size: u64,
    pub accepted_types: Vec<String>,
    /// When false, intake keeps only the first file and replaces the collection.
    pub multiple: bool,
    pub retry: RetryPolicy,
    pub preview_mode: PreviewMode,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accepted_types: DEFAULT_ACCEPTED_TYPES.iter().map(|s| s.to_string()).collect(),
            multiple: true,
            retry: RetryPolicy::default(),
            preview_mode: PreviewMode::default(),
        }
    }
}

impl UploaderConfig {
    pub fn from_env() -> Result<Self, UploadError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let max_files = env_or("IMGDROP_MAX_FILES", defaults.max_files);

        let max_file_size = env_parsed::<u64>("IMGDROP_MAX_FILE_SIZE_MB")
            .and_then(megabytes_to_bytes)
            .unwrap_or(defaults.max_file_size);

        let accepted_types = env::var("IMGDROP_ACCEPTED_TYPES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.accepted_types);

        let multiple = env_or("IMGDROP_MULTIPLE", defaults.multiple);
        let max_attempts = env_or("IMGDROP_MAX_ATTEMPTS", defaults.retry.max_attempts);
        let preview_mode = env_or("IMGDROP_PREVIEW_MODE", defaults.preview_mode);

        let config = Self {
            max_files,
            max_file_size,
            accepted_types,
            multiple,
            retry: RetryPolicy {
                max_attempts,
                ..defaults.retry
            },
            preview_mode,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if self.max_files == 0 {
            return Err(UploadError::configuration("maxFiles must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(UploadError::configuration(
                "max upload attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Parse an environment variable. Unset yields `None`; an unparseable value
/// is logged and ignored.
fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key = key, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env_parsed(key).unwrap_or(default)
}

/// `None` (logged) when the byte count does not fit in a u64.
fn megabytes_to_bytes(mb: u64) -> Option<u64> {
    let bytes = mb.checked_mul(1024 * 1024);
    if bytes.is_none() {
        tracing::warn!(
            key = "IMGDROP_MAX_FILE_SIZE_MB",
            value = mb,
            "Ignoring out-of-range setting"
        );
    }
    bytes
}

/// Image hosting endpoint configuration
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            upload_preset: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
        }
    }
}

impl RemoteConfig {
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            ..Self::default()
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create from environment: IMGDROP_CLOUD_NAME, IMGDROP_UPLOAD_PRESET and
    /// optionally IMGDROP_API_BASE. Missing values are left blank; use
    /// [`RemoteConfig::validate`] before uploading.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let config = Self::new(
            env::var("IMGDROP_CLOUD_NAME").unwrap_or_default(),
            env::var("IMGDROP_UPLOAD_PRESET").unwrap_or_default(),
        );

        match env::var("IMGDROP_API_BASE") {
            Ok(base) if !base.trim().is_empty() => config.with_api_base(base),
            _ => config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if self.cloud_name.trim().is_empty() {
            return Err(UploadError::configuration(
                "Cloud name is not configured.",
            ));
        }
        if self.upload_preset.trim().is_empty() {
            return Err(UploadError::configuration(
                "Upload preset is not configured.",
            ));
        }
        Ok(())
    }

    pub fn upload_url(&self) -> Result<String, UploadError> {
        if self.cloud_name.trim().is_empty() {
            return Err(UploadError::configuration(
                "Cloud name is not configured.",
            ));
        }
        Ok(format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name.trim()
        ))
    }
}
