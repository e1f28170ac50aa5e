//! HTTP upload client for the image hosting API.
//!
//! [`UploadClient`] performs one multipart upload with fine-grained progress
//! reporting. [`upload_with_retry`] wraps any [`RemoteUploader`] with
//! exponential backoff. Neither touches shared state: progress is only
//! reported through the callback.

pub mod progress;
pub mod response;
pub mod retry;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::sync::Arc;

use imgdrop_core::{RemoteConfig, RemoteRef, SourceFile, UploadError};

pub use progress::ProgressTracker;
pub use response::{ErrorResponse, UploadResponse};
pub use retry::upload_with_retry;

/// Progress callback, 0-100. Non-decreasing within one attempt.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Uploads one file and resolves with its remote reference.
#[async_trait]
pub trait RemoteUploader: Send + Sync {
    /// Fail fast when the uploader can never succeed (missing endpoint).
    /// Checked before any tracked image is touched.
    fn ensure_configured(&self) -> Result<(), UploadError> {
        Ok(())
    }

    /// Single attempt.
    async fn upload(&self, file: &SourceFile, on_progress: ProgressFn)
        -> Result<RemoteRef, UploadError>;
}

/// Multipart upload client for the hosting API.
#[derive(Clone, Debug)]
pub struct UploadClient {
    client: Client,
    config: RemoteConfig,
}

impl UploadClient {
    pub fn new(config: RemoteConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UploadError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create client from environment: IMGDROP_CLOUD_NAME, IMGDROP_UPLOAD_PRESET, IMGDROP_API_BASE.
    pub fn from_env() -> Result<Self, UploadError> {
        Self::new(RemoteConfig::from_env())
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn file_part(file: &SourceFile, on_progress: ProgressFn) -> Result<Part, UploadError> {
        let body = progress::progress_body(file.bytes.clone(), on_progress);

        Part::stream_with_length(body, file.size)
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                UploadError::configuration(format!(
                    "Failed to build upload request for {}: {}",
                    file.name, e
                ))
            })
    }
}

#[async_trait]
impl RemoteUploader for UploadClient {
    fn ensure_configured(&self) -> Result<(), UploadError> {
        self.config.validate()
    }

    async fn upload(
        &self,
        file: &SourceFile,
        on_progress: ProgressFn,
    ) -> Result<RemoteRef, UploadError> {
        self.config.validate()?;
        let url = self.config.upload_url()?;

        let form = Form::new()
            .part("file", Self::file_part(file, on_progress)?)
            .text("upload_preset", self.config.upload_preset.clone());

        tracing::debug!(
            file = %file.name,
            size = file.size,
            url = %url,
            "Sending upload request"
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(error_from_status(status, &body));
        }

        let parsed: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| UploadError::ResponseParse(e.to_string()))?;

        Ok(parsed.into_remote_ref())
    }
}

fn map_transport_error(error: reqwest::Error) -> UploadError {
    if error.is_timeout() {
        UploadError::Timeout
    } else if error.is_builder() {
        UploadError::configuration(format!("Invalid upload request: {}", error))
    } else {
        UploadError::Network(format!("Failed to upload file: {}", error))
    }
}

/// Build the error for a non-2xx response, preferring `error.message` from a
/// structured body.
pub fn error_from_status(status: StatusCode, body: &str) -> UploadError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Upload failed with status {}", status.as_u16())),
        Err(_) => format!(
            "Upload failed with status {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        ),
    };

    UploadError::HttpStatus {
        status: status.as_u16(),
        message,
    }
}
