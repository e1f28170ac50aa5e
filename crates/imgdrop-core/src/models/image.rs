use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::file::SourceFile;
use crate::constants::OBJECT_PREVIEW_PREFIX;
use crate::error::UploadError;

/// Upload lifecycle of one tracked image.
///
/// `pending -> uploading -> {success, error}`, `error -> retrying -> {success, error}`.
/// `success` and non-retryable `error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Uploading,
    Retrying,
    Success,
    Error,
}

impl Display for ImageStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ImageStatus::Pending => write!(f, "pending"),
            ImageStatus::Uploading => write!(f, "uploading"),
            ImageStatus::Retrying => write!(f, "retrying"),
            ImageStatus::Success => write!(f, "success"),
            ImageStatus::Error => write!(f, "error"),
        }
    }
}

/// Locally resolvable reference to a preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PreviewHandle {
    /// Inline `data:` URL, derived from the file.
    DataUrl(String),
    /// Key of bytes held by the preview registry; must be released.
    Object(String),
}

impl PreviewHandle {
    pub fn object(id: &str) -> Self {
        PreviewHandle::Object(format!("{}{}", OBJECT_PREVIEW_PREFIX, id))
    }

    pub fn is_memory_resident(&self) -> bool {
        matches!(self, PreviewHandle::Object(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            PreviewHandle::DataUrl(url) => url,
            PreviewHandle::Object(key) => key,
        }
    }
}

/// Where the image lives after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRef {
    pub secure_url: String,
    pub public_id: String,
    pub uploaded_at: DateTime<Utc>,
}

/// One user-selected file and its upload state.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedImage {
    pub id: String,
    pub file: SourceFile,
    #[serde(skip_serializing)]
    pub preview: PreviewHandle,
    pub status: ImageStatus,
    /// 0-100. Live only while uploading/retrying; 100 on success.
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retry_count: u32,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteRef>,
}

impl TrackedImage {
    pub fn new(id: String, file: SourceFile, preview: PreviewHandle) -> Self {
        Self {
            id,
            file,
            preview,
            status: ImageStatus::Pending,
            progress: 0,
            error: None,
            retry_count: 0,
            retryable: true,
            remote: None,
        }
    }

    /// Failed with an error worth another attempt. Picked up by `retry_all_failed`.
    pub fn can_retry(&self) -> bool {
        self.status == ImageStatus::Error && self.retryable
    }

    /// Picked up by an explicit upload trigger.
    pub fn awaiting_trigger(&self) -> bool {
        matches!(self.status, ImageStatus::Pending | ImageStatus::Retrying)
    }

    /// No further work can happen without user action beyond a retry:
    /// `success` or non-retryable `error`.
    pub fn is_terminal(&self) -> bool {
        match self.status {
            ImageStatus::Success => true,
            ImageStatus::Error => !self.retryable,
            _ => false,
        }
    }

    /// Contribution to overall progress.
    pub fn progress_weight(&self) -> u32 {
        match self.status {
            ImageStatus::Success => 100,
            ImageStatus::Pending | ImageStatus::Error => 0,
            ImageStatus::Uploading | ImageStatus::Retrying => u32::from(self.progress.min(100)),
        }
    }

    pub fn mark_uploading(&mut self) {
        self.status = ImageStatus::Uploading;
        self.progress = 0;
    }

    /// Prepare a fresh attempt after a failure.
    pub fn mark_retrying(&mut self) {
        self.status = ImageStatus::Retrying;
        self.retry_count += 1;
        self.progress = 0;
        self.error = None;
    }

    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }

    pub fn mark_success(&mut self, remote: RemoteRef) {
        self.status = ImageStatus::Success;
        self.progress = 100;
        self.error = None;
        self.retryable = false;
        self.remote = Some(remote);
    }

    pub fn mark_failed(&mut self, error: &UploadError) {
        self.status = ImageStatus::Error;
        self.progress = 0;
        self.error = Some(error.to_string());
        self.retryable = error.is_recoverable();
    }
}
