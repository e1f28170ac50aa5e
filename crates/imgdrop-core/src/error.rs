//! Error types module
//!
//! All failures the upload pipeline can report are unified under [`UploadError`].
//! Batch-level failures (validation, configuration) block an operation before
//! any tracked image is touched; transfer failures are per attempt and end up
//! on the failing image as an `error` status.

use crate::validation::ValidationError;

/// Preview generation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreviewError {
    #[error("File is not an image")]
    NotAnImage,

    #[error("Error reading file: {0}")]
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error("{0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. `message` is taken from the response body when it is
    /// structured, otherwise it is a generic status-code message.
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    #[error("Failed to parse upload response: {0}")]
    ResponseParse(String),

    #[error("Upload timeout: Request took too long")]
    Timeout,
}

impl UploadError {
    pub fn configuration(message: impl Into<String>) -> Self {
        UploadError::Configuration(message.into())
    }

    /// Whether another attempt could succeed. Only per-attempt transfer
    /// failures qualify.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            UploadError::Network(_)
                | UploadError::HttpStatus { .. }
                | UploadError::ResponseParse(_)
                | UploadError::Timeout
        )
    }

    /// Machine-readable error code (e.g., "NETWORK_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "VALIDATION_ERROR",
            UploadError::Preview(_) => "PREVIEW_ERROR",
            UploadError::Configuration(_) => "CONFIGURATION_ERROR",
            UploadError::Network(_) => "NETWORK_ERROR",
            UploadError::HttpStatus { .. } => "HTTP_STATUS_ERROR",
            UploadError::ResponseParse(_) => "RESPONSE_PARSE_ERROR",
            UploadError::Timeout => "TIMEOUT_ERROR",
        }
    }
}
