//! Response bodies of the hosting API.

use chrono::Utc;
use imgdrop_core::RemoteRef;
use serde::{Deserialize, Serialize};

/// Successful upload response. Only `secure_url` and `public_id` are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub secure_url: String,
    pub public_id: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

impl UploadResponse {
    pub fn into_remote_ref(self) -> RemoteRef {
        RemoteRef {
            secure_url: self.secure_url,
            public_id: self.public_id,
            uploaded_at: Utc::now(),
        }
    }
}

/// Error body: `{"error": {"message": "..."}}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn message(&self) -> Option<&str> {
        self.error.as_ref()?.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_minimal_success_body() {
        let body = r#"{"secure_url":"https://res.example/v1/a.png","public_id":"a"}"#;
        let parsed: UploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.public_id, "a");
        assert!(parsed.width.is_none());

        let remote = parsed.into_remote_ref();
        assert_eq!(remote.secure_url, "https://res.example/v1/a.png");
    }

    #[test]
    fn test_missing_public_id_is_rejected() {
        let body = r#"{"secure_url":"https://res.example/v1/a.png"}"#;
        assert!(serde_json::from_str::<UploadResponse>(body).is_err());
    }

    #[test]
    fn test_error_message_optional() {
        let parsed: ErrorResponse = serde_json::from_str(r#"{"error":{}}"#).unwrap();
        assert_eq!(parsed.message(), None);
    }
}
