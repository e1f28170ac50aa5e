use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;

use imgdrop_core::{format_file_size, FileValidator, ImageStatus, SourceFile, TrackedImage};

/// Read every path into a [`SourceFile`], in the order given.
pub async fn load_files(paths: &[PathBuf]) -> anyhow::Result<Vec<SourceFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = SourceFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

#[derive(Debug, Serialize)]
pub struct ImageReport {
    pub name: String,
    pub size: String,
    pub status: ImageStatus,
    pub progress: u8,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

impl From<&TrackedImage> for ImageReport {
    fn from(image: &TrackedImage) -> Self {
        Self {
            name: image.file.name.clone(),
            size: format_file_size(image.file.size),
            status: image.status,
            progress: image.progress,
            retry_count: image.retry_count,
            error: image.error.clone(),
            url: image.remote.as_ref().map(|r| r.secure_url.clone()),
            public_id: image.remote.as_ref().map(|r| r.public_id.clone()),
        }
    }
}

/// Final state of an upload run, printed as JSON.
#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub overall_progress: u8,
    pub images: Vec<ImageReport>,
}

impl UploadReport {
    pub fn new(images: &[TrackedImage], overall_progress: u8) -> Self {
        let count = |status: ImageStatus| images.iter().filter(|i| i.status == status).count();
        Self {
            total: images.len(),
            succeeded: count(ImageStatus::Success),
            failed: count(ImageStatus::Error),
            overall_progress,
            images: images.iter().map(ImageReport::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileCheck {
    pub name: String,
    pub content_type: String,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of validating a selection without uploading it.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// First error intake would report for the whole batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub files: Vec<FileCheck>,
}

impl ValidationReport {
    pub fn new(validator: &FileValidator, files: &[SourceFile]) -> Self {
        let error = validator.validate_batch(files).err().map(|e| e.to_string());
        let files = files
            .iter()
            .map(|file| FileCheck {
                name: file.name.clone(),
                content_type: file.content_type.clone(),
                size: format_file_size(file.size),
                error: validator.validate_file(file).err().map(|e| e.to_string()),
            })
            .collect();

        Self {
            valid: error.is_none(),
            error,
            files,
        }
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use imgdrop_core::{PreviewHandle, RemoteRef, UploadError};

    fn image(name: &str) -> TrackedImage {
        TrackedImage::new(
            format!("1-{}", name),
            SourceFile::new(name, "image/png", vec![0u8; 1536]),
            PreviewHandle::DataUrl("data:image/png;base64,".into()),
        )
    }

    #[test]
    fn test_upload_report_counts_statuses() {
        let mut done = image("a.png");
        done.mark_success(RemoteRef {
            secure_url: "https://res.example/a.png".into(),
            public_id: "a".into(),
            uploaded_at: Utc::now(),
        });
        let mut failed = image("b.png");
        failed.mark_failed(&UploadError::Timeout);

        let report = UploadReport::new(&[done, failed, image("c.png")], 33);

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.images[0].size, "1.5 KB");
        assert_eq!(report.images[0].public_id.as_deref(), Some("a"));
        assert_eq!(
            report.images[1].error.as_deref(),
            Some("Upload timeout: Request took too long")
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["images"][1]["status"], "error");
        assert!(json["images"][2].get("url").is_none());
    }

    #[test]
    fn test_validation_report_flags_each_file() {
        let validator = FileValidator::new(5, 1024 * 1024, vec!["image/png".into()]);
        let files = vec![
            SourceFile::new("ok.png", "image/png", vec![0u8; 10]),
            SourceFile::new("big.png", "image/png", vec![0u8; 2 * 1024 * 1024]),
            SourceFile::new("doc.pdf", "application/pdf", vec![0u8; 10]),
        ];

        let report = ValidationReport::new(&validator, &files);

        assert!(!report.valid);
        assert_eq!(
            report.error.as_deref(),
            Some("File size exceeds maximum allowed size of 1.00MB")
        );
        assert!(report.files[0].error.is_none());
        assert!(report.files[1].error.is_some());
        assert_eq!(
            report.files[2].error.as_deref(),
            Some("File type application/pdf is not supported. Accepted types: image/png")
        );
    }

    #[tokio::test]
    async fn test_load_files_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("cat.png");
        tokio::fs::write(&present, b"png").await.unwrap();

        let files = load_files(&[present.clone()]).await.unwrap();
        assert_eq!(files[0].name, "cat.png");
        assert_eq!(files[0].content_type, "image/png");

        let missing = dir.path().join("gone.png");
        let err = load_files(&[present, missing]).await.unwrap_err();
        assert!(err.to_string().contains("gone.png"));
    }
}
