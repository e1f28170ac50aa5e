//! Client-side validation of candidate files before they enter the pipeline.
//!
//! Batches are validated all-or-nothing, in this order: empty batch, too many
//! files, then per file (in batch order) unsupported type and oversize. The
//! first failing rule wins.

use crate::config::UploaderConfig;
use crate::models::SourceFile;

/// Validation errors for a batch of candidate files
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No files provided")]
    NoFiles,

    #[error("Maximum {max} file(s) allowed. You selected {selected} file(s).")]
    TooManyFiles { max: usize, selected: usize },

    #[error("File type {content_type} is not supported. Accepted types: {}", .accepted.join(", "))]
    UnsupportedType {
        content_type: String,
        accepted: Vec<String>,
    },

    #[error("File size exceeds maximum allowed size of {}MB", megabytes(.max))]
    FileTooLarge { max: u64 },
}

fn megabytes(bytes: &u64) -> String {
    format!("{:.2}", *bytes as f64 / (1024.0 * 1024.0))
}

/// Image file validator
///
/// Holds the count, size, and type constraints of one uploader instance.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_files: usize,
    max_file_size: u64,
    accepted_types: Vec<String>,
}

impl FileValidator {
    pub fn new(max_files: usize, max_file_size: u64, accepted_types: Vec<String>) -> Self {
        Self {
            max_files,
            max_file_size,
            accepted_types: accepted_types
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(
            config.max_files,
            config.max_file_size,
            config.accepted_types.clone(),
        )
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if !self.accepted_types.iter().any(|t| t == &normalized) {
            return Err(ValidationError::UnsupportedType {
                content_type: content_type.to_string(),
                accepted: self.accepted_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate a single file: type first, then size.
    pub fn validate_file(&self, file: &SourceFile) -> Result<(), ValidationError> {
        self.validate_content_type(&file.content_type)?;
        self.validate_file_size(file.size)?;
        Ok(())
    }

    /// Validate a whole batch. No partial acceptance: the first failure rejects it.
    pub fn validate_batch(&self, files: &[SourceFile]) -> Result<(), ValidationError> {
        if files.is_empty() {
            return Err(ValidationError::NoFiles);
        }

        if files.len() > self.max_files {
            return Err(ValidationError::TooManyFiles {
                max: self.max_files,
                selected: files.len(),
            });
        }

        for file in files {
            self.validate_file(file)?;
        }

        Ok(())
    }
}
