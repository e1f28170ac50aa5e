//! imgdrop core library
//!
//! This crate provides the domain models, error taxonomy, configuration, and
//! validation shared by the upload client, the orchestrator, and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod hooks;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{PreviewMode, RemoteConfig, RetryPolicy, UploaderConfig};
pub use error::{PreviewError, UploadError};
pub use hooks::{FnHooks, NoOpHooks, UploadHooks};
pub use models::{
    format_file_size, ImageStatus, PreviewHandle, RemoteRef, SourceFile, TrackedImage,
};
pub use validation::{FileValidator, ValidationError};
