//! Upload orchestration for image files.
//!
//! The [`ImageUploader`] owns the tracked images and drives them through
//! `pending -> uploading -> success | error -> retrying -> ...`. Previews are
//! produced by the [`PreviewGenerator`] and memory-resident ones are owned by
//! the [`PreviewRegistry`], which releases them when their image goes away.

pub mod orchestrator;
pub mod preview;
pub mod resources;
pub mod summary;

pub use orchestrator::ImageUploader;
pub use preview::{generate_id, PreviewGenerator};
pub use resources::PreviewRegistry;
pub use summary::{overall_progress, UploadSummary};
