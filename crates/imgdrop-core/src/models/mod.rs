pub mod file;
pub mod image;

pub use file::{content_type_for_extension, format_file_size, SourceFile};
pub use image::{ImageStatus, PreviewHandle, RemoteRef, TrackedImage};
