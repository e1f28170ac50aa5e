//! Preview generation and image identifiers.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use rand::Rng;

use imgdrop_core::{PreviewError, PreviewHandle, PreviewMode, SourceFile};

use crate::resources::PreviewRegistry;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

/// New image id: millisecond timestamp plus a random base-36 suffix.
/// Unique in practice within a session; not meant to be unguessable.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Turns image files into displayable previews.
#[derive(Clone)]
pub struct PreviewGenerator {
    mode: PreviewMode,
    registry: PreviewRegistry,
}

impl PreviewGenerator {
    pub fn new(mode: PreviewMode, registry: PreviewRegistry) -> Self {
        Self { mode, registry }
    }

    pub fn mode(&self) -> PreviewMode {
        self.mode
    }

    /// Produce the preview for the image `id`. Object previews are registered
    /// and must be released by the caller if the image never goes live.
    pub async fn generate(
        &self,
        id: &str,
        file: &SourceFile,
    ) -> Result<PreviewHandle, PreviewError> {
        if !file.content_type.to_lowercase().starts_with("image/") {
            return Err(PreviewError::NotAnImage);
        }

        if file.bytes.len() as u64 != file.size {
            return Err(PreviewError::Unreadable(format!(
                "{}: expected {} bytes, read {}",
                file.name,
                file.size,
                file.bytes.len()
            )));
        }

        match self.mode {
            PreviewMode::DataUrl => {
                let content_type = file.content_type.clone();
                let data = file.bytes.clone();
                let url = tokio::task::spawn_blocking(move || {
                    format!("data:{};base64,{}", content_type, STANDARD.encode(&data))
                })
                .await
                .map_err(|e| PreviewError::Unreadable(e.to_string()))?;

                Ok(PreviewHandle::DataUrl(url))
            }
            PreviewMode::Object => {
                let handle = PreviewHandle::object(id);
                self.registry.register(handle.as_str(), file.bytes.clone());
                Ok(handle)
            }
        }
    }
}
