//! Registry of memory-resident previews.
//!
//! Each `PreviewHandle::Object` key maps to the bytes it keeps alive. A handle
//! is released at most once; releasing an unknown, already released or
//! derived (`DataUrl`) handle does nothing.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use imgdrop_core::PreviewHandle;

#[derive(Default)]
struct RegistryState {
    live: HashMap<String, Bytes>,
    released: u64,
}

/// Shared handle to the registry. Clones refer to the same registry.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Keep `data` alive under `key` until released.
    pub fn register(&self, key: &str, data: Bytes) {
        self.state().live.insert(key.to_string(), data);
    }

    /// Bytes behind a live object handle.
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Bytes> {
        match handle {
            PreviewHandle::Object(key) => self.state().live.get(key).cloned(),
            PreviewHandle::DataUrl(_) => None,
        }
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        match handle {
            PreviewHandle::Object(key) => self.state().live.contains_key(key),
            PreviewHandle::DataUrl(_) => false,
        }
    }

    /// Release a handle. Returns whether anything was actually freed.
    pub fn release(&self, handle: &PreviewHandle) -> bool {
        let PreviewHandle::Object(key) = handle else {
            return false;
        };

        let mut state = self.state();
        if state.live.remove(key).is_some() {
            state.released += 1;
            tracing::debug!(preview = %key, "Released preview");
            true
        } else {
            false
        }
    }

    /// Release every live handle. Returns how many were freed.
    pub fn release_all(&self) -> usize {
        let mut state = self.state();
        let count = state.live.len();
        state.live.clear();
        state.released += count as u64;
        if count > 0 {
            tracing::debug!(count = count, "Released all previews");
        }
        count
    }

    pub fn live_count(&self) -> usize {
        self.state().live.len()
    }

    /// Total releases performed over the registry's lifetime.
    pub fn released_count(&self) -> u64 {
        self.state().released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_is_idempotent() {
        let registry = PreviewRegistry::new();
        let handle = PreviewHandle::object("1-a");
        registry.register(handle.as_str(), Bytes::from_static(b"png"));

        assert!(registry.is_live(&handle));
        assert!(registry.release(&handle));
        assert!(!registry.release(&handle));
        assert_eq!(registry.released_count(), 1);
        assert!(registry.resolve(&handle).is_none());
    }

    #[test]
    fn test_data_url_release_is_noop() {
        let registry = PreviewRegistry::new();
        let handle = PreviewHandle::DataUrl("data:image/png;base64,".into());
        assert!(!registry.release(&handle));
        assert_eq!(registry.released_count(), 0);
    }

    #[test]
    fn test_release_all_counts_live_only() {
        let registry = PreviewRegistry::new();
        let a = PreviewHandle::object("a");
        let b = PreviewHandle::object("b");
        registry.register(a.as_str(), Bytes::from_static(b"a"));
        registry.register(b.as_str(), Bytes::from_static(b"b"));
        registry.release(&a);

        assert_eq!(registry.release_all(), 1);
        assert_eq!(registry.released_count(), 2);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.release_all(), 0);
    }
}
