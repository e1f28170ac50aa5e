//! Caller-facing callbacks
//!
//! The orchestrator reports batch completion and failures through this trait
//! so that the front end (CLI, UI bindings) stays decoupled from it.

use crate::error::UploadError;
use crate::models::TrackedImage;

/// Receives upload outcomes from the orchestrator.
///
/// Methods are called outside the orchestrator's state lock, so an
/// implementation may call back into the orchestrator.
pub trait UploadHooks: Send + Sync {
    /// Called once per completed trigger, retry-all, or a retry that finished
    /// the batch, with the full current snapshot.
    fn on_upload_complete(&self, images: &[TrackedImage]);

    /// Called on validation failure, configuration failure, or a single
    /// retry's terminal failure.
    fn on_upload_error(&self, error: &UploadError);
}

/// No-op implementation for callers that only poll state
pub struct NoOpHooks;

impl UploadHooks for NoOpHooks {
    fn on_upload_complete(&self, _images: &[TrackedImage]) {}

    fn on_upload_error(&self, _error: &UploadError) {}
}

type CompleteFn = Box<dyn Fn(&[TrackedImage]) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&UploadError) + Send + Sync>;

/// Closure-backed hooks. Unset callbacks do nothing.
#[derive(Default)]
pub struct FnHooks {
    on_complete: Option<CompleteFn>,
    on_error: Option<ErrorFn>,
}

impl FnHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_complete(mut self, f: impl Fn(&[TrackedImage]) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&UploadError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl UploadHooks for FnHooks {
    fn on_upload_complete(&self, images: &[TrackedImage]) {
        if let Some(f) = &self.on_complete {
            f(images);
        }
    }

    fn on_upload_error(&self, error: &UploadError) {
        if let Some(f) = &self.on_error {
            f(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fn_hooks_forward_to_closures() {
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let hooks = FnHooks::new().on_error(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        hooks.on_upload_error(&UploadError::Timeout);
        hooks.on_upload_complete(&[]);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_op_hooks_are_object_safe() {
        let hooks: Box<dyn UploadHooks> = Box::new(NoOpHooks);
        hooks.on_upload_complete(&[]);
        hooks.on_upload_error(&UploadError::Timeout);
    }
}
