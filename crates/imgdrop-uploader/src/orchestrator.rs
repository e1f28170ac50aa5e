//! Upload orchestrator.
//!
//! Shared state is the tracked collection plus the set of ids with a transfer
//! in flight, behind one mutex. Every read-modify-write happens inside a single
//! lock scope with no await in it, and hooks are invoked after the lock is
//! dropped. Concurrent uploads are joined with "settle all": each outcome is
//! applied to its own image and one failure never affects another image.
//!
//! There is no cancellation. Removing an image while its upload is in flight
//! lets the transfer finish; its result is then discarded.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

use imgdrop_client::{upload_with_retry, ProgressFn, RemoteUploader};
use imgdrop_core::{
    FileValidator, ImageStatus, RemoteRef, SourceFile, TrackedImage, UploadError, UploadHooks,
    UploaderConfig,
};

use crate::preview::{generate_id, PreviewGenerator};
use crate::resources::PreviewRegistry;
use crate::summary::{overall_progress, UploadSummary};

type UploadOutcome = (String, Result<RemoteRef, UploadError>);

#[derive(Default)]
struct State {
    images: Vec<TrackedImage>,
    in_flight: HashSet<String>,
}

impl State {
    fn find_mut(&mut self, id: &str) -> Option<&mut TrackedImage> {
        self.images.iter_mut().find(|img| img.id == id)
    }

    fn summary(&self) -> UploadSummary {
        UploadSummary::from_images(&self.images, self.in_flight.len())
    }

    /// Apply a settled upload to its image. Returns false when the result is
    /// stale (image removed, or no longer waiting on this transfer).
    fn settle(&mut self, id: &str, result: &Result<RemoteRef, UploadError>) -> bool {
        if !self.in_flight.remove(id) {
            tracing::debug!(image_id = %id, "Discarding upload result for removed image");
            return false;
        }

        let Some(image) = self.find_mut(id) else {
            tracing::debug!(image_id = %id, "Discarding upload result for removed image");
            return false;
        };

        match result {
            Ok(remote) => {
                tracing::debug!(image_id = %id, public_id = %remote.public_id, "Image uploaded");
                image.mark_success(remote.clone());
            }
            Err(e) => image.mark_failed(e),
        }
        true
    }
}

struct Inner {
    config: UploaderConfig,
    validator: FileValidator,
    previews: PreviewGenerator,
    registry: PreviewRegistry,
    uploader: Arc<dyn RemoteUploader>,
    hooks: Arc<dyn UploadHooks>,
    state: Mutex<State>,
    summary_tx: watch::Sender<UploadSummary>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &State) {
        self.summary_tx.send_replace(state.summary());
    }

    fn release_all(&self, state: &mut State) -> usize {
        let removed = state.images.len();
        for image in state.images.drain(..) {
            self.registry.release(&image.preview);
        }
        state.in_flight.clear();
        removed
    }

    fn apply_progress(&self, id: &str, progress: u8) {
        let mut state = self.state();
        if !state.in_flight.contains(id) {
            return;
        }
        if let Some(image) = state.find_mut(id) {
            if matches!(image.status, ImageStatus::Uploading | ImageStatus::Retrying) {
                image.set_progress(progress);
            }
        }
        self.publish(&state);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let released = self.registry.release_all();
        if released > 0 {
            tracing::debug!(released = released, "Uploader dropped, previews released");
        }
    }
}

/// Tracks user-selected images and uploads them.
///
/// Cheap to clone; clones share the same collection.
#[derive(Clone)]
pub struct ImageUploader {
    inner: Arc<Inner>,
}

impl ImageUploader {
    pub fn new(
        config: UploaderConfig,
        uploader: Arc<dyn RemoteUploader>,
        hooks: Arc<dyn UploadHooks>,
    ) -> Result<Self, UploadError> {
        config.validate()?;

        let registry = PreviewRegistry::new();
        let (summary_tx, _) = watch::channel(UploadSummary::default());

        Ok(Self {
            inner: Arc::new(Inner {
                validator: FileValidator::from_config(&config),
                previews: PreviewGenerator::new(config.preview_mode, registry.clone()),
                registry,
                uploader,
                hooks,
                state: Mutex::new(State::default()),
                summary_tx,
                config,
            }),
        })
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &PreviewRegistry {
        &self.inner.registry
    }

    /// Snapshot of all tracked images, in arrival order.
    pub fn images(&self) -> Vec<TrackedImage> {
        self.inner.state().images.clone()
    }

    pub fn get(&self, id: &str) -> Option<TrackedImage> {
        self.inner.state().images.iter().find(|i| i.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.state().images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overall_progress(&self) -> u8 {
        overall_progress(&self.inner.state().images)
    }

    pub fn is_uploading(&self) -> bool {
        !self.inner.state().in_flight.is_empty()
    }

    pub fn summary(&self) -> UploadSummary {
        self.inner.state().summary()
    }

    /// Receive a fresh [`UploadSummary`] after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<UploadSummary> {
        self.inner.summary_tx.subscribe()
    }

    /// Validate a batch, generate previews for it concurrently, then append
    /// the new images as `pending`, truncating the collection to `max_files`.
    ///
    /// Nothing is added if validation or any preview fails. Returns the ids of
    /// the images that were added.
    pub async fn intake(&self, files: Vec<SourceFile>) -> Result<Vec<String>, UploadError> {
        let multiple = self.inner.config.multiple;
        let batch: Vec<SourceFile> = if multiple {
            files
        } else {
            files.into_iter().take(1).collect()
        };

        if let Err(e) = self.inner.validator.validate_batch(&batch) {
            tracing::warn!(error = %e, files = batch.len(), "Rejected file batch");
            let error = UploadError::from(e);
            self.inner.hooks.on_upload_error(&error);
            return Err(error);
        }

        let previews = join_all(batch.iter().map(|file| async move {
            let id = generate_id();
            let preview = self.inner.previews.generate(&id, file).await;
            (id, preview)
        }))
        .await;

        let mut ready = Vec::with_capacity(batch.len());
        let mut first_error = None;
        for ((id, preview), file) in previews.into_iter().zip(batch) {
            match preview {
                Ok(handle) => ready.push(TrackedImage::new(id, file, handle)),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        if let Some(e) = first_error {
            for image in &ready {
                self.inner.registry.release(&image.preview);
            }
            tracing::warn!(error = %e, "Preview generation failed, batch rejected");
            return Err(e.into());
        }

        let mut state = self.inner.state();
        if !multiple {
            let replaced = self.inner.release_all(&mut state);
            if replaced > 0 {
                tracing::debug!(replaced = replaced, "Single-file mode, replacing images");
            }
        }

        let room = self.inner.config.max_files.saturating_sub(state.images.len());
        let mut added = Vec::new();
        for image in ready {
            if added.len() < room {
                added.push(image.id.clone());
                state.images.push(image);
            } else {
                self.inner.registry.release(&image.preview);
            }
        }
        self.inner.publish(&state);

        tracing::debug!(
            added = added.len(),
            total = state.images.len(),
            "Images added"
        );
        Ok(added)
    }

    /// Remove one image, releasing its preview. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let mut state = self.inner.state();
        let Some(position) = state.images.iter().position(|img| img.id == id) else {
            return false;
        };

        let image = state.images.remove(position);
        state.in_flight.remove(id);
        self.inner.registry.release(&image.preview);
        self.inner.publish(&state);
        true
    }

    /// Remove every image. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut state = self.inner.state();
        let removed = self.inner.release_all(&mut state);
        self.inner.publish(&state);
        removed
    }

    /// Remove only successfully uploaded images. Returns how many were removed.
    pub fn clear_successful(&self) -> usize {
        let mut state = self.inner.state();
        let (done, keep): (Vec<_>, Vec<_>) = state
            .images
            .drain(..)
            .partition(|img| img.status == ImageStatus::Success);

        for image in &done {
            self.inner.registry.release(&image.preview);
        }
        state.images = keep;
        self.inner.publish(&state);
        done.len()
    }

    /// Drop every image and release every preview still held.
    pub fn shutdown(&self) {
        let mut state = self.inner.state();
        let removed = self.inner.release_all(&mut state);
        self.inner.registry.release_all();
        self.inner.publish(&state);
        tracing::info!(removed = removed, "Uploader shut down");
    }

    fn progress_callback(&self, id: &str) -> ProgressFn {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let id = id.to_string();
        Arc::new(move |progress| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_progress(&id, progress);
            }
        })
    }

    async fn upload_one(&self, id: String, file: SourceFile) -> UploadOutcome {
        let progress = self.progress_callback(&id);
        let result = upload_with_retry(
            self.inner.uploader.as_ref(),
            &file,
            progress,
            &self.inner.config.retry,
        )
        .await;
        (id, result)
    }

    /// Select images matching `select` that have no transfer in flight, apply
    /// `mark` to each and register their transfers, all in one step. Returns
    /// no jobs when nothing qualifies. A missing endpoint configuration is
    /// reported before any image is touched.
    fn begin_batch(
        &self,
        select: impl Fn(&TrackedImage) -> bool,
        mark: impl Fn(&mut TrackedImage),
    ) -> Result<Vec<(String, SourceFile)>, UploadError> {
        let mut state = self.inner.state();
        let State { images, in_flight } = &mut *state;

        let selected: Vec<usize> = images
            .iter()
            .enumerate()
            .filter(|&(_, img)| select(img) && !in_flight.contains(&img.id))
            .map(|(i, _)| i)
            .collect();

        if selected.is_empty() {
            return Ok(Vec::new());
        }

        if let Err(e) = self.inner.uploader.ensure_configured() {
            drop(state);
            tracing::error!(error = %e, "Upload endpoint is not configured");
            self.inner.hooks.on_upload_error(&e);
            return Err(e);
        }

        let mut jobs = Vec::with_capacity(selected.len());
        for i in selected {
            let image = &mut images[i];
            mark(image);
            in_flight.insert(image.id.clone());
            jobs.push((image.id.clone(), image.file.clone()));
        }

        self.inner.publish(&state);
        Ok(jobs)
    }

    async fn run_batch(&self, jobs: Vec<(String, SourceFile)>) -> Vec<TrackedImage> {
        let outcomes = join_all(
            jobs.into_iter()
                .map(|(id, file)| self.upload_one(id, file)),
        )
        .await;

        let mut state = self.inner.state();
        let mut succeeded = 0;
        let mut failed = 0;
        for (id, result) in &outcomes {
            if state.settle(id, result) {
                match result {
                    Ok(_) => succeeded += 1,
                    Err(_) => failed += 1,
                }
            }
        }
        self.inner.publish(&state);
        let snapshot = state.images.clone();
        drop(state);

        tracing::info!(
            succeeded = succeeded,
            failed = failed,
            "Upload batch finished"
        );
        snapshot
    }

    /// Upload every `pending` or `retrying` image concurrently.
    ///
    /// All selected images are marked `uploading` before the first transfer
    /// starts. When every transfer has settled, the completion hook receives
    /// the full snapshot once. Returns `Ok(None)` when there was nothing to do;
    /// the only error is a missing endpoint configuration.
    pub async fn trigger_upload(&self) -> Result<Option<Vec<TrackedImage>>, UploadError> {
        let jobs = self.begin_batch(TrackedImage::awaiting_trigger, TrackedImage::mark_uploading)?;
        if jobs.is_empty() {
            return Ok(None);
        }

        tracing::info!(count = jobs.len(), "Starting upload batch");
        let snapshot = self.run_batch(jobs).await;
        self.inner.hooks.on_upload_complete(&snapshot);
        Ok(Some(snapshot))
    }

    /// Retry every failed, retryable image concurrently, then call the
    /// completion hook once with the full snapshot.
    pub async fn retry_all_failed(&self) -> Result<Option<Vec<TrackedImage>>, UploadError> {
        let jobs = self.begin_batch(TrackedImage::can_retry, TrackedImage::mark_retrying)?;
        if jobs.is_empty() {
            return Ok(None);
        }

        tracing::info!(count = jobs.len(), "Retrying failed uploads");
        let snapshot = self.run_batch(jobs).await;
        self.inner.hooks.on_upload_complete(&snapshot);
        Ok(Some(snapshot))
    }

    /// Upload one image on its own, outside of any trigger.
    ///
    /// Any retryable image qualifies, so a `pending` one is uploaded directly
    /// as well as a failed one. On success the completion hook fires only if
    /// every image is now terminal. On failure the image is back to a
    /// retryable `error` and the error hook fires. Returns the settled image,
    /// or `None` when the id is unknown, not retryable, already uploading, or
    /// was removed while uploading.
    pub async fn retry_one(&self, id: &str) -> Result<Option<TrackedImage>, UploadError> {
        let jobs = self.begin_batch(
            |img| img.id == id && img.retryable,
            TrackedImage::mark_retrying,
        )?;
        let Some((id, file)) = jobs.into_iter().next() else {
            return Ok(None);
        };

        tracing::info!(image_id = %id, "Retrying upload");
        let (id, result) = self.upload_one(id, file).await;

        let mut state = self.inner.state();
        if !state.settle(&id, &result) {
            self.inner.publish(&state);
            return Ok(None);
        }
        self.inner.publish(&state);

        let image = state.images.iter().find(|img| img.id == id).cloned();
        let finished = state.images.iter().all(TrackedImage::is_terminal);
        let snapshot = finished.then(|| state.images.clone());
        drop(state);

        match result {
            Ok(_) => {
                if let Some(snapshot) = snapshot {
                    self.inner.hooks.on_upload_complete(&snapshot);
                }
            }
            Err(e) => self.inner.hooks.on_upload_error(&e),
        }

        Ok(image)
    }
}
