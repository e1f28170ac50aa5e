//! Shared fixtures for orchestrator tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use imgdrop_client::{ProgressFn, RemoteUploader};
use imgdrop_core::{
    PreviewMode, RemoteRef, RetryPolicy, SourceFile, TrackedImage, UploadError, UploadHooks,
    UploaderConfig,
};
use imgdrop_uploader::ImageUploader;

/// Uploader with per-file scripted outcomes. Unscripted attempts succeed.
///
/// With a gate, every attempt waits for a permit before reporting any
/// progress, so a test can observe state while transfers are in flight.
pub struct MockUploader {
    outcomes: Mutex<HashMap<String, VecDeque<Result<(), UploadError>>>>,
    calls: Mutex<Vec<String>>,
    configured: bool,
    gate: Option<Arc<Semaphore>>,
    started: Arc<Semaphore>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            configured: true,
            gate: None,
            started: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn fail(self, file_name: &str, error: UploadError) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .entry(file_name.to_string())
            .or_default()
            .push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until `n` attempts have started.
    pub async fn wait_started(&self, n: u32) {
        self.started.acquire_many(n).await.unwrap().forget();
    }
}

#[async_trait]
impl RemoteUploader for MockUploader {
    fn ensure_configured(&self) -> Result<(), UploadError> {
        if self.configured {
            Ok(())
        } else {
            Err(UploadError::configuration("Cloud name is not configured."))
        }
    }

    async fn upload(
        &self,
        file: &SourceFile,
        on_progress: ProgressFn,
    ) -> Result<RemoteRef, UploadError> {
        self.calls.lock().unwrap().push(file.name.clone());
        self.started.add_permits(1);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        on_progress(30);

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get_mut(&file.name)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Ok(()));

        outcome?;
        on_progress(100);
        Ok(RemoteRef {
            secure_url: format!("https://res.example/demo/{}", file.name),
            public_id: file.name.trim_end_matches(".png").to_string(),
            uploaded_at: Utc::now(),
        })
    }
}

/// Records every hook invocation.
#[derive(Default)]
pub struct RecordingHooks {
    pub completions: Mutex<Vec<Vec<TrackedImage>>>,
    pub errors: Mutex<Vec<UploadError>>,
}

impl RecordingHooks {
    pub fn completions(&self) -> Vec<Vec<TrackedImage>> {
        self.completions.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<UploadError> {
        self.errors.lock().unwrap().clone()
    }
}

impl UploadHooks for RecordingHooks {
    fn on_upload_complete(&self, images: &[TrackedImage]) {
        self.completions.lock().unwrap().push(images.to_vec());
    }

    fn on_upload_error(&self, error: &UploadError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

pub fn png(name: &str) -> SourceFile {
    SourceFile::new(format!("{}.png", name), "image/png", vec![0x89, b'P', b'N', b'G'])
}

pub fn pngs(names: &[&str]) -> Vec<SourceFile> {
    names.iter().map(|n| png(n)).collect()
}

pub fn test_config() -> UploaderConfig {
    UploaderConfig {
        retry: RetryPolicy::no_retry(),
        preview_mode: PreviewMode::Object,
        ..UploaderConfig::default()
    }
}

pub fn uploader_with(
    config: UploaderConfig,
    mock: MockUploader,
) -> (ImageUploader, Arc<MockUploader>, Arc<RecordingHooks>) {
    let mock = Arc::new(mock);
    let hooks = Arc::new(RecordingHooks::default());
    let uploader = ImageUploader::new(config, mock.clone(), hooks.clone()).unwrap();
    (uploader, mock, hooks)
}

pub fn network_error() -> UploadError {
    UploadError::Network("connection reset".to_string())
}
