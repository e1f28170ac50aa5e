//! Backoff behaviour of `upload_with_retry`, observed on tokio's paused clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use imgdrop_client::{upload_with_retry, ProgressFn, RemoteUploader};
use imgdrop_core::{RemoteRef, RetryPolicy, SourceFile, UploadError};

/// Replays scripted outcomes and records when each attempt started.
struct ScriptedUploader {
    outcomes: Mutex<VecDeque<Result<(), UploadError>>>,
    attempts: Mutex<Vec<Instant>>,
}

impl ScriptedUploader {
    fn new(outcomes: Vec<Result<(), UploadError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteUploader for ScriptedUploader {
    async fn upload(
        &self,
        file: &SourceFile,
        on_progress: ProgressFn,
    ) -> Result<RemoteRef, UploadError> {
        self.attempts.lock().unwrap().push(Instant::now());
        on_progress(50);

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(UploadError::Network("connection reset".into())));

        outcome.map(|_| {
            on_progress(100);
            RemoteRef {
                secure_url: format!("https://res.example/{}", file.name),
                public_id: file.name.clone(),
                uploaded_at: Utc::now(),
            }
        })
    }
}

fn file() -> SourceFile {
    SourceFile::new("cat.jpg", "image/jpeg", vec![0u8; 32])
}

fn recorder() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let f: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));
    (f, seen)
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_endpoint_makes_three_attempts() {
    let uploader = ScriptedUploader::new(vec![
        Err(UploadError::Network("first".into())),
        Err(UploadError::Network("second".into())),
        Err(UploadError::Network("third".into())),
    ]);
    let (progress, _) = recorder();

    let err = upload_with_retry(&uploader, &file(), progress, &RetryPolicy::default())
        .await
        .unwrap_err();

    assert_eq!(err, UploadError::Network("third".into()));

    let times = uploader.attempt_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_millis(1000));
    assert_eq!(times[2] - times[1], Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_retried_attempt_resets_progress() {
    let uploader = ScriptedUploader::new(vec![Err(UploadError::Timeout), Ok(())]);
    let (progress, seen) = recorder();

    let remote = upload_with_retry(&uploader, &file(), progress, &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(remote.public_id, "cat.jpg");
    assert_eq!(*seen.lock().unwrap(), vec![50, 0, 50, 100]);
}

#[tokio::test(start_paused = true)]
async fn test_first_success_does_not_wait() {
    let uploader = ScriptedUploader::new(vec![Ok(())]);
    let (progress, seen) = recorder();
    let started = Instant::now();

    upload_with_retry(&uploader, &file(), progress, &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(Instant::now() - started, Duration::ZERO);
    assert_eq!(*seen.lock().unwrap(), vec![50, 100]);
}

#[tokio::test(start_paused = true)]
async fn test_configuration_error_is_not_retried() {
    let uploader = ScriptedUploader::new(vec![Err(UploadError::configuration(
        "Cloud name is not configured.",
    ))]);
    let (progress, _) = recorder();

    let err = upload_with_retry(&uploader, &file(), progress, &RetryPolicy::default())
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Configuration(_)));
    assert_eq!(uploader.attempt_times().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy() {
    let uploader = ScriptedUploader::new(vec![Err(UploadError::Timeout), Ok(())]);
    let (progress, _) = recorder();

    let err = upload_with_retry(&uploader, &file(), progress, &RetryPolicy::no_retry())
        .await
        .unwrap_err();

    assert_eq!(err, UploadError::Timeout);
    assert_eq!(uploader.attempt_times().len(), 1);
}
