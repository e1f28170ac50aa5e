use std::time::Duration;

use imgdrop_core::{RemoteRef, RetryPolicy, SourceFile, UploadError};

use crate::{ProgressFn, RemoteUploader};

/// Upload with exponential backoff.
///
/// Makes at most `policy.max_attempts` attempts. After failed attempt `n`
/// (0-based) it waits `2^n * policy.base_delay`; every retried attempt starts
/// by reporting progress 0. Non-recoverable errors are returned immediately.
/// The last error is returned once attempts are exhausted.
pub async fn upload_with_retry(
    uploader: &dyn RemoteUploader,
    file: &SourceFile,
    on_progress: ProgressFn,
    policy: &RetryPolicy,
) -> Result<RemoteRef, UploadError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            on_progress(0);
        }

        let error = match uploader.upload(file, on_progress.clone()).await {
            Ok(remote) => return Ok(remote),
            Err(e) => e,
        };

        if !error.is_recoverable() || attempt + 1 >= max_attempts {
            tracing::error!(
                file = %file.name,
                attempts = attempt + 1,
                error_code = error.error_code(),
                error = %error,
                "Upload failed"
            );
            return Err(error);
        }

        let delay: Duration = policy.delay_for(attempt);
        tracing::warn!(
            file = %file.name,
            attempt = attempt + 1,
            max_attempts = max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Upload attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
