//! Upload progress reporting.
//!
//! The file is handed to the HTTP client as a stream of chunks; each chunk
//! pulled by the transport advances a [`ProgressTracker`].

use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::ProgressFn;

/// Chunk size of the streamed request body.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Converts bytes sent into whole percentages and forwards each new, higher
/// value to the callback.
pub struct ProgressTracker {
    total: u64,
    sent: u64,
    last: Option<u8>,
    on_progress: ProgressFn,
}

impl ProgressTracker {
    pub fn new(total: u64, on_progress: ProgressFn) -> Self {
        Self {
            total,
            sent: 0,
            last: None,
            on_progress,
        }
    }

    pub fn advance(&mut self, bytes: usize) {
        self.sent = (self.sent + bytes as u64).min(self.total);

        let percentage = if self.total == 0 {
            100
        } else {
            ((self.sent as f64 / self.total as f64) * 100.0).round() as u8
        };

        if self.last.map_or(true, |last| percentage > last) {
            self.last = Some(percentage);
            (self.on_progress)(percentage);
        }
    }
}

/// Request body that reports progress as the transport consumes it.
pub fn progress_body(data: Bytes, on_progress: ProgressFn) -> reqwest::Body {
    let total = data.len();
    let mut tracker = ProgressTracker::new(total as u64, on_progress);

    let chunks: Vec<Bytes> = (0..total)
        .step_by(CHUNK_SIZE)
        .map(|start| data.slice(start..(start + CHUNK_SIZE).min(total)))
        .collect();

    let body = stream::iter(chunks).map(move |chunk| {
        tracker.advance(chunk.len());
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(body)
}
