//! Aggregate state derived from the tracked images.

use imgdrop_core::{ImageStatus, TrackedImage};

/// Snapshot of derived values, recomputed after every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub total: usize,
    pub pending: usize,
    /// Uploading or retrying
    pub in_progress: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub overall_progress: u8,
    /// A transfer is in flight.
    pub is_uploading: bool,
}

impl UploadSummary {
    pub fn from_images(images: &[TrackedImage], transfers_in_flight: usize) -> Self {
        let count = |status: ImageStatus| images.iter().filter(|i| i.status == status).count();

        Self {
            total: images.len(),
            pending: count(ImageStatus::Pending),
            in_progress: count(ImageStatus::Uploading) + count(ImageStatus::Retrying),
            succeeded: count(ImageStatus::Success),
            failed: count(ImageStatus::Error),
            overall_progress: overall_progress(images),
            is_uploading: transfers_in_flight > 0,
        }
    }
}

/// Mean progress over all images: 100 for success, 0 for pending or error,
/// live progress otherwise. Rounded; 0 when nothing is tracked.
pub fn overall_progress(images: &[TrackedImage]) -> u8 {
    if images.is_empty() {
        return 0;
    }

    let total: u32 = images.iter().map(TrackedImage::progress_weight).sum();
    (f64::from(total) / images.len() as f64).round() as u8
}
