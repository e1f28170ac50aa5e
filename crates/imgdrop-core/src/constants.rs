//! Default limits and endpoint constants.

/// Default maximum number of tracked images.
pub const DEFAULT_MAX_FILES: usize = 10;

/// Default maximum size of a single file: 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Raster image types accepted when nothing else is configured.
pub const DEFAULT_ACCEPTED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Attempts made by the retry wrapper for one upload, first attempt included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit; attempt `n` waits `2^n * DEFAULT_BASE_DELAY_MS` before the next one.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Upper bound on a single upload request (5 minutes for large files).
pub const UPLOAD_TIMEOUT_SECS: u64 = 5 * 60;

/// Image hosting API used when `IMGDROP_API_BASE` is not set.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Scheme prefix of memory-resident preview handles.
pub const OBJECT_PREVIEW_PREFIX: &str = "blob:imgdrop/";
