//! Progress observer for mirror runs.

use std::path::Path;

use crate::stats::FileStats;

/// Trait for receiving progress updates while mirroring.
///
/// Paths are relative to the download root. All methods have default no-op
/// implementations.
pub trait MirrorProgress: Send + Sync {
    /// Called when a folder page has been read.
    fn on_folder(&self, _path: &Path, _url: &str) {}

    /// Called when a file already exists locally and is not fetched.
    fn on_file_skipped(&self, _path: &Path) {}

    /// Called right before the download of a file is triggered.
    fn on_file_start(&self, _path: &Path) {}

    /// Called for every progress event of the current download.
    fn on_progress(&self, _path: &Path, _received_bytes: u64, _total_bytes: u64) {}

    /// Called when a file download completes.
    fn on_file_complete(&self, _path: &Path, _stats: &FileStats) {}

    /// Called when a file download fails.
    fn on_error(&self, _path: &Path, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl MirrorProgress for NoProgress {}
