//! Mirror run statistics.

use std::time::{Duration, Instant};

/// Statistics for a single fetched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// Bytes reported received when the download completed.
    pub size: u64,
    /// Time from opening the viewer tab to completion.
    pub elapsed: Duration,
}

impl FileStats {
    /// Returns the average download speed in bytes per second.
    #[must_use]
    pub fn average_speed(&self) -> u64 {
        average_speed(self.size, self.elapsed)
    }
}

/// Statistics for a whole mirror run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStats {
    /// Folder pages visited.
    pub folders_visited: usize,
    /// Files fetched during this run.
    pub files_downloaded: usize,
    /// Files already present locally.
    pub files_skipped: usize,
    /// Listed items that were neither folders nor files.
    pub entries_ignored: usize,
    /// Total bytes fetched.
    pub total_bytes: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl MirrorStats {
    /// Returns the average download speed in bytes per second.
    #[must_use]
    pub fn average_speed(&self) -> u64 {
        average_speed(self.total_bytes, self.elapsed)
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn average_speed(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 / secs) as u64
    } else {
        0
    }
}

/// Accumulates statistics while a run progresses.
pub struct MirrorStatsBuilder {
    stats: MirrorStats,
    start_time: Instant,
}

impl Default for MirrorStatsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MirrorStatsBuilder {
    /// Creates a builder; the run clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stats: MirrorStats::default(),
            start_time: Instant::now(),
        }
    }

    pub const fn add_folder(&mut self) {
        self.stats.folders_visited += 1;
    }

    pub const fn add_skipped(&mut self) {
        self.stats.files_skipped += 1;
    }

    pub const fn add_ignored(&mut self) {
        self.stats.entries_ignored += 1;
    }

    /// Records a completed file download.
    pub const fn add_download(&mut self, file_stats: &FileStats) {
        self.stats.files_downloaded += 1;
        self.stats.total_bytes += file_stats.size;
    }

    /// Builds the final statistics.
    #[must_use]
    pub fn build(self) -> MirrorStats {
        MirrorStats {
            elapsed: self.start_time.elapsed(),
            ..self.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_stats_default() {
        let stats = MirrorStats::default();
        assert_eq!(stats.folders_visited, 0);
        assert_eq!(stats.files_downloaded, 0);
        assert_eq!(stats.total_bytes, 0);
    }

    #[test]
    fn average_speed_zero_elapsed() {
        let stats = MirrorStats {
            total_bytes: 1000,
            ..MirrorStats::default()
        };
        assert_eq!(stats.average_speed(), 0);
    }

    #[test]
    fn file_average_speed() {
        let stats = FileStats {
            size: 1000,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(stats.average_speed(), 500);
    }

    #[test]
    fn builder_accumulates() {
        let mut builder = MirrorStatsBuilder::new();
        builder.add_folder();
        builder.add_folder();
        builder.add_skipped();
        builder.add_ignored();
        builder.add_download(&FileStats {
            size: 500,
            elapsed: Duration::from_secs(1),
        });
        builder.add_download(&FileStats {
            size: 250,
            elapsed: Duration::from_secs(1),
        });

        let stats = builder.build();
        assert_eq!(stats.folders_visited, 2);
        assert_eq!(stats.files_downloaded, 2);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.entries_ignored, 1);
        assert_eq!(stats.total_bytes, 750);
    }
}
