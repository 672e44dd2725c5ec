//! Fetching a single file through its viewer page.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::Result;
use crate::fs::FileSystem;
use crate::mirror::{Mirror, close_tab};
use crate::path::sanitize_segment;
use crate::session::{Session, Tab};
use crate::stats::FileStats;
use crate::tracker::DownloadTracker;

/// A file to mirror and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Local file name, identical to the remote label.
    pub file_name: String,
    /// Directory under the download root, from the breadcrumb.
    pub relative_dir: PathBuf,
    /// Viewer page of the file.
    pub url: String,
}

impl DownloadTarget {
    /// Creates a target, turning the remote label into a safe file name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsafePathSegment`] if the label cannot be a
    /// file name.
    pub fn new(
        name: &str,
        relative_dir: impl Into<PathBuf>,
        url: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            file_name: sanitize_segment(name)?,
            relative_dir: relative_dir.into(),
            url: url.into(),
        })
    }

    /// Path relative to the download root, used for display.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.relative_dir.join(&self.file_name)
    }

    /// Directory the browser writes the download into.
    #[must_use]
    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_dir)
    }

    /// Final location of the file. The skip check uses exactly this path.
    #[must_use]
    pub fn destination(&self, root: &Path) -> PathBuf {
        self.directory(root).join(&self.file_name)
    }
}

impl<S: Session, F: FileSystem> Mirror<S, F> {
    /// Downloads one file through a fresh viewer tab.
    ///
    /// The tab is closed on every path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Navigation`] if the viewer cannot be opened,
    /// [`crate::Error::DownloadCanceled`] if the browser cancels the
    /// download, and any browser or I/O error along the way.
    pub async fn fetch(&self, target: &DownloadTarget) -> Result<FileStats> {
        let started = Instant::now();
        let relative = target.relative_path();

        let result = match self.session.open_tab(&target.url).await {
            Ok(tab) => {
                let result = self.download(&tab, target, &relative).await;
                close_tab(&tab, result).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(size) => {
                let stats = FileStats {
                    size,
                    elapsed: started.elapsed(),
                };
                log::info!(
                    "Downloaded {} ({size} bytes, {} B/s)",
                    relative.display(),
                    stats.average_speed()
                );
                self.progress.on_file_complete(&relative, &stats);
                Ok(stats)
            }
            Err(e) => {
                log::error!("Download of {} failed: {e}", relative.display());
                self.progress.on_error(&relative, &e.to_string());
                Err(e)
            }
        }
    }

    async fn download(&self, tab: &S::Tab, target: &DownloadTarget, relative: &Path) -> Result<u64> {
        self.settle(tab).await?;

        // The sink must be bound before the click or the download goes nowhere.
        let dir = target.directory(self.download_root());
        self.fs.create_dir_all(&dir).await?;
        tab.set_download_dir(&dir).await?;

        let events = tab.download_events().await?;
        log::info!("Starting download of {}", relative.display());
        self.progress.on_file_start(relative);
        tab.click(&self.config.selectors.download_button).await?;

        DownloadTracker::new(target.file_name.as_str())
            .run(
                events,
                |received, total| self.progress.on_progress(relative, received, total),
                self.config.download.stall_timeout(),
            )
            .await
    }
}
