//! The mirror orchestrator and its shared tab handling.

use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::extract::PageExtractor;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::progress::MirrorProgress;
use crate::session::{Session, Tab};
use crate::stats::MirrorStats;

/// Mirrors a remote folder tree through one browser session.
///
/// The session is owned by the mirror for the whole run, and every folder
/// visit and file fetch goes through it one at a time. Download directories
/// are configured per tab on this shared browser, so overlapping work would
/// race on them.
pub struct Mirror<S: Session, F: FileSystem = TokioFileSystem> {
    pub(crate) session: S,
    pub(crate) fs: F,
    pub(crate) config: AppConfig,
    pub(crate) extractor: PageExtractor,
    pub(crate) progress: Arc<dyn MirrorProgress>,
}

impl<S: Session> Mirror<S, TokioFileSystem> {
    /// Creates a mirror writing through the default file system.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Selector`] if a configured selector is invalid.
    pub fn new(session: S, config: AppConfig, progress: Arc<dyn MirrorProgress>) -> Result<Self> {
        Self::with_fs(session, config, progress, TokioFileSystem)
    }
}

impl<S: Session, F: FileSystem> Mirror<S, F> {
    /// Creates a mirror with a custom file system implementation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Selector`] if a configured selector is invalid
    /// and [`crate::Error::InvalidConfig`] if the idle settings cannot work.
    pub fn with_fs(
        session: S,
        config: AppConfig,
        progress: Arc<dyn MirrorProgress>,
        fs: F,
    ) -> Result<Self> {
        config.browser.validate()?;
        let extractor = PageExtractor::new(&config.selectors)?;
        Ok(Self {
            session,
            fs,
            config,
            extractor,
            progress,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Local directory the remote tree is mirrored under.
    #[must_use]
    pub fn download_root(&self) -> &Path {
        &self.config.download.dir
    }

    /// Walks `root_url`, then closes the session whatever the walk returned.
    ///
    /// # Errors
    ///
    /// Returns the walk's error if it failed, otherwise any failure to close
    /// the session. A close failure after a failed walk is only logged.
    pub async fn run(self, root_url: &str) -> Result<MirrorStats> {
        let result = self.walk(root_url).await;
        let closed = self.session.close().await;
        match (result, closed) {
            (Ok(stats), Ok(())) => Ok(stats),
            (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                log::warn!("Failed to close browser after error: {close_err}");
                Err(e)
            }
        }
    }

    /// Waits for a freshly navigated tab to finish rendering.
    pub(crate) async fn settle(&self, tab: &S::Tab) -> Result<()> {
        let browser = &self.config.browser;
        tokio::time::sleep(browser.settle_delay()).await;
        tab.wait_for_network_idle(browser.idle_time(), browser.network_idle_timeout())
            .await
    }
}

/// Closes `tab` and passes `result` through.
///
/// The tab is closed whatever `result` holds. If both the work and the close
/// failed, the work's error is returned and the close failure is logged.
pub(crate) async fn close_tab<T, Tb: Tab>(tab: &Tb, result: Result<T>) -> Result<T> {
    let closed = tab.close().await;
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            log::warn!("Failed to close tab after error: {close_err}");
            Err(e)
        }
    }
}
