//! Browser session seam.
//!
//! The mirror talks to the browser only through [`Session`] and [`Tab`].
//! One session is shared by the whole run and every tab belongs to exactly
//! one folder visit or file fetch.

pub mod chrome;
pub mod download;
pub mod idle;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::tracker::DownloadEvent;

pub use chrome::ChromeSession;

/// A running browser that can open tabs.
#[async_trait]
pub trait Session: Send + Sync {
    /// Tab type handed out by this session.
    type Tab: Tab;

    /// Opens a fresh tab and navigates it to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Navigation`] if the page cannot be loaded.
    async fn open_tab(&self, url: &str) -> Result<Self::Tab>;

    /// Shuts the browser down. Every tab must have been closed and dropped.
    async fn close(self) -> Result<()>;
}

/// One open browser tab.
#[async_trait]
pub trait Tab: Send + Sync {
    /// Waits until no requests have been in flight for `idle_time`.
    ///
    /// Requests count from the moment the tab was opened, not from the call.
    async fn wait_for_network_idle(&self, idle_time: Duration, timeout: Duration) -> Result<()>;

    /// Returns the fully rendered HTML of the page.
    async fn content(&self) -> Result<String>;

    /// Lets downloads proceed into `dir` with progress events enabled.
    async fn set_download_dir(&self, dir: &Path) -> Result<()>;

    /// Subscribes to progress of the next download this tab starts.
    async fn download_events(&self) -> Result<BoxStream<'static, DownloadEvent>>;

    /// Clicks the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Closes the tab.
    async fn close(&self) -> Result<()>;
}
