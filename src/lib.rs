//! drive-mirror - mirror a browser-only cloud drive folder tree to disk.
//!
//! The remote drive is only reachable through its rendered web UI, so the
//! library drives a real browser: it walks folders depth first, derives each
//! folder's local path from the UI breadcrumb, and triggers the native
//! download of every file that is not already on disk.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use drive_mirror::{AppConfig, ChromeSession, Mirror, NoProgress};
//!
//! # async fn example() -> drive_mirror::Result<()> {
//! let config = AppConfig::load(None)?;
//! let session = ChromeSession::launch(&config.browser).await?;
//! let mirror = Mirror::new(session, config, Arc::new(NoProgress))?;
//!
//! // Walks the tree, then closes the browser even if the walk failed.
//! let stats = mirror.run("https://example.feishu.cn/drive/folder/abc").await?;
//! println!("Downloaded {} files", stats.files_downloaded);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod fs;
pub mod mirror;
pub mod path;
pub mod progress;
pub mod session;
pub mod stats;
pub mod tracker;
pub mod walk;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::{AppConfig, BrowserConfig, DownloadConfig, SelectorConfig};
pub use error::{Error, Result};
pub use extract::{ChildEntry, EntryKind, FolderPage, PageExtractor};
pub use fetch::DownloadTarget;
pub use format::{format_bytes, format_duration};
pub use fs::{FileSystem, TokioFileSystem};
pub use mirror::Mirror;
pub use progress::{MirrorProgress, NoProgress};
pub use session::{ChromeSession, Session, Tab};
pub use stats::{FileStats, MirrorStats};
pub use tracker::{DownloadEvent, DownloadState, DownloadTracker};
pub use walk::FolderNode;
