//! Error types for the drive-mirror library.

use std::time::Duration;

use thiserror::Error;

use crate::tracker::DownloadState;

/// Errors that can occur while mirroring a remote folder tree.
#[derive(Error, Debug)]
pub enum Error {
    /// Command-line input was missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A tab could not load its target URL.
    #[error("Failed to navigate to {url}: {reason}")]
    Navigation {
        /// URL the tab was asked to load.
        url: String,
        /// Underlying browser failure.
        reason: String,
    },

    /// The browser reported the download as canceled.
    #[error("Download of {file_name} ended in state {state}")]
    DownloadCanceled {
        /// Remote label of the file.
        file_name: String,
        /// Terminal state reported by the browser.
        state: DownloadState,
    },

    /// No download progress arrived within the stall timeout.
    #[error("Download of {file_name} stalled: no progress for {after:?}")]
    DownloadStalled {
        /// Remote label of the file.
        file_name: String,
        /// How long the tracker waited for the next event.
        after: Duration,
    },

    /// The download event stream ended without a terminal state.
    #[error("Download events for {file_name} ended before completion")]
    DownloadStreamClosed {
        /// Remote label of the file.
        file_name: String,
    },

    /// The page never reached network idle.
    #[error("Network did not go idle on {url} within {timeout:?}")]
    NetworkIdleTimeout {
        /// URL of the page being stabilized.
        url: String,
        /// Configured idle timeout.
        timeout: Duration,
    },

    /// A rendered folder page had no breadcrumb to derive its path from.
    #[error("No breadcrumb found on folder page {url}")]
    MissingBreadcrumb {
        /// URL of the folder page.
        url: String,
    },

    /// A breadcrumb label or file name cannot be used as a path segment.
    #[error("Unsafe path segment: {segment:?}")]
    UnsafePathSegment {
        /// The offending label.
        segment: String,
    },

    /// A URL could not be parsed or has no usable origin.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A configured CSS selector failed to parse.
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// The browser could not be launched or rejected a request.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Configuration values contradict each other.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the Chrome DevTools connection.
    #[error("DevTools error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// A specialized `Result` type for drive-mirror operations.
pub type Result<T> = std::result::Result<T, Error>;
