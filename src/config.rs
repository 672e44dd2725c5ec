//! Configuration for mirror runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where and how downloads are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Local root the remote tree is mirrored under.
    pub dir: PathBuf,
    /// Seconds to wait for the next progress event before failing a file.
    /// Zero waits forever.
    pub stall_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./download"),
            stall_timeout_secs: 300,
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the local download root.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Sets the stall timeout in seconds (0 disables it).
    #[must_use]
    pub const fn with_stall_timeout_secs(mut self, secs: u64) -> Self {
        self.stall_timeout_secs = secs;
        self
    }

    /// Stall timeout, or `None` when disabled.
    #[must_use]
    pub const fn stall_timeout(&self) -> Option<Duration> {
        if self.stall_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.stall_timeout_secs))
        }
    }
}

/// Browser launch and page stabilization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run Chrome without a window.
    pub headless: bool,
    /// Chrome binary to launch instead of the auto-detected one.
    pub executable: Option<PathBuf>,
    /// Fixed delay after navigation before waiting for network idle.
    pub settle_delay_ms: u64,
    /// Quiet period with no requests in flight that counts as idle.
    pub idle_time_ms: u64,
    /// Upper bound on the network-idle wait.
    pub network_idle_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            executable: None,
            settle_delay_ms: 300,
            idle_time_ms: 500,
            network_idle_timeout_secs: 30,
        }
    }
}

impl BrowserConfig {
    /// Sets headless mode.
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Sets the settle delay in milliseconds.
    #[must_use]
    pub const fn with_settle_delay_ms(mut self, ms: u64) -> Self {
        self.settle_delay_ms = ms;
        self
    }

    /// Sets the idle quiet period in milliseconds.
    #[must_use]
    pub const fn with_idle_time_ms(mut self, ms: u64) -> Self {
        self.idle_time_ms = ms;
        self
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub const fn idle_time(&self) -> Duration {
        Duration::from_millis(self.idle_time_ms)
    }

    #[must_use]
    pub const fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    /// Checks that a network-idle wait can ever succeed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the quiet period does not fit in
    /// the idle timeout.
    pub fn validate(&self) -> Result<()> {
        if self.idle_time() > self.network_idle_timeout() {
            return Err(Error::InvalidConfig(format!(
                "browser.idle_time_ms ({}) exceeds browser.network_idle_timeout_secs ({})",
                self.idle_time_ms, self.network_idle_timeout_secs
            )));
        }
        Ok(())
    }
}

/// CSS selectors describing the drive UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// One element per breadcrumb level.
    pub breadcrumb_item: String,
    /// Label inside a breadcrumb item.
    pub breadcrumb_label: String,
    /// Link element of a listed item; its `href` is the item URL.
    pub item_link: String,
    /// Name label inside an item link.
    pub item_name: String,
    /// Button on a file viewer page that starts the download.
    pub download_button: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            breadcrumb_item: ".explorer-path-breadcrumb .explorer-path-breadcrumb-item".to_string(),
            breadcrumb_label: ".explorer-path-breadcrumb-item__link".to_string(),
            item_link: ".file-item-link".to_string(),
            item_name: "span[type='main']".to_string(),
            download_button: ".suite-download-btn".to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub download: DownloadConfig,
    pub browser: BrowserConfig,
    pub selectors: SelectorConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, if the platform has a config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drive-mirror").join("config.toml"))
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the document is not valid.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read if present, otherwise defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(p) => p,
                None => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path)?;
        log::info!("Loaded config from {}", path.display());
        Self::from_toml(&text)
    }
}
