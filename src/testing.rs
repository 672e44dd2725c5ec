//! In-memory browser and progress fakes for orchestrator tests.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::format::percent;
use crate::mirror::Mirror;
use crate::progress::MirrorProgress;
use crate::session::{Session, Tab};
use crate::stats::FileStats;
use crate::tracker::DownloadEvent;

/// Renders a folder page the default selectors understand.
pub fn folder_html(breadcrumb: &[&str], items: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body><div class=\"explorer-path-breadcrumb\">");
    for label in breadcrumb {
        let _ = write!(
            html,
            "<div class=\"explorer-path-breadcrumb-item\">\
             <a class=\"explorer-path-breadcrumb-item__link\"><span>{label}</span></a></div>"
        );
    }
    html.push_str("</div><ul>");
    for (name, href) in items {
        let _ = write!(
            html,
            "<li><a class=\"file-item-link\" href=\"{href}\"><span type=\"main\">{name}</span></a></li>"
        );
    }
    html.push_str("</ul></body></html>");
    html
}

struct ScriptedDownload {
    file_name: String,
    events: Vec<DownloadEvent>,
}

/// A scripted drive: pages by URL, download event scripts by file URL.
#[derive(Default)]
pub struct FakeDrive {
    pages: HashMap<String, String>,
    downloads: HashMap<String, ScriptedDownload>,
    unreachable: HashSet<String>,
    failing_close: bool,
    failing_shutdown: bool,
    log: Mutex<Vec<String>>,
    open_tabs: AtomicUsize,
    max_open_tabs: AtomicUsize,
}

impl FakeDrive {
    pub fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn download(mut self, url: &str, file_name: &str, events: Vec<DownloadEvent>) -> Self {
        self.downloads.insert(
            url.to_string(),
            ScriptedDownload {
                file_name: file_name.to_string(),
                events,
            },
        );
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.failing_close = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.failing_shutdown = true;
        self
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    /// Everything the fake browser was asked to do, in order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// URLs navigated to, in order.
    pub fn opened(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|l| l.strip_prefix("open ").map(str::to_string))
            .collect()
    }

    pub fn open_tabs(&self) -> usize {
        self.open_tabs.load(Ordering::SeqCst)
    }

    pub fn max_open_tabs(&self) -> usize {
        self.max_open_tabs.load(Ordering::SeqCst)
    }

    /// Whether the session itself was closed.
    pub fn shut_down(&self) -> bool {
        self.log().iter().any(|l| l == "shutdown")
    }
}

/// Session handing out [`FakeTab`]s over a shared [`FakeDrive`].
pub struct FakeSession {
    drive: Arc<FakeDrive>,
}

impl FakeSession {
    pub fn new(drive: FakeDrive) -> Self {
        Self {
            drive: Arc::new(drive),
        }
    }

    pub fn drive(&self) -> Arc<FakeDrive> {
        Arc::clone(&self.drive)
    }
}

#[async_trait]
impl Session for FakeSession {
    type Tab = FakeTab;

    async fn open_tab(&self, url: &str) -> Result<FakeTab> {
        if self.drive.unreachable.contains(url) {
            return Err(Error::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.drive.record(format!("open {url}"));
        let open = self.drive.open_tabs.fetch_add(1, Ordering::SeqCst) + 1;
        self.drive.max_open_tabs.fetch_max(open, Ordering::SeqCst);
        Ok(FakeTab {
            drive: Arc::clone(&self.drive),
            url: url.to_string(),
            download_dir: Mutex::new(None),
        })
    }

    async fn close(self) -> Result<()> {
        self.drive.record("shutdown".to_string());
        if self.drive.failing_shutdown {
            return Err(Error::Browser("browser already gone".to_string()));
        }
        Ok(())
    }
}

pub struct FakeTab {
    drive: Arc<FakeDrive>,
    url: String,
    download_dir: Mutex<Option<PathBuf>>,
}

#[async_trait]
impl Tab for FakeTab {
    async fn wait_for_network_idle(&self, _idle_time: Duration, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self
            .drive
            .pages
            .get(&self.url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn set_download_dir(&self, dir: &Path) -> Result<()> {
        self.drive.record(format!("dir {}", dir.display()));
        *self.download_dir.lock().unwrap() = Some(dir.to_path_buf());
        Ok(())
    }

    async fn download_events(&self) -> Result<BoxStream<'static, DownloadEvent>> {
        let events = self
            .drive
            .downloads
            .get(&self.url)
            .map(|d| d.events.clone())
            .unwrap_or_default();
        Ok(stream::iter(events).boxed())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let Some(download) = self.drive.downloads.get(&self.url) else {
            return Err(Error::Browser(format!("no element matches {selector}")));
        };
        self.drive.record(format!("click {}", self.url));

        if download.events.last() == Some(&DownloadEvent::Completed) {
            let dir = self.download_dir.lock().unwrap().clone();
            let dir = dir.ok_or_else(|| Error::Browser("download sink not configured".to_string()))?;
            std::fs::write(dir.join(&download.file_name), b"mirrored")?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.drive.record(format!("close {}", self.url));
        self.drive.open_tabs.fetch_sub(1, Ordering::SeqCst);
        if self.drive.failing_close {
            return Err(Error::Browser("target closed".to_string()));
        }
        Ok(())
    }
}

/// Progress sink that remembers what it was told.
#[derive(Default)]
pub struct RecordingProgress {
    progress: Mutex<Vec<(u64, u64)>>,
    folders: Mutex<Vec<PathBuf>>,
    skipped: Mutex<Vec<PathBuf>>,
    completed: Mutex<Vec<PathBuf>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn last_percent(&self) -> Option<u64> {
        self.progress
            .lock()
            .unwrap()
            .last()
            .filter(|(_, total)| *total > 0)
            .map(|&(received, total)| percent(received, total))
    }

    pub fn folders(&self) -> Vec<PathBuf> {
        self.folders.lock().unwrap().clone()
    }

    pub fn skipped(&self) -> Vec<PathBuf> {
        self.skipped.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<PathBuf> {
        self.completed.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl MirrorProgress for RecordingProgress {
    fn on_folder(&self, path: &Path, _url: &str) {
        self.folders.lock().unwrap().push(path.to_path_buf());
    }

    fn on_file_skipped(&self, path: &Path) {
        self.skipped.lock().unwrap().push(path.to_path_buf());
    }

    fn on_progress(&self, _path: &Path, received_bytes: u64, total_bytes: u64) {
        self.progress
            .lock()
            .unwrap()
            .push((received_bytes, total_bytes));
    }

    fn on_file_complete(&self, path: &Path, _stats: &FileStats) {
        self.completed.lock().unwrap().push(path.to_path_buf());
    }

    fn on_error(&self, _path: &Path, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

/// Builds a mirror over `drive` that writes under `root` without delays.
pub fn test_mirror(
    drive: FakeDrive,
    root: &Path,
) -> (Mirror<FakeSession>, Arc<FakeDrive>, Arc<RecordingProgress>) {
    let mut config = AppConfig::default();
    config.download = config.download.with_dir(root).with_stall_timeout_secs(1);
    config.browser = config.browser.with_settle_delay_ms(0).with_idle_time_ms(0);

    let session = FakeSession::new(drive);
    let drive = session.drive();
    let progress = Arc::new(RecordingProgress::default());
    let mirror = Mirror::new(session, config, Arc::clone(&progress) as Arc<dyn MirrorProgress>)
        .expect("default selectors are valid");
    (mirror, drive, progress)
}
