//! Chrome DevTools implementation of the session seam.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::error::CdpError;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, future};
use tokio::task::JoinHandle;

use super::download::{DownloadFilter, DownloadSignal};
use super::idle::{NetworkActivity, NetworkMonitor};
use super::{Session, Tab};
use crate::config::BrowserConfig;
use crate::error::{Error, Result};
use crate::tracker::DownloadEvent;

/// A launched Chrome instance and the task pumping its DevTools connection.
pub struct ChromeSession {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launches Chrome.
    ///
    /// # Errors
    ///
    /// Returns an error if the launch configuration is rejected or Chrome
    /// fails to start.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref exe) = config.executable {
            builder = builder.chrome_executable(exe);
        }
        let chrome_config = builder.build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(chrome_config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    log::debug!("DevTools handler stopped: {e}");
                    break;
                }
            }
        });

        log::info!("Browser launched (headless: {})", config.headless);
        Ok(Self {
            browser: Arc::new(browser),
            handler,
        })
    }
}

/// Subscribes to the page's request lifecycle and starts counting.
async fn monitor_network(page: &Page) -> Result<NetworkMonitor> {
    let started = page
        .event_listener::<EventRequestWillBeSent>()
        .await?
        .map(|e| NetworkActivity::Started(e.request_id.inner().clone()));
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(|e| NetworkActivity::Finished(e.request_id.inner().clone()));
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await?
        .map(|e| NetworkActivity::Finished(e.request_id.inner().clone()));

    let activity = stream::select_all([started.boxed(), finished.boxed(), failed.boxed()]);
    Ok(NetworkMonitor::spawn(activity))
}

#[async_trait]
impl Session for ChromeSession {
    type Tab = ChromeTab;

    async fn open_tab(&self, url: &str) -> Result<ChromeTab> {
        let navigation_error = |e: CdpError| Error::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(navigation_error)?;

        // Requests of the real page must be counted from its first one on.
        let network = match monitor_network(&page).await {
            Ok(network) => network,
            Err(e) => {
                if let Err(close_err) = page.close().await {
                    log::warn!("Failed to close tab for {url}: {close_err}");
                }
                return Err(e);
            }
        };
        let tab = ChromeTab {
            page,
            browser: Arc::clone(&self.browser),
            network,
            url: url.to_string(),
        };

        if let Err(e) = tab.page.goto(url).await {
            if let Err(close_err) = tab.close().await {
                log::warn!("Failed to close tab for {url}: {close_err}");
            }
            return Err(navigation_error(e));
        }
        log::debug!("Opened tab for {url}");
        Ok(tab)
    }

    async fn close(self) -> Result<()> {
        let Ok(mut browser) = Arc::try_unwrap(self.browser) else {
            return Err(Error::Browser(
                "cannot close the browser while tabs are still open".to_string(),
            ));
        };
        browser.close().await?;
        browser.wait().await?;
        if let Err(e) = self.handler.await {
            log::warn!("DevTools handler task failed: {e}");
        }
        log::info!("Browser closed");
        Ok(())
    }
}

/// A Chrome page and the browser it belongs to.
pub struct ChromeTab {
    page: Page,
    browser: Arc<Browser>,
    network: NetworkMonitor,
    url: String,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_download_event(state: &DownloadProgressState, received: f64, total: f64) -> DownloadEvent {
    match state {
        DownloadProgressState::InProgress => DownloadEvent::InProgress {
            received_bytes: received as u64,
            total_bytes: total as u64,
        },
        DownloadProgressState::Completed => DownloadEvent::Completed,
        DownloadProgressState::Canceled => DownloadEvent::Canceled,
    }
}

#[async_trait]
impl Tab for ChromeTab {
    async fn wait_for_network_idle(&self, idle_time: Duration, timeout: Duration) -> Result<()> {
        if self.network.wait_for_idle(idle_time, timeout).await {
            Ok(())
        } else {
            log::debug!(
                "{} requests still in flight on {}",
                self.network.in_flight(),
                self.url
            );
            Err(Error::NetworkIdleTimeout {
                url: self.url.clone(),
                timeout,
            })
        }
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn set_download_dir(&self, dir: &Path) -> Result<()> {
        let dir = std::path::absolute(dir)?;
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(dir.to_string_lossy())
            .events_enabled(true)
            .build()
            .map_err(Error::Browser)?;
        self.browser.execute(params).await?;
        log::debug!("Download directory for {} set to {}", self.url, dir.display());
        Ok(())
    }

    async fn download_events(&self) -> Result<BoxStream<'static, DownloadEvent>> {
        let frame_id = self.page.mainframe().await?.map(|id| id.inner().clone());
        let begins = self
            .browser
            .event_listener::<EventDownloadWillBegin>()
            .await?
            .map(|e| DownloadSignal::Begin {
                frame_id: e.frame_id.inner().clone(),
                guid: e.guid.clone(),
            });
        let progress = self
            .browser
            .event_listener::<EventDownloadProgress>()
            .await?
            .map(|e| DownloadSignal::Progress {
                guid: e.guid.clone(),
                event: to_download_event(&e.state, e.received_bytes, e.total_bytes),
            });

        let events = stream::select(begins.boxed(), progress.boxed())
            .scan(DownloadFilter::new(frame_id), |filter, signal| {
                future::ready(Some(stream::iter(filter.accept(signal))))
            })
            .flatten();
        Ok(events.boxed())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.page.clone().close().await?;
        log::debug!("Closed tab for {}", self.url);
        Ok(())
    }
}
