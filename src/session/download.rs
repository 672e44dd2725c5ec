//! Picking one tab's download out of the browser-wide download events.
//!
//! Chrome reports downloads at the browser level: a `downloadWillBegin`
//! names the frame that started it and assigns a guid, and every
//! `downloadProgress` carries only that guid.

use std::collections::HashMap;

use crate::tracker::DownloadEvent;

/// A browser-wide download notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSignal {
    /// A download was started by `frame_id`.
    Begin { frame_id: String, guid: String },
    /// Progress of the download `guid`.
    Progress { guid: String, event: DownloadEvent },
}

/// Follows the first download started by one frame.
///
/// Progress for a guid that has not been announced yet is held back, because
/// the two event kinds arrive on separate subscriptions and may interleave.
#[derive(Debug)]
pub struct DownloadFilter {
    frame_id: Option<String>,
    guid: Option<String>,
    early: HashMap<String, Vec<DownloadEvent>>,
}

impl DownloadFilter {
    /// Filters for `frame_id`, or for whichever frame starts a download first
    /// when the tab's frame is unknown.
    #[must_use]
    pub fn new(frame_id: Option<String>) -> Self {
        Self {
            frame_id,
            guid: None,
            early: HashMap::new(),
        }
    }

    /// Feeds one signal and returns the events that belong to this tab.
    pub fn accept(&mut self, signal: DownloadSignal) -> Vec<DownloadEvent> {
        match signal {
            DownloadSignal::Begin { frame_id, guid } => {
                if self.guid.is_some() {
                    return Vec::new();
                }
                if self.frame_id.as_ref().is_some_and(|own| *own != frame_id) {
                    self.early.remove(&guid);
                    return Vec::new();
                }
                log::debug!("Following download {guid} from frame {frame_id}");
                let held = self.early.remove(&guid).unwrap_or_default();
                self.early.clear();
                self.guid = Some(guid);
                held
            }
            DownloadSignal::Progress { guid, event } => match &self.guid {
                Some(own) if *own == guid => vec![event],
                Some(_) => Vec::new(),
                None => {
                    self.early.entry(guid).or_default().push(event);
                    Vec::new()
                }
            },
        }
    }
}
