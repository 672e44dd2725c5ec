//! Download completion tracking.
//!
//! The browser reports a triggered download as a stream of progress events.
//! [`DownloadTracker`] folds that stream into exactly one outcome: the file
//! completed, or the browser canceled it.

use std::fmt;
use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::error::{Error, Result};

/// Lifecycle of a single browser download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Triggered, no progress reported yet.
    Pending,
    /// Bytes are arriving.
    InProgress,
    /// Finished successfully.
    Completed,
    /// The browser gave up on the download.
    Canceled,
}

impl DownloadState {
    /// Returns true for `Completed` and `Canceled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// A progress notification from the browser's download subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent {
    /// Bytes received so far out of the expected total (0 if unknown).
    InProgress {
        received_bytes: u64,
        total_bytes: u64,
    },
    /// The download finished.
    Completed,
    /// The download was canceled.
    Canceled,
}

/// Effect of feeding one event into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Progress advanced; report these values.
    Progress {
        received_bytes: u64,
        total_bytes: u64,
    },
    /// A terminal state was reached.
    Finished(DownloadState),
    /// The event arrived after the terminal state and was dropped.
    Ignored,
}

/// State machine for one in-flight download.
#[derive(Debug)]
pub struct DownloadTracker {
    file_name: String,
    state: DownloadState,
    received_bytes: u64,
    total_bytes: u64,
}

impl DownloadTracker {
    /// Creates a tracker in the `Pending` state.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            state: DownloadState::Pending,
            received_bytes: 0,
            total_bytes: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> DownloadState {
        self.state
    }

    /// Highest byte count observed so far.
    #[must_use]
    pub const fn received_bytes(&self) -> u64 {
        self.received_bytes
    }

    /// Expected size, or 0 while unknown.
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Applies one event.
    ///
    /// Only the first terminal event takes effect. Anything arriving after it
    /// is logged and ignored.
    pub fn apply(&mut self, event: DownloadEvent) -> Step {
        if self.state.is_terminal() {
            log::warn!(
                "Ignoring {event:?} for {} after terminal state {}",
                self.file_name,
                self.state
            );
            return Step::Ignored;
        }

        match event {
            DownloadEvent::InProgress {
                received_bytes,
                total_bytes,
            } => {
                if self.state == DownloadState::Pending {
                    self.state = DownloadState::InProgress;
                    self.total_bytes = total_bytes;
                } else if self.total_bytes == 0 {
                    self.total_bytes = total_bytes;
                }
                // Out-of-order reports never move the counter backwards.
                self.received_bytes = self.received_bytes.max(received_bytes);
                Step::Progress {
                    received_bytes: self.received_bytes,
                    total_bytes: self.total_bytes,
                }
            }
            DownloadEvent::Completed => {
                self.state = DownloadState::Completed;
                Step::Finished(self.state)
            }
            DownloadEvent::Canceled => {
                self.state = DownloadState::Canceled;
                Step::Finished(self.state)
            }
        }
    }

    /// Outcome once terminal: bytes received on success, the cancellation otherwise.
    fn outcome(&self) -> Option<Result<u64>> {
        match self.state {
            DownloadState::Completed => Some(Ok(self.received_bytes)),
            DownloadState::Canceled => Some(Err(Error::DownloadCanceled {
                file_name: self.file_name.clone(),
                state: self.state,
            })),
            DownloadState::Pending | DownloadState::InProgress => None,
        }
    }

    /// Consumes events until a terminal state and returns its outcome.
    ///
    /// `report` receives `(received_bytes, total_bytes)` for every progress
    /// event and is never called after the terminal event. With a
    /// `stall_timeout`, waiting longer than that for the next event fails
    /// with [`Error::DownloadStalled`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DownloadCanceled`] if the browser cancels the
    /// download, [`Error::DownloadStalled`] on a stall, and
    /// [`Error::DownloadStreamClosed`] if events stop before a terminal state.
    pub async fn run<S, R>(
        mut self,
        mut events: S,
        mut report: R,
        stall_timeout: Option<Duration>,
    ) -> Result<u64>
    where
        S: Stream<Item = DownloadEvent> + Unpin,
        R: FnMut(u64, u64),
    {
        loop {
            let next = match stall_timeout {
                Some(limit) => tokio::time::timeout(limit, events.next())
                    .await
                    .map_err(|_| Error::DownloadStalled {
                        file_name: self.file_name.clone(),
                        after: limit,
                    })?,
                None => events.next().await,
            };

            let Some(event) = next else {
                return Err(Error::DownloadStreamClosed {
                    file_name: self.file_name,
                });
            };

            match self.apply(event) {
                Step::Progress {
                    received_bytes,
                    total_bytes,
                } => report(received_bytes, total_bytes),
                Step::Finished(state) => {
                    log::debug!("Download of {} reached {state}", self.file_name);
                    if let Some(outcome) = self.outcome() {
                        return outcome;
                    }
                }
                Step::Ignored => {}
            }
        }
    }
}
