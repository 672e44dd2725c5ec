//! Network-idle detection.
//!
//! A [`NetworkMonitor`] is attached to a tab before it navigates and keeps
//! counting in-flight requests for the tab's whole life. Waiting for idle then
//! sees requests that started long before the wait began.

use std::collections::HashSet;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A request starting or ending on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkActivity {
    Started(String),
    Finished(String),
}

/// Background counter of a page's in-flight requests.
#[derive(Debug)]
pub struct NetworkMonitor {
    in_flight: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl NetworkMonitor {
    /// Starts counting requests reported by `activity`.
    pub fn spawn<S>(activity: S) -> Self
    where
        S: Stream<Item = NetworkActivity> + Send + Unpin + 'static,
    {
        let (tx, in_flight) = watch::channel(0);
        let task = tokio::spawn(track(activity, tx));
        Self { in_flight, task }
    }

    /// Requests currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Waits until no request has been in flight for a full `idle_time`.
    ///
    /// Any request starting during the quiet period restarts it. Returns
    /// `false` if the page does not go quiet within `timeout`. Once the
    /// activity stream has ended the page counts as idle.
    pub async fn wait_for_idle(&self, idle_time: Duration, timeout: Duration) -> bool {
        let mut in_flight = self.in_flight.clone();
        let quiet = async move {
            loop {
                let drained = in_flight.wait_for(|n| *n == 0).await.is_ok();
                if !drained {
                    return;
                }
                match tokio::time::timeout(idle_time, in_flight.changed()).await {
                    Err(_) | Ok(Err(_)) => return,
                    Ok(Ok(())) => {}
                }
            }
        };
        tokio::time::timeout(timeout, quiet).await.is_ok()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn track<S>(mut activity: S, tx: watch::Sender<usize>)
where
    S: Stream<Item = NetworkActivity> + Unpin,
{
    let mut pending: HashSet<String> = HashSet::new();
    while let Some(event) = activity.next().await {
        match event {
            NetworkActivity::Started(id) => {
                pending.insert(id);
            }
            NetworkActivity::Finished(id) => {
                pending.remove(&id);
            }
        }
        tx.send_replace(pending.len());
    }
}
