//! Depth-first walk over the remote folder tree.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::extract::{ChildEntry, EntryKind};
use crate::fetch::DownloadTarget;
use crate::fs::FileSystem;
use crate::mirror::{Mirror, close_tab};
use crate::path;
use crate::session::{Session, Tab};
use crate::stats::{MirrorStats, MirrorStatsBuilder};

/// A folder page that has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    /// URL the folder was opened at.
    pub url: String,
    /// Breadcrumb labels, root first.
    pub breadcrumb: Vec<String>,
    /// Directory under the download root derived from the breadcrumb.
    pub relative_path: PathBuf,
    /// Listed items in document order.
    pub entries: Vec<ChildEntry>,
}

/// Work waiting on the walk stack.
///
/// Files keep their raw label until popped, so a bad name only fails once
/// every earlier sibling has been handled.
#[derive(Debug)]
enum Pending {
    Folder(String),
    File {
        name: String,
        relative_dir: PathBuf,
        url: String,
    },
}

impl<S: Session, F: FileSystem> Mirror<S, F> {
    /// Mirrors the folder tree rooted at `root_url`.
    ///
    /// Items are handled one at a time, depth first, in the order each folder
    /// lists them. Files that already exist at their destination are skipped,
    /// so an interrupted run can simply be repeated.
    ///
    /// # Errors
    ///
    /// The first error aborts the walk and is returned. Files written before
    /// it stay on disk.
    pub async fn walk(&self, root_url: &str) -> Result<MirrorStats> {
        let mut stats = MirrorStatsBuilder::new();
        let mut stack = vec![Pending::Folder(root_url.to_string())];

        while let Some(next) = stack.pop() {
            match next {
                Pending::Folder(url) => {
                    let node = self.visit_folder(&url).await?;
                    stats.add_folder();
                    self.progress.on_folder(&node.relative_path, &node.url);

                    let children = plan_children(node, &mut stats);
                    // Reversed so the first listed item is popped first.
                    stack.extend(children.into_iter().rev());
                }
                Pending::File {
                    name,
                    relative_dir,
                    url,
                } => {
                    let target = DownloadTarget::new(&name, relative_dir, url)?;
                    let destination = target.destination(self.download_root());
                    if self.fs.file_exists(&destination).await {
                        log::info!("Skipping {}, already present", destination.display());
                        self.progress.on_file_skipped(&target.relative_path());
                        stats.add_skipped();
                    } else {
                        let file_stats = self.fetch(&target).await?;
                        stats.add_download(&file_stats);
                    }
                }
            }
        }

        let stats = stats.build();
        log::info!(
            "Walk of {root_url} finished: {} folders, {} downloaded, {} skipped",
            stats.folders_visited,
            stats.files_downloaded,
            stats.files_skipped
        );
        Ok(stats)
    }

    /// Opens one folder page, waits for it to render and reads it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Navigation`] if the page cannot be opened and
    /// [`Error::MissingBreadcrumb`] if the page shows no breadcrumb.
    pub async fn visit_folder(&self, url: &str) -> Result<FolderNode> {
        let tab = self.session.open_tab(url).await?;
        let result = self.read_folder(&tab, url).await;
        close_tab(&tab, result).await
    }

    async fn read_folder(&self, tab: &S::Tab, url: &str) -> Result<FolderNode> {
        self.settle(tab).await?;
        let html = tab.content().await?;
        let page = self.extractor.extract(&html, url)?;

        if page.breadcrumb.is_empty() {
            return Err(Error::MissingBreadcrumb {
                url: url.to_string(),
            });
        }
        let relative_path = path::resolve(&page.breadcrumb)?;

        log::info!("Parsed folder {} ({} items)", relative_path.display(), page.entries.len());
        if page.entries.is_empty() {
            log::warn!("Folder {} at {url} lists no items", relative_path.display());
        }

        Ok(FolderNode {
            url: url.to_string(),
            breadcrumb: page.breadcrumb,
            relative_path,
            entries: page.entries,
        })
    }
}

/// Turns a folder's entries into walk work, keeping their order.
fn plan_children(node: FolderNode, stats: &mut MirrorStatsBuilder) -> Vec<Pending> {
    let mut children = Vec::with_capacity(node.entries.len());
    for entry in node.entries {
        match entry.kind {
            EntryKind::Folder => children.push(Pending::Folder(entry.url)),
            EntryKind::File => children.push(Pending::File {
                name: entry.name,
                relative_dir: node.relative_path.clone(),
                url: entry.url,
            }),
            EntryKind::Other => {
                log::debug!("Ignoring {} ({})", entry.name, entry.url);
                stats.add_ignored();
            }
        }
    }
    children
}
