//! Progress bars and summary reporting for CLI runs.

use std::path::Path;
use std::sync::Mutex;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::format::{format_bytes, format_duration, format_megabytes};
use crate::{FileStats, MirrorProgress, MirrorStats};

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Creates a progress bar for a single file download.
pub fn make_progress_bar(path: &Path) -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.cyan/blue}] {percent:>3}% | {msg} | ETA {eta} | {prefix}",
        )
        .expect("progress template is valid")
        .progress_chars("━━╌"),
    );
    bar.set_prefix(path.display().to_string());
    bar
}

/// Terminal reporter: one line per folder, one bar per in-flight download.
pub struct CliProgress {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CliProgress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
        }
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut bar| bar.take())
    }

    /// Clears any bar left behind.
    pub fn finish(&self) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
        let _ = self.multi.clear();
    }
}

impl MirrorProgress for CliProgress {
    fn on_folder(&self, path: &Path, _url: &str) {
        self.println(format!("Parsing folder: {}", style(path.display()).bold()));
    }

    fn on_file_skipped(&self, path: &Path) {
        self.println(format!(
            "  {} {}",
            style("=").dim(),
            style(format!("{} (already present)", path.display())).dim()
        ));
    }

    fn on_file_start(&self, path: &Path) {
        let bar = self.multi.add(make_progress_bar(path));
        bar.set_message(format!("{} / ?", format_megabytes(0)));
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(old) = slot.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, _path: &Path, received_bytes: u64, total_bytes: u64) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                if total_bytes > 0 {
                    bar.set_length(total_bytes);
                }
                bar.set_position(received_bytes);
                bar.set_message(format!(
                    "{} / {}",
                    format_megabytes(received_bytes),
                    format_megabytes(total_bytes)
                ));
            }
        }
    }

    fn on_file_complete(&self, path: &Path, stats: &FileStats) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
        self.println(format!(
            "  {} {} ({}, {}/s)",
            style("✓").green(),
            path.display(),
            format_bytes(stats.size),
            format_bytes(stats.average_speed())
        ));
    }

    fn on_error(&self, path: &Path, error: &str) {
        if let Some(bar) = self.take_bar() {
            bar.abandon();
        }
        self.println(format!("  {} {}: {error}", style("✗").red(), path.display()));
    }
}

/// Prints a summary of the run.
pub fn print_summary(stats: &MirrorStats) {
    println!("\n{SEPARATOR}");
    println!("Mirror Summary");
    println!("{SEPARATOR}");
    println!("  Folders visited:   {}", stats.folders_visited);
    println!("  Files downloaded:  {}", stats.files_downloaded);
    if stats.files_downloaded > 0 {
        println!("  Total size:        {}", format_bytes(stats.total_bytes));
        println!(
            "  Average speed:     {}/s",
            format_bytes(stats.average_speed())
        );
    }
    if stats.files_skipped > 0 {
        println!("  Files skipped:     {} (already present)", stats.files_skipped);
    }
    if stats.entries_ignored > 0 {
        println!("  Items ignored:     {}", stats.entries_ignored);
    }
    println!("  Total time:        {}", format_duration(stats.elapsed));
    println!("{SEPARATOR}");
}
