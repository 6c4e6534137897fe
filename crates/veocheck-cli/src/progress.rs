//! Progress bar implementation for batch validation.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use std::path::Path;
use veocheck_core::BatchProgress;
use veocheck_core::PackageReport;

/// CLI progress bar wrapper implementing `BatchProgress`.
///
/// Displays one tick per package with the archive being processed when
/// running in a TTY. Automatically cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
    failed: usize,
}

impl CliProgress {
    /// Creates a new CLI progress bar.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of packages in the batch
    /// * `message` - Prefix to display (e.g., "Validating")
    #[must_use]
    pub fn new(total: usize, message: &str) -> Self {
        let bar = ProgressBar::new(total as u64);

        // Template: "Validating [████████░░░░] 3/8 packages (12s) 1 failed, R-4.veo.zip"
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} packages ({elapsed}) {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );

        bar.set_prefix(message.to_string());
        bar.set_message("0 failed");

        Self { bar, failed: 0 }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl BatchProgress for CliProgress {
    fn on_package_start(&mut self, archive: &Path, _total: usize, _current: usize) {
        let name = archive
            .file_name()
            .map_or_else(|| archive.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.bar.set_message(format!("{} failed, {name}", self.failed));
    }

    fn on_package_complete(&mut self, report: &PackageReport) {
        if !report.is_conformant() {
            self.failed += 1;
        }
        self.bar.inc(1);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}
