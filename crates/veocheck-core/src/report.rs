//! Extraction, package and batch reporting.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::Issue;

/// Report of one archive extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Canonical package root the entries were written under.
    pub root: PathBuf,

    /// Number of files written.
    pub files_extracted: usize,

    /// Number of directories created.
    pub directories_created: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// Duration of the extraction.
    pub duration: Duration,

    /// Non-fatal observations (e.g. a renamed archive).
    pub warnings: Vec<String>,
}

impl ExtractionReport {
    /// Creates an empty report for `root`.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Overall outcome of validating one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageStatus {
    /// Processing aborted; nothing after the failure point was checked.
    Fatal,
    /// At least one error; the package is non-conformant.
    Errors,
    /// Conformant, with warnings.
    Warnings,
    /// Conformant, nothing to report.
    Clean,
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Fatal => "fatal",
            Self::Errors => "errors",
            Self::Warnings => "warnings",
            Self::Clean => "clean",
        };
        f.write_str(s)
    }
}

/// Result of validating one package.
#[derive(Debug, Clone)]
pub struct PackageReport {
    /// Archive that was validated.
    pub archive: PathBuf,

    /// Archive filename without the container extension, if derivable.
    pub canonical_name: Option<String>,

    /// Where the package was extracted (kept only on request).
    pub extraction_root: Option<PathBuf>,

    /// Message of the fatal error that stopped processing, if any.
    pub fatal: Option<String>,

    /// All errors, in ownership-tree order.
    pub errors: Vec<Issue>,

    /// All warnings, in ownership-tree order.
    pub warnings: Vec<Issue>,

    /// Wall-clock processing time.
    pub duration: Duration,
}

impl PackageReport {
    /// Creates an empty report for `archive`.
    #[must_use]
    pub fn new(archive: &Path) -> Self {
        Self {
            archive: archive.to_path_buf(),
            canonical_name: None,
            extraction_root: None,
            fatal: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns the package outcome.
    #[must_use]
    pub fn status(&self) -> PackageStatus {
        if self.fatal.is_some() {
            PackageStatus::Fatal
        } else if !self.errors.is_empty() {
            PackageStatus::Errors
        } else if !self.warnings.is_empty() {
            PackageStatus::Warnings
        } else {
            PackageStatus::Clean
        }
    }

    /// Returns `true` when no fatal error and no error was recorded.
    #[must_use]
    pub fn is_conformant(&self) -> bool {
        matches!(
            self.status(),
            PackageStatus::Warnings | PackageStatus::Clean
        )
    }

    /// Returns `true` if an issue with `code` from `component` was recorded.
    #[must_use]
    pub fn has_issue(&self, component: &str, code: u32) -> bool {
        self.errors
            .iter()
            .chain(&self.warnings)
            .any(|i| i.id.component == component && i.id.code == code)
    }
}

/// Run-wide tally of package outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Packages attempted.
    pub packages: usize,
    /// Packages that failed fatally.
    pub fatal: usize,
    /// Packages with at least one error.
    pub with_errors: usize,
    /// Conformant packages with warnings.
    pub with_warnings: usize,
    /// Packages with nothing to report.
    pub clean: usize,
}

impl BatchSummary {
    /// Records one package outcome.
    pub fn record(&mut self, report: &PackageReport) {
        self.packages += 1;
        match report.status() {
            PackageStatus::Fatal => self.fatal += 1,
            PackageStatus::Errors => self.with_errors += 1,
            PackageStatus::Warnings => self.with_warnings += 1,
            PackageStatus::Clean => self.clean += 1,
        }
    }

    /// Number of conformant packages.
    #[must_use]
    pub fn conformant(&self) -> usize {
        self.with_warnings + self.clean
    }
}

/// Callback trait for progress reporting during a batch run.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use veocheck_core::BatchProgress;
/// use veocheck_core::PackageReport;
///
/// struct Printer;
///
/// impl BatchProgress for Printer {
///     fn on_package_start(&mut self, archive: &Path, total: usize, current: usize) {
///         println!("[{current}/{total}] {}", archive.display());
///     }
///
///     fn on_package_complete(&mut self, report: &PackageReport) {
///         println!("  -> {}", report.status());
///     }
///
///     fn on_complete(&mut self) {}
/// }
/// ```
pub trait BatchProgress {
    /// Called before a package is processed (`current` is 1-indexed).
    fn on_package_start(&mut self, archive: &Path, total: usize, current: usize);

    /// Called after a package has been processed, whatever the outcome.
    fn on_package_complete(&mut self, report: &PackageReport);

    /// Called once after the last package.
    fn on_complete(&mut self);
}

/// No-op implementation of `BatchProgress`.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl BatchProgress for NoopProgress {
    fn on_package_start(&mut self, _archive: &Path, _total: usize, _current: usize) {}

    fn on_package_complete(&mut self, _report: &PackageReport) {}

    fn on_complete(&mut self) {}
}
