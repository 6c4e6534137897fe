//! Package orchestration: extract, parse, verify, aggregate.

use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::BatchProgress;
use crate::BatchSummary;
use crate::IssueId;
use crate::Ledger;
use crate::PackageReport;
use crate::Severity;
use crate::Validated;
use crate::ValidationConfig;
use crate::VeoError;
use crate::VeoResult;
use crate::extraction::CleanupGuard;
use crate::extraction::canonical_name;
use crate::extraction::extract_archive;
use crate::history::History;
use crate::manifest::Manifest;
use crate::signature::Signature;
use crate::signature::SignedFile;
use crate::xml::Schema;
use crate::xml::SchemaKind;

const EXTRACTION_WARNING: IssueId = IssueId::new("Package", "extract", 1);
const MISSING_FILE: IssueId = IssueId::new("Package", "layout", 1);
const NO_CONTENT_SIGNATURE: IssueId = IssueId::new("Package", "layout", 2);
const NO_HISTORY_SIGNATURE: IssueId = IssueId::new("Package", "layout", 3);
const UNKNOWN_FILE: IssueId = IssueId::new("Package", "layout", 4);
const README_LENGTH: IssueId = IssueId::new("Package", "readme", 1);

const CONTENT_FILE: &str = "VEOContent.xml";
const HISTORY_FILE: &str = "VEOHistory.xml";
const README_FILE: &str = "VEOReadme.txt";

/// The validated object model of one extracted package.
#[derive(Debug)]
pub struct Package {
    /// Extraction root.
    pub root: PathBuf,
    /// The parsed manifest, if `VEOContent.xml` was present.
    pub manifest: Option<Manifest>,
    /// The parsed history, if `VEOHistory.xml` was present.
    pub history: Option<History>,
    /// Every signature file, in file-name order.
    pub signatures: Vec<Signature>,
    ledger: Ledger,
}

impl Package {
    /// Validates an already extracted package rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema cannot be loaded or a signed companion
    /// file exists but cannot be read.
    pub fn validate(root: &Path, config: &ValidationConfig) -> VeoResult<Self> {
        let schema_dir = config.schema_dir.as_deref();
        let content_schema = Schema::for_kind(SchemaKind::Content, schema_dir)?;
        let history_schema = Schema::for_kind(SchemaKind::History, schema_dir)?;
        let signature_schema = Schema::for_kind(SchemaKind::Signature, schema_dir)?;

        let mut package = Self {
            root: root.to_path_buf(),
            manifest: None,
            history: None,
            signatures: Vec::new(),
            ledger: Ledger::new("package"),
        };
        let signature_files = package.check_layout(config)?;

        let content_path = root.join(CONTENT_FILE);
        if content_path.is_file() {
            let mut manifest = Manifest::parse(&content_path, &content_schema);
            manifest.check_content(root, config.verify_content_hashes);
            package.manifest = Some(manifest);
        }

        let history_path = root.join(HISTORY_FILE);
        if history_path.is_file() {
            package.history = Some(History::parse(&history_path, &history_schema));
        }

        for (name, kind) in signature_files {
            let mut signature = Signature::parse(&root.join(&name), &name, &signature_schema);
            let companion = root.join(kind.companion());
            if companion.is_file() {
                signature.verify(&companion)?;
            }
            package.signatures.push(signature);
        }
        Ok(package)
    }

    /// Checks the top-level files and returns the signature files found.
    fn check_layout(&mut self, config: &ValidationConfig) -> VeoResult<Vec<(String, SignedFile)>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        for required in [CONTENT_FILE, HISTORY_FILE, README_FILE] {
            if !names.iter().any(|n| n == required) {
                self.ledger
                    .error(MISSING_FILE, format!("{required} is missing"));
            }
        }

        let mut signatures = Vec::new();
        for name in &names {
            if let Some(kind) = SignedFile::classify(name) {
                signatures.push((name.clone(), kind));
            } else if ![CONTENT_FILE, HISTORY_FILE, README_FILE].contains(&name.as_str()) {
                self.ledger.warning(
                    UNKNOWN_FILE,
                    format!("unexpected file '{name}' at the top level of the package"),
                );
            }
        }
        if !signatures.iter().any(|(_, k)| *k == SignedFile::Content) {
            self.ledger
                .error(NO_CONTENT_SIGNATURE, "no VEOContentSignature file is present");
        }
        if !signatures.iter().any(|(_, k)| *k == SignedFile::History) {
            self.ledger
                .error(NO_HISTORY_SIGNATURE, "no VEOHistorySignature file is present");
        }

        let readme = self.root.join(README_FILE);
        if let Ok(meta) = std::fs::metadata(&readme)
            && !config.is_readme_length_allowed(meta.len())
        {
            self.ledger.error(
                README_LENGTH,
                format!("{README_FILE} is {} bytes, which matches no standard readme", meta.len()),
            );
        }

        Ok(signatures)
    }
}

impl Validated for Package {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn children(&self) -> Vec<&dyn Validated> {
        let mut children: Vec<&dyn Validated> = Vec::new();
        if let Some(manifest) = &self.manifest {
            children.push(manifest);
        }
        if let Some(history) = &self.history {
            children.push(history);
        }
        children.extend(self.signatures.iter().map(|s| s as &dyn Validated));
        children
    }
}

/// Validates one package archive.
///
/// Never fails: a fatal problem (unreadable archive, sandbox violation,
/// unusable schema, unreadable signed file) ends processing of this package
/// and is reported in [`PackageReport::fatal`]. The extracted tree is
/// removed on every path unless `config.keep_extracted` is set.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use veocheck_core::ValidationConfig;
/// use veocheck_core::validate_package;
///
/// let report = validate_package(
///     Path::new("R-17.veo.zip"),
///     Path::new("/tmp/veocheck"),
///     &ValidationConfig::default(),
/// );
/// for issue in &report.errors {
///     eprintln!("{issue}");
/// }
/// println!("{}: {}", report.archive.display(), report.status());
/// ```
#[must_use]
pub fn validate_package(archive: &Path, output_dir: &Path, config: &ValidationConfig) -> PackageReport {
    let start = Instant::now();
    let mut report = PackageReport::new(archive);
    report.canonical_name = canonical_name(archive).ok();

    if let Err(e) = run(archive, output_dir, config, &mut report) {
        if let VeoError::Extraction(inner) = &e
            && inner.is_security_violation()
        {
            warn!(archive = %archive.display(), error = %e, "package rejected by extraction sandbox");
        } else {
            warn!(archive = %archive.display(), error = %e, "package processing aborted");
        }
        report.fatal = Some(e.to_string());
    }

    report.duration = start.elapsed();
    info!(
        archive = %archive.display(),
        status = %report.status(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated package"
    );
    report
}

fn run(
    archive: &Path,
    output_dir: &Path,
    config: &ValidationConfig,
    report: &mut PackageReport,
) -> VeoResult<()> {
    let extraction = extract_archive(archive, output_dir, config)?;
    let mut guard = CleanupGuard::new(&extraction.root);
    if config.keep_extracted {
        guard.disarm();
        report.extraction_root = Some(extraction.root.clone());
    }
    debug!(
        root = %extraction.root.display(),
        files = extraction.files_extracted,
        "extracted package"
    );

    let mut package = Package::validate(&extraction.root, config)?;
    for message in &extraction.warnings {
        package.ledger.warning(EXTRACTION_WARNING, message.clone());
    }

    report.errors = package.collect(Severity::Error).into_iter().cloned().collect();
    report.warnings = package.collect(Severity::Warning).into_iter().cloned().collect();
    Ok(())
}

/// Validates every archive in turn, never stopping on a failed package.
///
/// Each archive is extracted into its own `output_dir/<canonical name>`.
pub fn validate_batch(
    archives: &[PathBuf],
    output_dir: &Path,
    config: &ValidationConfig,
    progress: &mut dyn BatchProgress,
) -> (BatchSummary, Vec<PackageReport>) {
    let mut summary = BatchSummary::default();
    let mut reports = Vec::with_capacity(archives.len());

    for (i, archive) in archives.iter().enumerate() {
        progress.on_package_start(archive, archives.len(), i + 1);
        let report = validate_package(archive, output_dir, config);
        summary.record(&report);
        progress.on_package_complete(&report);
        reports.push(report);
    }
    progress.on_complete();

    info!(
        packages = summary.packages,
        conformant = summary.conformant(),
        fatal = summary.fatal,
        "batch complete"
    );
    (summary, reports)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::NoopProgress;
    use crate::PackageStatus;
    use crate::test_utils::VeoZipBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_clean_package() {
        let temp = TempDir::new().unwrap();
        let archive = VeoZipBuilder::new("R-1.veo").write_to(temp.path());
        let out = temp.path().join("out");

        let report = validate_package(&archive, &out, &ValidationConfig::default());

        assert_eq!(report.status(), PackageStatus::Clean, "{:?}", report.errors);
        assert_eq!(report.canonical_name.as_deref(), Some("R-1.veo"));
        assert!(!out.join("R-1.veo").exists());
    }

    #[test]
    fn test_keep_extracted() {
        let temp = TempDir::new().unwrap();
        let archive = VeoZipBuilder::new("R-1.veo").write_to(temp.path());
        let config = ValidationConfig {
            keep_extracted: true,
            ..Default::default()
        };

        let report = validate_package(&archive, temp.path(), &config);

        let root = report.extraction_root.unwrap();
        assert!(root.join("VEOContent.xml").is_file());
    }

    #[test]
    fn test_missing_files_and_unknown_file() {
        let temp = TempDir::new().unwrap();
        let archive = VeoZipBuilder::new("R-1.veo")
            .without("VEOReadme.txt")
            .without("VEOHistorySignature1.xml")
            .file("notes.txt", b"stray")
            .write_to(temp.path());

        let report = validate_package(&archive, temp.path(), &ValidationConfig::default());

        assert_eq!(report.status(), PackageStatus::Errors);
        assert!(report.has_issue("Package", 1));
        assert!(report.has_issue("Package", 3));
        assert!(report.has_issue("Package", 4));
    }

    #[test]
    fn test_readme_length_checked() {
        let temp = TempDir::new().unwrap();
        let archive = VeoZipBuilder::new("R-1.veo").write_to(temp.path());
        let config = ValidationConfig {
            readme_lengths: vec![1],
            ..Default::default()
        };
        let report = validate_package(&archive, temp.path(), &config);
        assert!(report.errors.iter().any(|i| i.id == README_LENGTH));
    }

    #[test]
    fn test_fatal_on_bad_archive_name() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("R-1.veo");
        std::fs::write(&archive, b"").unwrap();

        let report = validate_package(&archive, temp.path(), &ValidationConfig::default());

        assert_eq!(report.status(), PackageStatus::Fatal);
        assert!(report.canonical_name.is_none());
    }

    #[test]
    fn test_fatal_on_bad_schema_dir_cleans_up() {
        let temp = TempDir::new().unwrap();
        let archive = VeoZipBuilder::new("R-1.veo").write_to(temp.path());
        let out = temp.path().join("out");
        let config = ValidationConfig {
            schema_dir: Some(temp.path().join("no-schemas")),
            ..Default::default()
        };

        let report = validate_package(&archive, &out, &config);

        assert_eq!(report.status(), PackageStatus::Fatal);
        assert!(report.fatal.unwrap().contains("VEOContent.xsd"));
        assert!(!out.join("R-1.veo").exists());
    }

    #[test]
    fn test_batch_continues_past_fatal() {
        let temp = TempDir::new().unwrap();
        let good = VeoZipBuilder::new("A.veo").write_to(temp.path());
        let bad = temp.path().join("B.veo.zip");
        std::fs::write(&bad, b"not a zip").unwrap();
        let out = temp.path().join("out");

        let (summary, reports) = validate_batch(
            &[bad, good],
            &out,
            &ValidationConfig::default(),
            &mut NoopProgress,
        );

        assert_eq!(summary.packages, 2);
        assert_eq!(summary.fatal, 1);
        assert_eq!(summary.clean, 1);
        assert_eq!(reports[1].status(), PackageStatus::Clean);
    }
}
