//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::Status;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use veocheck_core::BatchSummary;
use veocheck_core::ExtractionReport;
use veocheck_core::Issue;
use veocheck_core::PackageReport;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct IssueOutput {
    component: &'static str,
    method: &'static str,
    code: u32,
    location: String,
    message: String,
}

impl From<&Issue> for IssueOutput {
    fn from(issue: &Issue) -> Self {
        Self {
            component: issue.id.component,
            method: issue.id.method,
            code: issue.id.code,
            location: issue.location.clone(),
            message: issue.message.clone(),
        }
    }
}

#[derive(Serialize)]
struct PackageOutput {
    archive: String,
    canonical_name: Option<String>,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fatal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    extraction_root: Option<String>,
    errors: Vec<IssueOutput>,
    warnings: Vec<IssueOutput>,
    duration_ms: u128,
}

impl From<&PackageReport> for PackageOutput {
    fn from(report: &PackageReport) -> Self {
        Self {
            archive: report.archive.display().to_string(),
            canonical_name: report.canonical_name.clone(),
            status: report.status().to_string(),
            fatal: report.fatal.clone(),
            extraction_root: report
                .extraction_root
                .as_ref()
                .map(|p| p.display().to_string()),
            errors: report.errors.iter().map(IssueOutput::from).collect(),
            warnings: report.warnings.iter().map(IssueOutput::from).collect(),
            duration_ms: report.duration.as_millis(),
        }
    }
}

#[derive(Serialize)]
struct SummaryOutput {
    packages: usize,
    conformant: usize,
    clean: usize,
    with_warnings: usize,
    with_errors: usize,
    fatal: usize,
}

impl From<&BatchSummary> for SummaryOutput {
    fn from(summary: &BatchSummary) -> Self {
        Self {
            packages: summary.packages,
            conformant: summary.conformant(),
            clean: summary.clean,
            with_warnings: summary.with_warnings,
            with_errors: summary.with_errors,
            fatal: summary.fatal,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput {
            root: String,
            files_extracted: usize,
            directories_created: usize,
            bytes_written: u64,
            duration_ms: u128,
            warnings: Vec<String>,
        }

        let data = ExtractionOutput {
            root: report.root.display().to_string(),
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
            warnings: report.warnings.clone(),
        };

        let output = JsonOutput::success("extract", data);
        Self::output(&output)
    }

    fn format_validation(&self, summary: &BatchSummary, reports: &[PackageReport]) -> Result<()> {
        #[derive(Serialize)]
        struct ValidationOutput {
            summary: SummaryOutput,
            packages: Vec<PackageOutput>,
        }

        let status = if summary.conformant() == summary.packages {
            Status::Success
        } else {
            Status::Failed
        };
        let data = ValidationOutput {
            summary: SummaryOutput::from(summary),
            packages: reports.iter().map(PackageOutput::from).collect(),
        };

        let output = JsonOutput::with_status("validate", status, data);
        Self::output(&output)
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::<()>::error("unknown", format!("{error:?}"));
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::Path;
    use veocheck_core::IssueId;
    use veocheck_core::Severity;

    #[test]
    fn test_package_output_structure() {
        let mut report = PackageReport::new(Path::new("R-1.veo.zip"));
        report.errors.push(Issue {
            id: IssueId::new("ContentFile", "check", 6),
            severity: Severity::Error,
            location: "VEOContent.xml/IO[1]".to_string(),
            message: "digest mismatch".to_string(),
        });

        let json = serde_json::to_value(PackageOutput::from(&report)).unwrap();

        assert_eq!(json["status"], "errors");
        assert_eq!(json["errors"][0]["component"], "ContentFile");
        assert_eq!(json["errors"][0]["code"], 6);
        assert!(json.get("fatal").is_none());
    }

    #[test]
    fn test_status_serialization() {
        let output = JsonOutput::with_status("validate", Status::Failed, ());
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "failed");
        assert!(json.get("error").is_none());
    }
}
