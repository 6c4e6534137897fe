//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use veocheck_core::BatchSummary;
use veocheck_core::ExtractionReport;
use veocheck_core::Issue;
use veocheck_core::PackageReport;
use veocheck_core::PackageStatus;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn plural(n: usize, word: &str) -> String {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    }

    fn status_marker(&self, status: PackageStatus) -> String {
        let (symbol, text) = match status {
            PackageStatus::Clean | PackageStatus::Warnings => ("✓", "OK"),
            PackageStatus::Errors => ("✗", "FAILED"),
            PackageStatus::Fatal => ("✗", "FATAL"),
        };
        if !self.use_colors {
            return text.to_string();
        }
        match status {
            PackageStatus::Clean => style(symbol).green().bold().to_string(),
            PackageStatus::Warnings => style(symbol).yellow().bold().to_string(),
            PackageStatus::Errors | PackageStatus::Fatal => style(symbol).red().bold().to_string(),
        }
    }

    fn write_issue(&self, issue: &Issue) {
        let tag = if self.use_colors {
            match issue.severity {
                veocheck_core::Severity::Error => style("error").red().to_string(),
                veocheck_core::Severity::Warning => style("warning").yellow().to_string(),
            }
        } else {
            issue.severity.to_string()
        };
        let _ = self.term.write_line(&format!(
            "    {tag} {} [{}]: {}",
            issue.id, issue.location, issue.message
        ));
    }

    fn write_package(&self, report: &PackageReport) {
        let status = report.status();
        // Quiet mode only reports packages that need attention
        if self.quiet && report.is_conformant() {
            return;
        }

        let detail = match status {
            PackageStatus::Fatal => "processing aborted".to_string(),
            PackageStatus::Errors => format!(
                "{}, {}",
                Self::plural(report.errors.len(), "error"),
                Self::plural(report.warnings.len(), "warning")
            ),
            PackageStatus::Warnings => Self::plural(report.warnings.len(), "warning"),
            PackageStatus::Clean => "clean".to_string(),
        };
        let _ = self.term.write_line(&format!(
            "{} {}: {detail}",
            self.status_marker(status),
            report.archive.display()
        ));

        if let Some(fatal) = &report.fatal {
            let _ = self.term.write_line(&format!("    {fatal}"));
        }
        for issue in &report.errors {
            self.write_issue(issue);
        }
        if !self.quiet {
            for issue in &report.warnings {
                self.write_issue(issue);
            }
        }

        if self.verbose {
            if let Some(root) = &report.extraction_root {
                let _ = self
                    .term
                    .write_line(&format!("    Extracted to: {}", root.display()));
            }
            let _ = self
                .term
                .write_line(&format!("    Duration: {:?}", report.duration));
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} Extraction complete",
                style("✓").green().bold()
            ));
        } else {
            let _ = self.term.write_line("Extraction complete");
        }

        let _ = self
            .term
            .write_line(&format!("  Package root: {}", report.root.display()));
        let _ = self
            .term
            .write_line(&format!("  Files extracted: {}", report.files_extracted));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", report.directories_created));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        for warning in &report.warnings {
            if self.use_colors {
                let _ = self
                    .term
                    .write_line(&format!("{} {warning}", style("⚠").yellow().bold()));
            } else {
                let _ = self.term.write_line(&format!("WARNING: {warning}"));
            }
        }

        Ok(())
    }

    fn format_validation(&self, summary: &BatchSummary, reports: &[PackageReport]) -> Result<()> {
        for report in reports {
            self.write_package(report);
        }

        if self.quiet {
            return Ok(());
        }

        let _ = self.term.write_line("");
        let headline = format!(
            "{} of {} conformant",
            summary.conformant(),
            Self::plural(summary.packages, "package")
        );
        if self.use_colors {
            let styled = if summary.conformant() == summary.packages {
                style(headline).green().bold()
            } else {
                style(headline).red().bold()
            };
            let _ = self.term.write_line(&styled.to_string());
        } else {
            let _ = self.term.write_line(&headline);
        }
        let _ = self.term.write_line(&format!(
            "  Clean: {}, with warnings: {}, with errors: {}, fatal: {}",
            summary.clean, summary.with_warnings, summary.with_errors, summary.fatal
        ));

        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}
