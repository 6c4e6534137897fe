//! Validate command implementation.

use crate::cli::ValidateArgs;
use crate::commands::EXIT_NON_CONFORMANT;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use std::env;
use std::fs;
use std::process::ExitCode;
use veocheck_core::NoopProgress;
use veocheck_core::ValidationConfig;
use veocheck_core::validate_batch;

pub fn execute(
    args: &ValidateArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<ExitCode> {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| env::temp_dir().join("veocheck"));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create output directory '{}'", output_dir.display()))?;

    let config = ValidationConfig {
        keep_extracted: args.keep,
        max_path_depth: usize::from(args.max_path_depth),
        readme_lengths: args.readme_lengths.clone(),
        verify_content_hashes: !args.no_hash_check,
        schema_dir: args.schema_dir.clone(),
    };

    // Progress bar only on an interactive terminal
    let (summary, reports) = if show_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new(args.archives.len(), "Validating");
        validate_batch(&args.archives, &output_dir, &config, &mut progress)
    } else {
        validate_batch(&args.archives, &output_dir, &config, &mut NoopProgress)
    };

    formatter.format_validation(&summary, &reports)?;

    if summary.conformant() == summary.packages {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_NON_CONFORMANT))
    }
}
