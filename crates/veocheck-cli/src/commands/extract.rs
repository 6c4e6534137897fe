//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use std::env;
use std::process::ExitCode;
use veocheck_core::ValidationConfig;
use veocheck_core::extract_archive;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let config = ValidationConfig {
        max_path_depth: usize::from(args.max_path_depth),
        ..Default::default()
    };

    let report = add_archive_context(
        extract_archive(&args.archive, &output_dir, &config),
        &args.archive,
    )?;

    formatter.format_extraction_result(&report)?;

    Ok(ExitCode::SUCCESS)
}
