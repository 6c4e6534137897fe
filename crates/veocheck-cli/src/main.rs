//! veocheck CLI - command-line validator for VEO digital-preservation
//! packages.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let show_progress = !cli.quiet && !cli.json;

    let result = match &cli.command {
        cli::Commands::Validate(args) => commands::validate::execute(args, &*formatter, show_progress),
        cli::Commands::Extract(args) => commands::extract::execute(args, &*formatter),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            formatter.format_error(&e);
            ExitCode::from(commands::EXIT_FAILURE)
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level chosen by the flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
