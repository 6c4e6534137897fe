//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "veocheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate one or more VEO packages
    Validate(ValidateArgs),
    /// Extract a VEO package without validating it
    Extract(ExtractArgs),
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// VEO archives to validate (`*.veo.zip`)
    #[arg(value_name = "ARCHIVE", required = true)]
    pub archives: Vec<PathBuf>,

    /// Directory packages are extracted into (default: system temp dir)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Keep extracted packages after validation
    #[arg(short, long)]
    pub keep: bool,

    /// Accepted VEOReadme.txt length in bytes (can be repeated)
    #[arg(long = "readme-length", value_name = "BYTES")]
    pub readme_lengths: Vec<u64>,

    /// Directory with replacement VEOContent.xsd, VEOHistory.xsd and
    /// VEOSignature.xsd
    #[arg(long, value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Skip content file digest checks
    #[arg(long)]
    pub no_hash_check: bool,

    /// Maximum directory depth of archive entries
    #[arg(long, default_value = "32", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_path_depth: u16,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the VEO archive
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum directory depth of archive entries
    #[arg(long, default_value = "32", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_path_depth: u16,
}
