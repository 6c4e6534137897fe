//! Integrity validation of VEO digital-preservation packages.
//!
//! `veocheck-core` takes a VEO archive from an untrusted source and decides
//! whether it can be accepted for long-term retention:
//!
//! - the archive is unpacked into a sandbox that no entry can escape;
//! - `VEOContent.xml` is parsed, its information objects linked into a tree
//!   from their declared depths, and every content file checked;
//! - `VEOHistory.xml` is parsed;
//! - every signature file is verified against the file it signs, together
//!   with its certificate chain.
//!
//! Problems found along the way are recorded on the object that detected
//! them (see [`Ledger`]) and never stop the run; only conditions that make
//! further checking meaningless abort a package.
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use veocheck_core::ValidationConfig;
//! use veocheck_core::validate_package;
//!
//! let report = validate_package(
//!     Path::new("R-17.veo.zip"),
//!     Path::new("/tmp/veocheck"),
//!     &ValidationConfig::default(),
//! );
//! println!("{} errors, {} warnings", report.errors.len(), report.warnings.len());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod copy;
pub mod datetime;
pub mod error;
pub mod extraction;
pub mod history;
pub mod ledger;
pub mod manifest;
pub mod package;
pub mod report;
pub mod signature;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod xml;

// Re-export main API types
pub use config::ValidationConfig;
pub use error::ExtractionError;
pub use error::Result;
pub use error::VeoError;
pub use error::VeoResult;
pub use extraction::extract_archive;
pub use ledger::Issue;
pub use ledger::IssueId;
pub use ledger::Ledger;
pub use ledger::Severity;
pub use ledger::Validated;
pub use package::Package;
pub use package::validate_batch;
pub use package::validate_package;
pub use report::BatchProgress;
pub use report::BatchSummary;
pub use report::ExtractionReport;
pub use report::NoopProgress;
pub use report::PackageReport;
pub use report::PackageStatus;
