//! Error conversion utilities for CLI.
//!
//! Converts veocheck-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use veocheck_core::ExtractionError;

/// Converts `ExtractionError` to user-friendly anyhow error with context
pub fn convert_extraction_error(err: ExtractionError, archive: &Path) -> anyhow::Error {
    match err {
        ExtractionError::PathTraversal { path } => {
            anyhow!(
                "Security violation: Archive '{}' attempted path traversal with '{}'\n\
                 HINT: This package may be malicious. Nothing was left on disk.",
                archive.display(),
                path.display()
            )
        }
        ExtractionError::SecurityViolation { reason } => {
            anyhow!(
                "Security violation in '{}': {}\n\
                 HINT: Use --max-path-depth to allow deeper entries if the package is trusted.",
                archive.display(),
                reason
            )
        }
        ExtractionError::MissingExtension { path } => {
            anyhow!(
                "Cannot derive a package name from '{}'\n\
                 HINT: VEO archives must be named '<name>.veo.zip'.",
                path.display()
            )
        }
        ExtractionError::TruncatedArchive { claimed, actual } => {
            anyhow!(
                "Archive '{}' is truncated: entries claim {} bytes, file holds {}\n\
                 HINT: The transfer may have been interrupted. Fetch the package again.",
                archive.display(),
                claimed,
                actual
            )
        }
        ExtractionError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{}': {}\n\
                 HINT: The archive may be corrupted or malformed.",
                archive.display(),
                reason
            )
        }
        ExtractionError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {}",
                archive.display(),
                io_err
            )
        }
    }
}

/// Adds context to a generic error about archive operations
pub fn add_archive_context<T>(
    result: Result<T, ExtractionError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_extraction_error(e, archive))
}
