//! Fatal error types for package validation.
//!
//! Only conditions that stop processing of the current package are
//! represented here. Recoverable problems (schema violations, broken
//! signatures, depth errors) are recorded in a [`Ledger`](crate::Ledger)
//! instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias using `VeoError`.
pub type VeoResult<T> = std::result::Result<T, VeoError>;

/// Errors that abort extraction of an archive.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive is corrupted or cannot be read as a ZIP file.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// Archive filename does not carry the container extension.
    #[error("archive name does not end in '.zip': {path}")]
    MissingExtension {
        /// The offending archive path.
        path: PathBuf,
    },

    /// Entry directory claims more compressed bytes than the file holds.
    #[error(
        "archive truncated or malformed: entries claim {claimed} compressed bytes, file holds {actual}"
    )]
    TruncatedArchive {
        /// Sum of the compressed sizes claimed by the entries.
        claimed: u64,
        /// Actual length of the archive file on disk.
        actual: u64,
    },

    /// Path traversal attempt detected.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The entry path that attempted traversal.
        path: PathBuf,
    },

    /// Operation not permitted by the extraction policy.
    #[error("operation denied by security policy: {reason}")]
    SecurityViolation {
        /// Reason for the violation.
        reason: String,
    },
}

impl ExtractionError {
    /// Returns `true` if this error represents a sandbox violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use veocheck_core::ExtractionError;
    ///
    /// let err = ExtractionError::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = ExtractionError::InvalidArchive("bad header".into());
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal { .. }
                | Self::SecurityViolation { .. }
                | Self::TruncatedArchive { .. }
        )
    }

    /// Returns a context string for this error, if available.
    ///
    /// # Examples
    ///
    /// ```
    /// use veocheck_core::ExtractionError;
    ///
    /// let err = ExtractionError::InvalidArchive("bad header".to_string());
    /// assert_eq!(err.context(), Some("bad header"));
    /// ```
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidArchive(msg) => Some(msg),
            Self::SecurityViolation { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Errors that abort validation of one package.
///
/// A batch run records these against the package and moves on to the next
/// archive.
#[derive(Error, Debug)]
pub enum VeoError {
    /// Extraction of the archive failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// I/O failure outside extraction.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema could not be loaded or understood.
    #[error("cannot load schema {path}: {reason}")]
    Schema {
        /// The schema file.
        path: PathBuf,
        /// Why it could not be used.
        reason: String,
    },

    /// The file a signature covers could not be read.
    #[error("cannot read signed file {path}: {source}")]
    Companion {
        /// The companion file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
