//! Buffered streaming of archive entries to disk.
//!
//! One stack buffer is reused for every entry of a package. Each entry is
//! held to the uncompressed size its directory record declares.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::ExtractionError;
use crate::Result;

/// Buffer size for entry streaming (64KB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Streams entry bytes through a reusable buffer.
///
/// # Examples
///
/// ```
/// use veocheck_core::copy::EntryCopier;
///
/// let mut copier = EntryCopier::new();
/// let mut output = Vec::new();
/// let written = copier
///     .copy("R-1.veo/VEOReadme.txt", &mut &b"readme"[..], &mut output, 6)
///     .unwrap();
/// assert_eq!(written, 6);
/// ```
#[derive(Debug)]
pub struct EntryCopier {
    #[allow(clippy::large_stack_arrays)]
    buf: [u8; COPY_BUFFER_SIZE],
    total: u64,
}

impl EntryCopier {
    /// Creates a copier with a zeroed buffer.
    #[inline]
    #[must_use]
    #[allow(clippy::large_stack_arrays)]
    pub fn new() -> Self {
        Self {
            buf: [0u8; COPY_BUFFER_SIZE],
            total: 0,
        }
    }

    /// Bytes written by every call so far.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Copies one entry and returns its length.
    ///
    /// # Errors
    ///
    /// Returns `SecurityViolation` if the entry yields more bytes than
    /// `declared`, `InvalidArchive` if it yields fewer, and `Io` if reading
    /// or writing fails.
    pub fn copy<R: Read, W: Write>(
        &mut self,
        name: &str,
        reader: &mut R,
        writer: &mut W,
        declared: u64,
    ) -> Result<u64> {
        let mut written: u64 = 0;

        loop {
            let n = match reader.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExtractionError::Io(e)),
            };
            written = written.saturating_add(n as u64);
            if written > declared {
                return Err(ExtractionError::SecurityViolation {
                    reason: format!("entry '{name}' inflates past its declared {declared} bytes"),
                });
            }
            writer.write_all(&self.buf[..n])?;
        }

        if written < declared {
            return Err(ExtractionError::InvalidArchive(format!(
                "entry '{name}' ends after {written} of its declared {declared} bytes"
            )));
        }
        self.total = self.total.saturating_add(written);
        Ok(written)
    }
}

impl Default for EntryCopier {
    fn default() -> Self {
        Self::new()
    }
}
