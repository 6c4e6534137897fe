//! Archive entry metadata.

use chrono::NaiveDate;
use filetime::FileTime;

/// One record of the archive's entry directory.
///
/// Read before any bytes are written and dropped once extraction finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name exactly as stored.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// Modification time, when the entry carries a valid one.
    pub modified: Option<FileTime>,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Converts a ZIP (MS-DOS) timestamp to a file time, treating it as UTC.
///
/// Returns `None` for out-of-range fields, which some writers emit for
/// "no timestamp".
#[must_use]
pub fn mtime_from_zip(dt: zip::DateTime) -> Option<FileTime> {
    let date = NaiveDate::from_ymd_opt(
        i32::from(dt.year()),
        u32::from(dt.month()),
        u32::from(dt.day()),
    )?;
    let stamp = date
        .and_hms_opt(
            u32::from(dt.hour()),
            u32::from(dt.minute()),
            u32::from(dt.second()),
        )?
        .and_utc()
        .timestamp();
    Some(FileTime::from_unix_time(stamp, 0))
}

/// Sums the compressed sizes claimed by `entries`, saturating on overflow.
#[must_use]
pub fn claimed_compressed_size(entries: &[ArchiveEntry]) -> u64 {
    entries
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.compressed_size))
}
