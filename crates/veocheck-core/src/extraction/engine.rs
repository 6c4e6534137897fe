//! Sandboxed extraction of a package archive.

use std::fs::File;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use filetime::FileTime;
use tracing::debug;
use tracing::warn;

use super::atomic::CleanupGuard;
use super::entry::ArchiveEntry;
use super::entry::claimed_compressed_size;
use super::entry::mtime_from_zip;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::ValidationConfig;
use crate::copy::EntryCopier;
use crate::types::DestDir;
use crate::types::SafePath;

/// Container extension stripped from the archive filename.
const CONTAINER_EXTENSION: &str = ".zip";

/// Derives the package's canonical name from its archive path.
///
/// # Errors
///
/// Returns `ExtractionError::MissingExtension` if the filename does not end
/// in `.zip` (any case) or nothing is left once it is stripped.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use veocheck_core::extraction::canonical_name;
///
/// assert_eq!(canonical_name(Path::new("/in/R-17.veo.zip")).unwrap(), "R-17.veo");
/// assert!(canonical_name(Path::new("/in/R-17.veo")).is_err());
/// ```
pub fn canonical_name(archive_path: &Path) -> Result<String> {
    let missing = || ExtractionError::MissingExtension {
        path: archive_path.to_path_buf(),
    };
    let file_name = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(missing)?;

    let split = file_name
        .len()
        .checked_sub(CONTAINER_EXTENSION.len())
        .ok_or_else(missing)?;
    match (file_name.get(..split), file_name.get(split..)) {
        (Some(stem), Some(ext)) if !stem.is_empty() && ext.eq_ignore_ascii_case(CONTAINER_EXTENSION) => {
            Ok(stem.to_string())
        }
        _ => Err(missing()),
    }
}

/// Extracts a package archive into `output_dir/<canonical name>`.
///
/// Any existing directory at that location is deleted first, so re-running
/// on the same output directory yields the same tree. Every entry is
/// re-rooted under the package directory regardless of its own top-level
/// name; the first mismatch is reported as a warning.
///
/// # Errors
///
/// Returns an error, after removing everything written so far, if:
/// - the archive name lacks the container extension
/// - the archive cannot be read as ZIP
/// - the entries claim more compressed bytes than the file holds
/// - an entry name is absolute, contains `..`, or resolves outside the
///   package directory
/// - an I/O operation fails
///
/// # Examples
///
/// ```no_run
/// use veocheck_core::ValidationConfig;
/// use veocheck_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = extract_archive("R-17.veo.zip", "/tmp/out", &ValidationConfig::default())?;
/// println!("{} files under {}", report.files_extracted, report.root.display());
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    output_dir: Q,
    config: &ValidationConfig,
) -> Result<ExtractionReport> {
    let start = Instant::now();
    let archive_path = archive_path.as_ref();
    let name = canonical_name(archive_path)?;
    let root_path = output_dir.as_ref().join(&name);

    remove_previous(&root_path)?;

    let file = File::open(archive_path)?;
    let actual = file.metadata()?.len();
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExtractionError::InvalidArchive(format!("failed to open ZIP archive: {e}")))?;

    let entries = read_entries(&mut archive)?;
    let claimed = claimed_compressed_size(&entries);
    if claimed > actual {
        return Err(ExtractionError::TruncatedArchive { claimed, actual });
    }

    let dest = DestDir::create(&root_path)?;
    let mut guard = CleanupGuard::new(dest.as_path());
    let mut report = ExtractionReport::new(dest.as_path().to_path_buf());
    let mut copier = EntryCopier::new();
    let mut renamed_reported = false;
    let mut directory_times = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let (safe, renamed) = SafePath::reroot(&entry.name, &name, config.max_path_depth)?;
        if renamed && !renamed_reported {
            renamed_reported = true;
            report.add_warning(format!(
                "archive entries are rooted at '{}', not '{name}' (archive renamed since creation)",
                entry.name.replace('\\', "/").split('/').next().unwrap_or_default()
            ));
        }

        if safe.is_root() {
            if entry.is_dir {
                continue;
            }
            return Err(ExtractionError::InvalidArchive(format!(
                "file entry '{}' collides with the package directory",
                entry.name
            )));
        }

        let target = dest.resolve(&safe)?;
        debug!(entry = %entry.name, target = %target.display(), "extracting");

        if entry.is_dir {
            std::fs::create_dir_all(&target)?;
            report.directories_created += 1;
            if let Some(mtime) = entry.modified {
                directory_times.push((target, mtime));
            }
            continue;
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut reader = archive.by_index(index).map_err(|e| {
            ExtractionError::InvalidArchive(format!("failed to read entry '{}': {e}", entry.name))
        })?;
        let mut writer = BufWriter::with_capacity(64 * 1024, File::create(&target)?);
        copier.copy(&entry.name, &mut reader, &mut writer, entry.size)?;
        writer.flush()?;
        drop(writer);

        if let Some(mtime) = entry.modified {
            filetime::set_file_mtime(&target, mtime)?;
        }
        report.files_extracted += 1;
    }

    restore_directory_times(&directory_times);

    report.bytes_written = copier.total();
    guard.disarm();
    report.duration = start.elapsed();
    Ok(report)
}

/// Reads the entry directory without decompressing anything.
fn read_entries<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index_raw(i).map_err(|e| {
            ExtractionError::InvalidArchive(format!("failed to read ZIP entry {i}: {e}"))
        })?;
        entries.push(ArchiveEntry {
            name: file.name().to_string(),
            size: file.size(),
            compressed_size: file.compressed_size(),
            modified: file.last_modified().and_then(mtime_from_zip),
            is_dir: file.is_dir(),
        });
    }
    Ok(entries)
}

/// Deletes whatever an earlier run left at `root`.
fn remove_previous(root: &Path) -> Result<()> {
    match std::fs::symlink_metadata(root) {
        Ok(meta) if meta.is_dir() => {
            debug!(path = %root.display(), "removing previous extraction");
            std::fs::remove_dir_all(root)?;
        }
        Ok(_) => std::fs::remove_file(root)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Directory times are set last; writing children would bump them again.
fn restore_directory_times(times: &[(std::path::PathBuf, FileTime)]) {
    for (path, mtime) in times.iter().rev() {
        if let Err(e) = filetime::set_file_mtime(path, *mtime) {
            warn!(path = %path.display(), error = %e, "cannot restore directory time");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_zip;
    use tempfile::TempDir;

    fn write_archive(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name(Path::new("a/b/X.veo.zip")).unwrap(), "X.veo");
        assert_eq!(canonical_name(Path::new("X.veo.ZIP")).unwrap(), "X.veo");
        assert!(canonical_name(Path::new("X.veo")).is_err());
        assert!(canonical_name(Path::new(".zip")).is_err());
        assert!(canonical_name(Path::new("zip")).is_err());
    }

    #[test]
    fn test_extract_places_entries_under_root() {
        let temp = TempDir::new().unwrap();
        let data = create_test_zip(vec![
            ("X.veo/VEOReadme.txt", b"readme".as_slice()),
            ("X.veo/S-1/doc.txt", b"content".as_slice()),
        ]);
        let archive = write_archive(temp.path(), "X.veo.zip", &data);
        let out = temp.path().join("out");

        let report = extract_archive(&archive, &out, &ValidationConfig::default()).unwrap();

        assert_eq!(report.files_extracted, 2);
        assert!(!report.has_warnings());
        assert_eq!(
            std::fs::read(report.root.join("S-1/doc.txt")).unwrap(),
            b"content"
        );
        assert!(report.root.ends_with("X.veo"));
    }

    #[test]
    fn test_extract_warns_once_on_renamed_archive() {
        let temp = TempDir::new().unwrap();
        let data = create_test_zip(vec![("Old.veo/a.txt", b"a".as_slice()), ("Old.veo/b.txt", b"b".as_slice())]);
        let archive = write_archive(temp.path(), "New.veo.zip", &data);

        let report = extract_archive(&archive, temp.path(), &ValidationConfig::default()).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Old.veo"));
        assert!(temp.path().join("New.veo/a.txt").exists());
        assert!(!temp.path().join("Old.veo").exists());
    }

    #[test]
    fn test_extract_traversal_removes_partial_tree() {
        let temp = TempDir::new().unwrap();
        let data = create_test_zip(vec![
            ("X.veo/ok.txt", b"fine".as_slice()),
            ("X.veo/../../escape.txt", b"evil".as_slice()),
        ]);
        let archive = write_archive(temp.path(), "X.veo.zip", &data);
        let out = temp.path().join("out");

        let result = extract_archive(&archive, &out, &ValidationConfig::default());

        assert!(matches!(result, Err(ExtractionError::PathTraversal { .. })));
        assert!(!out.join("X.veo").exists());
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let temp = TempDir::new().unwrap();
        let archive = write_archive(temp.path(), "X.veo.zip", b"definitely not a zip");
        let result = extract_archive(&archive, temp.path(), &ValidationConfig::default());
        assert!(matches!(result, Err(ExtractionError::InvalidArchive(_))));
    }

    #[test]
    fn test_extract_replaces_previous_run() {
        let temp = TempDir::new().unwrap();
        let stale = temp.path().join("X.veo/stale.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"old").unwrap();

        let data = create_test_zip(vec![("X.veo/new.txt", b"new".as_slice())]);
        let archive = write_archive(temp.path(), "X.veo.zip", &data);
        extract_archive(&archive, temp.path(), &ValidationConfig::default()).unwrap();

        assert!(!stale.exists());
        assert!(temp.path().join("X.veo/new.txt").exists());
    }
}
