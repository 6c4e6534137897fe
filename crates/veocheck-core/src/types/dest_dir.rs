//! Canonicalized extraction root.

use crate::ExtractionError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

use super::SafePath;

/// A canonical directory that extracted entries must stay inside.
///
/// # Security Properties
///
/// The stored path is canonical, so symlinks in the caller-supplied output
/// directory are resolved once up front. Every placement is then checked by
/// component containment against this canonical form, never by string
/// prefix.
///
/// # Examples
///
/// ```no_run
/// use veocheck_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::create("/tmp/out/pkg.veo")?;
/// println!("Extracting to: {}", dest.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates the directory (and missing parents) and canonicalizes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, exists as a
    /// non-directory, or cannot be canonicalized.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        if !path.is_dir() {
            return Err(ExtractionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path is not a directory: {}", path.display()),
            )));
        }

        let canonical = path.canonicalize().map_err(|e| {
            ExtractionError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize path {}: {}", path.display(), e),
            ))
        })?;

        Ok(Self(canonical))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolves a validated entry path to its absolute target.
    ///
    /// The deepest already-existing ancestor of the target is canonicalized
    /// and must still lie inside this directory, which defeats symlinks
    /// planted by earlier entries.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::PathTraversal` if the target escapes.
    pub fn resolve(&self, safe: &SafePath) -> Result<PathBuf> {
        let target = self.0.join(safe.as_path());
        if !target.starts_with(&self.0) {
            return Err(ExtractionError::PathTraversal {
                path: safe.as_path().to_path_buf(),
            });
        }

        let mut ancestor = target.as_path();
        loop {
            match ancestor.canonicalize() {
                Ok(canonical) => {
                    if !canonical.starts_with(&self.0) {
                        return Err(ExtractionError::PathTraversal {
                            path: safe.as_path().to_path_buf(),
                        });
                    }
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    match ancestor.parent() {
                        Some(parent) => ancestor = parent,
                        None => break,
                    }
                }
                Err(e) => {
                    return Err(ExtractionError::Io(std::io::Error::new(
                        e.kind(),
                        format!("failed to canonicalize {}: {e}", ancestor.display()),
                    )));
                }
            }
        }

        Ok(target)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_makes_missing_directories() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::create(temp.path().join("a/b/pkg.veo")).unwrap();
        assert!(dest.as_path().is_dir());
        assert!(dest.as_path().is_absolute());
    }

    #[test]
    fn test_create_rejects_file() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let file = temp.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(DestDir::create(&file).is_err());
    }

    #[test]
    fn test_resolve_nested_target() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::create(temp.path().join("pkg.veo")).unwrap();
        let (safe, _) = SafePath::reroot("pkg.veo/S-1/a.txt", "pkg.veo", 32).unwrap();
        let target = dest.resolve(&safe).unwrap();
        assert!(target.starts_with(dest.as_path()));
        assert!(target.ends_with("S-1/a.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlinked_directory() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let outside = temp.path().join("outside");
        std::fs::create_dir(&outside).unwrap();
        let dest = DestDir::create(temp.path().join("pkg.veo")).unwrap();
        std::os::unix::fs::symlink(&outside, dest.as_path().join("S-1")).unwrap();

        let (safe, _) = SafePath::reroot("pkg.veo/S-1/a.txt", "pkg.veo", 32).unwrap();
        assert!(matches!(
            dest.resolve(&safe),
            Err(ExtractionError::PathTraversal { .. })
        ));
    }
}
