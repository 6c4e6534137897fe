//! Validated, re-rooted archive entry path.

use crate::ExtractionError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

/// Parent-directory token.
const PARENT_DIR: &str = "..";

/// A validated entry path, relative to the extraction root.
///
/// `SafePath` represents an entry name that has been:
/// - normalized to `/` separators,
/// - checked for null bytes, absolute forms and `..` segments,
/// - stripped of its top-level directory, so that placement never depends
///   on what the archive claims its own root is called.
///
/// # Security Properties
///
/// - Can ONLY be constructed through [`SafePath::reroot`]
/// - NO `From<PathBuf>` implementation
/// - Contains only normal components
///
/// # Examples
///
/// ```
/// use veocheck_core::types::SafePath;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (safe, renamed) = SafePath::reroot("pkg.veo/S-1/doc.pdf", "pkg.veo", 32)?;
/// assert_eq!(safe.as_path(), std::path::Path::new("S-1/doc.pdf"));
/// assert!(!renamed);
///
/// assert!(SafePath::reroot("pkg.veo/../../etc/passwd", "pkg.veo", 32).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates an entry name and re-roots it under the extraction root.
    ///
    /// Returns the relative placement and whether the entry's first segment
    /// differed from `canonical_name` (the archive was renamed after it was
    /// built). An entry naming the package directory itself yields an empty
    /// path.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::SecurityViolation` for null bytes or excessive
    ///   depth
    /// - `ExtractionError::PathTraversal` for absolute names, drive letters,
    ///   UNC prefixes or any `..` segment
    pub fn reroot(name: &str, canonical_name: &str, max_depth: usize) -> Result<(Self, bool)> {
        if name.contains('\0') {
            return Err(ExtractionError::SecurityViolation {
                reason: format!("entry name contains null bytes: {}", name.escape_debug()),
            });
        }

        let normalized = name.replace('\\', "/");
        if is_absolute(&normalized) {
            return Err(ExtractionError::PathTraversal {
                path: PathBuf::from(name),
            });
        }

        let mut segments = Vec::new();
        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                PARENT_DIR => {
                    return Err(ExtractionError::PathTraversal {
                        path: PathBuf::from(name),
                    });
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(ExtractionError::PathTraversal {
                path: PathBuf::from(name),
            });
        }

        if segments.len() > max_depth {
            return Err(ExtractionError::SecurityViolation {
                reason: format!(
                    "path depth {} exceeds maximum {}",
                    segments.len(),
                    max_depth
                ),
            });
        }

        let renamed = segments[0] != canonical_name;
        let tail = if segments.len() == 1 && renamed {
            &segments[..]
        } else {
            &segments[1..]
        };

        Ok((Self(tail.iter().collect()), renamed))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` when the entry denotes the extraction root itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

/// Absolute forms: `/x`, `C:x`, and (after normalization) `//server/share`.
fn is_absolute(normalized: &str) -> bool {
    let bytes = normalized.as_bytes();
    normalized.starts_with('/')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NAME: &str = "pkg.veo";

    #[test]
    fn test_reroot_strips_canonical_top() {
        let (safe, renamed) = SafePath::reroot("pkg.veo/VEOContent.xml", NAME, 32).unwrap();
        assert_eq!(safe.as_path(), Path::new("VEOContent.xml"));
        assert!(!renamed);
    }

    #[test]
    fn test_reroot_renamed_top_is_replaced() {
        let (safe, renamed) = SafePath::reroot("old-name.veo/S-1/a.txt", NAME, 32).unwrap();
        assert_eq!(safe.as_path(), Path::new("S-1/a.txt"));
        assert!(renamed);
    }

    #[test]
    fn test_reroot_bare_filename_kept_whole() {
        let (safe, renamed) = SafePath::reroot("VEOReadme.txt", NAME, 32).unwrap();
        assert_eq!(safe.as_path(), Path::new("VEOReadme.txt"));
        assert!(renamed);
    }

    #[test]
    fn test_reroot_root_directory_entry() {
        let (safe, renamed) = SafePath::reroot("pkg.veo/", NAME, 32).unwrap();
        assert!(safe.is_root());
        assert!(!renamed);
    }

    #[test]
    fn test_reroot_backslash_separators() {
        let (safe, _) = SafePath::reroot("pkg.veo\\S-1\\a.txt", NAME, 32).unwrap();
        assert_eq!(safe.as_path(), Path::new("S-1/a.txt"));
    }

    #[test]
    fn test_reroot_rejects_traversal() {
        for name in [
            "../../etc/passwd",
            "pkg.veo/../../etc/passwd",
            "pkg.veo\\..\\..\\evil",
            "pkg.veo/a/b/../../../../x",
            "..",
        ] {
            assert!(
                matches!(
                    SafePath::reroot(name, NAME, 32),
                    Err(ExtractionError::PathTraversal { .. })
                ),
                "should reject {name}"
            );
        }
    }

    #[test]
    fn test_reroot_rejects_absolute() {
        for name in ["/etc/passwd", "C:\\Windows\\evil.dll", "c:evil", "\\\\server\\share\\x"] {
            assert!(
                matches!(
                    SafePath::reroot(name, NAME, 32),
                    Err(ExtractionError::PathTraversal { .. })
                ),
                "should reject {name}"
            );
        }
    }

    #[test]
    fn test_reroot_rejects_null_byte() {
        assert!(matches!(
            SafePath::reroot("pkg.veo/a\0b", NAME, 32),
            Err(ExtractionError::SecurityViolation { .. })
        ));
    }

    #[test]
    fn test_reroot_rejects_excessive_depth() {
        let deep = format!("pkg.veo/{}", vec!["d"; 40].join("/"));
        assert!(matches!(
            SafePath::reroot(&deep, NAME, 32),
            Err(ExtractionError::SecurityViolation { .. })
        ));
    }

    #[test]
    fn test_reroot_empty_name_rejected() {
        assert!(SafePath::reroot("", NAME, 32).is_err());
        assert!(SafePath::reroot("./", NAME, 32).is_err());
    }
}
