//! Removal of a package directory on every exit path.

use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

/// Deletes a directory tree when dropped, unless disarmed.
///
/// Extraction arms one around the root it is populating so a failed run
/// never leaves a half-written tree behind; the package orchestrator arms
/// one around the finished root so it is deleted after validation unless
/// retention was requested.
#[derive(Debug)]
pub struct CleanupGuard {
    path: PathBuf,
    armed: bool,
}

impl CleanupGuard {
    /// Arms a guard for `path`.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    /// Keeps the directory.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// The guarded directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed package directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove package directory"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_armed_guard_removes_tree() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pkg.veo");
        std::fs::create_dir_all(dir.join("S-1")).unwrap();
        std::fs::write(dir.join("S-1/a.txt"), b"x").unwrap();

        drop(CleanupGuard::new(&dir));
        assert!(!dir.exists());
    }

    #[test]
    fn test_disarmed_guard_keeps_tree() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pkg.veo");
        std::fs::create_dir_all(&dir).unwrap();

        let mut guard = CleanupGuard::new(&dir);
        guard.disarm();
        drop(guard);
        assert!(dir.exists());
    }

    #[test]
    fn test_missing_directory_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        drop(CleanupGuard::new(&temp.path().join("never-created")));
    }
}
