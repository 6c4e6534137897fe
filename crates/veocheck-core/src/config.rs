//! Validation configuration.

use std::path::PathBuf;

/// Configuration for package validation with conservative defaults.
///
/// # Examples
///
/// ```
/// use veocheck_core::ValidationConfig;
///
/// // Use defaults: delete the extracted tree afterwards, check hashes
/// let config = ValidationConfig::default();
///
/// // Keep the extracted tree for inspection
/// let custom = ValidationConfig {
///     keep_extracted: true,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Retain the extracted package directory after validation.
    pub keep_extracted: bool,

    /// Maximum path depth allowed for archive entries.
    pub max_path_depth: usize,

    /// Accepted byte lengths for `VEOReadme.txt` (empty = any length).
    pub readme_lengths: Vec<u64>,

    /// Check content file digests against the manifest's hash values.
    pub verify_content_hashes: bool,

    /// Directory holding replacement schemas; built-in schemas are used when
    /// unset.
    pub schema_dir: Option<PathBuf>,
}

impl Default for ValidationConfig {
    /// Default values:
    /// - `keep_extracted`: false
    /// - `max_path_depth`: 32
    /// - `readme_lengths`: empty (any length)
    /// - `verify_content_hashes`: true
    /// - `schema_dir`: none (built-in schemas)
    fn default() -> Self {
        Self {
            keep_extracted: false,
            max_path_depth: 32,
            readme_lengths: Vec::new(),
            verify_content_hashes: true,
            schema_dir: None,
        }
    }
}

impl ValidationConfig {
    /// Returns whether a readme of `len` bytes is acceptable.
    #[must_use]
    pub fn is_readme_length_allowed(&self, len: u64) -> bool {
        self.readme_lengths.is_empty() || self.readme_lengths.contains(&len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        assert!(!config.keep_extracted);
        assert!(config.verify_content_hashes);
        assert_eq!(config.max_path_depth, 32);
        assert!(config.schema_dir.is_none());
    }

    #[test]
    fn test_readme_length_any_when_empty() {
        let config = ValidationConfig::default();
        assert!(config.is_readme_length_allowed(0));
        assert!(config.is_readme_length_allowed(4096));
    }

    #[test]
    fn test_readme_length_with_list() {
        let config = ValidationConfig {
            readme_lengths: vec![1024, 2048],
            ..Default::default()
        };
        assert!(config.is_readme_length_allowed(2048));
        assert!(!config.is_readme_length_allowed(2049));
    }
}
