//! Test suite discovery
//!
//! Walks a tests directory and loads every suite file whose name matches the
//! configured glob pattern.

use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::SuiteFile;

/// Default file name pattern for suite files
pub const DEFAULT_PATTERN: &str = "test_*.{yaml,yml,json}";

/// Discovery errors
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Tests directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Invalid suite pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to walk tests directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Finds suite files under a directory
#[derive(Clone, Debug)]
pub struct SuiteDiscovery {
    root: PathBuf,
    matcher: GlobMatcher,
}

impl SuiteDiscovery {
    /// Create a discovery rooted at `root`, matching file names against `pattern`
    pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Result<Self, DiscoveryError> {
        let matcher = Glob::new(pattern)
            .map_err(|source| DiscoveryError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(Self {
            root: root.into(),
            matcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of all matching suite files, sorted
    pub fn paths(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        if !self.root.is_dir() {
            return Err(DiscoveryError::MissingDirectory(self.root.clone()));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.matcher.is_match(entry.file_name()) {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Load every matching suite.
    ///
    /// A file that fails to parse is kept as an unloadable suite so that the
    /// group it lands in fails instead of the file silently dropping out.
    pub fn discover(&self) -> Result<Vec<SuiteFile>, DiscoveryError> {
        let mut suites = Vec::new();
        let mut broken = 0;

        for path in self.paths()? {
            match SuiteFile::load(&path) {
                Ok(suite) => {
                    debug!("Discovered {} from {}", suite, path.display());
                    suites.push(suite);
                }
                Err(e) => {
                    warn!("Cannot load {}: {:#}", path.display(), e);
                    broken += 1;
                    suites.push(SuiteFile::unloadable(path, format!("{e:#}")));
                }
            }
        }

        info!(
            "Discovered {} suites in {} ({} unloadable)",
            suites.len(),
            self.root.display(),
            broken
        );
        Ok(suites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestUnit;
    use tempfile::tempdir;

    fn write_suite(dir: &Path, file: &str, cases: usize) {
        let mut content = format!("name: {file}\ncases:\n");
        for i in 0..cases {
            content.push_str(&format!("  - name: test_{i}\n    run: \"true\"\n"));
        }
        std::fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_discover_matching_files() {
        let dir = tempdir().unwrap();
        write_suite(dir.path(), "test_b.yaml", 2);
        write_suite(dir.path(), "test_a.yaml", 3);
        write_suite(dir.path(), "helper.yaml", 1);

        let discovery = SuiteDiscovery::new(dir.path(), DEFAULT_PATTERN).unwrap();
        let suites = discovery.discover().unwrap();

        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].name, "test_a.yaml");
        assert_eq!(suites[0].cost(), 3);
        assert_eq!(suites[1].name, "test_b.yaml");
    }

    #[test]
    fn test_discover_nested_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("api").join("v1");
        std::fs::create_dir_all(&nested).unwrap();
        write_suite(&nested, "test_users.yaml", 4);
        write_suite(dir.path(), "test_root.yaml", 1);

        let discovery = SuiteDiscovery::new(dir.path(), DEFAULT_PATTERN).unwrap();
        let paths = discovery.paths().unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().any(|p| p.ends_with("api/v1/test_users.yaml")));
    }

    #[test]
    fn test_discover_keeps_invalid_suite() {
        let dir = tempdir().unwrap();
        write_suite(dir.path(), "test_ok.yaml", 2);
        std::fs::write(dir.path().join("test_broken.yaml"), "cases: [oops").unwrap();

        let discovery = SuiteDiscovery::new(dir.path(), DEFAULT_PATTERN).unwrap();
        let suites = discovery.discover().unwrap();
        assert_eq!(suites.len(), 2);

        let broken = &suites[0];
        assert_eq!(broken.path, dir.path().join("test_broken.yaml"));
        assert!(!broken.is_loaded());
        assert_eq!(broken.cost(), 1);
        assert!(suites[1].is_loaded());
        assert_eq!(suites[1].name, "test_ok.yaml");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let discovery = SuiteDiscovery::new(dir.path().join("nope"), DEFAULT_PATTERN).unwrap();
        assert!(matches!(
            discovery.discover(),
            Err(DiscoveryError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            SuiteDiscovery::new(".", "test_[.yaml"),
            Err(DiscoveryError::InvalidPattern { .. })
        ));
    }
}
