//! Test unit models
//!
//! Defines the unit abstraction consumed by the partitioner and the suite
//! file format that backs it on disk.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{read_document, write_document};

/// A runnable group of test cases.
///
/// Partitioning only ever looks at a unit's identity and its cost. Units are
/// never inspected further or mutated once discovered.
pub trait TestUnit {
    /// Stable identity of the unit
    fn id(&self) -> &str;

    /// Load metric of the unit, usually its number of test cases
    fn cost(&self) -> u64;
}

impl<U: TestUnit + ?Sized> TestUnit for &U {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn cost(&self) -> u64 {
        (**self).cost()
    }
}

/// A single test case inside a suite file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDef {
    /// Case name, shown in worker output
    pub name: String,

    /// Shell command; the case passes iff it exits with status 0
    pub run: String,
}

impl CaseDef {
    pub fn new(name: impl Into<String>, run: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run: run.into(),
        }
    }
}

/// A suite file on disk, the concrete test unit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteFile {
    /// Display name of the suite
    #[serde(default)]
    pub name: String,

    /// Cases in declaration order
    #[serde(default)]
    pub cases: Vec<CaseDef>,

    /// Where the suite was loaded from
    #[serde(skip)]
    pub path: PathBuf,

    /// Why the file could not be parsed, for suites kept as placeholders
    #[serde(skip)]
    pub load_error: Option<String>,
}

impl SuiteFile {
    /// Create an in-memory suite
    pub fn new(name: impl Into<String>, cases: Vec<CaseDef>) -> Self {
        Self {
            name: name.into(),
            cases,
            path: PathBuf::new(),
            load_error: None,
        }
    }

    /// Placeholder for a suite file that failed to parse.
    ///
    /// It still takes part in partitioning with a cost of 1, so the worker
    /// that receives it fails on reload and its group is reported NG.
    pub fn unloadable(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: file_stem(&path),
            cases: Vec::new(),
            path,
            load_error: Some(error.into()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.load_error.is_none()
    }

    /// Load a suite from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut suite: Self = read_document(path, "suite")?;

        if suite.name.is_empty() {
            suite.name = file_stem(path);
        }
        suite.path = path.to_path_buf();

        Ok(suite)
    }

    /// Write the suite to a YAML or JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_document(path.as_ref(), self, "suite")
    }

    /// Number of cases in the suite
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }
}

impl TestUnit for SuiteFile {
    fn id(&self) -> &str {
        self.path.to_str().unwrap_or(&self.name)
    }

    fn cost(&self) -> u64 {
        if self.is_loaded() {
            self.cases.len() as u64
        } else {
            1
        }
    }
}

impl fmt::Display for SuiteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.load_error {
            None => write!(f, "{} ({} cases)", self.name, self.cases.len()),
            Some(_) => write!(f, "{} (unloadable)", self.name),
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_suite_cost_is_case_count() {
        let suite = SuiteFile::new(
            "Dummy0Test",
            vec![CaseDef::new("test_0", "true"), CaseDef::new("test_1", "true")],
        );
        assert_eq!(suite.cost(), 2);
        assert_eq!(suite.to_string(), "Dummy0Test (2 cases)");
    }

    #[test]
    fn test_suite_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_login.yaml");
        std::fs::write(
            &path,
            "name: LoginTest\ncases:\n  - name: ok\n    run: \"true\"\n  - name: bad\n    run: \"false\"\n",
        )
        .unwrap();

        let suite = SuiteFile::load(&path).unwrap();
        assert_eq!(suite.name, "LoginTest");
        assert_eq!(suite.cost(), 2);
        assert_eq!(suite.cases[1].run, "false");
        assert_eq!(suite.id(), path.to_str().unwrap());
    }

    #[test]
    fn test_suite_name_defaults_to_file_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_orders.json");
        std::fs::write(&path, r#"{"cases": [{"name": "a", "run": "true"}]}"#).unwrap();

        let suite = SuiteFile::load(&path).unwrap();
        assert_eq!(suite.name, "test_orders");
        assert_eq!(suite.cost(), 1);
    }

    #[test]
    fn test_suite_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_class_0.yaml");

        let suite = SuiteFile::new("Dummy0Test", vec![CaseDef::new("test_0", "true")]);
        suite.save(&path).unwrap();

        let loaded = SuiteFile::load(&path).unwrap();
        assert_eq!(loaded.name, suite.name);
        assert_eq!(loaded.cases, suite.cases);
    }

    #[test]
    fn test_suite_load_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_broken.yaml");
        std::fs::write(&path, "cases: [unterminated").unwrap();

        assert!(SuiteFile::load(&path).is_err());
    }

    #[test]
    fn test_unloadable_suite_costs_one() {
        let suite = SuiteFile::unloadable("tests/test_broken.yaml", "Invalid YAML");
        assert!(!suite.is_loaded());
        assert_eq!(suite.name, "test_broken");
        assert_eq!(suite.cost(), 1);
        assert_eq!(suite.to_string(), "test_broken (unloadable)");
    }
}
