//! Config file lookup and validation
//!
//! A project file is searched for from the working directory upwards, so a
//! run started in any subdirectory of a repository picks up the same
//! settings. The per-user file is the fallback.

use anyhow::Result;
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::format::{read_document, write_document};
use super::AppConfig;
use crate::output::OutputFormat;

/// Project file names, checked in this order in each directory
const PROJECT_FILES: &[&str] = &["partest.yaml", "partest.yml", ".partest.yaml", "partest.json"];

const CONFIG_VERSION: &str = "1.0";

/// On-disk configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "current_version")]
    pub version: String,

    #[serde(default)]
    pub app: AppConfig,
}

fn current_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: current_version(),
            app: AppConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Nearest project file from the working directory, else the user file
    pub fn find() -> Option<PathBuf> {
        std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::find_from(&cwd))
            .or_else(|| user_config_path().filter(|p| p.is_file()))
    }

    /// Nearest project file in `start` or one of its ancestors
    pub fn find_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .flat_map(|dir| PROJECT_FILES.iter().map(move |name| dir.join(name)))
            .find(|path| path.is_file())
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = read_document(path, "config")?;
        config.validate().map_err(|e| {
            anyhow::anyhow!("Invalid config file {}: {e}", path.display())
        })?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_document(path.as_ref(), self, "config")
    }

    /// Check every setting, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.version != CONFIG_VERSION {
            problems.push(format!("unsupported version {:?}", self.version));
        }
        if self.app.num_groups == 0 {
            problems.push("num_groups must be at least 1".to_string());
        }
        if let Err(e) = Glob::new(&self.app.pattern) {
            problems.push(format!("invalid pattern {:?}: {e}", self.app.pattern));
        }
        if OutputFormat::from_str(&self.app.format).is_none() {
            problems.push(format!(
                "unknown format {:?} (expected text, json, json-pretty or csv)",
                self.app.format
            ));
        }
        if self.app.shell.trim().is_empty() {
            problems.push("shell must not be empty".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("{}", problems.join("; "))
        }
    }

    /// Starter file written by `config init`
    pub fn example() -> Self {
        Self {
            version: current_version(),
            app: AppConfig {
                save_results: true,
                ..AppConfig::default()
            },
        }
    }
}

/// Per-user config file, `<config dir>/partest/config.yaml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("partest").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_is_valid() {
        assert!(ConfigFile::default().validate().is_ok());
        assert!(ConfigFile::example().validate().is_ok());
    }

    #[test]
    fn test_example_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partest.yaml");
        ConfigFile::example().save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.app, ConfigFile::example().app);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partest.yaml");
        fs::write(&path, "app:\n  num_groups: 6\n").unwrap();

        let app = ConfigFile::load(&path).unwrap().app;
        assert_eq!(app.num_groups, 6);
        assert_eq!(app.tests_dir, "tests");
        assert_eq!(app.format, "text");
    }

    #[test]
    fn test_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partest.json");
        fs::write(&path, r#"{"app": {"group_indices": [0, 2]}}"#).unwrap();

        let app = ConfigFile::load(&path).unwrap().app;
        assert_eq!(app.group_indices, Some(vec![0, 2]));
    }

    #[test]
    fn test_invalid_file_rejected_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partest.yaml");
        fs::write(&path, "app:\n  num_groups: 0\n").unwrap();

        let err = ConfigFile::load(&path).unwrap_err().to_string();
        assert!(err.contains("num_groups"));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = ConfigFile::default();
        config.version = "9.9".to_string();
        config.app.format = "xml".to_string();
        config.app.pattern = "test_[".to_string();
        config.app.shell = " ".to_string();

        let err = config.validate().unwrap_err().to_string();
        for needle in ["version", "format", "pattern", "shell"] {
            assert!(err.contains(needle), "missing {needle} in {err}");
        }
    }

    #[test]
    fn test_find_from_walks_up() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("crates/core/src");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("partest.yaml"), "app: {}\n").unwrap();

        assert_eq!(
            ConfigFile::find_from(&nested),
            Some(dir.path().join("partest.yaml"))
        );
    }

    #[test]
    fn test_find_from_prefers_nearest() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("partest.yaml"), "app: {}\n").unwrap();
        fs::write(nested.join(".partest.yaml"), "app: {}\n").unwrap();

        assert_eq!(
            ConfigFile::find_from(&nested),
            Some(nested.join(".partest.yaml"))
        );
    }
}
