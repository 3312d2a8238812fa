//! YAML/JSON documents on disk
//!
//! Config files and suite files share the same rule: `.json` files are JSON,
//! everything else is read and written as YAML.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    pub fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T> {
        match self {
            DocumentFormat::Yaml => serde_yaml::from_str(content).context("Invalid YAML"),
            DocumentFormat::Json => serde_json::from_str(content).context("Invalid JSON"),
        }
    }

    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            DocumentFormat::Yaml => serde_yaml::to_string(value).context("YAML serialization"),
            DocumentFormat::Json => {
                serde_json::to_string_pretty(value).context("JSON serialization")
            }
        }
    }
}

/// Read and parse `path`; `kind` names the document in error messages
pub fn read_document<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {kind} file: {}", path.display()))?;
    DocumentFormat::from_path(path)
        .parse(&content)
        .with_context(|| format!("Failed to parse {kind} file: {}", path.display()))
}

/// Serialize `value` to `path`, creating missing parent directories
pub fn write_document<T: Serialize>(path: &Path, value: &T, kind: &str) -> Result<()> {
    let content = DocumentFormat::from_path(path).render(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write {kind} file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.yaml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), DocumentFormat::Yaml);
        assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("partest")), DocumentFormat::Yaml);
    }

    #[test]
    fn test_write_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/doc.json");
        let value = BTreeMap::from([("groups", 4)]);

        write_document(&path, &value, "test").unwrap();
        let loaded: BTreeMap<String, u32> = read_document(&path, "test").unwrap();
        assert_eq!(loaded["groups"], 4);
    }

    #[test]
    fn test_read_errors_name_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "cases: [").unwrap();

        let err = read_document::<BTreeMap<String, String>>(&path, "suite").unwrap_err();
        assert!(format!("{err:#}").contains("broken.yaml"));
    }
}
