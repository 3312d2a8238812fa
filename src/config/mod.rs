//! Configuration module
//!
//! Settings come from four layers, highest precedence first: command-line
//! flags, environment variables, the config file, built-in defaults.

pub mod env;
mod file;
mod format;

pub use env::{parse_indices, EnvConfig};
pub use file::ConfigFile;
pub(crate) use format::{read_document, write_document};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::discovery::DEFAULT_PATTERN;
use crate::output::OutputFormat;

/// Default number of groups when nothing else is configured
pub const DEFAULT_NUM_GROUPS: usize = 4;

/// Application configuration as stored in the config file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Number of groups (and worker processes) to split tests into
    pub num_groups: usize,

    /// Directory searched for suite files
    pub tests_dir: String,

    /// File name glob for suite files
    pub pattern: String,

    /// Only run these groups
    pub group_indices: Option<Vec<usize>>,

    /// Report format (text, json, json-pretty, csv)
    pub format: String,

    /// Shell used to run case commands
    pub shell: String,

    /// Persist every run
    pub save_results: bool,

    /// Where runs are persisted
    pub results_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            num_groups: DEFAULT_NUM_GROUPS,
            tests_dir: "tests".to_string(),
            pattern: DEFAULT_PATTERN.to_string(),
            group_indices: None,
            format: "text".to_string(),
            shell: "sh".to_string(),
            save_results: false,
            results_dir: None,
        }
    }
}

/// Per-invocation values given on the command line
#[derive(Clone, Debug, Default)]
pub struct RunOverrides {
    pub num_groups: Option<usize>,
    pub group_indices: Option<String>,
    pub tests_dir: Option<String>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub shell: Option<String>,
    pub save_results: bool,
    pub results_dir: Option<String>,
}

/// Fully resolved settings for one run
#[derive(Clone, Debug, PartialEq)]
pub struct RunSettings {
    pub num_groups: usize,
    pub group_indices: Option<Vec<usize>>,
    pub tests_dir: PathBuf,
    pub pattern: String,
    pub format: OutputFormat,
    pub shell: String,
    pub save_results: bool,
    pub results_dir: Option<PathBuf>,
}

impl RunSettings {
    /// Merge the layers. Unparseable values fall back to the next layer.
    pub fn resolve(cli: &RunOverrides, env: &EnvConfig, app: &AppConfig) -> Self {
        let group_indices = cli
            .group_indices
            .as_deref()
            .map(parse_indices)
            .filter(|indices| !indices.is_empty())
            .or_else(|| env.test_group_indices.clone())
            .or_else(|| app.group_indices.clone());

        let format_name = cli
            .format
            .as_deref()
            .or(env.format.as_deref())
            .unwrap_or(&app.format);
        let format = OutputFormat::from_str(format_name).unwrap_or_else(|| {
            warn!("Unknown report format {:?}, using text", format_name);
            OutputFormat::Text
        });

        Self {
            num_groups: cli
                .num_groups
                .or(env.num_parallelization)
                .unwrap_or(app.num_groups),
            group_indices,
            tests_dir: PathBuf::from(
                cli.tests_dir
                    .as_deref()
                    .or(env.tests_dir.as_deref())
                    .unwrap_or(&app.tests_dir),
            ),
            pattern: cli
                .pattern
                .clone()
                .or_else(|| env.pattern.clone())
                .unwrap_or_else(|| app.pattern.clone()),
            format,
            shell: cli
                .shell
                .clone()
                .or_else(|| env.shell.clone())
                .unwrap_or_else(|| app.shell.clone()),
            save_results: cli.save_results || app.save_results,
            results_dir: cli
                .results_dir
                .as_ref()
                .or(app.results_dir.as_ref())
                .map(PathBuf::from),
        }
    }
}

/// Load the config file named on the command line or in the environment, or
/// the nearest one found on disk. Without any file the defaults apply.
pub fn load_app_config(explicit: Option<&str>, env: &EnvConfig) -> Result<AppConfig> {
    let path = explicit
        .or(env.config_file.as_deref())
        .map(PathBuf::from)
        .or_else(ConfigFile::find);

    match path {
        Some(path) => {
            debug!("Using config file {}", path.display());
            Ok(ConfigFile::load(&path)?.app)
        }
        None => Ok(AppConfig::default()),
    }
}
