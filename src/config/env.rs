//! Environment variable configuration
//!
//! `NUM_PARALLELIZATION` and `TEST_GROUP_INDICES` are read without a prefix so
//! existing CI setups keep working; everything else uses `PARTEST_`.
//! Unparseable values are ignored.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "PARTEST";

/// Number of groups
pub const NUM_PARALLELIZATION: &str = "NUM_PARALLELIZATION";

/// Comma-separated group indices to run
pub const TEST_GROUP_INDICES: &str = "TEST_GROUP_INDICES";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Group count from NUM_PARALLELIZATION
    pub num_parallelization: Option<usize>,
    /// Group subset from TEST_GROUP_INDICES
    pub test_group_indices: Option<Vec<usize>>,
    /// Tests directory from PARTEST_TESTS_DIR
    pub tests_dir: Option<String>,
    /// Suite pattern from PARTEST_PATTERN
    pub pattern: Option<String>,
    /// Report format from PARTEST_FORMAT
    pub format: Option<String>,
    /// Shell from PARTEST_SHELL
    pub shell: Option<String>,
    /// Config file from PARTEST_CONFIG
    pub config_file: Option<String>,
    /// Verbose from PARTEST_VERBOSE
    pub verbose: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            num_parallelization: env::var(NUM_PARALLELIZATION)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .filter(|&n| n > 0),
            test_group_indices: env::var(TEST_GROUP_INDICES)
                .ok()
                .map(|v| parse_indices(&v))
                .filter(|indices| !indices.is_empty()),
            tests_dir: get_env("TESTS_DIR"),
            pattern: get_env("PATTERN"),
            format: get_env("FORMAT"),
            shell: get_env("SHELL"),
            config_file: get_env("CONFIG"),
            verbose: get_env_bool("VERBOSE"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.num_parallelization.is_some()
            || self.test_group_indices.is_some()
            || self.tests_dir.is_some()
            || self.pattern.is_some()
            || self.format.is_some()
            || self.shell.is_some()
            || self.config_file.is_some()
            || self.verbose.is_some()
    }

    /// Print current environment configuration
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  {NUM_PARALLELIZATION}:   {:?}", self.num_parallelization);
        println!("  {TEST_GROUP_INDICES}:    {:?}", self.test_group_indices);
        println!("  {}_TESTS_DIR:    {:?}", ENV_PREFIX, self.tests_dir);
        println!("  {}_PATTERN:      {:?}", ENV_PREFIX, self.pattern);
        println!("  {}_FORMAT:       {:?}", ENV_PREFIX, self.format);
        println!("  {}_SHELL:        {:?}", ENV_PREFIX, self.shell);
        println!("  {}_CONFIG:       {:?}", ENV_PREFIX, self.config_file);
        println!("  {}_VERBOSE:      {:?}", ENV_PREFIX, self.verbose);
    }
}

/// Parse a comma-separated index list, dropping entries that are not
/// non-negative integers
pub fn parse_indices(value: &str) -> Vec<usize> {
    value
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.is_empty())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all environment variables understood by partest
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {NUM_PARALLELIZATION}     Number of groups / worker processes (default 4)");
    println!("  {TEST_GROUP_INDICES}      Comma-separated group indices to run (e.g. 0,2)");
    println!("  {ENV_PREFIX}_TESTS_DIR      Directory searched for suite files");
    println!("  {ENV_PREFIX}_PATTERN        File name glob for suite files");
    println!("  {ENV_PREFIX}_FORMAT         Report format (text, json, json-pretty, csv)");
    println!("  {ENV_PREFIX}_SHELL          Shell used to run case commands");
    println!("  {ENV_PREFIX}_CONFIG         Path to configuration file");
    println!("  {ENV_PREFIX}_VERBOSE        Enable verbose output (true/false)");
    println!();
    println!("Example:");
    println!("  export {NUM_PARALLELIZATION}=8");
    println!("  export {TEST_GROUP_INDICES}=0,1");
    println!("  partest run");
}
