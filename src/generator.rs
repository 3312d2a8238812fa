//! Placeholder suite generator
//!
//! Writes a directory of dummy suites with random case counts, useful for
//! trying out partitioning against a realistic spread of suite sizes.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{CaseDef, SuiteFile};

/// Generator settings
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Number of suite files to write
    pub classes: usize,
    /// Upper bound for the case count of one suite
    pub max_cases: usize,
    /// Probability that an individual case fails
    pub fail_rate: f64,
    /// Seed for reproducible output
    pub seed: Option<u64>,
    /// File extension, `yaml` or `json`
    pub extension: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            classes: 100,
            max_cases: 20,
            fail_rate: 0.0,
            seed: None,
            extension: "yaml".to_string(),
        }
    }
}

pub struct DummySuiteGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl DummySuiteGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        if config.max_cases == 0 {
            anyhow::bail!("max_cases must be at least 1");
        }
        if !(0.0..=1.0).contains(&config.fail_rate) {
            anyhow::bail!("fail_rate must be between 0 and 1, got {}", config.fail_rate);
        }
        if !matches!(config.extension.as_str(), "yaml" | "yml" | "json") {
            anyhow::bail!("Unsupported suite format: {}", config.extension);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self { config, rng })
    }

    /// Build the `n`th suite
    pub fn suite(&mut self, n: usize) -> SuiteFile {
        let count = self.rng.random_range(1..=self.config.max_cases);
        let cases = (0..count)
            .map(|i| {
                let run = if self.rng.random_bool(self.config.fail_rate) {
                    "false"
                } else {
                    "true"
                };
                CaseDef::new(format!("test_{i}"), run)
            })
            .collect();
        SuiteFile::new(format!("Dummy{n}Test"), cases)
    }

    /// Write every suite into `dir`, creating it if needed
    pub fn write_to(&mut self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let mut paths = Vec::with_capacity(self.config.classes);
        for n in 0..self.config.classes {
            let suite = self.suite(n);
            let path = dir.join(format!("test_class_{n}.{}", self.config.extension));
            suite.save(&path)?;
            debug!("Wrote {} ({} cases)", path.display(), suite.case_count());
            paths.push(path);
        }

        info!("Generated {} suites in {}", paths.len(), dir.display());
        Ok(paths)
    }
}
