//! Results storage and retrieval
//!
//! Provides persistent storage for run reports in JSON format.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::RunReport;

/// Stored run containing the report and how it was produced
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRun {
    /// Unique run ID
    pub id: String,

    /// Timestamp when the run started
    pub started_at: DateTime<Utc>,

    /// Timestamp when the last worker finished
    pub completed_at: DateTime<Utc>,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// Directory the suites were discovered in
    pub tests_dir: String,

    /// Requested group count
    pub num_groups: usize,

    /// Requested group subset, if any
    pub group_indices: Option<Vec<usize>>,

    /// Per-group results and overall verdict
    pub report: RunReport,
}

impl StoredRun {
    /// Start a new run record; call [`StoredRun::complete`] once the report
    /// is available
    pub fn new(tests_dir: impl Into<String>, num_groups: usize) -> Self {
        let now = Utc::now();
        Self {
            id: generate_run_id(),
            started_at: now,
            completed_at: now,
            duration_ms: 0,
            tests_dir: tests_dir.into(),
            num_groups,
            group_indices: None,
            report: RunReport::new(Vec::new()),
        }
    }

    pub fn with_group_indices(mut self, indices: Option<Vec<usize>>) -> Self {
        self.group_indices = indices;
        self
    }

    /// Attach the final report and stamp the completion time
    pub fn complete(&mut self, report: RunReport) {
        self.completed_at = Utc::now();
        self.duration_ms = (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self.report = report;
    }
}

/// Summary of a stored run for listing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub num_groups: usize,
    pub groups_run: usize,
    pub failed: usize,
    pub success: bool,
}

impl From<&StoredRun> for RunInfo {
    fn from(run: &StoredRun) -> Self {
        Self {
            id: run.id.clone(),
            started_at: run.started_at,
            num_groups: run.num_groups,
            groups_run: run.report.groups.len(),
            failed: run.report.failed(),
            success: run.report.success,
        }
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Results storage manager
pub struct ResultsStorage {
    /// Base directory for results
    base_dir: PathBuf,
}

impl ResultsStorage {
    /// Create a new results storage
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create with default directory
    pub fn default_dir() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("partest")
            .join("results");
        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.base_dir.join(format!("{run_id}.json"))
    }

    /// Save a run
    pub fn save(&self, run: &StoredRun) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!("Failed to create results directory: {}", self.base_dir.display())
        })?;

        let path = self.run_path(&run.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, run).context("Failed to write results")?;

        info!("Saved run results to {}", path.display());
        Ok(path)
    }

    /// Load a run by ID
    pub fn load(&self, run_id: &str) -> Result<StoredRun> {
        let path = self.run_path(run_id);
        let run = load_from_path(&path)
            .with_context(|| format!("No stored run with id {run_id}"))?;
        debug!("Loaded run results from {}", path.display());
        Ok(run)
    }

    /// Load every stored run, newest first. Unreadable files are skipped.
    pub fn load_all(&self) -> Result<Vec<StoredRun>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match load_from_path(&path) {
                    Ok(run) => runs.push(run),
                    Err(e) => debug!("Failed to load {}: {:#}", path.display(), e),
                }
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    /// List stored runs, newest first
    pub fn list(&self) -> Result<Vec<RunInfo>> {
        Ok(self.load_all()?.iter().map(RunInfo::from).collect())
    }

    /// Most recent run, if any
    pub fn latest(&self) -> Result<Option<StoredRun>> {
        Ok(self.load_all()?.into_iter().next())
    }

    /// Delete a run; returns whether it existed
    pub fn delete(&self, run_id: &str) -> Result<bool> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete {}", path.display()))?;
        info!("Deleted results: {}", path.display());
        Ok(true)
    }
}

fn load_from_path(path: &Path) -> Result<StoredRun> {
    let file = File::open(path).context("Failed to open results file")?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).context("Failed to parse results")
}
