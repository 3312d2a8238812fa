//! Group worker
//!
//! Runs inside a worker process: loads the group's suites and executes their
//! cases one after another through a shell.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::models::{CaseDef, SuiteFile};
use crate::utils::Timer;

/// Status of a single case
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Pass,
    Fail,
    Error,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseStatus::Pass => write!(f, "ok"),
            CaseStatus::Fail => write!(f, "FAILED"),
            CaseStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of one case (or of a suite that could not be loaded)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseResult {
    pub suite: String,
    pub case: String,
    pub status: CaseStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl CaseResult {
    pub fn pass(suite: impl Into<String>, case: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
            status: CaseStatus::Pass,
            duration_ms,
            message: None,
        }
    }

    pub fn fail(
        suite: impl Into<String>,
        case: impl Into<String>,
        duration_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
            status: CaseStatus::Fail,
            duration_ms,
            message: Some(message.into()),
        }
    }

    pub fn error(
        suite: impl Into<String>,
        case: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
            status: CaseStatus::Error,
            duration_ms: 0,
            message: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CaseStatus::Pass
    }
}

impl fmt::Display for CaseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{} ... {} [{}ms]",
            self.suite, self.case, self.status, self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Tally of one group's execution inside its worker
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupRunSummary {
    pub group: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub duration_ms: u64,
    pub results: Vec<CaseResult>,
}

impl GroupRunSummary {
    pub fn new(group: usize, results: Vec<CaseResult>, duration_ms: u64) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        let passed = count(CaseStatus::Pass);
        let failed = count(CaseStatus::Fail);
        let errors = count(CaseStatus::Error);

        Self {
            group,
            total: results.len(),
            passed,
            failed,
            errors,
            duration_ms,
            results,
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.results.iter().all(CaseResult::is_success)
    }
}

impl fmt::Display for GroupRunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Group-{}: ran {} cases in {}ms | Pass: {} | Fail: {} | Error: {}",
            self.group, self.total, self.duration_ms, self.passed, self.failed, self.errors
        )
    }
}

/// Sequential executor for one group's suites
pub struct GroupWorker {
    group: usize,
    shell: String,
}

impl GroupWorker {
    pub fn new(group: usize) -> Self {
        Self {
            group,
            shell: "sh".to_string(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Run a single case; passes iff its command exits with status 0
    pub async fn run_case(&self, suite: &SuiteFile, case: &CaseDef) -> CaseResult {
        let timer = Timer::start();

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&case.run)
            .stdin(Stdio::null())
            .output()
            .await;

        let duration_ms = timer.elapsed_ms();
        match output {
            Ok(output) if output.status.success() => {
                CaseResult::pass(&suite.name, &case.name, duration_ms)
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let reason = stderr
                    .lines()
                    .last()
                    .map(str::to_string)
                    .unwrap_or_else(|| output.status.to_string());
                CaseResult::fail(&suite.name, &case.name, duration_ms, reason)
            }
            Err(e) => CaseResult::error(&suite.name, &case.name, e.to_string()),
        }
    }

    /// Run every case of a suite in declaration order
    pub async fn run_suite(&self, suite: &SuiteFile) -> Vec<CaseResult> {
        debug!("Group-{} running {}", self.group, suite);

        let mut results = Vec::with_capacity(suite.case_count());
        for case in &suite.cases {
            let result = self.run_case(suite, case).await;
            println!("{result}");
            results.push(result);
        }
        results
    }

    /// Load and run the given suite files; a suite that fails to load counts
    /// as one errored case
    pub async fn run_paths(&self, paths: &[PathBuf]) -> GroupRunSummary {
        info!("Group-{} running {} suites", self.group, paths.len());
        let timer = Timer::start();

        let mut results = Vec::new();
        for path in paths {
            match SuiteFile::load(path) {
                Ok(suite) => results.extend(self.run_suite(&suite).await),
                Err(e) => {
                    error!("Group-{} could not load {}: {:#}", self.group, path.display(), e);
                    let result = CaseResult::error(suite_label(path), "<load>", format!("{e:#}"));
                    println!("{result}");
                    results.push(result);
                }
            }
        }

        let duration_ms = timer.finish(&format!("Group-{}", self.group));
        let summary = GroupRunSummary::new(self.group, results, duration_ms);
        println!("{summary}");
        summary
    }
}

fn suite_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn suite(cases: &[(&str, &str)]) -> SuiteFile {
        SuiteFile::new(
            "SampleTest",
            cases
                .iter()
                .map(|(name, run)| CaseDef::new(*name, *run))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_run_passing_case() {
        let suite = suite(&[("ok", "true")]);
        let result = GroupWorker::new(0).run_case(&suite, &suite.cases[0]).await;
        assert!(result.is_success());
        assert_eq!(result.suite, "SampleTest");
    }

    #[tokio::test]
    async fn test_run_failing_case_keeps_stderr() {
        let suite = suite(&[("bad", "echo boom >&2; exit 3")]);
        let result = GroupWorker::new(0).run_case(&suite, &suite.cases[0]).await;
        assert_eq!(result.status, CaseStatus::Fail);
        assert_eq!(result.message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_missing_shell_is_error() {
        let suite = suite(&[("ok", "true")]);
        let worker = GroupWorker::new(0).with_shell("/nonexistent/shell");
        let result = worker.run_case(&suite, &suite.cases[0]).await;
        assert_eq!(result.status, CaseStatus::Error);
    }

    #[tokio::test]
    async fn test_run_suite_in_order() {
        let suite = suite(&[("a", "true"), ("b", "false"), ("c", "true")]);
        let results = GroupWorker::new(1).run_suite(&suite).await;
        let names: Vec<&str> = results.iter().map(|r| r.case.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(!results[1].is_success());
    }

    #[tokio::test]
    async fn test_run_paths_summary() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("test_good.yaml");
        let bad = dir.path().join("test_bad.yaml");
        suite(&[("a", "true"), ("b", "true")]).save(&good).unwrap();
        suite(&[("c", "false")]).save(&bad).unwrap();

        let summary = GroupWorker::new(2).run_paths(&[good.clone()]).await;
        assert!(summary.is_all_passed());
        assert_eq!(summary.total, 2);

        let summary = GroupWorker::new(2).run_paths(&[good, bad]).await;
        assert!(!summary.is_all_passed());
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn test_unloadable_suite_counts_as_error() {
        let dir = tempdir().unwrap();
        let summary = GroupWorker::new(0)
            .run_paths(&[dir.path().join("test_missing.yaml")])
            .await;
        assert_eq!(summary.errors, 1);
        assert!(!summary.is_all_passed());
    }

    #[tokio::test]
    async fn test_non_utf8_suite_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"test_\xe9.yaml"));
        suite(&[("ok", "true")]).save(&path).unwrap();

        let summary = GroupWorker::new(0).run_paths(&[path]).await;
        assert_eq!(summary.passed, 1);
        assert!(summary.is_all_passed());
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            CaseResult::pass("S", "a", 1),
            CaseResult::fail("S", "b", 2, "exit status: 1"),
            CaseResult::error("S", "c", "spawn failed"),
        ];
        let summary = GroupRunSummary::new(0, results, 3);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_empty_group_passes() {
        let summary = GroupRunSummary::new(0, Vec::new(), 0);
        assert!(summary.is_all_passed());
    }
}
