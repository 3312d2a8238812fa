//! Process-isolated group dispatch
//!
//! Every group runs in its own child process so that a crash, abort or
//! resource exhaustion in one group cannot take down another. All workers are
//! launched together and joined together; there is no fail-fast and no
//! timeout.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::models::{GroupOutcome, SuiteFile, TestGroup, TestUnit};
use crate::utils::Timer;

/// Builds the worker process for one group.
///
/// `units` are the group's members, in group order. The launcher knows the
/// concrete unit type and decides how to hand the units to the worker. For
/// simple setups a closure `Fn(usize, &[U]) -> Command` can act as a
/// launcher.
pub trait WorkerLauncher<U> {
    fn command(&self, group_index: usize, units: &[U]) -> Command;
}

impl<U, F> WorkerLauncher<U> for F
where
    F: Fn(usize, &[U]) -> Command,
{
    fn command(&self, group_index: usize, units: &[U]) -> Command {
        self(group_index, units)
    }
}

/// Launches workers by re-invoking the current executable with the hidden
/// `worker` subcommand
#[derive(Clone, Debug)]
pub struct SelfLauncher {
    exe: PathBuf,
    shell: String,
    stdout_to_stderr: bool,
}

impl SelfLauncher {
    /// Create a launcher for the running binary
    pub fn new() -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate current executable")?;
        Ok(Self {
            exe,
            shell: "sh".to_string(),
            stdout_to_stderr: false,
        })
    }

    /// Shell used by workers to run case commands
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Send worker stdout to our stderr, keeping stdout free for a
    /// structured report
    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }
}

/// Suites are passed as raw paths, so file names that are not valid UTF-8
/// reach the worker unchanged
impl WorkerLauncher<SuiteFile> for SelfLauncher {
    fn command(&self, group_index: usize, units: &[SuiteFile]) -> Command {
        let mut command = Command::new(&self.exe);
        command
            .arg("worker")
            .arg("--group")
            .arg(group_index.to_string())
            .arg("--shell")
            .arg(&self.shell)
            .arg("--")
            .args(units.iter().map(|suite| suite.path.as_os_str()));
        if self.stdout_to_stderr {
            command.stdout(Stdio::from(std::io::stderr()));
        }
        command
    }
}

/// Fans groups out to worker processes and collects one outcome per group
pub struct WorkerDispatcher<L> {
    launcher: L,
}

impl<L> WorkerDispatcher<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    /// Run every group in its own process and wait for all of them.
    ///
    /// Outcomes come back in the order of `groups`, each tagged with its
    /// group index. A worker that cannot be spawned, exits non-zero or dies
    /// from a signal yields a failed outcome.
    pub async fn dispatch<U>(&self, groups: &[TestGroup<U>]) -> Vec<GroupOutcome>
    where
        U: TestUnit,
        L: WorkerLauncher<U>,
    {
        info!("Dispatching {} groups to worker processes", groups.len());
        let timer = Timer::start();

        let mut indices = Vec::with_capacity(groups.len());
        let mut handles = Vec::with_capacity(groups.len());

        for group in groups {
            let index = group.index();
            let mut command = self.launcher.command(index, group.units());
            command.stdin(Stdio::null());

            let ids: Vec<&str> = group.units().iter().map(|u| u.id()).collect();
            debug!("Launching worker for Group-{}: {}", index, ids.join(", "));
            indices.push(index);
            handles.push(tokio::spawn(run_worker(index, command)));
        }

        let outcomes: Vec<GroupOutcome> = join_all(handles)
            .await
            .into_iter()
            .zip(indices)
            .map(|(joined, index)| match joined {
                Ok(success) => GroupOutcome::new(index, success),
                Err(e) => {
                    error!("Group-{} worker task failed: {}", index, e);
                    GroupOutcome::new(index, false)
                }
            })
            .collect();

        info!(
            "All {} workers finished in {}ms",
            outcomes.len(),
            timer.elapsed_ms()
        );

        outcomes
    }
}

/// Spawn one worker and wait for it; true iff it exited with status 0
async fn run_worker(index: usize, mut command: Command) -> bool {
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!("Group-{} failed to launch worker: {}", index, e);
            return false;
        }
    };

    match child.wait().await {
        Ok(status) if status.success() => {
            debug!("Group-{} worker succeeded", index);
            true
        }
        Ok(status) => {
            match status.code() {
                Some(code) => warn!("Group-{} worker exited with code {}", index, code),
                None => warn!("Group-{} worker terminated abnormally ({})", index, status),
            }
            false
        }
        Err(e) => {
            error!("Group-{} failed waiting for worker: {}", index, e);
            false
        }
    }
}
