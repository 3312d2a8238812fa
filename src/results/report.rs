//! Run report aggregation
//!
//! The composition section is written before dispatch, the status section
//! after every worker has been joined. Outcomes are matched back to their
//! groups by index, so completion order never leaks into the report.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, warn};

use crate::models::{GroupOutcome, GroupStatus, TestGroup, TestUnit};
use crate::output::ReportFormatter;

/// Size of one group as shown before dispatch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupComposition {
    pub index: usize,
    pub classes: usize,
    pub cases: u64,
}

impl<U: TestUnit> From<&TestGroup<U>> for GroupComposition {
    fn from(group: &TestGroup<U>) -> Self {
        Self {
            index: group.index(),
            classes: group.unit_count(),
            cases: group.total_cost(),
        }
    }
}

/// Final line for one group
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupResult {
    pub index: usize,
    pub classes: usize,
    pub cases: u64,
    pub status: GroupStatus,
}

/// Per-group statuses plus the overall verdict
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub success: bool,
    pub groups: Vec<GroupResult>,
}

impl RunReport {
    /// Build a report; the verdict is the AND of every group status and is
    /// vacuously true for no groups
    pub fn new(groups: Vec<GroupResult>) -> Self {
        let success = groups.iter().all(|g| g.status.is_success());
        Self { success, groups }
    }

    pub fn passed(&self) -> usize {
        self.groups.iter().filter(|g| g.status.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.groups.len() - self.passed()
    }
}

/// Composition of every group, in partition order
pub fn composition<U: TestUnit>(groups: &[TestGroup<U>]) -> Vec<GroupComposition> {
    groups.iter().map(GroupComposition::from).collect()
}

/// Pair each group with its outcome by index.
///
/// A group with no matching outcome is reported as NG.
pub fn collect<U: TestUnit>(groups: &[TestGroup<U>], outcomes: &[GroupOutcome]) -> RunReport {
    let by_index: HashMap<usize, GroupStatus> =
        outcomes.iter().map(|o| (o.index, o.status())).collect();

    let results = groups
        .iter()
        .map(|group| {
            let status = by_index.get(&group.index()).copied().unwrap_or_else(|| {
                warn!("No outcome reported for Group-{}", group.index());
                GroupStatus::Ng
            });
            GroupResult {
                index: group.index(),
                classes: group.unit_count(),
                cases: group.total_cost(),
                status,
            }
        })
        .collect();

    RunReport::new(results)
}

/// Writes the composition and status sections for one run
pub struct ResultAggregator<W> {
    formatter: ReportFormatter,
    out: W,
}

impl<W: Write> ResultAggregator<W> {
    pub fn new(formatter: ReportFormatter, out: W) -> Self {
        Self { formatter, out }
    }

    /// Emit the pre-run composition. Structured formats defer everything to
    /// `finish` so they produce a single document.
    pub fn announce<U: TestUnit>(&mut self, groups: &[TestGroup<U>]) -> Result<()> {
        if !self.formatter.format().streams_composition() {
            return Ok(());
        }

        let text = self.formatter.format_composition(&composition(groups));
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .context("Failed to write group composition")
    }

    /// Emit the post-run statuses and return the report
    pub fn finish<U: TestUnit>(
        &mut self,
        groups: &[TestGroup<U>],
        outcomes: &[GroupOutcome],
    ) -> Result<RunReport> {
        let report = collect(groups, outcomes);
        debug!(
            "Run finished: {} passed, {} failed",
            report.passed(),
            report.failed()
        );

        let mut text = self.formatter.format_report(&report)?;
        if !text.ends_with('\n') {
            text.push('\n');
        }
        self.out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
            .context("Failed to write test results")?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    struct Unit(u64);

    impl TestUnit for Unit {
        fn id(&self) -> &str {
            "unit"
        }

        fn cost(&self) -> u64 {
            self.0
        }
    }

    fn groups() -> Vec<TestGroup<Unit>> {
        vec![
            TestGroup::new(0, vec![Unit(10), Unit(3)]),
            TestGroup::new(1, vec![Unit(9), Unit(4)]),
            TestGroup::new(2, vec![Unit(8), Unit(5), Unit(1)]),
        ]
    }

    /// Run both sections through an aggregator, returning the report and
    /// everything written
    fn render(
        format: OutputFormat,
        groups: &[TestGroup<Unit>],
        outcomes: &[GroupOutcome],
    ) -> (RunReport, String) {
        let mut out = Vec::new();
        let report = {
            let mut aggregator = ResultAggregator::new(ReportFormatter::new(format), &mut out);
            aggregator.announce(groups).unwrap();
            aggregator.finish(groups, outcomes).unwrap()
        };
        (report, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_composition() {
        let composition = composition(&groups());
        assert_eq!(
            composition[2],
            GroupComposition {
                index: 2,
                classes: 3,
                cases: 14
            }
        );
    }

    #[test]
    fn test_faulted_group_reported_ng() {
        let outcomes = [
            GroupOutcome::new(0, true),
            GroupOutcome::new(1, false),
            GroupOutcome::new(2, true),
        ];
        let (report, output) = render(OutputFormat::Text, &groups(), &outcomes);
        assert!(!report.success);
        assert_eq!(
            output,
            "[Grouped Tests]\n\
             Group-0: 2 classes, 13 cases\n\
             Group-1: 2 classes, 13 cases\n\
             Group-2: 3 classes, 14 cases\n\
             [Test Results]\n\
             Group-0: OK\n\
             Group-1: NG\n\
             Group-2: OK\n"
        );
    }

    #[test]
    fn test_outcomes_reordered_by_index() {
        let outcomes = [
            GroupOutcome::new(2, false),
            GroupOutcome::new(0, true),
            GroupOutcome::new(1, true),
        ];
        let report = collect(&groups(), &outcomes);
        let statuses: Vec<GroupStatus> = report.groups.iter().map(|g| g.status).collect();
        assert_eq!(statuses, [GroupStatus::Ok, GroupStatus::Ok, GroupStatus::Ng]);
        assert!(!report.success);
    }

    #[test]
    fn test_missing_outcome_is_ng() {
        let report = collect(&groups(), &[GroupOutcome::new(0, true)]);
        assert_eq!(report.groups[1].status, GroupStatus::Ng);
        assert_eq!(report.failed(), 2);
        assert!(!report.success);
    }

    #[test]
    fn test_all_ok() {
        let outcomes: Vec<GroupOutcome> = (0..3).map(|i| GroupOutcome::new(i, true)).collect();
        let report = collect(&groups(), &outcomes);
        assert!(report.success);
        assert_eq!(report.passed(), 3);
    }

    #[test]
    fn test_empty_run_is_success() {
        let report = collect::<Unit>(&[], &[]);
        assert!(report.success);
        assert!(report.groups.is_empty());
    }

    #[test]
    fn test_selected_groups_keep_index() {
        let selected = vec![TestGroup::new(3, vec![Unit(2)])];
        let (_, output) = render(OutputFormat::Text, &selected, &[GroupOutcome::new(3, true)]);
        assert!(output.contains("Group-3: 1 classes, 2 cases\n"));
        assert!(output.contains("Group-3: OK\n"));
    }

    #[test]
    fn test_json_skips_composition() {
        let all = groups();
        let (report, output) =
            render(OutputFormat::Json, &all[..1], &[GroupOutcome::new(0, true)]);
        assert!(report.success);

        assert!(!output.contains("[Grouped Tests]"));
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["groups"][0]["classes"], 2);
    }
}
