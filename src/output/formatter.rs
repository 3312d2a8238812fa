//! Output formatters for run reports
//!
//! Text output reproduces the classic `[Grouped Tests]` / `[Test Results]`
//! layout; JSON and CSV are meant for downstream automation.

use anyhow::{Context, Result};

use crate::models::{GroupStatus, SuiteFile, TestGroup};
use crate::results::{GroupComposition, RunReport};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    JsonPretty,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    /// Whether the composition is printed before dispatch. Structured
    /// formats emit a single document after the run instead.
    pub fn streams_composition(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Report formatter
#[derive(Clone, Debug)]
pub struct ReportFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: false,
        }
    }

    /// Color OK/NG markers in text output
    pub fn with_color(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Pre-run composition section
    pub fn format_composition(&self, groups: &[GroupComposition]) -> String {
        let mut output = String::from("[Grouped Tests]\n");
        for group in groups {
            output.push_str(&format!(
                "Group-{}: {} classes, {} cases\n",
                group.index, group.classes, group.cases
            ));
        }
        output
    }

    /// Post-run report in the configured format
    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(self.format_report_text(report)),
            OutputFormat::Json => {
                serde_json::to_string(report).context("Failed to serialize report")
            }
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(report).context("Failed to serialize report")
            }
            OutputFormat::Csv => self.format_report_csv(report),
        }
    }

    fn format_report_text(&self, report: &RunReport) -> String {
        let mut output = String::from("[Test Results]\n");
        for group in &report.groups {
            output.push_str(&format!(
                "Group-{}: {}\n",
                group.index,
                self.status_label(group.status)
            ));
        }
        output
    }

    fn status_label(&self, status: GroupStatus) -> String {
        match (self.colorize, status) {
            (false, _) => status.to_string(),
            (true, GroupStatus::Ok) => format!("\x1b[32m{status}\x1b[0m"),
            (true, GroupStatus::Ng) => format!("\x1b[31m{status}\x1b[0m"),
        }
    }

    fn format_report_csv(&self, report: &RunReport) -> Result<String> {
        let rows = report.groups.iter().map(|group| {
            vec![
                group.index.to_string(),
                group.classes.to_string(),
                group.cases.to_string(),
                group.status.to_string(),
            ]
        });
        write_csv(&["group", "classes", "cases", "status"], rows)
    }

    /// Composition as CSV, one row per group
    pub fn format_composition_csv(&self, groups: &[GroupComposition]) -> Result<String> {
        let rows = groups.iter().map(|group| {
            vec![
                group.index.to_string(),
                group.classes.to_string(),
                group.cases.to_string(),
            ]
        });
        write_csv(&["group", "classes", "cases"], rows)
    }

    /// Partition plan with the suites in each group
    pub fn format_plan(&self, groups: &[TestGroup<SuiteFile>]) -> String {
        let mut output = String::new();
        for group in groups {
            output.push_str(&format!("{group}\n"));
            for suite in group.units() {
                let detail = match &suite.load_error {
                    None => format!("{} cases", suite.case_count()),
                    Some(_) => "unloadable".to_string(),
                };
                output.push_str(&format!("  - {} ({detail})\n", suite.path.display()));
            }
        }
        output
    }
}

fn write_csv(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {e}"))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::report::GroupResult;

    fn report() -> RunReport {
        RunReport::new(vec![
            GroupResult {
                index: 0,
                classes: 3,
                cases: 27,
                status: GroupStatus::Ok,
            },
            GroupResult {
                index: 1,
                classes: 2,
                cases: 26,
                status: GroupStatus::Ng,
            },
        ])
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("TEXT"), Some(OutputFormat::Text));
        assert_eq!(
            OutputFormat::from_str("json-pretty"),
            Some(OutputFormat::JsonPretty)
        );
        assert_eq!(OutputFormat::from_str("csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_str("xml"), None);
        assert!(OutputFormat::Text.streams_composition());
        assert!(!OutputFormat::Json.streams_composition());
    }

    #[test]
    fn test_format_composition() {
        let formatter = ReportFormatter::new(OutputFormat::Text);
        let groups = [
            GroupComposition {
                index: 0,
                classes: 3,
                cases: 27,
            },
            GroupComposition {
                index: 1,
                classes: 2,
                cases: 26,
            },
        ];
        assert_eq!(
            formatter.format_composition(&groups),
            "[Grouped Tests]\nGroup-0: 3 classes, 27 cases\nGroup-1: 2 classes, 26 cases\n"
        );
    }

    #[test]
    fn test_format_report_text() {
        let formatter = ReportFormatter::new(OutputFormat::Text);
        assert_eq!(
            formatter.format_report(&report()).unwrap(),
            "[Test Results]\nGroup-0: OK\nGroup-1: NG\n"
        );
    }

    #[test]
    fn test_format_report_colored() {
        let formatter = ReportFormatter::new(OutputFormat::Text).with_color(true);
        let output = formatter.format_report(&report()).unwrap();
        assert!(output.contains("\x1b[32mOK\x1b[0m"));
        assert!(output.contains("\x1b[31mNG\x1b[0m"));
    }

    #[test]
    fn test_format_report_json() {
        let formatter = ReportFormatter::new(OutputFormat::Json);
        let output = formatter.format_report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["groups"][1]["status"], "NG");
        assert_eq!(value["groups"][0]["cases"], 27);
    }

    #[test]
    fn test_format_composition_csv() {
        let formatter = ReportFormatter::new(OutputFormat::Csv);
        let groups = [GroupComposition {
            index: 0,
            classes: 3,
            cases: 27,
        }];
        assert_eq!(
            formatter.format_composition_csv(&groups).unwrap(),
            "group,classes,cases\n0,3,27\n"
        );
    }

    #[test]
    fn test_plan_marks_unloadable_suite() {
        let broken = SuiteFile::unloadable("tests/test_broken.yaml", "Invalid YAML");
        let plan = ReportFormatter::new(OutputFormat::Text)
            .format_plan(&[TestGroup::new(0, vec![broken])]);
        assert_eq!(
            plan,
            "Group-0: 1 classes, 1 cases\n  - tests/test_broken.yaml (unloadable)\n"
        );
    }

    #[test]
    fn test_format_report_csv() {
        let formatter = ReportFormatter::new(OutputFormat::Csv);
        assert_eq!(
            formatter.format_report(&report()).unwrap(),
            "group,classes,cases,status\n0,3,27,OK\n1,2,26,NG\n"
        );
    }
}
