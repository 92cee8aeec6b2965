use crate::types::{CaseResult, Level, Status, StatusCounts};
use anyhow::{Context, Result};
use colored::Colorize;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Collects results in arrival order and keeps the per-category tally.
#[derive(Debug, Default)]
pub struct Aggregator {
    level: Level,
    totals: StatusCounts,
    categories: IndexMap<String, StatusCounts>,
    results: Vec<CaseResult>,
}

impl Aggregator {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn push(&mut self, result: CaseResult) {
        self.totals.record(result.status);
        self.categories
            .entry(result.category.clone())
            .or_default()
            .record(result.status);
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn finish(self, tool_version: String, timestamp: String) -> RunSummary {
        RunSummary {
            counts: self.totals,
            level: self.level,
            tool_version,
            timestamp,
            categories: self.categories,
            results: self.results,
        }
    }
}

/// The terminal artifact of a run. Built once by [`Aggregator::finish`] and
/// read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    #[serde(flatten)]
    counts: StatusCounts,
    level: Level,
    tool_version: String,
    timestamp: String,
    categories: IndexMap<String, StatusCounts>,
    results: Vec<CaseResult>,
}

impl RunSummary {
    pub fn counts(&self) -> &StatusCounts {
        &self.counts
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn categories(&self) -> &IndexMap<String, StatusCounts> {
        &self.categories
    }

    pub fn results(&self) -> &[CaseResult] {
        &self.results
    }

    /// `expected_fail` counts as success; any `failed` or `error` does not.
    pub fn is_success(&self) -> bool {
        self.counts.failed == 0 && self.counts.error == 0
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize run summary")
    }

    /// Writes the report to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut text = self.to_json()?;
        text.push('\n');
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn paint_status(status: Status) -> String {
    let label = status.as_str();
    match status {
        Status::Passed => label.green().to_string(),
        Status::ExpectedFail => label.cyan().to_string(),
        Status::Failed => label.red().bold().to_string(),
        Status::Error => label.yellow().bold().to_string(),
    }
}

/// One line of verbose progress: `  <name>: <status> (<secs>s)`.
pub fn render_progress(result: &CaseResult) -> String {
    format!(
        "  {}: {} ({:.2}s)",
        result.test,
        paint_status(result.status),
        result.duration
    )
}

pub fn render_tally(summary: &RunSummary) -> String {
    let c = summary.counts();
    let failed = if c.failed > 0 {
        c.failed.to_string().red().bold().to_string()
    } else {
        c.failed.to_string().green().to_string()
    };
    let error = if c.error > 0 {
        c.error.to_string().yellow().bold().to_string()
    } else {
        c.error.to_string().green().to_string()
    };
    format!(
        "Total: {}, Passed: {}, Failed: {}, Expected fail: {}, Error: {}",
        c.total,
        c.passed.to_string().green(),
        failed,
        c.expected_fail.to_string().cyan(),
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn result(name: &str, category: &str, status: Status) -> CaseResult {
        CaseResult {
            test: name.into(),
            path: PathBuf::from("tests").join(name),
            category: category.into(),
            level: Level::Structural,
            status,
            duration: 0.5,
            stdout: String::new(),
            stderr: String::new(),
            reference: None,
        }
    }

    fn summary_of(results: Vec<CaseResult>) -> RunSummary {
        let mut agg = Aggregator::new(Level::Structural);
        for r in results {
            agg.push(r);
        }
        agg.finish("ryusim 1.0".into(), "2026-01-01T00:00:00+00:00".into())
    }

    #[test]
    fn category_totals_add_up() {
        let summary = summary_of(vec![
            result("combinational/a", "combinational", Status::Passed),
            result("combinational/b", "combinational", Status::Failed),
            result("unsupported/c", "unsupported", Status::ExpectedFail),
            result("sequential/d", "sequential", Status::Error),
        ]);
        let mut sum = 0;
        for counts in summary.categories().values() {
            assert_eq!(
                counts.total,
                counts.passed + counts.failed + counts.expected_fail + counts.error
            );
            sum += counts.total;
        }
        assert_eq!(sum, summary.counts().total);
        assert_eq!(summary.counts().total, 4);
        let order: Vec<&str> = summary.categories().keys().map(String::as_str).collect();
        assert_eq!(order, vec!["combinational", "unsupported", "sequential"]);
        assert!(!summary.is_success());
    }

    #[test]
    fn expected_fail_is_success() {
        let summary = summary_of(vec![
            result("a", "unsupported", Status::ExpectedFail),
            result("b", "combinational", Status::Passed),
        ]);
        assert!(summary.is_success());
    }

    #[test]
    fn json_has_report_shape() {
        let summary = summary_of(vec![result("combinational/a", "combinational", Status::Passed)]);
        let value: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["passed"], 1);
        assert_eq!(value["expected_fail"], 0);
        assert_eq!(value["level"], 1);
        assert_eq!(value["tool_version"], "ryusim 1.0");
        assert_eq!(value["categories"]["combinational"]["total"], 1);
        assert_eq!(value["results"][0]["test"], "combinational/a");
        assert_eq!(value["results"][0]["status"], "passed");
        assert_eq!(value["results"][0]["path"], "tests/combinational/a");
        assert!(value["results"][0].get("reference").is_none());
    }

    #[test]
    fn writes_report_creating_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("reports/nested/run.json");
        let summary = summary_of(vec![]);
        summary.write_to(&out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(summary.is_success());
    }

    #[test]
    fn progress_line_mentions_name_and_status() {
        colored::control::set_override(false);
        let line = render_progress(&result("hierarchy/x", "hierarchy", Status::Failed));
        assert_eq!(line, "  hierarchy/x: failed (0.50s)");
    }
}
