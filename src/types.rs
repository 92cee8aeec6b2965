use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::HarnessError;

/// Validation depth: structural pass/fail, or structural plus trace comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    #[default]
    Structural,
    Trace,
}

impl Level {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Level::Structural),
            2 => Some(Level::Trace),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Level::Structural => 1,
            Level::Trace => 2,
        }
    }
}

impl Serialize for Level {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed,
    ExpectedFail,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::ExpectedFail => "expected_fail",
            Status::Error => "error",
        }
    }

    /// Whether this status counts against the run's exit signal.
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failed | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed contents of a case's `config.yaml`, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseConfig {
    pub top_module: String,
    pub description: Option<String>,
    pub expect_fail: bool,
    pub enabled: bool,
}

pub const DEFAULT_TOP_MODULE: &str = "dut";

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            top_module: DEFAULT_TOP_MODULE.to_string(),
            description: None,
            expect_fail: false,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseLocation {
    pub path: PathBuf,
    /// First path segment below the cases root.
    pub category: String,
    /// Path relative to the cases root, `/`-separated.
    pub name: String,
}

impl CaseLocation {
    /// Last path segment, used by the benchmark runner to select designs.
    pub fn leaf_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Which of the two execution strategies a case runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Compile only; the tool is expected to reject the input.
    ExpectFail,
    /// Build and simulate through the case's Makefile.
    FullRun,
}

/// Raw result of one external invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// `None` when the process never completed normally.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
    pub dispatch_error: Option<HarnessError>,
}

impl ExecutionOutcome {
    pub fn from_error(error: HarnessError, elapsed: Duration) -> Self {
        Self {
            exit_code: None,
            elapsed,
            stdout: String::new(),
            stderr: error.to_string(),
            dispatch_error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.dispatch_error.is_none() && self.exit_code == Some(0)
    }
}

/// Outcome of re-running a benchmark under the reference simulator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRun {
    pub simulator: String,
    pub status: Status,
    pub elapsed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub test: String,
    pub path: PathBuf,
    pub category: String,
    pub level: Level,
    pub status: Status,
    /// Wall-clock seconds.
    pub duration: f64,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceRun>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub expected_fail: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::ExpectedFail => self.expected_fail += 1,
            Status::Error => self.error += 1,
        }
    }
}
