use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::runner::{Invocation, Runner};
use crate::types::{CaseLocation, Status};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const TRACE_EXTENSION: &str = "vcd";

/// Why a trace comparison did not produce a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skipped {
    NoProducedTrace,
    NoGoldenTrace,
    ToolUnavailable,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Match,
    Mismatch,
    Skipped(Skipped),
}

impl Comparison {
    /// Only a real mismatch downgrades; an absent artifact or an unusable
    /// comparison tool leaves the status alone.
    pub fn apply(self, status: Status) -> Status {
        match (self, status) {
            (Comparison::Mismatch, Status::Passed) => Status::Failed,
            _ => status,
        }
    }
}

fn is_trace(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|e| e == TRACE_EXTENSION)
}

/// First trace (in path order) written anywhere below the case directory,
/// ignoring anything that sits inside a `golden` directory.
pub fn find_produced_trace(case_dir: &Path) -> Option<PathBuf> {
    let mut traces: Vec<PathBuf> = WalkDir::new(case_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| is_trace(p))
        .filter(|p| {
            let rel = p.strip_prefix(case_dir).unwrap_or(p);
            !rel.components()
                .any(|c| matches!(c, Component::Normal(s) if s == "golden"))
        })
        .collect();
    traces.sort();
    traces.into_iter().next()
}

/// Directory of the golden store that mirrors `case_name`.
pub fn golden_dir(golden_root: &Path, case_name: &str) -> PathBuf {
    case_name
        .split('/')
        .fold(golden_root.to_path_buf(), |acc, part| acc.join(part))
}

/// Traces directly inside `dir`, sorted. A missing directory has none.
pub(crate) fn traces_in(dir: &Path) -> Vec<PathBuf> {
    let mut traces: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_trace(p))
            .collect(),
        Err(_) => Vec::new(),
    };
    traces.sort();
    traces
}

/// Every trace stored for a case, sorted. Empty when the store has nothing.
pub fn golden_traces(golden_root: &Path, case_name: &str) -> Vec<PathBuf> {
    traces_in(&golden_dir(golden_root, case_name))
}

/// Level-2 check of a produced trace against its golden counterpart.
pub struct TraceComparator<'a, R: Runner> {
    runner: &'a R,
    config: &'a HarnessConfig,
}

impl<'a, R: Runner> TraceComparator<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig) -> Self {
        Self { runner, config }
    }

    pub fn compare(&self, location: &CaseLocation) -> Comparison {
        let Some(golden) = golden_traces(&self.config.golden_root, &location.name)
            .into_iter()
            .next()
        else {
            debug!(case = %location.name, "no golden trace, skipping comparison");
            return Comparison::Skipped(Skipped::NoGoldenTrace);
        };
        let Some(produced) = find_produced_trace(&location.path) else {
            debug!(case = %location.name, "case produced no trace, skipping comparison");
            return Comparison::Skipped(Skipped::NoProducedTrace);
        };

        let inv = Invocation::new(&self.config.tools.vcddiff, self.config.compare_timeout)
            .arg(absolute(&produced).to_string_lossy())
            .arg(absolute(&golden).to_string_lossy())
            .current_dir(&location.path);
        let outcome = self.runner.run(&inv);
        match (&outcome.dispatch_error, outcome.exit_code) {
            (Some(HarnessError::Timeout { .. }), _) => Comparison::Skipped(Skipped::TimedOut),
            (Some(_), _) => Comparison::Skipped(Skipped::ToolUnavailable),
            (None, Some(0)) => Comparison::Match,
            (None, _) => {
                info!(case = %location.name, golden = %golden.display(), "trace differs from golden");
                Comparison::Mismatch
            }
        }
    }
}

// vcddiff runs inside the case directory, so relative store paths would not
// resolve there.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn produced_trace_ignores_golden_copies() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("golden")).unwrap();
        fs::create_dir_all(tmp.path().join("sim_build")).unwrap();
        fs::write(tmp.path().join("golden/a.vcd"), "").unwrap();
        fs::write(tmp.path().join("sim_build/dump.vcd"), "").unwrap();
        assert_eq!(
            find_produced_trace(tmp.path()),
            Some(tmp.path().join("sim_build/dump.vcd"))
        );
    }

    #[test]
    fn golden_store_mirrors_case_path() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("sequential/basic_flops/d_ff");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("dump.vcd"), "").unwrap();
        fs::write(dir.join("readme.md"), "").unwrap();
        assert_eq!(
            golden_traces(tmp.path(), "sequential/basic_flops/d_ff"),
            vec![dir.join("dump.vcd")]
        );
        assert!(golden_traces(tmp.path(), "sequential/other").is_empty());
    }

    #[test]
    fn traces_in_is_shallow_and_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("sim_build")).unwrap();
        fs::write(tmp.path().join("b.vcd"), "").unwrap();
        fs::write(tmp.path().join("a.vcd"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        fs::write(tmp.path().join("sim_build/deep.vcd"), "").unwrap();
        assert_eq!(
            traces_in(tmp.path()),
            vec![tmp.path().join("a.vcd"), tmp.path().join("b.vcd")]
        );
        assert!(traces_in(&tmp.path().join("absent")).is_empty());
    }

    #[test]
    fn only_mismatch_downgrades() {
        assert_eq!(Comparison::Mismatch.apply(Status::Passed), Status::Failed);
        assert_eq!(Comparison::Match.apply(Status::Passed), Status::Passed);
        assert_eq!(
            Comparison::Skipped(Skipped::NoGoldenTrace).apply(Status::Passed),
            Status::Passed
        );
        assert_eq!(
            Comparison::Skipped(Skipped::TimedOut).apply(Status::Passed),
            Status::Passed
        );
    }
}
