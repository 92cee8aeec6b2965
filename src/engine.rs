use crate::classify::classify;
use crate::compare::TraceComparator;
use crate::config::HarnessConfig;
use crate::dispatch::Dispatcher;
use crate::report::{Aggregator, RunSummary};
use crate::runner::{Invocation, Runner};
use crate::types::{CaseLocation, CaseResult, Level, ReferenceRun, Status, Strategy};
use chrono::Utc;
use tracing::{debug, info};

pub const UNKNOWN_VERSION: &str = "unknown";
pub const REFERENCE_SIMULATOR: &str = "verilator";

/// Runs cases one after another and folds their results into a summary.
pub struct Harness<'a, R: Runner> {
    runner: &'a R,
    config: &'a HarnessConfig,
}

impl<'a, R: Runner> Harness<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig) -> Self {
        Self { runner, config }
    }

    /// Version string reported by the tool under test, or `"unknown"`.
    pub fn tool_version(&self) -> String {
        let inv = Invocation::new(&self.config.tools.ryusim, self.config.version_timeout)
            .arg("--version");
        let out = self.runner.run(&inv);
        if out.dispatch_error.is_some() {
            return UNKNOWN_VERSION.to_string();
        }
        let stdout = out.stdout.trim();
        let version = if stdout.is_empty() { out.stderr.trim() } else { stdout };
        if version.is_empty() {
            UNKNOWN_VERSION.to_string()
        } else {
            version.to_string()
        }
    }

    /// Runs one case start to finish, including the level-2 comparison and
    /// the optional reference run. Always yields a result.
    pub fn run_case(&self, location: &CaseLocation) -> CaseResult {
        let dispatched = Dispatcher::new(self.runner, self.config).dispatch(location);
        let mut status = classify(
            &dispatched.outcome,
            dispatched.strategy,
            dispatched.expected_message.as_deref(),
        );
        debug!(case = %location.name, strategy = ?dispatched.strategy, exit = ?dispatched.outcome.exit_code, %status, "classified");

        if self.config.level == Level::Trace && status == Status::Passed {
            let comparison = TraceComparator::new(self.runner, self.config).compare(location);
            debug!(case = %location.name, ?comparison, "trace comparison");
            status = comparison.apply(status);
        }

        let reference = (self.config.reference_compare
            && dispatched.strategy == Strategy::FullRun
            && status == Status::Passed)
            .then(|| self.run_reference(location));

        CaseResult {
            test: location.name.clone(),
            path: location.path.clone(),
            category: location.category.clone(),
            level: self.config.level,
            status,
            duration: dispatched.outcome.elapsed.as_secs_f64(),
            stdout: dispatched.outcome.stdout,
            stderr: dispatched.outcome.stderr,
            reference,
        }
    }

    /// Re-runs a design under the reference simulator. Informational only.
    fn run_reference(&self, location: &CaseLocation) -> ReferenceRun {
        let mut inv = Invocation::new(&self.config.tools.make, self.config.timeout)
            .arg(format!("SIM={REFERENCE_SIMULATOR}"))
            .current_dir(&location.path);
        if let Some(target) = &self.config.make_target {
            inv = inv.arg(target);
        }
        let out = self.runner.run(&inv);
        let status = match (&out.dispatch_error, out.exit_code) {
            (Some(_), _) | (None, None) => Status::Error,
            (None, Some(0)) => Status::Passed,
            (None, Some(_)) => Status::Failed,
        };
        ReferenceRun {
            simulator: REFERENCE_SIMULATOR.to_string(),
            status,
            elapsed: out.elapsed.as_secs_f64(),
        }
    }

    /// Runs every location in order. `on_result` sees each result as soon as
    /// it is final.
    pub fn run<F>(&self, locations: &[CaseLocation], on_result: F) -> RunSummary
    where
        F: FnMut(&CaseResult),
    {
        self.run_with_version(self.tool_version(), locations, on_result)
    }

    /// Like [`Harness::run`], for callers that probed the version up front.
    pub fn run_with_version<F>(
        &self,
        version: String,
        locations: &[CaseLocation],
        mut on_result: F,
    ) -> RunSummary
    where
        F: FnMut(&CaseResult),
    {
        info!(version = %version, cases = locations.len(), level = self.config.level.number(), "starting run");
        let timestamp = Utc::now().to_rfc3339();
        let mut aggregator = Aggregator::new(self.config.level);
        for location in locations {
            let result = self.run_case(location);
            on_result(&result);
            aggregator.push(result);
        }
        aggregator.finish(version, timestamp)
    }
}
