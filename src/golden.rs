//! Offline generation of golden traces with the reference simulator.
//!
//! Not part of a validation run: it populates the store the level-2
//! comparison reads from.

use crate::compare::{golden_dir, golden_traces, traces_in};
use crate::config::GoldenConfig;
use crate::runner::{Invocation, Runner};
use crate::types::CaseLocation;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

pub const BUILD_OUTPUT_DIR: &str = "sim_build";
const STDERR_EXCERPT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    GoldenExists,
    NoMakefile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoldenOutcome {
    Generated(Vec<PathBuf>),
    Skipped(SkipReason),
    Failed(String),
}

impl GoldenOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, GoldenOutcome::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoldenTally {
    pub succeeded: usize,
    pub failed: usize,
}

fn excerpt(text: &str) -> String {
    text.chars().take(STDERR_EXCERPT).collect()
}

pub struct GoldenGenerator<'a, R: Runner> {
    runner: &'a R,
    config: &'a GoldenConfig,
}

impl<'a, R: Runner> GoldenGenerator<'a, R> {
    pub fn new(runner: &'a R, config: &'a GoldenConfig) -> Self {
        Self { runner, config }
    }

    pub fn generate(&self, location: &CaseLocation) -> GoldenOutcome {
        if !self.config.force && !golden_traces(&self.config.golden_root, &location.name).is_empty()
        {
            return GoldenOutcome::Skipped(SkipReason::GoldenExists);
        }
        if self.runner.locate(&self.config.tools.verilator).is_none() {
            return GoldenOutcome::Failed(format!(
                "{} not found on PATH",
                self.config.tools.verilator
            ));
        }
        if !location.path.join("Makefile").is_file() {
            return GoldenOutcome::Skipped(SkipReason::NoMakefile);
        }

        let outcome = self.build_and_copy(location);
        self.clean(location);
        outcome
    }

    fn build_and_copy(&self, location: &CaseLocation) -> GoldenOutcome {
        info!(case = %location.name, "generating golden trace");
        let inv = Invocation::new(&self.config.tools.make, self.config.timeout)
            .args(["SIM=verilator", "WAVES=1"])
            .current_dir(&location.path);
        let out = self.runner.run(&inv);
        if let Some(e) = &out.dispatch_error {
            return GoldenOutcome::Failed(e.to_string());
        }
        if out.exit_code != Some(0) {
            return GoldenOutcome::Failed(excerpt(&out.stderr));
        }

        let mut produced = traces_in(&location.path.join(BUILD_OUTPUT_DIR));
        produced.extend(traces_in(&location.path));
        if produced.is_empty() {
            return GoldenOutcome::Failed("no VCD file generated".to_string());
        }

        let dest_dir = golden_dir(&self.config.golden_root, &location.name);
        if let Err(e) = fs::create_dir_all(&dest_dir) {
            return GoldenOutcome::Failed(format!("failed to create {}: {e}", dest_dir.display()));
        }
        let mut copied = Vec::new();
        for trace in produced {
            let Some(file_name) = trace.file_name() else {
                continue;
            };
            let dest = dest_dir.join(file_name);
            if let Err(e) = fs::copy(&trace, &dest) {
                return GoldenOutcome::Failed(format!(
                    "failed to copy {} to {}: {e}",
                    trace.display(),
                    dest.display()
                ));
            }
            debug!(from = %trace.display(), to = %dest.display(), "copied golden trace");
            copied.push(dest);
        }
        GoldenOutcome::Generated(copied)
    }

    // Best effort; a failing clean never changes the outcome.
    fn clean(&self, location: &CaseLocation) {
        let inv = Invocation::new(&self.config.tools.make, self.config.clean_timeout)
            .arg("clean")
            .current_dir(&location.path);
        let out = self.runner.run(&inv);
        if !out.succeeded() {
            warn!(case = %location.name, exit = ?out.exit_code, "make clean did not succeed");
        }
    }

    pub fn generate_all<F>(&self, locations: &[CaseLocation], mut on_outcome: F) -> GoldenTally
    where
        F: FnMut(&CaseLocation, &GoldenOutcome),
    {
        let mut tally = GoldenTally::default();
        for location in locations {
            let outcome = self.generate(location);
            on_outcome(location, &outcome);
            if outcome.is_success() {
                tally.succeeded += 1;
            } else {
                tally.failed += 1;
            }
        }
        tally
    }
}
