use crate::case::load_case_config;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::runner::{Invocation, Runner};
use crate::types::{CaseConfig, CaseLocation, ExecutionOutcome, Strategy};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

pub const EXPECTED_ERROR_FILE: &str = "expected_error.txt";

/// Everything the classifier needs to know about one executed case.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub config: Option<CaseConfig>,
    pub strategy: Strategy,
    pub outcome: ExecutionOutcome,
    /// Message the tool must print when rejecting an expect-fail case.
    pub expected_message: Option<String>,
}

/// Chooses and runs the execution strategy for a single case.
pub struct Dispatcher<'a, R: Runner> {
    runner: &'a R,
    config: &'a HarnessConfig,
}

/// Source file handed to the compiler for compile-only runs: the first of
/// `rtl/*.sv`, `rtl/*.v`, then `*.sv`, `*.v`.
pub fn find_source(case_dir: &Path) -> Option<PathBuf> {
    let by_ext = |dir: &Path, ext: &str| -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == ext))
                .collect(),
            Err(_) => Vec::new(),
        };
        found.sort();
        found
    };
    let rtl = case_dir.join("rtl");
    let searches: [(&Path, &str); 4] = [(&rtl, "sv"), (&rtl, "v"), (case_dir, "sv"), (case_dir, "v")];
    searches
        .into_iter()
        .flat_map(|(dir, ext)| by_ext(dir, ext))
        .next()
}

/// Trimmed content of `expected_error.txt`. An empty file is treated as absent.
pub fn read_expected_message(case_dir: &Path) -> Result<Option<String>, HarnessError> {
    match fs::read_to_string(case_dir.join(EXPECTED_ERROR_FILE)) {
        Ok(text) => {
            let text = text.trim();
            Ok((!text.is_empty()).then(|| text.to_string()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HarnessError::ExpectedMessageUnreadable(e.to_string())),
    }
}

impl<'a, R: Runner> Dispatcher<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig) -> Self {
        Self { runner, config }
    }

    pub fn strategy_for(&self, location: &CaseLocation, case: &CaseConfig) -> Strategy {
        let by_category = self
            .config
            .expect_fail_category
            .as_deref()
            .is_some_and(|c| c == location.category);
        if by_category || case.expect_fail {
            Strategy::ExpectFail
        } else {
            Strategy::FullRun
        }
    }

    pub fn dispatch(&self, location: &CaseLocation) -> Dispatched {
        let start = Instant::now();
        let case = match load_case_config(&location.path) {
            Ok(case) => case,
            Err(e) => {
                debug!(case = %location.name, error = %e, "config unusable");
                return Dispatched {
                    config: None,
                    strategy: Strategy::FullRun,
                    outcome: ExecutionOutcome::from_error(e, start.elapsed()),
                    expected_message: None,
                };
            }
        };

        let strategy = self.strategy_for(location, &case);
        let (outcome, expected_message) = match strategy {
            Strategy::ExpectFail => match read_expected_message(&location.path) {
                Ok(message) => (self.compile_only(location, &case), message),
                Err(e) => (ExecutionOutcome::from_error(e, start.elapsed()), None),
            },
            Strategy::FullRun => (self.full_run(location), None),
        };
        Dispatched {
            config: Some(case),
            strategy,
            outcome,
            expected_message,
        }
    }

    fn compile_only(&self, location: &CaseLocation, case: &CaseConfig) -> ExecutionOutcome {
        let start = Instant::now();
        let Some(source) = find_source(&location.path) else {
            return ExecutionOutcome::from_error(HarnessError::MissingSource, start.elapsed());
        };
        // Relative to the case directory, which is also the working directory.
        let source = source
            .strip_prefix(&location.path)
            .map(Path::to_path_buf)
            .unwrap_or(source);
        let inv = Invocation::new(&self.config.tools.ryusim, self.config.timeout)
            .arg("compile")
            .arg(source.to_string_lossy())
            .arg("--top")
            .arg(&case.top_module)
            .current_dir(&location.path);
        self.runner.run(&inv)
    }

    fn full_run(&self, location: &CaseLocation) -> ExecutionOutcome {
        let mut inv = Invocation::new(&self.config.tools.make, self.config.timeout)
            .current_dir(&location.path);
        if let Some(target) = &self.config.make_target {
            inv = inv.arg(target);
        }
        self.runner.run(&inv)
    }
}
