#![allow(dead_code)]

use ryusim_harness::case::CONFIG_FILE;
use ryusim_harness::error::HarnessError;
use ryusim_harness::runner::{Invocation, Runner};
use ryusim_harness::types::ExecutionOutcome;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

type Script = Box<dyn Fn(&Invocation) -> ExecutionOutcome>;

/// Answers invocations from a closure and remembers what it was asked to run.
pub struct ScriptedRunner {
    script: Script,
    pub calls: RefCell<Vec<Invocation>>,
    pub on_path: Vec<String>,
}

impl ScriptedRunner {
    pub fn new(script: impl Fn(&Invocation) -> ExecutionOutcome + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: RefCell::new(Vec::new()),
            on_path: vec!["verilator".to_string()],
        }
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }
}

impl Runner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> ExecutionOutcome {
        self.calls.borrow_mut().push(invocation.clone());
        (self.script)(invocation)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.on_path
            .iter()
            .any(|p| p == program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}

pub fn exited(code: i32) -> ExecutionOutcome {
    ExecutionOutcome {
        exit_code: Some(code),
        elapsed: Duration::from_millis(10),
        ..ExecutionOutcome::default()
    }
}

pub fn exited_with(code: i32, stdout: &str, stderr: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        ..exited(code)
    }
}

pub fn timed_out(what: &str) -> ExecutionOutcome {
    ExecutionOutcome::from_error(
        HarnessError::Timeout {
            what: what.to_string(),
            timeout: Duration::from_secs(300),
        },
        Duration::from_secs(300),
    )
}

pub fn missing(tool: &str) -> ExecutionOutcome {
    ExecutionOutcome::from_error(
        HarnessError::ToolMissing {
            tool: tool.to_string(),
        },
        Duration::ZERO,
    )
}

/// Creates `root/rel` with a `config.yaml` holding `config`.
pub fn make_case(root: &Path, rel: &str, config: &str) -> PathBuf {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(CONFIG_FILE), config).unwrap();
    dir
}

pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Name of the case directory an invocation ran in.
pub fn case_of(inv: &Invocation) -> String {
    inv.cwd
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
