use crate::error::HarnessError;
use crate::types::ExecutionOutcome;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// How long to wait for output pipes to close once the child is gone.
const PIPE_GRACE: Duration = Duration::from_secs(5);

/// One bounded external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// `program` plus its first argument, e.g. `ryusim compile`.
    pub fn label(&self) -> String {
        match self.args.first() {
            Some(first) if !first.contains(['/', '.', '=']) => {
                format!("{} {}", self.program, first)
            }
            _ => self.program.clone(),
        }
    }
}

/// Seam between the harness and the operating system. Every external call
/// goes through here so that the orchestration can be exercised with a
/// scripted implementation.
pub trait Runner {
    /// Runs the invocation to completion or until its timeout. Never fails:
    /// problems starting the process come back as a dispatch error.
    fn run(&self, invocation: &Invocation) -> ExecutionOutcome;

    /// Resolves a program on PATH.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

fn collect(rx: &mpsc::Receiver<Vec<u8>>) -> String {
    match rx.recv_timeout(PIPE_GRACE) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

// The child leads its own process group so a timeout can take down whatever
// it spawned (the simulator under `make`, say) along with it.
#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
        debug!(pid = child.id(), error = %e, "killpg failed, killing child only");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

impl Runner for ProcessRunner {
    fn run(&self, inv: &Invocation) -> ExecutionOutcome {
        let start = Instant::now();

        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &inv.cwd {
            cmd.current_dir(dir);
        }
        own_process_group(&mut cmd);

        debug!(command = %inv.program, args = ?inv.args, cwd = ?inv.cwd, "spawning");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return ExecutionOutcome::from_error(
                    HarnessError::ToolMissing {
                        tool: inv.program.clone(),
                    },
                    start.elapsed(),
                );
            }
            Err(e) => {
                return ExecutionOutcome::from_error(
                    HarnessError::Spawn {
                        tool: inv.program.clone(),
                        message: e.to_string(),
                    },
                    start.elapsed(),
                );
            }
        };

        // Drain both pipes while waiting so a chatty child can't block on a
        // full pipe buffer.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let waited = child.wait_timeout(inv.timeout);
        let status = match waited {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                warn!(command = %inv.label(), secs = inv.timeout.as_secs(), "timed out, killing");
                kill_tree(&mut child);
                let _ = child.wait();
                Err(HarnessError::Timeout {
                    what: inv.label(),
                    timeout: inv.timeout,
                })
            }
            Err(e) => {
                kill_tree(&mut child);
                let _ = child.wait();
                Err(HarnessError::Spawn {
                    tool: inv.program.clone(),
                    message: e.to_string(),
                })
            }
        };

        let stdout = collect(&stdout_rx);
        let mut stderr = collect(&stderr_rx);
        let elapsed = start.elapsed();

        match status {
            Ok(status) => ExecutionOutcome {
                exit_code: status.code(),
                elapsed,
                stdout,
                stderr,
                dispatch_error: None,
            },
            Err(error) => {
                if !stderr.is_empty() && !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                stderr.push_str(&error.to_string());
                ExecutionOutcome {
                    exit_code: None,
                    elapsed,
                    stdout,
                    stderr,
                    dispatch_error: Some(error),
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> ExecutionOutcome {
        ProcessRunner.run(&Invocation::new("sh", timeout).args(["-c", script]))
    }

    #[test]
    fn captures_exit_code_and_output() {
        let out = sh("echo hello; echo oops >&2; exit 3", Duration::from_secs(10));
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
        assert!(out.dispatch_error.is_none());
    }

    #[test]
    fn missing_program_is_tool_missing() {
        let out = ProcessRunner.run(&Invocation::new(
            "definitely-not-a-real-tool-3f9a",
            Duration::from_secs(5),
        ));
        assert_eq!(out.exit_code, None);
        assert!(matches!(
            out.dispatch_error,
            Some(HarnessError::ToolMissing { .. })
        ));
        assert!(out.stderr.contains("not found on PATH"));
    }

    #[test]
    fn overrunning_child_is_killed() {
        let started = Instant::now();
        let out = sh("sleep 30", Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_secs(20));
        assert_eq!(out.exit_code, None);
        assert!(matches!(out.dispatch_error, Some(HarnessError::Timeout { .. })));
    }

    #[test]
    fn timeout_takes_down_background_grandchildren() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("alive");
        let script = format!("(sleep 2; touch '{}') & wait", marker.display());

        let started = Instant::now();
        let out = sh(&script, Duration::from_millis(300));
        assert!(matches!(out.dispatch_error, Some(HarnessError::Timeout { .. })));
        // The grandchild held the output pipes; they close once it is gone.
        assert!(started.elapsed() < Duration::from_secs(2));

        thread::sleep(Duration::from_secs(3));
        assert!(!marker.exists());
    }

    #[test]
    fn large_output_does_not_deadlock() {
        let out = sh(
            "i=0; while [ $i -lt 20000 ]; do echo line-$i; i=$((i+1)); done",
            Duration::from_secs(30),
        );
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(out.stdout.lines().count(), 20000);
    }

    #[test]
    fn runs_in_requested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let out = ProcessRunner.run(
            &Invocation::new("sh", Duration::from_secs(5))
                .args(["-c", "ls"])
                .current_dir(dir.path()),
        );
        assert!(out.stdout.contains("marker.txt"));
    }

    #[test]
    fn label_includes_subcommand() {
        let inv = Invocation::new("ryusim", DEFAULT).args(["compile", "rtl/dut.sv"]);
        assert_eq!(inv.label(), "ryusim compile");
        let inv = Invocation::new("make", DEFAULT).arg("SIM=verilator");
        assert_eq!(inv.label(), "make");
    }

    const DEFAULT: Duration = Duration::from_secs(1);
}
