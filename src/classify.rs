use crate::types::{ExecutionOutcome, Status, Strategy};

/// Maps a raw outcome onto a status.
///
/// A dispatch error always wins: a run that timed out or never started is
/// `error`, never `failed` or `expected_fail`, so that "the tool rejected the
/// input" stays distinct from "the tool could not be run".
pub fn classify(
    outcome: &ExecutionOutcome,
    strategy: Strategy,
    expected_message: Option<&str>,
) -> Status {
    if outcome.dispatch_error.is_some() {
        return Status::Error;
    }
    // Killed by a signal without a timeout of ours.
    let Some(code) = outcome.exit_code else {
        return Status::Error;
    };
    match strategy {
        Strategy::FullRun if code == 0 => Status::Passed,
        Strategy::FullRun => Status::Failed,
        // Accepted input it should have rejected.
        Strategy::ExpectFail if code == 0 => Status::Failed,
        Strategy::ExpectFail => match expected_message {
            Some(msg) if !outcome.stderr.contains(msg) => Status::Failed,
            _ => Status::ExpectedFail,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use std::time::Duration;

    fn exited(code: i32, stderr: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            exit_code: Some(code),
            stderr: stderr.to_string(),
            ..ExecutionOutcome::default()
        }
    }

    #[test]
    fn full_run_follows_exit_code() {
        assert_eq!(classify(&exited(0, ""), Strategy::FullRun, None), Status::Passed);
        assert_eq!(classify(&exited(2, ""), Strategy::FullRun, None), Status::Failed);
    }

    #[test]
    fn expect_fail_without_message_file() {
        assert_eq!(
            classify(&exited(1, "error: nope"), Strategy::ExpectFail, None),
            Status::ExpectedFail
        );
        assert_eq!(classify(&exited(0, ""), Strategy::ExpectFail, None), Status::Failed);
    }

    #[test]
    fn expect_fail_checks_the_reason() {
        let out = exited(1, "error: interfaces are not supported\n");
        assert_eq!(
            classify(&out, Strategy::ExpectFail, Some("interfaces are not supported")),
            Status::ExpectedFail
        );
        assert_eq!(
            classify(&out, Strategy::ExpectFail, Some("classes are not supported")),
            Status::Failed
        );
    }

    #[test]
    fn dispatch_errors_take_precedence() {
        for strategy in [Strategy::FullRun, Strategy::ExpectFail] {
            let timeout = ExecutionOutcome::from_error(
                HarnessError::Timeout {
                    what: "make".into(),
                    timeout: Duration::from_secs(300),
                },
                Duration::from_secs(300),
            );
            assert_eq!(classify(&timeout, strategy, None), Status::Error);

            let missing = ExecutionOutcome::from_error(
                HarnessError::ToolMissing { tool: "ryusim".into() },
                Duration::ZERO,
            );
            assert_eq!(classify(&missing, strategy, Some("x")), Status::Error);
        }
    }

    #[test]
    fn signal_death_is_an_error() {
        let out = ExecutionOutcome::default();
        assert_eq!(classify(&out, Strategy::FullRun, None), Status::Error);
    }
}
