use std::time::Duration;
use thiserror::Error;

/// Reasons a case could not be run at all.
///
/// Every variant is converted into an `error` status at the per-case boundary;
/// none of them abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("config.yaml not found")]
    ConfigMissing,

    #[error("config.yaml could not be read: {0}")]
    ConfigUnreadable(String),

    #[error("config.yaml is malformed: {0}")]
    ConfigMalformed(String),

    #[error("{tool} not found on PATH")]
    ToolMissing { tool: String },

    #[error("{what} timed out ({}s)", .timeout.as_secs())]
    Timeout { what: String, timeout: Duration },

    #[error("No .sv or .v source files found")]
    MissingSource,

    #[error("expected_error.txt could not be read: {0}")]
    ExpectedMessageUnreadable(String),

    #[error("failed to run {tool}: {message}")]
    Spawn { tool: String, message: String },
}

impl HarnessError {
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            HarnessError::ConfigMissing
                | HarnessError::ConfigUnreadable(_)
                | HarnessError::ConfigMalformed(_)
        )
    }
}
