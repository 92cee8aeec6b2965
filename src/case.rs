use crate::error::HarnessError;
use crate::types::{CaseConfig, DEFAULT_TOP_MODULE};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.yaml";

// Every key optional; defaults are applied in `into_config` so that a key with
// the wrong type is still an error rather than a silent default.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawCaseConfig {
    top_module: Option<String>,
    description: Option<String>,
    expect_fail: Option<bool>,
    enabled: Option<bool>,
}

impl RawCaseConfig {
    fn into_config(self) -> Result<CaseConfig, HarnessError> {
        let top_module = match self.top_module {
            Some(top) if top.trim().is_empty() => {
                return Err(HarnessError::ConfigMalformed(
                    "top_module must not be empty".to_string(),
                ));
            }
            Some(top) => top.trim().to_string(),
            None => DEFAULT_TOP_MODULE.to_string(),
        };
        Ok(CaseConfig {
            top_module,
            description: self.description.map(|d| d.trim().to_string()),
            expect_fail: self.expect_fail.unwrap_or(false),
            enabled: self.enabled.unwrap_or(true),
        })
    }
}

fn is_blank_document(content: &str) -> bool {
    content.lines().all(|line| {
        let t = line.trim();
        t.is_empty() || t.starts_with('#') || t == "---"
    })
}

/// Parses the text of a `config.yaml`. An empty or `null` document yields the
/// defaults; anything that is not a mapping of the known keys with the right types is
/// rejected.
pub fn parse_case_config(content: &str) -> Result<CaseConfig, HarnessError> {
    if is_blank_document(content) {
        return Ok(CaseConfig::default());
    }
    let raw: Option<RawCaseConfig> = serde_yaml::from_str(content)
        .map_err(|e| HarnessError::ConfigMalformed(e.to_string()))?;
    raw.unwrap_or_default().into_config()
}

pub fn load_case_config(case_dir: &Path) -> Result<CaseConfig, HarnessError> {
    let file = case_dir.join(CONFIG_FILE);
    let content = fs::read_to_string(&file).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => HarnessError::ConfigMissing,
        _ => HarnessError::ConfigUnreadable(e.to_string()),
    })?;
    parse_case_config(&content)
}

/// Reads only the `enabled` flag, failing open: a case whose config cannot be
/// read or parsed counts as enabled so that its problem shows up in the report.
pub fn is_enabled(case_dir: &Path) -> bool {
    match load_case_config(case_dir) {
        Ok(cfg) => cfg.enabled,
        Err(e) => {
            tracing::debug!(dir = %case_dir.display(), error = %e, "treating unreadable config as enabled");
            true
        }
    }
}
