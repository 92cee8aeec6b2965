use crate::types::Level;
use std::path::PathBuf;
use std::time::Duration;

/// Hard wall-clock bound for a build/simulate or compile-only run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const COMPARE_TIMEOUT: Duration = Duration::from_secs(60);
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(10);
pub const CLEAN_TIMEOUT: Duration = Duration::from_secs(60);

/// Categories the test runner searches, in the order they are listed in help.
pub const TEST_CATEGORIES: [&str; 5] = [
    "combinational",
    "sequential",
    "hierarchy",
    "advanced",
    "unsupported",
];

/// Category whose cases must be rejected by the compiler.
pub const UNSUPPORTED_CATEGORY: &str = "unsupported";

pub const BENCHMARK_ROOTS: [&str; 2] = ["rtlmeter_tests", "cocotb_tests"];

/// External programs the harness shells out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub ryusim: String,
    pub make: String,
    pub vcddiff: String,
    pub verilator: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            ryusim: "ryusim".to_string(),
            make: "make".to_string(),
            vcddiff: "vcddiff".to_string(),
            verilator: "verilator".to_string(),
        }
    }
}

/// Everything a run needs, fixed before the first case starts.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub cases_root: PathBuf,
    pub golden_root: PathBuf,
    pub level: Level,
    pub timeout: Duration,
    pub compare_timeout: Duration,
    pub version_timeout: Duration,
    pub tools: Tools,
    /// Cases in this category take the compile-only path regardless of config.
    pub expect_fail_category: Option<String>,
    /// Extra make target appended to the full-run command.
    pub make_target: Option<String>,
    /// Re-run passing full-run cases under the reference simulator.
    pub reference_compare: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            cases_root: PathBuf::from("tests"),
            golden_root: PathBuf::from("golden"),
            level: Level::Structural,
            timeout: DEFAULT_TIMEOUT,
            compare_timeout: COMPARE_TIMEOUT,
            version_timeout: VERSION_TIMEOUT,
            tools: Tools::default(),
            expect_fail_category: Some(UNSUPPORTED_CATEGORY.to_string()),
            make_target: None,
            reference_compare: false,
        }
    }
}

impl HarnessConfig {
    /// Layout used by the benchmark runner: designs live under the benchmark
    /// roots of the current directory and nothing is compile-only by category.
    pub fn benchmarks() -> Self {
        Self {
            cases_root: PathBuf::from("."),
            expect_fail_category: None,
            ..Self::default()
        }
    }
}

/// Settings for the offline golden trace generator.
#[derive(Debug, Clone)]
pub struct GoldenConfig {
    pub cases_root: PathBuf,
    pub golden_root: PathBuf,
    pub force: bool,
    pub timeout: Duration,
    pub clean_timeout: Duration,
    pub tools: Tools,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self {
            cases_root: PathBuf::from("tests"),
            golden_root: PathBuf::from("golden"),
            force: false,
            timeout: DEFAULT_TIMEOUT,
            clean_timeout: CLEAN_TIMEOUT,
            tools: Tools::default(),
        }
    }
}
