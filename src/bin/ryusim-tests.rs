use anyhow::Result;
use clap::Parser;
use ryusim_harness::cli::{self, ToolArgs};
use ryusim_harness::config::{HarnessConfig, TEST_CATEGORIES};
use ryusim_harness::discover::{DiscoveryOptions, discover, locate};
use ryusim_harness::engine::Harness;
use ryusim_harness::report::render_progress;
use ryusim_harness::runner::ProcessRunner;
use ryusim_harness::types::Level;
use ryusim_harness::{t, t_args};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ryusim-tests", version, about = t!("cli-about-tests"))]
struct Cli {
    #[arg(long, help = t!("cli-all"))]
    all: bool,

    #[arg(long, value_name = "NAME", value_parser = TEST_CATEGORIES, help = t!("cli-category"))]
    category: Option<String>,

    // Relative to the cases root, e.g. combinational/operators/add_sub
    #[arg(long, value_name = "PATH", help = t!("cli-test"))]
    test: Option<String>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2), help = t!("cli-level"))]
    level: u8,

    #[arg(long, value_name = "FILE", help = t!("cli-output"))]
    output: Option<PathBuf>,

    #[arg(long = "ryusim-version", value_name = "VERSION", help = t!("cli-ryusim-version"))]
    ryusim_version: Option<String>,

    #[arg(long, value_name = "N", value_parser = cli::case_limit(), help = t!("cli-limit"))]
    limit: Option<usize>,

    #[arg(short = 'v', long, help = t!("cli-verbose"))]
    verbose: bool,

    #[arg(long, help = t!("cli-include-disabled"))]
    include_disabled: bool,

    #[arg(long, value_name = "DIR", default_value = "tests", help = t!("cli-cases-root"))]
    cases_root: PathBuf,

    #[arg(long, value_name = "DIR", default_value = "golden", help = t!("cli-golden-root"))]
    golden_root: PathBuf,

    #[arg(long, value_name = "SECS", default_value_t = 300, help = t!("cli-timeout"))]
    timeout: u64,

    #[arg(long = "no-color", help = t!("cli-no-color"))]
    no_color: bool,

    #[command(flatten)]
    tools: ToolArgs,
}

fn main() -> Result<()> {
    let cli: Cli = cli::parse_or_exit();

    if !cli.all && cli.category.is_none() && cli.test.is_none() {
        println!("{}", cli::render_help::<Cli>());
        return Ok(());
    }

    cli::init_tracing(cli.verbose);
    cli::init_color(cli.no_color);

    let config = HarnessConfig {
        cases_root: cli.cases_root.clone(),
        golden_root: cli.golden_root.clone(),
        level: Level::from_number(cli.level).unwrap_or_default(),
        timeout: Duration::from_secs(cli.timeout),
        tools: cli.tools.clone().into(),
        ..HarnessConfig::default()
    };

    let mut cases = if let Some(test) = &cli.test {
        match locate(&config.cases_root, test) {
            Some(case) => vec![case],
            None => {
                error!("{}", t_args!("error-test-not-found", "test" => test));
                std::process::exit(1);
            }
        }
    } else {
        discover(&DiscoveryOptions {
            categories: Some(TEST_CATEGORIES.iter().map(|c| c.to_string()).collect()),
            category: cli.category.clone(),
            include_disabled: cli.include_disabled,
            ..DiscoveryOptions::new(&config.cases_root)
        })
    };
    if let Some(limit) = cli.limit {
        cases.truncate(limit);
    }
    info!("{}", t_args!("info-cases-selected", "count" => cases.len()));

    let runner = ProcessRunner;
    let harness = Harness::new(&runner, &config);
    let version = harness.tool_version();
    cli::check_version(cli.ryusim_version.as_deref(), &version);

    let verbose = cli.verbose;
    let summary = harness.run_with_version(version, &cases, |result| {
        if verbose {
            eprintln!("{}", render_progress(result));
        }
    });

    cli::emit_summary(&summary, cli.output.as_deref())?;

    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
