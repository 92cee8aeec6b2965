use anyhow::Result;
use clap::Parser;
use ryusim_harness::cli::{self, ToolArgs};
use ryusim_harness::config::{BENCHMARK_ROOTS, HarnessConfig};
use ryusim_harness::discover::{DiscoveryOptions, discover};
use ryusim_harness::engine::Harness;
use ryusim_harness::report::render_progress;
use ryusim_harness::runner::ProcessRunner;
use ryusim_harness::types::Level;
use ryusim_harness::{t, t_args};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ryusim-bench", version, about = t!("cli-about-bench"))]
struct Cli {
    #[arg(long, help = t!("cli-all"))]
    all: bool,

    #[arg(long, value_name = "NAME", help = t!("cli-design"))]
    design: Option<String>,

    // Make target inside the design, e.g. a single cocotb test
    #[arg(long, value_name = "TARGET", help = t!("cli-bench-test"))]
    test: Option<String>,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2), help = t!("cli-level"))]
    level: u8,

    #[arg(long, help = t!("cli-compare-verilator"))]
    compare_verilator: bool,

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

    #[arg(long, value_name = "DIR", default_value = ".", help = t!("cli-bench-root"))]
    root: PathBuf,

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

    if !cli.all && cli.design.is_none() {
        println!("{}", cli::render_help::<Cli>());
        return Ok(());
    }

    cli::init_tracing(cli.verbose);
    cli::init_color(cli.no_color);

    let config = HarnessConfig {
        cases_root: cli.root.clone(),
        golden_root: cli.golden_root.clone(),
        level: Level::from_number(cli.level).unwrap_or_default(),
        timeout: Duration::from_secs(cli.timeout),
        tools: cli.tools.clone().into(),
        make_target: cli.test.clone(),
        reference_compare: cli.compare_verilator,
        ..HarnessConfig::benchmarks()
    };

    let mut designs = discover(&DiscoveryOptions {
        categories: Some(BENCHMARK_ROOTS.iter().map(|r| r.to_string()).collect()),
        include_disabled: cli.include_disabled,
        max_depth: Some(1),
        ..DiscoveryOptions::new(&config.cases_root)
    });

    if let Some(name) = &cli.design {
        designs.retain(|d| d.leaf_name() == name);
        if designs.is_empty() {
            error!("{}", t_args!("error-design-not-found", "design" => name));
            std::process::exit(1);
        }
    }
    if let Some(limit) = cli.limit {
        designs.truncate(limit);
    }
    info!("{}", t_args!("info-cases-selected", "count" => designs.len()));

    let runner = ProcessRunner;
    let harness = Harness::new(&runner, &config);
    let version = harness.tool_version();
    cli::check_version(cli.ryusim_version.as_deref(), &version);

    let verbose = cli.verbose;
    let summary = harness.run_with_version(version, &designs, |result| {
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
