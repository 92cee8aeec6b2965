use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use ryusim_harness::cli::{self, ToolArgs};
use ryusim_harness::config::GoldenConfig;
use ryusim_harness::discover::{DiscoveryOptions, discover, locate};
use ryusim_harness::golden::{GoldenGenerator, GoldenOutcome, SkipReason};
use ryusim_harness::runner::ProcessRunner;
use ryusim_harness::types::CaseLocation;
use ryusim_harness::{t, t_args};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "ryusim-golden", version, about = t!("cli-about-golden"))]
struct Cli {
    #[arg(long, help = t!("cli-golden-all"))]
    all: bool,

    #[arg(long, value_name = "NAME", help = t!("cli-golden-category"))]
    category: Option<String>,

    #[arg(long, value_name = "PATH", help = t!("cli-golden-test"))]
    test: Option<String>,

    #[arg(long, help = t!("cli-force"))]
    force: bool,

    #[arg(short = 'v', long, help = t!("cli-verbose"))]
    verbose: bool,

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

fn report(location: &CaseLocation, outcome: &GoldenOutcome) {
    let case = location.name.as_str();
    let line = match outcome {
        GoldenOutcome::Skipped(SkipReason::GoldenExists) => {
            t_args!("golden-skip-exists", "case" => case)
        }
        GoldenOutcome::Skipped(SkipReason::NoMakefile) => {
            t_args!("golden-skip-no-makefile", "case" => case)
        }
        GoldenOutcome::Generated(dests) => dests
            .iter()
            .map(|d| t_args!("golden-ok", "case" => case, "dest" => d.display()).green().to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        GoldenOutcome::Failed(reason) => {
            t_args!("golden-fail", "case" => case, "reason" => reason)
                .red()
                .to_string()
        }
    };
    println!("  {line}");
}

fn main() -> Result<()> {
    let cli: Cli = cli::parse_or_exit();

    if !cli.all && cli.category.is_none() && cli.test.is_none() {
        println!("{}", cli::render_help::<Cli>());
        return Ok(());
    }

    cli::init_tracing(cli.verbose);
    cli::init_color(cli.no_color);

    let config = GoldenConfig {
        cases_root: cli.cases_root.clone(),
        golden_root: cli.golden_root.clone(),
        force: cli.force,
        timeout: Duration::from_secs(cli.timeout),
        tools: cli.tools.clone().into(),
        ..GoldenConfig::default()
    };

    // The generator does not honour `enabled: false`; disabled cases still
    // get a reference trace.
    let cases = if let Some(test) = &cli.test {
        match locate(&config.cases_root, test) {
            Some(case) => vec![case],
            None => {
                error!("{}", t_args!("error-test-not-found", "test" => test));
                std::process::exit(1);
            }
        }
    } else if let Some(category) = &cli.category {
        if !config.cases_root.join(category).is_dir() {
            error!("{}", t_args!("error-category-not-found", "category" => category));
            std::process::exit(1);
        }
        discover(&DiscoveryOptions {
            category: Some(category.clone()),
            include_disabled: true,
            ..DiscoveryOptions::new(&config.cases_root)
        })
    } else {
        discover(&DiscoveryOptions {
            include_disabled: true,
            ..DiscoveryOptions::new(&config.cases_root)
        })
    };

    println!("{}", t_args!("golden-header", "count" => cases.len()));

    let runner = ProcessRunner;
    let generator = GoldenGenerator::new(&runner, &config);
    let tally = generator.generate_all(&cases, report);

    println!();
    println!(
        "{}",
        t_args!("golden-done", "succeeded" => tally.succeeded, "failed" => tally.failed)
    );
    if tally.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
