//! Pieces shared by the three binaries: help rendering, logging setup, tool
//! overrides and report emission.

use crate::config::Tools;
use crate::report::RunSummary;
use crate::{t, t_args};
use anyhow::Result;
use clap::builder::RangedU64ValueParser;
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser};
use colored::Colorize;
use colored::control::set_override as set_color_override;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Locations of the external programs, overridable per flag or environment.
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    #[arg(long, value_name = "CMD", env = "RYUSIM_BIN", default_value = "ryusim", help = t!("cli-ryusim-bin"))]
    pub ryusim_bin: String,

    #[arg(long, value_name = "CMD", env = "MAKE", default_value = "make", help = t!("cli-make-bin"))]
    pub make_bin: String,

    #[arg(long, value_name = "CMD", env = "VCDDIFF", default_value = "vcddiff", help = t!("cli-vcddiff-bin"))]
    pub vcddiff_bin: String,

    #[arg(long, value_name = "CMD", env = "VERILATOR", default_value = "verilator", help = t!("cli-verilator-bin"))]
    pub verilator_bin: String,
}

impl From<ToolArgs> for Tools {
    fn from(args: ToolArgs) -> Self {
        Tools {
            ryusim: args.ryusim_bin.trim().to_string(),
            make: args.make_bin.trim().to_string(),
            vcddiff: args.vcddiff_bin.trim().to_string(),
            verilator: args.verilator_bin.trim().to_string(),
        }
    }
}

/// `-v` raises the default filter to info; `RUST_LOG` wins over both.
/// Logs go to stderr so that stdout carries nothing but the report.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn init_color(no_color: bool) {
    if no_color {
        set_color_override(false);
    }
}

fn flag_regex() -> &'static Regex {
    static FLAG: OnceLock<Regex> = OnceLock::new();
    // --word or -letter at the start of a help line
    FLAG.get_or_init(|| {
        Regex::new(r"(?m)^(\s*)(--?\w[\w-]*(?:, --?\w[\w-]*)?)").expect("static regex is valid")
    })
}

fn format_flags_bold(text: &str) -> String {
    flag_regex()
        .replace_all(text, |caps: &regex::Captures| {
            format!("{}{}", &caps[1], caps[2].bold())
        })
        .to_string()
}

fn localize_sections(text: &str, program: &str) -> String {
    let text = text
        .replace("Usage:", &t!("cli-error-usage").bold().underline().to_string())
        .replace("Options:", &t!("cli-help-options").bold().underline().to_string())
        .replace("[default:", &format!("[{}:", t!("cli-help-default")))
        .replace("[env:", &format!("[{}:", t!("cli-help-env")))
        .replace("[possible values:", &format!("[{}:", t!("cli-help-possible-values")))
        .replace("Print help", &t!("cli-help-print-help"))
        .replace("Print version", &t!("cli-help-print-version"))
        .replace(program, &program.bold().to_string());
    format_flags_bold(&text)
}

/// Localized long help for `C`, also printed when no selection flag is given.
pub fn render_help<C: CommandFactory>() -> String {
    let mut cmd = C::command();
    let program = cmd.get_name().to_string();
    let help = cmd.render_long_help().to_string();
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_was_empty = false;
    let localized = localize_sections(&help, &program);
    for line in localized.lines() {
        let is_empty = line.trim().is_empty();
        if is_empty && prev_was_empty {
            continue;
        }
        lines.push(line);
        prev_was_empty = is_empty;
    }
    lines.join("\n")
}

fn format_clap_error<C: CommandFactory>(error: &clap::Error) -> String {
    let program = C::command().get_name().to_string();
    let msg = error
        .to_string()
        .replace("For more information, try '--help'.", &t!("cli-error-help-info"))
        .replace("error:", &t!("cli-error-label").red().bold().to_string())
        .replace("tip:", &t!("cli-tip-label"))
        .replace("unexpected argument", &t!("cli-unexpected-argument"));
    let msg = localize_sections(&msg, &program);
    match error.kind() {
        ErrorKind::InvalidValue => msg.replace("invalid value", &t!("cli-error-invalid-value")),
        ErrorKind::ArgumentConflict => {
            msg.replace("cannot be used with", &t!("cli-error-conflict"))
        }
        _ => msg,
    }
}

/// Parses the command line, printing localized help/errors and exiting the
/// way clap would.
pub fn parse_or_exit<C: Parser + CommandFactory>() -> C {
    crate::i18n::init();
    match C::try_parse() {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp => {
                println!("{}", render_help::<C>());
                std::process::exit(0);
            }
            ErrorKind::DisplayVersion => {
                println!("{} {}", C::command().get_name(), env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            _ => {
                eprintln!("{}", format_clap_error::<C>(&error));
                std::process::exit(2);
            }
        },
    }
}

/// `--limit` takes a positive count; leave the flag off for no cap.
pub fn case_limit() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

/// Soft check of the detected tool version against the one the caller expects.
pub fn check_version(expected: Option<&str>, actual: &str) -> bool {
    match expected {
        Some(expected) if !actual.is_empty() && expected != actual => {
            warn!(
                "{}",
                t_args!("warn-version-mismatch", "expected" => expected, "actual" => actual)
            );
            false
        }
        _ => true,
    }
}

/// Prints the report to stdout and, when asked, persists it.
pub fn emit_summary(summary: &RunSummary, output: Option<&Path>) -> Result<()> {
    println!("{}", summary.to_json()?);
    if let Some(path) = output {
        summary.write_to(path)?;
        eprintln!("{}", t_args!("info-results-written", "path" => path.display()));
    }
    info!("{}", crate::report::render_tally(summary));
    Ok(())
}
