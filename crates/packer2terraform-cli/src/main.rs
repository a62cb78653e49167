//! packer2terraform CLI
//!
//! Turns Packer's machine-readable output into a Terraform-readable format.
//!
//! ## Exit codes
//!
//! - `0`: success (or help shown)
//! - `1`: input file could not be read
//! - `2`: input is not readable as CSV
//! - `3`: the build failed or produced no usable artifacts
//! - `6`: template could not be read or rendered
//! - `64`: invalid command-line usage

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use packer2terraform_core::{
    init_tracing, run, ConvertConfig, ConvertError, FailureStage, InputSource, OutputFormat,
    TemplateSource,
};
use tracing::{debug, Level};

const AFTER_HELP: &str = "Example:
    packer -machine-readable build app.json | \\
        packer2terraform --template templates/amazon-ebs.hcl > app.tfvars";

#[derive(Parser, Debug)]
#[command(name = "packer2terraform")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "packer2terraform turns Packer's machine-readable output into a Terraform-readable format.",
    long_about = None,
    after_help = AFTER_HELP
)]
struct Cli {
    /// Filename of the input CSV (default: standard input)
    #[arg(short = 'f', long = "file", env = "PACKER2TERRAFORM_FILE")]
    file: Option<PathBuf>,

    /// Filename of the template to use in the output (default: built-in images template).
    /// Not used with `--format json`.
    #[arg(short, long, env = "PACKER2TERRAFORM_TEMPLATE")]
    template: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Template)]
    format: OutputFormat,

    /// Only output artifacts produced by this builder (e.g. amazon-ebs)
    #[arg(long, env = "PACKER2TERRAFORM_BUILDER")]
    builder: Option<String>,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn config(&self) -> ConvertConfig {
        ConvertConfig {
            input: self
                .file
                .clone()
                .map_or(InputSource::Stdin, InputSource::File),
            template: self
                .template
                .clone()
                .map_or(TemplateSource::Builtin, TemplateSource::File),
            format: self.format,
            builder: self.builder.clone(),
        }
    }
}

/// Exit code for invalid command-line usage (`EX_USAGE`).
///
/// Kept apart from the stage codes so a bad flag never reads as a CSV error.
const USAGE_EXIT_CODE: u8 = 64;

/// Exit code for a failed argument parse; help and version output succeed.
fn parse_failure_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
        _ => USAGE_EXIT_CODE,
    }
}

/// Prefix printed before a failure, per stage.
fn failure_prefix(err: &ConvertError) -> &'static str {
    match err {
        ConvertError::TemplateRead { .. } => "Template file read failed",
        _ => match err.stage() {
            FailureStage::Input => "CSV file read failed",
            FailureStage::Parse => "CSV read failed",
            FailureStage::Reduce => "Packer build failed",
            FailureStage::Render => "Template render failed",
        },
    }
}

fn print_help() -> anyhow::Result<()> {
    Cli::command()
        .print_help()
        .context("Failed to write help")?;
    println!();
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap renders help, version and usage errors itself
            let _ = err.print();
            return ExitCode::from(parse_failure_code(&err));
        }
    };

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json_logs, level);

    // Nothing piped in and no file given: show usage instead of blocking.
    if cli.file.is_none() && std::io::stdin().is_terminal() {
        return match print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("{err:#}");
                ExitCode::FAILURE
            }
        };
    }

    let config = cli.config();
    debug!(?config, "Starting conversion");

    match run(&config) {
        Ok(doc) => {
            println!("{doc}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {err}", failure_prefix(&err));
            ExitCode::from(err.stage().exit_code())
        }
    }
}
