//! # bls-e2e
//!
//! Conformance harness for the BLS automation service.
//!
//! Runs the applicant, credential, automation and streaming suites against a
//! live deployment and prints per-category pass rates.
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite against the URL from /app/frontend/.env
//! bls-e2e
//!
//! # Run against a local backend, automation suite only
//! bls-e2e --base-url http://localhost:8001 --filter automation
//!
//! # Machine-readable summary, non-zero exit on failures
//! bls-e2e --format json --fail-on-error
//!
//! # List suites and their steps
//! bls-e2e --list
//! ```

use anyhow::{Context, Result};
use bls_e2e::{
    DEFAULT_ENV_FILE, HarnessConfig, HttpTransport, RunConfig, RunController, RunReport, Suite,
    Summary, TerminalReporter, Verbosity, create_progress_callback, default_suites,
};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Summary output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal output with live step lines
    #[default]
    Terminal,
    /// JSON summary on stdout
    Json,
}

/// Conformance harness for the BLS automation service.
#[derive(Parser, Debug)]
#[command(name = "bls-e2e")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Service base URL (overrides the env file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Env file holding REACT_APP_BACKEND_URL
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Run only suites matching this pattern
    #[arg(long)]
    pub filter: Option<String>,

    /// List suites and their steps without running them
    #[arg(long)]
    pub list: bool,

    /// Summary output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Show observed detail of failing steps and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only show the pass/fail summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Seconds to wait for the streaming echo (at least 1)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub stream_timeout_secs: u64,

    /// Exit with status 1 when any step failed
    #[arg(long)]
    pub fail_on_error: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    let config = HarnessConfig::resolve(cli.base_url.as_deref(), &cli.env_file)
        .with_stream_timeout(Duration::from_secs(cli.stream_timeout_secs));
    debug!(base_url = %config.base_url, source = ?config.source, "resolved configuration");

    let suites = default_suites(&config);
    if cli.list {
        list_suites(&suites);
        return Ok(ExitCode::SUCCESS);
    }

    let report = run(&cli, &config, suites, verbosity).await?;
    let summary = Summary::from_ledger(&report.ledger).with_skipped(&report.skipped);

    match cli.format {
        OutputFormat::Terminal => {
            TerminalReporter::with_verbosity(verbosity).print_summary(&summary);
        }
        OutputFormat::Json => println!(
            "{}",
            summary.to_json().context("failed to serialize summary")?
        ),
    }

    if cli.fail_on_error && !report.ledger.all_passed() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "bls_e2e=debug" } else { "bls_e2e=warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(
    cli: &Cli,
    config: &HarnessConfig,
    suites: Vec<Box<dyn Suite>>,
    verbosity: Verbosity,
) -> Result<RunReport> {
    let mut run_config = RunConfig::new();
    if let Some(filter) = &cli.filter {
        run_config = run_config.with_filter(filter);
    }

    let mut controller = RunController::new(suites).with_config(run_config);

    // JSON output owns stdout; no live lines.
    if cli.format == OutputFormat::Terminal {
        TerminalReporter::with_verbosity(verbosity).print_banner(config);
        controller = controller.on_progress(create_progress_callback(verbosity));
    }

    let transport = HttpTransport::new(config.base_url.clone())
        .context("failed to build HTTP client")?;
    controller.setup(Box::new(transport))?;
    controller.run_all().await?;
    controller.cleanup();

    Ok(controller.into_report())
}

fn list_suites(suites: &[Box<dyn Suite>]) {
    println!("{}\n", "Available suites:".bold());

    let mut steps = 0;
    for suite in suites {
        println!(
            "  {}  {}",
            suite.id().cyan(),
            suite.description().dimmed()
        );
        println!("    {}", suite.category().to_string().underline());
        for step in suite.steps() {
            println!("      {}.{}", suite.category().key(), step);
        }
        steps += suite.steps().len();
    }

    println!(
        "\n  {}",
        format!("Total: {} suites, {} steps", suites.len(), steps).dimmed()
    );
}
