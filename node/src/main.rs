// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SimpleBank Harness
//!
//! Entry point for the `simplebank` binary. Parses CLI arguments,
//! initializes logging, deploys an in-memory bank, executes a session
//! against it, and prints the report as JSON on stdout.
//!
//! The binary supports three subcommands:
//!
//! - `run`: execute a session file
//! - `demo`: execute the built-in reference scenario
//! - `version`: print build version information

mod cli;
mod logging;
mod metrics;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use cli::{Commands, SimpleBankCli};
use metrics::RunMetrics;
use session::{Session, SessionReport};

fn main() -> Result<()> {
    let cli = SimpleBankCli::parse();

    match cli.command {
        Commands::Run(args) => {
            init_logging(&cli.log);
            run_session(args)
        }
        Commands::Demo(args) => {
            init_logging(&cli.log);
            run_demo(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn init_logging(log: &cli::LogArgs) {
    logging::init_logging(&logging::default_directive(&log.log_level), log.log_format);
}

/// Loads a session file, executes it, and prints the report.
fn run_session(args: cli::RunArgs) -> Result<()> {
    let session = load_session(&args.session)?;
    tracing::info!(
        path = %args.session.display(),
        calls = session.calls.len(),
        "session loaded"
    );

    let metrics = RunMetrics::new().context("failed to create metrics registry")?;
    let report = session::execute(&session, Some(&metrics)).context("deployment failed")?;

    print_report(&report, args.pretty)?;
    if let Some(path) = args.metrics_out.as_deref() {
        write_metrics(&metrics, path)?;
    }
    Ok(())
}

/// Runs the reference scenario on the development accounts.
fn run_demo(args: cli::DemoArgs) -> Result<()> {
    let session = Session::reference(args.funding).context("invalid development account")?;
    let metrics = RunMetrics::new().context("failed to create metrics registry")?;
    let report = session::execute(&session, Some(&metrics)).context("deployment failed")?;

    print_report(&report, true)?;
    if let Some(path) = args.metrics_out.as_deref() {
        write_metrics(&metrics, path)?;
    }
    Ok(())
}

/// Reads and parses a session file.
fn load_session(path: &Path) -> Result<Session> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse session file: {}", path.display()))
}

fn print_report(report: &SessionReport, pretty: bool) -> Result<()> {
    let body = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
    .context("failed to serialize report")?;
    println!("{}", body);
    Ok(())
}

fn write_metrics(metrics: &RunMetrics, path: &Path) -> Result<()> {
    let body = metrics.encode().context("failed to encode metrics")?;
    std::fs::write(path, body)
        .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    tracing::info!(path = %path.display(), "metrics written");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("simplebank {}", env!("CARGO_PKG_VERSION"));
    println!("unit       {}", simplebank_contracts::config::BASE_UNIT);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
