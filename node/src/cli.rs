//! # CLI Interface
//!
//! Defines the command-line argument structure for `simplebank` using
//! `clap` derive. Supports three subcommands: `run`, `demo`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// SimpleBank custodial ledger harness.
///
/// Deploys an in-memory bank, plays the role of the caller identity
/// provider, and reports every call's outcome as JSON on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "simplebank",
    about = "SimpleBank custodial ledger harness",
    version,
    propagate_version = true
)]
pub struct SimpleBankCli {
    /// Logging options shared by every subcommand.
    #[command(flatten)]
    pub log: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a session file against a freshly deployed bank.
    Run(RunArgs),
    /// Run the built-in reference scenario.
    Demo(DemoArgs),
    /// Print version information and exit.
    Version,
}

/// Logging flags.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Default log level when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "SIMPLEBANK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "SIMPLEBANK_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the session file (JSON).
    #[arg(long, short = 's', env = "SIMPLEBANK_SESSION")]
    pub session: PathBuf,

    /// Write Prometheus metrics for the run to this file.
    #[arg(long, env = "SIMPLEBANK_METRICS_OUT")]
    pub metrics_out: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Genesis funding for the owner, in base units.
    #[arg(long, default_value_t = simplebank_contracts::config::DEFAULT_GENESIS_FUNDING)]
    pub funding: u64,

    /// Write Prometheus metrics for the run to this file.
    #[arg(long, env = "SIMPLEBANK_METRICS_OUT")]
    pub metrics_out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        SimpleBankCli::command().debug_assert();
    }

    #[test]
    fn run_requires_session() {
        let result = SimpleBankCli::try_parse_from(["simplebank", "run"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_log_flags_after_subcommand() {
        let cli = SimpleBankCli::try_parse_from([
            "simplebank",
            "run",
            "--session",
            "calls.json",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log.log_format, LogFormat::Json);
        match cli.command {
            Commands::Run(args) => assert_eq!(args.session, PathBuf::from("calls.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
