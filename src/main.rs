//! Tithe CLI - Command-line interface for running Tithe scenarios.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Tithe - A deterministic church and faith simulation
#[derive(Parser, Debug)]
#[command(name = "tithe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log more (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a single scenario to the end
    Run {
        /// Scenario file (default: built-in two-player scenario)
        scenario: Option<PathBuf>,

        /// Map seed (default: the scenario's)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum turns (default: the scenario's)
        #[arg(short, long)]
        turns: Option<u32>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress the header
        #[arg(short, long)]
        quiet: bool,
    },

    /// Play a scenario over many seeds in parallel and aggregate statistics
    Batch {
        /// Scenario file (default: built-in two-player scenario)
        scenario: Option<PathBuf>,

        /// Number of games to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Check a scenario file without playing it
    Validate {
        /// Scenario file to validate
        #[arg(required = true)]
        scenario: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Logs go to stderr so JSON output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Run {
            scenario,
            seed,
            turns,
            format,
            quiet,
        } => cli::run::execute(scenario, seed, turns, format, quiet),

        Commands::Batch {
            scenario,
            games,
            seed,
            threads,
            format,
            progress,
        } => cli::batch::execute(scenario, games, seed, threads, format, progress),

        Commands::Validate { scenario } => cli::validate::execute(scenario),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
