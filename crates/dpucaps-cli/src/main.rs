// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

mod channels;
mod check;
mod error;
mod overlap;
mod show;
mod source;
mod utils;
mod watch;

use clap::{Parser, Subcommand};
use error::result_to_exit_code;
use std::process::ExitCode;

/// dpucaps CLI - Inspect and validate DPU plane restriction tables
#[derive(Parser)]
#[command(name = "dpucaps")]
#[command(version)]
#[command(about = "dpucaps CLI - Inspect and validate DPU plane restriction tables")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=debug for more)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a restriction description
    Show(show::Args),

    /// Dump per-channel restrictions
    Channels(channels::Args),

    /// Show which general channels share hardware blocks
    Overlap(overlap::Args),

    /// Validate a restriction description
    Check(check::Args),

    /// Reload a restriction description on SIGHUP or file change
    Watch(watch::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbose, cli.quiet);

    // Execute the subcommand and convert result to exit code
    let result = match cli.command {
        Commands::Show(args) => show::execute(args, cli.json),
        Commands::Channels(args) => channels::execute(args, cli.json),
        Commands::Overlap(args) => overlap::execute(args, cli.json),
        Commands::Check(args) => check::execute(args, cli.json),
        Commands::Watch(args) => watch::execute(args, cli.json),
    };

    result_to_exit_code(result)
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default();

    let env = if quiet {
        env.default_filter_or("error")
    } else if verbose {
        env.default_filter_or("debug")
    } else {
        env.default_filter_or("info")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::debug!("Logging initialized");
}
