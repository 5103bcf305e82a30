//! Parity CLI - regression comparison and propagation checks for serialized
//! force-field artifacts
//!
//! - `compare`: diff two collections of system XML files, reconciling known changes
//! - `propagate`: perturb every parameter and verify where each change lands
//! - `enumerate`: list the perturbations a parameter file would receive
//!
//! Exit status: 0 clean, 1 divergence or per-item errors, 2 configuration or
//! startup failure.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod output;
mod transform;

use commands::{compare, enumerate, propagate, Status};

/// Parity CLI application
#[derive(Parser)]
#[command(name = "parity")]
#[command(about = "Parity - regression comparison and perturbation verification", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Compare two artifact collections
    Compare(compare::CompareArgs),

    /// Verify parameter propagation through a pipeline command
    Propagate(propagate::PropagateArgs),

    /// Write the perturbation list for a parameter file
    Enumerate(enumerate::EnumerateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Compare(args) => compare::execute(args),
        Commands::Propagate(args) => propagate::execute(args),
        Commands::Enumerate(args) => enumerate::execute(args),
    };

    match result {
        Ok(Status::Clean) => ExitCode::SUCCESS,
        Ok(Status::Failed) => ExitCode::from(1),
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::from(2)
        }
    }
}
