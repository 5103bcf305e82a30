//! CLI error types

use thiserror::Error;

/// Failures that stop a command before it can produce a report.
#[derive(Debug, Error)]
pub enum CliError {
    /// Settings, expected-change or parameter file problem
    #[error("Configuration error: {0}")]
    Config(#[from] parity_types::ConfigError),

    /// Collection loading or worker pool failure
    #[error("Batch error: {0}")]
    Batch(#[from] parity_batch::BatchError),

    /// Harness setup or baseline failure
    #[error("Propagation error: {0}")]
    Perturb(#[from] parity_perturb::PerturbError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
