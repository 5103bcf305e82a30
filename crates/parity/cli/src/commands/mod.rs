//! Subcommand implementations

pub mod compare;
pub mod enumerate;
pub mod propagate;

use std::path::Path;

use clap::Args;
use parity_types::{load_tolerance, ToleranceSpec};

use crate::error::CliResult;

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    Failed,
}

impl Status {
    pub fn from_flags(failed: bool, warned: bool, warnings_as_errors: bool) -> Self {
        if failed || (warned && warnings_as_errors) {
            Status::Failed
        } else {
            Status::Clean
        }
    }
}

/// Options shared by commands that run comparisons in parallel.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Comparison settings file (JSON or YAML)
    #[arg(long, env = "PARITY_SETTINGS")]
    pub settings: Option<std::path::PathBuf>,

    /// Number of worker threads (default: one per core)
    #[arg(long, env = "PARITY_N_PROCS")]
    pub n_procs: Option<usize>,

    /// Exit non-zero when any warning is reported
    #[arg(long)]
    pub warnings_as_errors: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

impl RunArgs {
    pub fn tolerance(&self) -> CliResult<ToleranceSpec> {
        match &self.settings {
            Some(path) => Ok(load_settings(path)?),
            None => Ok(ToleranceSpec::default()),
        }
    }
}

fn load_settings(path: &Path) -> CliResult<ToleranceSpec> {
    let tolerance = load_tolerance(path)?;
    tracing::debug!(path = %path.display(), "loaded comparison settings");
    Ok(tolerance)
}
