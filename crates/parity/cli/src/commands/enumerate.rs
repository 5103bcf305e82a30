//! `parity enumerate`: list the perturbations a parameter file would receive.

use std::path::PathBuf;

use clap::Args;
use parity_perturb::{enumerate_perturbations, DefaultPerturbation, ParameterRegistry, ParameterSet};
use parity_types::{load_model, save_model};

use super::Status;
use crate::error::CliResult;
use crate::output;

#[derive(Args, Debug)]
pub struct EnumerateArgs {
    /// Parameter file (JSON or YAML)
    #[arg(long)]
    pub parameters: PathBuf,

    /// Perturbation list to write (.json or .yaml)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Attribute registry file replacing the built-in registry
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

pub fn execute(args: EnumerateArgs) -> CliResult<Status> {
    let parameters: ParameterSet = load_model(&args.parameters)?;
    let registry = match &args.registry {
        Some(path) => ParameterRegistry::load(path)?,
        None => ParameterRegistry::builtin(),
    };

    let enumeration = enumerate_perturbations(&parameters, &registry, &DefaultPerturbation::default());
    for warning in &enumeration.warnings {
        output::print_warning(warning);
    }
    save_model(&enumeration.perturbations, &args.output)?;
    output::print_success(&format!(
        "{} perturbation(s) written to {}",
        enumeration.perturbations.len(),
        args.output.display()
    ));
    Ok(Status::Clean)
}
