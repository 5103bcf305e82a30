//! `parity propagate`: perturbation verification through an external pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use parity_batch::WorkerPool;
use parity_perturb::{
    coverage_gaps, ParameterRegistry, ParameterSet, PropagationHarness, PropagationReport, RuleSet, RuleSpec,
};
use parity_types::{load_model, save_model, ToleranceSpec};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{RunArgs, Status};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::transform::CommandTransform;

#[derive(Args, Debug)]
pub struct PropagateArgs {
    /// Parameter file and subject; repeat for several inputs
    #[arg(long, num_args = 2, value_names = ["PARAMETERS", "SUBJECT"], required = true)]
    pub input: Vec<String>,

    /// Pipeline command, invoked as `<cmd> transform|label --parameters <file> --subject <subject>`
    #[arg(long)]
    pub transform_cmd: String,

    /// Report file (.json or .yaml)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Propagation rule file replacing the built-in rules
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Attribute registry file replacing the built-in registry
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Fail the whole run on the first fatal transform error
    #[arg(long)]
    pub fail_fast: bool,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Reports keyed by input, plus the registry attributes no input exercised.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PropagationSummary {
    pub inputs: BTreeMap<String, PropagationReport>,
    /// Inputs whose baseline could not be produced.
    pub errors: BTreeMap<String, String>,
    pub coverage_gaps: Vec<String>,
}

impl PropagationSummary {
    fn failed(&self) -> bool {
        !self.errors.is_empty() || self.inputs.values().any(|r| r.has_residual() || r.has_errors())
    }

    fn warned(&self) -> bool {
        !self.coverage_gaps.is_empty() || self.inputs.values().any(PropagationReport::has_warnings)
    }
}

struct Input {
    key: String,
    parameters: ParameterSet,
    subject: String,
}

fn load_inputs(raw: &[String]) -> CliResult<Vec<Input>> {
    raw.chunks(2)
        .map(|pair| match pair {
            [path, subject] => Ok(Input {
                key: format!("{}:{}", path, subject),
                parameters: load_model(path)?,
                subject: subject.clone(),
            }),
            _ => Err(CliError::InvalidInput(
                "--input takes a parameter file and a subject".to_string(),
            )),
        })
        .collect()
}

pub fn execute(args: PropagateArgs) -> CliResult<Status> {
    let tolerance = args.run.tolerance()?;
    let registry = match &args.registry {
        Some(path) => ParameterRegistry::load(path)?,
        None => ParameterRegistry::builtin(),
    };
    let rule_specs: Option<Vec<RuleSpec>> = match &args.rules {
        Some(path) => Some(load_model(path)?),
        None => None,
    };
    let inputs = load_inputs(&args.input)?;

    let mut summary = PropagationSummary::default();
    for input in &inputs {
        let rules = match &rule_specs {
            Some(specs) => RuleSet::from_specs(specs.clone())?,
            None => RuleSet::builtin()?,
        };
        let harness = build_harness(&args, input, registry.clone(), rules, tolerance.clone())?;

        info!(input = %input.key, "verifying input");
        let pb = output::spinner(args.run.quiet);
        pb.set_message(input.key.clone());
        let result = harness.verify_with_progress(&input.parameters, |path| {
            pb.set_message(path.to_string());
            pb.tick();
        });
        pb.finish_and_clear();

        match result {
            Ok(report) => {
                summarize_input(&input.key, &report);
                summary.inputs.insert(input.key.clone(), report);
            }
            Err(e) if args.fail_fast => return Err(e.into()),
            Err(e) => {
                warn!(input = %input.key, error = %e, "input could not be verified");
                output::print_error(&format!("{}: {}", input.key, e));
                summary.errors.insert(input.key.clone(), e.to_string());
            }
        }
    }

    summary.coverage_gaps = coverage_gaps(
        &registry,
        summary.inputs.values().flat_map(PropagationReport::perturbed_paths),
    );
    if !summary.coverage_gaps.is_empty() {
        output::print_warning(&format!(
            "{} declared attribute(s) were never perturbed: {}",
            summary.coverage_gaps.len(),
            summary.coverage_gaps.join(", ")
        ));
    }

    save_model(&summary, &args.output)?;
    output::print_info(&format!(
        "{} input(s) verified, report written to {}",
        summary.inputs.len(),
        args.output.display()
    ));

    let status = Status::from_flags(summary.failed(), summary.warned(), args.run.warnings_as_errors);
    if status == Status::Clean {
        output::print_success("all perturbations propagated as expected");
    }
    Ok(status)
}

fn build_harness(
    args: &PropagateArgs,
    input: &Input,
    registry: ParameterRegistry,
    rules: RuleSet,
    tolerance: ToleranceSpec,
) -> CliResult<PropagationHarness> {
    let transform = CommandTransform::new(&args.transform_cmd, &input.subject)?;
    Ok(PropagationHarness::new(transform)?
        .with_registry(registry)
        .with_rules(rules)
        .with_tolerance(tolerance)
        .with_pool(WorkerPool::new(args.run.n_procs)?)
        .with_fatal_errors(args.fail_fast))
}

fn summarize_input(key: &str, report: &PropagationReport) {
    for (path, outcome) in &report.outcomes {
        if let Some(error) = &outcome.error {
            output::print_error(&format!("{} {}: {}", key, path, error));
        }
        if !outcome.residual.is_empty() {
            output::print_error(&format!(
                "{} {}: {} unexplained difference(s)",
                key,
                path,
                outcome.residual.len()
            ));
        }
        for warning in &outcome.warnings {
            output::print_warning(&format!("{} {}: {}", key, path, warning));
        }
    }
    for warning in &report.enumeration_warnings {
        output::print_warning(&format!("{}: {}", key, warning));
    }
}
