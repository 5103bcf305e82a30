//! Parameter perturbation harness.
//!
//! For one input, the harness labels the input to find the active families,
//! enumerates one perturbation per perturbable attribute, builds the baseline
//! artifact once, then runs every perturbation on its own copy of the input:
//! apply, transform, canonicalize, diff against the baseline, and reconcile
//! the diff against the rule's expected changes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use parity_batch::WorkerPool;
use parity_canonical::{CanonicalOptions, Canonicalizer};
use parity_differ::diff;
use parity_reconcile::reconcile;
use parity_types::{CanonicalRecord, Difference, ExpectedChange, Perturbation, ToleranceSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::enumerate::enumerate_where;
use crate::error::{PerturbResult, TransformError};
use crate::parameters::ParameterSet;
use crate::registry::ParameterRegistry;
use crate::rules::{RuleContext, RuleSet};
use crate::strategy::{DefaultPerturbation, PerturbationStrategy};
use crate::transform::{active_families, Transform};
use crate::units::UnitTable;

// ── Outcomes ────────────────────────────────────────────────────────────

/// Something about one perturbation that needs human judgement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropagationWarning {
    NoRule,
    UnmetExpectation(ExpectedChange),
    ZeroEffect,
}

impl fmt::Display for PropagationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationWarning::NoRule => f.write_str("no propagation rule available"),
            PropagationWarning::UnmetExpectation(change) => {
                write!(f, "expected change did not occur: {}", change)
            }
            PropagationWarning::ZeroEffect => f.write_str("parameter had zero observable effect"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerturbationOutcome {
    pub perturbation: Perturbation,
    /// Differences no expected change explains.
    pub residual: Vec<Difference>,
    pub warnings: Vec<PropagationWarning>,
    /// Set when this perturbation could not be evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PerturbationOutcome {
    pub fn new(perturbation: Perturbation) -> Self {
        Self {
            perturbation,
            residual: Vec::new(),
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn failed(perturbation: Perturbation, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(perturbation)
        }
    }

    pub fn is_clean(&self) -> bool {
        self.residual.is_empty() && self.warnings.is_empty() && self.error.is_none()
    }
}

/// Outcomes for one input keyed by parameter path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropagationReport {
    pub active_families: Vec<String>,
    pub outcomes: BTreeMap<String, PerturbationOutcome>,
    /// Attributes that were not perturbed, and why.
    pub enumeration_warnings: Vec<String>,
    pub cancelled: Vec<String>,
}

impl PropagationReport {
    pub fn has_residual(&self) -> bool {
        self.outcomes.values().any(|o| !o.residual.is_empty())
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.values().any(|o| o.error.is_some())
    }

    pub fn has_warnings(&self) -> bool {
        !self.enumeration_warnings.is_empty()
            || !self.cancelled.is_empty()
            || self.outcomes.values().any(|o| !o.warnings.is_empty())
    }

    pub fn perturbed_paths(&self) -> impl Iterator<Item = &str> {
        self.outcomes.keys().map(String::as_str)
    }
}

/// Declared perturbable attributes never perturbed by any run.
///
/// Indexed attributes count as covered when their `1` variant was perturbed.
pub fn coverage_gaps<'a>(registry: &ParameterRegistry, perturbed: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let perturbed: BTreeSet<&str> = perturbed.into_iter().collect();
    registry
        .perturbable_attributes()
        .into_iter()
        .filter(|declared| {
            !perturbed.contains(declared.as_str()) && !perturbed.contains(format!("{}1", declared).as_str())
        })
        .collect()
}

// ── Harness ─────────────────────────────────────────────────────────────

pub struct PropagationHarness {
    transform: Box<dyn Transform>,
    registry: ParameterRegistry,
    rules: RuleSet,
    strategy: Box<dyn PerturbationStrategy>,
    tolerance: ToleranceSpec,
    canonicalizer: Canonicalizer,
    units: UnitTable,
    pool: WorkerPool,
    fatal_errors: bool,
}

impl PropagationHarness {
    /// Harness with the built-in registry, rules and strategy on a default pool.
    pub fn new<T: Transform + 'static>(transform: T) -> PerturbResult<Self> {
        Ok(Self {
            transform: Box::new(transform),
            registry: ParameterRegistry::builtin(),
            rules: RuleSet::builtin()?,
            strategy: Box::new(DefaultPerturbation::new()),
            tolerance: ToleranceSpec::default(),
            canonicalizer: Canonicalizer::default(),
            units: UnitTable::md(),
            pool: WorkerPool::new(None)?,
            fatal_errors: false,
        })
    }

    pub fn with_registry(mut self, registry: ParameterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_strategy<S: PerturbationStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn with_tolerance(mut self, tolerance: ToleranceSpec) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_options(mut self, options: CanonicalOptions) -> Self {
        self.canonicalizer = Canonicalizer::new(options);
        self
    }

    pub fn with_units(mut self, units: UnitTable) -> Self {
        self.units = units;
        self
    }

    pub fn with_pool(mut self, pool: WorkerPool) -> Self {
        self.pool = pool;
        self
    }

    /// Re-raise fatal transform errors instead of recording them.
    pub fn with_fatal_errors(mut self, fatal: bool) -> Self {
        self.fatal_errors = fatal;
        self
    }

    pub fn registry(&self) -> &ParameterRegistry {
        &self.registry
    }

    pub fn verify_propagation(&self, input: &ParameterSet) -> PerturbResult<PropagationReport> {
        self.verify_with_progress(input, |_| {})
    }

    /// Like [`verify_propagation`](Self::verify_propagation), calling
    /// `progress` with each parameter path as it finishes.
    pub fn verify_with_progress<P>(&self, input: &ParameterSet, progress: P) -> PerturbResult<PropagationReport>
    where
        P: Fn(&str) + Sync,
    {
        let labels = self.transform.label(input)?;
        let active = active_families(&labels, &self.registry);

        let mut enumeration = enumerate_where(input, &self.registry, self.strategy.as_ref(), |family| {
            active.contains(family)
        });
        for family in input.families.keys() {
            if self.registry.family(family).is_some() && !active.contains(family) {
                enumeration
                    .warnings
                    .push(format!("skipping {} - family not active for this input", family));
            }
        }
        info!(
            transform = self.transform.name(),
            active = active.len(),
            perturbations = enumeration.perturbations.len(),
            "verifying propagation"
        );

        let baseline_text = self.transform.transform(input)?;
        let baseline = self.canonicalizer.build(&baseline_text)?;

        let items: Vec<(String, Perturbation)> = enumeration
            .perturbations
            .into_iter()
            .map(|p| (p.path.clone(), p))
            .collect();
        let output = self.pool.run(
            items,
            |_, perturbation| {
                let result = self.run_one(input, &baseline, &perturbation);
                (perturbation, result)
            },
            |path| progress(path),
        );

        let mut report = PropagationReport {
            active_families: active.into_iter().collect(),
            enumeration_warnings: enumeration.warnings,
            cancelled: output.cancelled,
            ..PropagationReport::default()
        };
        for (path, (perturbation, result)) in output.completed {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(error) if error.is_fatal() && self.fatal_errors => return Err(error.into()),
                Err(error) => {
                    warn!(path = %path, error = %error, "transform failed");
                    PerturbationOutcome::failed(perturbation, error.to_string())
                }
            };
            report.outcomes.insert(path, outcome);
        }

        info!(
            outcomes = report.outcomes.len(),
            residual = report.has_residual(),
            cancelled = report.cancelled.len(),
            "propagation verified"
        );
        Ok(report)
    }

    fn run_one(
        &self,
        input: &ParameterSet,
        baseline: &CanonicalRecord,
        perturbation: &Perturbation,
    ) -> Result<PerturbationOutcome, TransformError> {
        let mut outcome = PerturbationOutcome::new(perturbation.clone());

        let mut parameters = input.clone();
        if let Err(e) = parameters.apply(perturbation) {
            outcome.error = Some(e.to_string());
            return Ok(outcome);
        }
        let text = self.transform.transform(&parameters)?;
        let perturbed = match self.canonicalizer.build(&text) {
            Ok(record) => record,
            Err(e) => {
                outcome.error = Some(format!("perturbed artifact: {}", e));
                return Ok(outcome);
            }
        };

        let differences = diff(baseline, &perturbed, &self.tolerance);
        let was_perturbed = !differences.is_empty();

        match self.rules.get(&perturbation.path) {
            None => outcome.warnings.push(PropagationWarning::NoRule),
            Some(rule) => {
                let ctx = match RuleContext::new(baseline, input, perturbation, &self.units) {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        outcome.error = Some(e.to_string());
                        return Ok(outcome);
                    }
                };
                let expected = rule.expected_changes(&ctx, &self.tolerance);
                let reconciliation = reconcile(differences, &expected, &self.tolerance);
                outcome.residual = reconciliation.residual;
                outcome.warnings.extend(
                    reconciliation
                        .unmet
                        .into_iter()
                        .map(PropagationWarning::UnmetExpectation),
                );
            }
        }
        if !was_perturbed {
            outcome.warnings.insert(0, PropagationWarning::ZeroEffect);
        }

        debug!(
            path = %perturbation.path,
            residual = outcome.residual.len(),
            warnings = outcome.warnings.len(),
            "perturbation evaluated"
        );
        Ok(outcome)
    }
}
