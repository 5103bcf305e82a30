//! Propagation rules.
//!
//! A [`PropagationRule`] maps one abstract parameter to the concrete artifact
//! locations it should move, with a pure function computing each expected new
//! value. Rules are declared as [`RuleSpec`] data (built in, or loaded from a
//! file) and compiled to closures once.

use std::collections::BTreeMap;
use std::path::Path;

use parity_types::{load_model, CanonicalRecord, ExpectedChange, PathPattern, Perturbation, Scalar, ToleranceSpec, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PerturbError, PerturbResult};
use crate::parameters::{ParameterPath, ParameterSet};
use crate::units::UnitTable;

/// Everything a rule may consult while computing expected values.
pub struct RuleContext<'a> {
    /// Canonical artifact of the unperturbed input.
    pub baseline: &'a CanonicalRecord,
    /// The unperturbed input.
    pub parameters: &'a ParameterSet,
    pub perturbation: &'a Perturbation,
    pub units: &'a UnitTable,
    /// Perturbed value converted to artifact units.
    pub new_value: f64,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        baseline: &'a CanonicalRecord,
        parameters: &'a ParameterSet,
        perturbation: &'a Perturbation,
        units: &'a UnitTable,
    ) -> PerturbResult<Self> {
        let value = parameters.perturbed_value(perturbation)?;
        let new_value = units
            .value_in_md(&value)?
            .ok_or_else(|| PerturbError::NotNumeric {
                path: perturbation.path.clone(),
            })?;
        Ok(Self {
            baseline,
            parameters,
            perturbation,
            units,
            new_value,
        })
    }

    /// Unperturbed value of a parameter, in artifact units.
    pub fn parameter(&self, path: &str) -> Option<f64> {
        let path = ParameterPath::parse(path).ok()?;
        let value = self.parameters.get(&path).ok()??;
        self.units.value_in_md(value).ok()?
    }

    /// Numeric baseline artifact value at a concrete path.
    pub fn baseline_value(&self, path: &str) -> Option<f64> {
        self.baseline.get(path).and_then(Value::as_f64)
    }
}

/// Computes the expected new value from the old one; `None` means no
/// expectation for that location.
pub type ComputeFn = Box<dyn Fn(&RuleContext<'_>, &Scalar) -> Option<Scalar> + Send + Sync>;

fn compute<F>(f: F) -> ComputeFn
where
    F: Fn(&RuleContext<'_>, &Scalar) -> Option<Scalar> + Send + Sync + 'static,
{
    Box::new(f)
}

pub struct RuleTarget {
    pub pattern: PathPattern,
    /// Field of the matched block whose zero baseline value marks an excluded
    /// pair; such locations are ignored.
    pub excluded_when_zero: Option<String>,
    compute: ComputeFn,
}

impl RuleTarget {
    pub fn new<F>(pattern: PathPattern, f: F) -> Self
    where
        F: Fn(&RuleContext<'_>, &Scalar) -> Option<Scalar> + Send + Sync + 'static,
    {
        Self {
            pattern,
            excluded_when_zero: None,
            compute: compute(f),
        }
    }

    pub fn excluded_when_zero(mut self, field: impl Into<String>) -> Self {
        self.excluded_when_zero = Some(field.into());
        self
    }

    fn is_excluded(&self, ctx: &RuleContext<'_>, path: &str) -> bool {
        let Some(field) = &self.excluded_when_zero else {
            return false;
        };
        let sibling = match path.rsplit_once('/') {
            Some((block, _)) => format!("{}/{}", block, field),
            None => field.clone(),
        };
        ctx.baseline_value(&sibling) == Some(0.0)
    }
}

pub struct PropagationRule {
    pub parameter: String,
    pub targets: Vec<RuleTarget>,
}

impl PropagationRule {
    pub fn new(parameter: &str) -> Self {
        Self {
            parameter: parameter.to_string(),
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: RuleTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Concrete expected changes against the baseline.
    ///
    /// Locations whose computed value equals the baseline (within the
    /// tolerance for that path) produce no expectation.
    pub fn expected_changes(&self, ctx: &RuleContext<'_>, tolerance: &ToleranceSpec) -> Vec<ExpectedChange> {
        let mut out = Vec::new();
        for target in &self.targets {
            for (path, value) in ctx.baseline.select(&target.pattern) {
                let Some(old) = value.as_scalar() else {
                    continue;
                };
                if target.is_excluded(ctx, &path) {
                    continue;
                }
                let Some(new) = (target.compute)(ctx, old) else {
                    continue;
                };
                if new.approx_eq(old, tolerance.resolve_path(&path)) {
                    continue;
                }
                out.push(ExpectedChange::new(path, old.clone(), new));
            }
        }
        debug!(parameter = %self.parameter, expected = out.len(), "computed expected changes");
        out
    }
}

// ---------------------------------------------------------------------------
// Declarative rules
// ---------------------------------------------------------------------------

fn unit_factor() -> f64 {
    1.0
}

/// How the expected value at a target location is computed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectedValueSpec {
    /// `new * factor`, optionally times another parameter's current value.
    NewValue {
        #[serde(default = "unit_factor")]
        factor: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        factor_parameter: Option<String>,
    },
    /// `old / baseline_parameter * new`.
    ScaleOld { baseline: String },
    /// `old * before / new`, `before` being the unperturbed value of the
    /// `baseline` parameter, or `fallback` when the input leaves it unset.
    DivideOld {
        baseline: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<f64>,
    },
    /// `old + new - reference`, `reference` read from the baseline artifact.
    ShiftOld { reference: String },
    /// `reference - new`, `reference` read from the baseline artifact.
    ReferenceMinusNew { reference: String },
}

impl ExpectedValueSpec {
    pub fn new_value() -> Self {
        ExpectedValueSpec::NewValue {
            factor: 1.0,
            factor_parameter: None,
        }
    }

    pub fn scaled(factor: f64) -> Self {
        ExpectedValueSpec::NewValue {
            factor,
            factor_parameter: None,
        }
    }

    pub fn compile(self) -> ComputeFn {
        match self {
            ExpectedValueSpec::NewValue {
                factor,
                factor_parameter,
            } => compute(move |ctx, _| {
                let scale = match &factor_parameter {
                    Some(parameter) => ctx.parameter(parameter)?,
                    None => 1.0,
                };
                Some(Scalar::Float(ctx.new_value * factor * scale))
            }),
            ExpectedValueSpec::ScaleOld { baseline } => compute(move |ctx, old| {
                let before = ctx.parameter(&baseline)?;
                if before == 0.0 {
                    return None;
                }
                Some(Scalar::Float(old.as_f64()? / before * ctx.new_value))
            }),
            ExpectedValueSpec::DivideOld { baseline, fallback } => compute(move |ctx, old| {
                if ctx.new_value == 0.0 {
                    return None;
                }
                let before = ctx.parameter(&baseline).or(fallback)?;
                Some(Scalar::Float(old.as_f64()? * before / ctx.new_value))
            }),
            ExpectedValueSpec::ShiftOld { reference } => compute(move |ctx, old| {
                let before = ctx.baseline_value(&reference)?;
                Some(Scalar::Float(old.as_f64()? + ctx.new_value - before))
            }),
            ExpectedValueSpec::ReferenceMinusNew { reference } => compute(move |ctx, _| {
                Some(Scalar::Float(ctx.baseline_value(&reference)? - ctx.new_value))
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTargetSpec {
    pub pattern: String,
    /// Sibling field whose zero baseline marks an excluded pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_when_zero: Option<String>,
    pub value: ExpectedValueSpec,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub parameter: String,
    pub targets: Vec<RuleTargetSpec>,
}

impl RuleSpec {
    fn compile(self) -> PerturbResult<PropagationRule> {
        ParameterPath::parse(&self.parameter)?;
        let mut rule = PropagationRule::new(&self.parameter);
        for spec in self.targets {
            let target = RuleTarget {
                pattern: PathPattern::parse(&spec.pattern)?,
                excluded_when_zero: spec.excluded_when_zero,
                compute: spec.value.compile(),
            };
            rule = rule.with_target(target);
        }
        Ok(rule)
    }
}

/// Rules keyed by parameter path.
#[derive(Default)]
pub struct RuleSet {
    rules: BTreeMap<String, PropagationRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rule: PropagationRule) {
        self.rules.insert(rule.parameter.clone(), rule);
    }

    pub fn with_rule(mut self, rule: PropagationRule) -> Self {
        self.insert(rule);
        self
    }

    pub fn get(&self, parameter: &str) -> Option<&PropagationRule> {
        self.rules.get(parameter)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn from_specs(specs: Vec<RuleSpec>) -> PerturbResult<Self> {
        let mut set = Self::new();
        for spec in specs {
            if set.rules.contains_key(&spec.parameter) {
                return Err(PerturbError::Rule {
                    parameter: spec.parameter,
                    reason: "declared more than once".into(),
                });
            }
            set.insert(spec.compile()?);
        }
        Ok(set)
    }

    /// Read a list of [`RuleSpec`] from a JSON or YAML file.
    pub fn load(path: impl AsRef<Path>) -> PerturbResult<Self> {
        let specs: Vec<RuleSpec> = load_model(path)?;
        Self::from_specs(specs)
    }

    pub fn builtin() -> PerturbResult<Self> {
        Self::from_specs(builtin_specs())
    }
}

fn target(pattern: &str, value: ExpectedValueSpec) -> RuleTargetSpec {
    RuleTargetSpec {
        pattern: pattern.to_string(),
        excluded_when_zero: None,
        value,
    }
}

/// Target on exception blocks, ignoring pairs whose `field` is zero.
fn exception_target(pattern: &str, field: &str, value: ExpectedValueSpec) -> RuleTargetSpec {
    RuleTargetSpec {
        excluded_when_zero: Some(field.to_string()),
        ..target(pattern, value)
    }
}

fn rule(parameter: &str, targets: Vec<RuleTargetSpec>) -> RuleSpec {
    RuleSpec {
        parameter: parameter.to_string(),
        targets,
    }
}

const BONDS: &str = "Forces/HarmonicBondForce/Bonds/*";
const ANGLES: &str = "Forces/HarmonicAngleForce/Angles/*";
const TORSIONS: &str = "Forces/PeriodicTorsionForce/Torsions/*";
const PARTICLES: &str = "Forces/NonbondedForce/Particles/*";
const EXCEPTIONS: &str = "Forces/NonbondedForce/Exceptions/*";
const CUTOFF: &str = "Forces/NonbondedForce/cutoff";
const SWITCHING: &str = "Forces/NonbondedForce/switchingDistance";

/// One-to-one mappings from force field parameters to system locations.
pub fn builtin_specs() -> Vec<RuleSpec> {
    use ExpectedValueSpec as V;

    let at = |base: &str, field: &str| format!("{}/{}", base, field);
    let rmin_to_sigma = 2.0 / 2f64.powf(1.0 / 6.0);

    let mut specs = vec![
        rule(
            "Bonds/Bond/length",
            vec![
                target(&at(BONDS, "d"), V::new_value()),
                target("Constraints/*/d", V::new_value()),
            ],
        ),
        rule("Bonds/Bond/k", vec![target(&at(BONDS, "k"), V::new_value())]),
        rule("Angles/Angle/angle", vec![target(&at(ANGLES, "a"), V::new_value())]),
        rule("Angles/Angle/k", vec![target(&at(ANGLES, "k"), V::new_value())]),
        rule("Constraints/Constraint/distance", vec![target("Constraints/*/d", V::new_value())]),
        rule(
            "vdW/Atom/epsilon",
            vec![
                target(&at(PARTICLES, "eps"), V::new_value()),
                exception_target(
                    &at(EXCEPTIONS, "eps"),
                    "eps",
                    V::NewValue {
                        factor: 1.0,
                        factor_parameter: Some("vdW/scale14".into()),
                    },
                ),
            ],
        ),
        rule(
            "vdW/Atom/sigma",
            vec![
                target(&at(PARTICLES, "sig"), V::new_value()),
                exception_target(&at(EXCEPTIONS, "sig"), "eps", V::new_value()),
            ],
        ),
        rule(
            "vdW/Atom/rmin_half",
            vec![
                target(&at(PARTICLES, "sig"), V::scaled(rmin_to_sigma)),
                exception_target(&at(EXCEPTIONS, "sig"), "eps", V::scaled(rmin_to_sigma)),
            ],
        ),
        rule(
            "vdW/cutoff",
            vec![
                target(CUTOFF, V::new_value()),
                target(
                    SWITCHING,
                    V::ShiftOld {
                        reference: CUTOFF.into(),
                    },
                ),
            ],
        ),
        rule(
            "vdW/switch_width",
            vec![target(
                SWITCHING,
                V::ReferenceMinusNew {
                    reference: CUTOFF.into(),
                },
            )],
        ),
        rule(
            "vdW/scale14",
            vec![exception_target(
                &at(EXCEPTIONS, "eps"),
                "eps",
                V::ScaleOld {
                    baseline: "vdW/scale14".into(),
                },
            )],
        ),
        rule(
            "Electrostatics/scale14",
            vec![exception_target(
                &at(EXCEPTIONS, "q"),
                "q",
                V::ScaleOld {
                    baseline: "Electrostatics/scale14".into(),
                },
            )],
        ),
    ];

    // Toolkit default divisors when the input leaves idivf unset.
    for (family, tag, k_factor, divisor) in [
        ("ProperTorsions", "Proper", 1.0, 1.0),
        ("ImproperTorsions", "Improper", 1.0 / 3.0, 3.0),
    ] {
        let parameter = |name: &str| format!("{}/{}/{}", family, tag, name);
        specs.push(rule(
            &parameter("periodicity1"),
            vec![target(&at(TORSIONS, "periodicity"), V::new_value())],
        ));
        specs.push(rule(&parameter("phase1"), vec![target(&at(TORSIONS, "phase"), V::new_value())]));
        specs.push(rule(&parameter("k1"), vec![target(&at(TORSIONS, "k"), V::scaled(k_factor))]));
        specs.push(rule(
            &parameter("idivf1"),
            vec![target(
                &at(TORSIONS, "k"),
                V::DivideOld {
                    baseline: parameter("idivf1"),
                    fallback: Some(divisor),
                },
            )],
        ));
    }
    specs
}
