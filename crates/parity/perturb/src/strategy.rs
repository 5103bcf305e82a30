//! How a new value is chosen for a parameter.

use std::collections::BTreeMap;
use std::fmt;

use parity_types::{Perturbation, Scalar};

use crate::parameters::ParameterValue;

/// Why a parameter could not be perturbed.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    NotNumeric(String),
    Unset,
    /// The offset value does not fit the parameter's integer type.
    Overflow(i64),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotNumeric(value) => {
                write!(f, "can only perturb numeric values (found '{}')", value)
            }
            SkipReason::Unset => f.write_str("value is unset and no probe value is declared"),
            SkipReason::Overflow(value) => write!(f, "offsetting {} overflows a 64-bit integer", value),
        }
    }
}

pub trait PerturbationStrategy: Send + Sync {
    /// Pick the perturbed value for `path` given its current value.
    fn perturb(&self, path: &str, old: Option<&ParameterValue>) -> Result<Perturbation, SkipReason>;
}

/// Fixed offset in the native unit, with per-path overrides.
#[derive(Clone, Debug)]
pub struct DefaultPerturbation {
    fixed: BTreeMap<String, ParameterValue>,
    unset_probes: BTreeMap<String, ParameterValue>,
    offset: f64,
}

impl DefaultPerturbation {
    pub fn new() -> Self {
        Self {
            fixed: BTreeMap::new(),
            unset_probes: BTreeMap::new(),
            offset: 1.0,
        }
        .with_fixed("ImproperTorsions/Improper/idivf1", ParameterValue::from(2i64))
        .with_unset_probe(
            "Constraints/Constraint/distance",
            ParameterValue::quantity(0.1234, "angstrom"),
        )
    }

    /// Always use `value` for `path`.
    pub fn with_fixed(mut self, path: &str, value: ParameterValue) -> Self {
        self.fixed.insert(path.to_string(), value);
        self
    }

    /// Use `value` for `path` when it is currently unset.
    pub fn with_unset_probe(mut self, path: &str, value: ParameterValue) -> Self {
        self.unset_probes.insert(path.to_string(), value);
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    fn offset_scalar(&self, scalar: &Scalar) -> Result<Scalar, SkipReason> {
        match scalar {
            Scalar::Int(i) if self.offset.fract() == 0.0 => i
                .checked_add(self.offset as i64)
                .map(Scalar::Int)
                .ok_or(SkipReason::Overflow(*i)),
            Scalar::Int(i) => Ok(Scalar::Float(*i as f64 + self.offset)),
            Scalar::Float(f) => Ok(Scalar::Float(f + self.offset)),
            other => Err(SkipReason::NotNumeric(other.to_string())),
        }
    }
}

impl Default for DefaultPerturbation {
    fn default() -> Self {
        Self::new()
    }
}

fn perturbation(path: &str, value: &ParameterValue) -> Perturbation {
    match value {
        ParameterValue::Quantity { value, unit } => Perturbation::new(path, *value).with_units(unit.clone()),
        ParameterValue::Scalar(scalar) => Perturbation::new(path, scalar.clone()),
    }
}

impl PerturbationStrategy for DefaultPerturbation {
    fn perturb(&self, path: &str, old: Option<&ParameterValue>) -> Result<Perturbation, SkipReason> {
        if let Some(value) = self.fixed.get(path) {
            return Ok(perturbation(path, value));
        }
        match old {
            None => self
                .unset_probes
                .get(path)
                .map(|value| perturbation(path, value))
                .ok_or(SkipReason::Unset),
            Some(ParameterValue::Quantity { value, unit }) => {
                Ok(Perturbation::new(path, value + self.offset).with_units(unit.clone()))
            }
            Some(ParameterValue::Scalar(scalar)) => {
                Ok(Perturbation::new(path, self.offset_scalar(scalar)?))
            }
        }
    }
}
