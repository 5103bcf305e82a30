//! Declared intentional changes and single-parameter perturbations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Scalar, Value};

/// Kind tag carried by expected-change files. Only value changes exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    #[default]
    ValueChanged,
}

/// A divergence at `path` from `old_value` to `new_value` that is intentional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedChange {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ChangeKind>,
    pub path: String,
    pub old_value: Scalar,
    pub new_value: Scalar,
}

impl ExpectedChange {
    pub fn new(path: impl Into<String>, old_value: impl Into<Scalar>, new_value: impl Into<Scalar>) -> Self {
        Self {
            kind: None,
            path: path.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    /// Whether an observed `old -> new` at `path` is exactly this change.
    ///
    /// Numeric values compare within `tolerance`; non-scalar values never match.
    pub fn explains(&self, path: &str, old: &Value, new: &Value, tolerance: f64) -> bool {
        if self.path != path {
            return false;
        }
        match (old.as_scalar(), new.as_scalar()) {
            (Some(old), Some(new)) => {
                self.old_value.approx_eq(old, tolerance) && self.new_value.approx_eq(new, tolerance)
            }
            _ => false,
        }
    }
}

impl fmt::Display for ExpectedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.path, self.old_value, self.new_value)
    }
}

/// A single-parameter mutation applied to an input before re-running the
/// transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Perturbation {
    /// Parameter path, e.g. `Bonds/Bond/length` or `vdW/cutoff`.
    pub path: String,
    pub new_value: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_units: Option<String>,
}

impl Perturbation {
    pub fn new(path: impl Into<String>, new_value: impl Into<Scalar>) -> Self {
        Self {
            path: path.into(),
            new_value: new_value.into(),
            new_units: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.new_units = Some(units.into());
        self
    }
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.new_units {
            Some(units) => write!(f, "{} = {} {}", self.path, self.new_value, units),
            None => write!(f, "{} = {}", self.path, self.new_value),
        }
    }
}
