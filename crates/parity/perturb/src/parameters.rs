//! Parameter input model.
//!
//! A [`ParameterSet`] is the declarative input of a transform: named families,
//! each with family-level attributes and an ordered list of parameter entries.
//! Values are plain scalars or quantities carrying a unit expression.

use std::collections::BTreeMap;
use std::fmt;

use parity_types::{format_float, split_path, Perturbation, Scalar};
use serde::{Deserialize, Serialize};

use crate::error::{PerturbError, PerturbResult};

/// One attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Quantity { value: f64, unit: String },
    Scalar(Scalar),
}

impl ParameterValue {
    pub fn quantity(value: f64, unit: impl Into<String>) -> Self {
        ParameterValue::Quantity {
            value,
            unit: unit.into(),
        }
    }

    /// Magnitude in the value's own unit.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Quantity { value, .. } => Some(*value),
            ParameterValue::Scalar(scalar) => scalar.as_f64(),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            ParameterValue::Quantity { unit, .. } => Some(unit),
            ParameterValue::Scalar(_) => None,
        }
    }
}

impl From<Scalar> for ParameterValue {
    fn from(scalar: Scalar) -> Self {
        ParameterValue::Scalar(scalar)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Scalar(Scalar::Float(value))
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        ParameterValue::Scalar(Scalar::Int(value))
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Scalar(Scalar::from(value))
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Quantity { value, unit } => write!(f, "{} {}", format_float(*value), unit),
            ParameterValue::Scalar(scalar) => write!(f, "{}", scalar),
        }
    }
}

pub type Attributes = BTreeMap<String, ParameterValue>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterFamily {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub parameters: Vec<Attributes>,
}

impl ParameterFamily {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn with_parameter(mut self, parameter: Attributes) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Address of one attribute: `Family/attribute` or `Family/Tag/attribute`.
///
/// The tagged form addresses the family's first parameter entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterPath {
    pub family: String,
    pub tag: Option<String>,
    pub attribute: String,
}

impl ParameterPath {
    pub fn parse(path: &str) -> PerturbResult<Self> {
        let invalid = |reason: &str| PerturbError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let segments = split_path(path);
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid("empty segment"));
        }
        match segments.as_slice() {
            [family, attribute] => Ok(Self {
                family: family.to_string(),
                tag: None,
                attribute: attribute.to_string(),
            }),
            [family, tag, attribute] => Ok(Self {
                family: family.to_string(),
                tag: Some(tag.to_string()),
                attribute: attribute.to_string(),
            }),
            _ => Err(invalid("expected 2 or 3 segments")),
        }
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}/{}/{}", self.family, tag, self.attribute),
            None => write!(f, "{}/{}", self.family, self.attribute),
        }
    }
}

/// Parameter families keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    pub families: BTreeMap<String, ParameterFamily>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, name: &str, family: ParameterFamily) -> Self {
        self.families.insert(name.to_string(), family);
        self
    }

    pub fn family(&self, name: &str) -> Option<&ParameterFamily> {
        self.families.get(name)
    }

    fn attributes(&self, path: &ParameterPath) -> PerturbResult<&Attributes> {
        let family = self
            .families
            .get(&path.family)
            .ok_or_else(|| PerturbError::UnknownFamily {
                family: path.family.clone(),
            })?;
        match path.tag {
            None => Ok(&family.attributes),
            Some(_) => family
                .parameters
                .first()
                .ok_or_else(|| PerturbError::NoParameterEntry {
                    family: path.family.clone(),
                }),
        }
    }

    fn attributes_mut(&mut self, path: &ParameterPath) -> PerturbResult<&mut Attributes> {
        let family = self
            .families
            .get_mut(&path.family)
            .ok_or_else(|| PerturbError::UnknownFamily {
                family: path.family.clone(),
            })?;
        match path.tag {
            None => Ok(&mut family.attributes),
            Some(_) => family
                .parameters
                .first_mut()
                .ok_or_else(|| PerturbError::NoParameterEntry {
                    family: path.family.clone(),
                }),
        }
    }

    /// Current value; `Ok(None)` when the attribute is unset.
    pub fn get(&self, path: &ParameterPath) -> PerturbResult<Option<&ParameterValue>> {
        Ok(self.attributes(path)?.get(&path.attribute))
    }

    pub fn set(&mut self, path: &ParameterPath, value: ParameterValue) -> PerturbResult<()> {
        self.attributes_mut(path)?.insert(path.attribute.clone(), value);
        Ok(())
    }

    /// The value `perturbation` would store.
    ///
    /// A perturbation without units keeps the unit of the current value.
    pub fn perturbed_value(&self, perturbation: &Perturbation) -> PerturbResult<ParameterValue> {
        let path = ParameterPath::parse(&perturbation.path)?;
        let current_unit = self.get(&path)?.and_then(ParameterValue::unit).map(str::to_string);
        match perturbation.new_units.clone().or(current_unit) {
            Some(unit) => {
                let magnitude = perturbation
                    .new_value
                    .as_f64()
                    .ok_or_else(|| PerturbError::NotNumeric {
                        path: perturbation.path.clone(),
                    })?;
                Ok(ParameterValue::quantity(magnitude, unit))
            }
            None => Ok(ParameterValue::Scalar(perturbation.new_value.clone())),
        }
    }

    /// Apply a perturbation in place.
    pub fn apply(&mut self, perturbation: &Perturbation) -> PerturbResult<()> {
        let path = ParameterPath::parse(&perturbation.path)?;
        let value = self.perturbed_value(perturbation)?;
        self.set(&path, value)
    }
}
