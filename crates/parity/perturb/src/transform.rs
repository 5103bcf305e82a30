//! The pipeline under test.
//!
//! A [`Transform`] turns a [`ParameterSet`] into a raw serialized artifact for
//! one fixed subject, and reports which parameter families touched that
//! subject. Implementations must be pure with respect to their input: the
//! harness calls them concurrently on independent copies.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TransformError;
use crate::parameters::ParameterSet;
use crate::registry::ParameterRegistry;

/// Number of effects each family had on the subject.
pub type FamilyLabels = BTreeMap<String, usize>;

pub trait Transform: Send + Sync {
    /// Produce the raw artifact text.
    fn transform(&self, parameters: &ParameterSet) -> Result<String, TransformError>;

    /// Label the subject against every family's applicability condition.
    fn label(&self, parameters: &ParameterSet) -> Result<FamilyLabels, TransformError>;

    /// Name of this transform for logging.
    fn name(&self) -> &str;
}

/// Families with at least one recorded effect, plus those always active.
pub fn active_families(labels: &FamilyLabels, registry: &ParameterRegistry) -> BTreeSet<String> {
    registry
        .families()
        .filter(|(name, descriptor)| {
            descriptor.always_active || labels.get(*name).is_some_and(|count| *count > 0)
        })
        .map(|(name, _)| name.to_string())
        .collect()
}
