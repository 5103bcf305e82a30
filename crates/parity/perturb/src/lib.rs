#![deny(unsafe_code)]
//! # parity-perturb
//!
//! Parameter Perturbation Harness: verifies that every perturbable parameter
//! of an input propagates to the serialized artifact exactly where, and by
//! how much, a declared propagation rule says it should.
//!
//! ## Key Types
//!
//! - [`PropagationHarness`] — enumerate, perturb, transform, diff, reconcile
//! - [`ParameterSet`] / [`ParameterRegistry`] — input model and static attribute registry
//! - [`Transform`] — the pipeline under test ([`SimulatedDiatomicTransform`] for tests)
//! - [`RuleSet`] / [`PropagationRule`] — parameter -> expected artifact changes
//! - [`PerturbationStrategy`] — how perturbed values are chosen
//! - [`UnitTable`] — unit expressions to artifact units

pub mod enumerate;
pub mod error;
pub mod harness;
pub mod parameters;
pub mod registry;
pub mod rules;
pub mod simulated;
pub mod strategy;
pub mod transform;
pub mod units;

pub use enumerate::{enumerate_perturbations, enumerate_where, Enumeration};
pub use error::{PerturbError, PerturbResult, TransformError, TransformErrorKind};
pub use harness::{coverage_gaps, PerturbationOutcome, PropagationHarness, PropagationReport, PropagationWarning};
pub use parameters::{Attributes, ParameterFamily, ParameterPath, ParameterSet, ParameterValue};
pub use registry::{AttributeDescriptor, AttributeKind, FamilyDescriptor, ParameterRegistry};
pub use rules::{
    builtin_specs, ComputeFn, ExpectedValueSpec, PropagationRule, RuleContext, RuleSet, RuleSpec, RuleTarget,
    RuleTargetSpec,
};
pub use simulated::SimulatedDiatomicTransform;
pub use strategy::{DefaultPerturbation, PerturbationStrategy, SkipReason};
pub use transform::{active_families, FamilyLabels, Transform};
pub use units::UnitTable;
