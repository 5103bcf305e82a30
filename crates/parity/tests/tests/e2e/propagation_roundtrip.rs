//! End-to-end test: parameter perturbation through the simulated diatomic
//! pipeline.
//!
//! Parameters and rules are read from files the way an operator supplies
//! them; the report is checked per parameter path and for registry coverage.

use std::fs;

use parity_batch::WorkerPool;
use parity_perturb::{
    coverage_gaps, ParameterSet, PropagationHarness, PropagationReport, PropagationWarning, RuleSet,
    SimulatedDiatomicTransform,
};
use parity_tests::carbon_monoxide;
use parity_types::{load_model, save_model};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn harness() -> PropagationHarness {
    PropagationHarness::new(SimulatedDiatomicTransform::new())
        .unwrap()
        .with_pool(WorkerPool::new(Some(3)).unwrap())
}

fn verify_from_yaml(harness: &PropagationHarness) -> PropagationReport {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("co.yaml");
    fs::write(&path, serde_yaml::to_string(&carbon_monoxide()).unwrap()).unwrap();
    let parameters: ParameterSet = load_model(&path).unwrap();
    assert_eq!(parameters, carbon_monoxide());
    harness.verify_propagation(&parameters).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn bond_length_round_trip_is_fully_explained() {
    let report = verify_from_yaml(&harness());
    let outcome = &report.outcomes["Bonds/Bond/length"];
    assert!(outcome.residual.is_empty(), "{:?}", outcome.residual);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert!(outcome.error.is_none());
}

#[test]
fn unreferenced_parameter_has_zero_effect() {
    let report = verify_from_yaml(&harness());
    // A diatomic has no 1-4 pairs.
    let outcome = &report.outcomes["vdW/scale14"];
    assert!(outcome.residual.is_empty());
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.to_string().contains("zero observable effect")));
}

#[test]
fn inactive_family_is_never_perturbed() {
    let report = verify_from_yaml(&harness());
    assert!(report.outcomes.keys().all(|path| !path.starts_with("Angles/")));
    assert!(report
        .enumeration_warnings
        .iter()
        .any(|w| w == "skipping Angles - family not active for this input"));
}

#[test]
fn incomplete_rule_file_leaves_constraint_residual() {
    let tmp = TempDir::new().unwrap();
    let rules_path = tmp.path().join("rules.yaml");
    fs::write(
        &rules_path,
        r#"- parameter: Bonds/Bond/length
  targets:
    - pattern: Forces/HarmonicBondForce/Bonds/*/d
      value:
        kind: new_value
"#,
    )
    .unwrap();
    let rules = RuleSet::load(&rules_path).unwrap();
    assert_eq!(rules.len(), 1);

    let report = verify_from_yaml(&harness().with_rules(rules));
    let outcome = &report.outcomes["Bonds/Bond/length"];
    let residual: Vec<&str> = outcome.residual.iter().map(|d| d.path()).collect();
    assert_eq!(residual, vec!["Constraints/0/d"]);
    assert!(report.has_residual());

    let k = &report.outcomes["Bonds/Bond/k"];
    assert_eq!(k.warnings, vec![PropagationWarning::NoRule]);
    assert!(k.residual.is_empty());
}

#[test]
fn coverage_and_report_persist() {
    let harness = harness();
    let report = verify_from_yaml(&harness);

    let gaps = coverage_gaps(harness.registry(), report.perturbed_paths());
    assert!(gaps.contains(&"Angles/Angle/angle".to_string()));
    assert!(!gaps.contains(&"Bonds/Bond/length".to_string()));
    assert!(!gaps.contains(&"vdW/cutoff".to_string()));

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("propagation.json");
    save_model(&report, &out).unwrap();
    let restored: PropagationReport = load_model(&out).unwrap();
    assert_eq!(restored.active_families, report.active_families);
    assert_eq!(
        restored.outcomes.keys().collect::<Vec<_>>(),
        report.outcomes.keys().collect::<Vec<_>>()
    );
}
