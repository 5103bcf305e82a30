//! End-to-end test: regression comparison of two collections on disk.
//!
//! Collections are written as files, loaded, canonicalized, diffed and
//! reconciled in parallel, and the report is persisted.

use std::fs;
use std::path::Path;

use parity_batch::{compare_batch, load_collection, BatchComparer, CancelFlag, WorkerPool};
use parity_tests::{openmm_system, Bond};
use parity_types::{load_tolerance, save_model, ExpectedChange, ToleranceSpec};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ethane_bonds() -> Vec<Bond> {
    vec![
        Bond::new(0, 1, 0.109, 284512.0),
        Bond::new(1, 2, 0.152, 224262.4),
        Bond::new(0, 3, 0.109, 284512.0),
    ]
}

fn write(dir: &Path, name: &str, text: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), text).unwrap();
}

fn dirs() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();
    (tmp, a, b)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn reordered_and_noisy_collections_match() {
    let (_tmp, a, b) = dirs();
    let bonds = ethane_bonds();
    let mut shuffled: Vec<Bond> = bonds.iter().rev().copied().collect();
    for bond in &mut shuffled {
        bond.d += 1.0e-9;
    }

    write(&a, "ethane.xml", &openmm_system(4, &bonds, 1.0));
    write(&b, "ethane.xml", &openmm_system(4, &shuffled, 1.0));
    write(&a, "methane.xml", &openmm_system(2, &bonds[..1], 0.9));
    write(&b, "methane.xml", &openmm_system(2, &bonds[..1], 0.9));
    write(&b, "notes.txt", "not an artifact");

    let collection_a = load_collection(&a, "xml").unwrap();
    let collection_b = load_collection(&b, "xml").unwrap();
    assert_eq!(collection_b.len(), 2);

    let report = compare_batch(&collection_a, &collection_b, &ToleranceSpec::default(), &[]).unwrap();
    assert_eq!(report.compared, 2);
    assert_eq!(report.identical, 2);
    assert!(report.is_clean(), "{:?}", report);
}

#[test]
fn only_shared_names_are_compared() {
    let (_tmp, a, b) = dirs();
    let system = openmm_system(2, &ethane_bonds()[..1], 0.9);
    write(&a, "a.xml", &system);
    write(&a, "b.xml", &system);
    write(&b, "a.xml", &system);
    // Never parsed: it has no counterpart in collection A.
    write(&b, "c.xml", "<System");

    let report = compare_batch(
        &load_collection(&a, "xml").unwrap(),
        &load_collection(&b, "xml").unwrap(),
        &ToleranceSpec::default(),
        &[],
    )
    .unwrap();

    assert_eq!(report.missing_in_b, vec!["b".to_string()]);
    assert_eq!(report.missing_in_a, vec!["c".to_string()]);
    assert_eq!(report.compared, 1);
    assert!(report.errors.is_empty());
    assert!(report.has_warnings());
}

#[test]
fn expected_change_explains_cutoff_move() {
    let (_tmp, a, b) = dirs();
    let bonds = ethane_bonds();
    write(&a, "moved.xml", &openmm_system(4, &bonds, 1.0));
    write(&b, "moved.xml", &openmm_system(4, &bonds, 1.2));
    write(&a, "still.xml", &openmm_system(4, &bonds, 1.0));
    write(&b, "still.xml", &openmm_system(4, &bonds, 1.0));
    let collection_a = load_collection(&a, "xml").unwrap();
    let collection_b = load_collection(&b, "xml").unwrap();

    let unexplained = compare_batch(&collection_a, &collection_b, &ToleranceSpec::default(), &[]).unwrap();
    let moved = &unexplained.divergent["moved"];
    assert_eq!(moved.differences.len(), 1);
    assert_eq!(moved.differences[0].path(), "Forces/NonbondedForce/cutoff");

    let expected = [ExpectedChange::new("Forces/NonbondedForce/cutoff", 1.0, 1.2)];
    let explained = compare_batch(&collection_a, &collection_b, &ToleranceSpec::default(), &expected).unwrap();
    assert!(!explained.has_divergence());
    assert_eq!(explained.identical, 2);
    // The unchanged item never shows the declared change.
    let still = &explained.warnings["still"];
    assert!(still[0].starts_with("expected change did not occur"));
    assert!(!explained.warnings.contains_key("moved"));
}

#[test]
fn settings_file_overrides_apply_per_path() {
    let (tmp, a, b) = dirs();
    let bonds = ethane_bonds();
    let mut stretched = bonds.clone();
    stretched[1].d = 0.153;
    write(&a, "ethane.xml", &openmm_system(4, &bonds, 1.0));
    write(&b, "ethane.xml", &openmm_system(4, &stretched, 1.2));

    let settings = tmp.path().join("settings.yaml");
    fs::write(
        &settings,
        "default_numeric_tolerance: 1.0e-6\nnumeric_tolerance_overrides:\n  Forces/NonbondedForce/cutoff: 0.5\n",
    )
    .unwrap();
    let tolerance = load_tolerance(&settings).unwrap();

    let report = compare_batch(
        &load_collection(&a, "xml").unwrap(),
        &load_collection(&b, "xml").unwrap(),
        &tolerance,
        &[],
    )
    .unwrap();
    let paths: Vec<&str> = report.divergent["ethane"]
        .differences
        .iter()
        .map(|d| d.path())
        .collect();
    assert_eq!(paths, vec!["Forces/HarmonicBondForce/Bonds/2/d"]);
}

#[test]
fn malformed_items_are_isolated() {
    let (_tmp, a, b) = dirs();
    let system = openmm_system(2, &ethane_bonds()[..1], 0.9);
    write(&a, "good.xml", &system);
    write(&b, "good.xml", &system);
    write(&a, "bad.xml", &system);
    write(&b, "bad.xml", "<System><Forces><Force name=\"x\"/></Forces></System>");

    let report = compare_batch(
        &load_collection(&a, "xml").unwrap(),
        &load_collection(&b, "xml").unwrap(),
        &ToleranceSpec::default(),
        &[],
    )
    .unwrap();
    assert_eq!(report.identical, 1);
    assert!(report.errors["bad"].starts_with("collection b: "));
}

#[test]
fn non_utf8_artifact_does_not_abort_the_batch() {
    let (_tmp, a, b) = dirs();
    let system = openmm_system(2, &ethane_bonds()[..1], 0.9);
    write(&a, "good.xml", &system);
    write(&b, "good.xml", &system);
    write(&a, "bad.xml", &system);
    fs::write(b.join("bad.xml"), [0xFF, 0xFE, 0x00]).unwrap();

    let report = compare_batch(
        &load_collection(&a, "xml").unwrap(),
        &load_collection(&b, "xml").unwrap(),
        &ToleranceSpec::default(),
        &[],
    )
    .unwrap();
    assert_eq!(report.compared, 2);
    assert_eq!(report.identical, 1);
    assert!(report.errors["bad"].starts_with("collection b: invalid UTF-8"));
    assert!(report.missing_in_a.is_empty() && report.missing_in_b.is_empty());
}

#[test]
fn cancelled_run_keeps_report_shape() {
    let (tmp, a, b) = dirs();
    let system = openmm_system(2, &ethane_bonds()[..1], 0.9);
    for name in ["one.xml", "two.xml"] {
        write(&a, name, &system);
        write(&b, name, &system);
    }
    let cancel = CancelFlag::new();
    cancel.cancel();
    let pool = WorkerPool::new(Some(2)).unwrap().with_cancel_flag(cancel);

    let comparer = BatchComparer::new(ToleranceSpec::default(), Vec::new());
    let report = comparer.run(
        &load_collection(&a, "xml").unwrap(),
        &load_collection(&b, "xml").unwrap(),
        &pool,
        |_| {},
    );
    assert_eq!(report.cancelled, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(report.identical, 0);

    let out = tmp.path().join("report.json");
    save_model(&report, &out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert!(json["generated_at"].is_string());
    assert_eq!(json["cancelled"].as_array().map(Vec::len), Some(2));
}
