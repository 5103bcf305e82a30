//! Property tests: reconciliation consumes exactly the explained
//! differences and reports every expected change that never happened.

use std::collections::BTreeSet;

use parity_reconcile::reconcile;
use parity_types::{Difference, ExpectedChange, ToleranceSpec, Value};
use proptest::prelude::*;

#[test]
fn explained_difference_is_consumed() {
    let differences = vec![
        Difference::value_changed("A", Value::from(1i64), Value::from(2i64)),
        Difference::value_changed("B", Value::from("x"), Value::from("y")),
    ];
    let expected = [ExpectedChange::new("A", 1i64, 2i64)];
    let result = reconcile(differences, &expected, &ToleranceSpec::default());
    let residual: Vec<&str> = result.residual.iter().map(|d| d.path()).collect();
    assert_eq!(residual, vec!["B"]);
    assert!(result.unmet.is_empty());
}

#[test]
fn change_without_difference_is_unmet() {
    let expected = [ExpectedChange::new("C", 5i64, 6i64)];
    let result = reconcile(Vec::new(), &expected, &ToleranceSpec::default());
    assert!(result.residual.is_empty());
    assert_eq!(result.unmet, expected.to_vec());
}

proptest! {
    /// Residual is the unexplained differences; unmet is the phantom changes.
    #[test]
    fn residual_and_unmet_partition(
        changes in prop::collection::vec((any::<bool>(), -1000i64..1000, 1i64..50), 0..20),
        phantoms in 0usize..5,
    ) {
        let mut differences = Vec::new();
        let mut expected = Vec::new();
        let mut unexplained = BTreeSet::new();
        for (i, (explained, old, step)) in changes.iter().enumerate() {
            let path = format!("Forces/HarmonicBondForce/Bonds/{}/k", i);
            differences.push(Difference::value_changed(
                path.as_str(),
                Value::from(*old),
                Value::from(old + step),
            ));
            if *explained {
                expected.push(ExpectedChange::new(path.as_str(), *old, old + step));
            } else {
                unexplained.insert(path);
            }
        }
        let phantom: Vec<ExpectedChange> = (0..phantoms)
            .map(|i| ExpectedChange::new(format!("Constraints/{}/d", i), 0.1, 0.2))
            .collect();
        expected.extend(phantom.iter().cloned());

        let result = reconcile(differences, &expected, &ToleranceSpec::default());
        let residual: BTreeSet<String> = result.residual.iter().map(|d| d.path().to_string()).collect();
        prop_assert_eq!(residual, unexplained);
        prop_assert_eq!(result.unmet, phantom);
    }
}
