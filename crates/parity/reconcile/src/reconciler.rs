use parity_types::{Difference, ExpectedChange, ToleranceSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of reconciling a diff against expected changes.
///
/// `residual` is the defect signal; `unmet` is a warning signal. The two are
/// independent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Differences no expected change explains.
    pub residual: Vec<Difference>,
    /// Expected changes that matched no difference.
    pub unmet: Vec<ExpectedChange>,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.residual.is_empty() && self.unmet.is_empty()
    }
}

/// Remove every difference explained by an expected change.
///
/// A `ValueChanged` or `TypeChanged` difference at path `p` is explained by an
/// unconsumed expected change with the same path whose old and new values are
/// equal to the observed ones within the tolerance resolved for `p`. Each
/// expected change is consumed at most once; the first unconsumed match in
/// declaration order wins.
pub fn reconcile(
    differences: Vec<Difference>,
    expected: &[ExpectedChange],
    tolerance: &ToleranceSpec,
) -> Reconciliation {
    let mut consumed = vec![false; expected.len()];
    let mut residual = Vec::new();

    for difference in differences {
        let explained = match (&difference, difference.old(), difference.new_value()) {
            (d, Some(old), Some(new)) if d.is_change() => {
                let path = d.path();
                let tol = tolerance.resolve_path(path);
                expected.iter().enumerate().find_map(|(index, change)| {
                    (!consumed[index] && change.explains(path, old, new, tol)).then_some(index)
                })
            }
            _ => None,
        };

        match explained {
            Some(index) => consumed[index] = true,
            None => residual.push(difference),
        }
    }

    let unmet: Vec<ExpectedChange> = expected
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(change, _)| change.clone())
        .collect();

    debug!(
        residual = residual.len(),
        explained = consumed.iter().filter(|c| **c).count(),
        unmet = unmet.len(),
        "reconciled differences"
    );

    Reconciliation { residual, unmet }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_types::Value;

    fn changed(path: &str, old: impl Into<Value>, new: impl Into<Value>) -> Difference {
        Difference::value_changed(path, old.into(), new.into())
    }

    #[test]
    fn consumes_matching_expectation() {
        let diffs = vec![changed("A", 1i64, 2i64), changed("B", "x", "y")];
        let expected = vec![ExpectedChange::new("A", 1i64, 2i64)];
        let result = reconcile(diffs, &expected, &ToleranceSpec::default());
        assert_eq!(result.residual, vec![changed("B", "x", "y")]);
        assert!(result.unmet.is_empty());
    }

    #[test]
    fn reports_unmet_expectation() {
        let expected = vec![ExpectedChange::new("C", 5i64, 6i64)];
        let result = reconcile(Vec::new(), &expected, &ToleranceSpec::default());
        assert!(result.residual.is_empty());
        assert_eq!(result.unmet, expected);
    }

    #[test]
    fn wrong_new_value_stays_residual() {
        let diffs = vec![changed("A", 1.0, 2.5)];
        let expected = vec![ExpectedChange::new("A", 1.0, 2.0)];
        let result = reconcile(diffs.clone(), &expected, &ToleranceSpec::default());
        assert_eq!(result.residual, diffs);
        assert_eq!(result.unmet, expected);
    }

    #[test]
    fn uses_path_tolerance() {
        let tolerance = ToleranceSpec::new(1e-6)
            .unwrap()
            .with_override("Forces/*/switchingDistance", 1e-3)
            .unwrap();
        let diffs = vec![changed("Forces/NonbondedForce/switchingDistance", -1.0, 0.8004)];
        let expected = vec![ExpectedChange::new(
            "Forces/NonbondedForce/switchingDistance",
            -1.0,
            0.8,
        )];
        let result = reconcile(diffs, &expected, &tolerance);
        assert!(result.is_clean());
    }

    #[test]
    fn expectation_consumed_once() {
        let diffs = vec![changed("A", 1i64, 2i64)];
        let expected = vec![
            ExpectedChange::new("A", 1i64, 2i64),
            ExpectedChange::new("A", 1i64, 2i64),
        ];
        let result = reconcile(diffs, &expected, &ToleranceSpec::default());
        assert!(result.residual.is_empty());
        assert_eq!(result.unmet.len(), 1);
    }

    #[test]
    fn added_and_removed_never_explained() {
        let diffs = vec![Difference::Added {
            path: "A".into(),
            new: 2i64.into(),
        }];
        let expected = vec![ExpectedChange::new("A", 1i64, 2i64)];
        let result = reconcile(diffs, &expected, &ToleranceSpec::default());
        assert_eq!(result.residual.len(), 1);
        assert_eq!(result.unmet.len(), 1);
    }

    #[test]
    fn type_change_can_be_expected() {
        let diffs = vec![Difference::type_changed("v", 0i64.into(), "auto".into())];
        let expected = vec![ExpectedChange::new("v", 0i64, "auto")];
        let result = reconcile(diffs, &expected, &ToleranceSpec::default());
        assert!(result.is_clean());
    }
}
