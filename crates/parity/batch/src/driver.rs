//! Batch comparison of two named collections.

use parity_canonical::{CanonicalOptions, Canonicalizer, ParseError};
use parity_differ::diff;
use parity_reconcile::reconcile;
use parity_types::{ExpectedChange, ToleranceSpec};
use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::error::BatchResult;
use crate::pool::WorkerPool;
use crate::report::{BatchReport, ItemReport};

/// Warning text for an expected change that did not happen.
pub fn unmet_warning(change: &ExpectedChange) -> String {
    format!("expected change did not occur: {}", change)
}

/// Compares named artifacts pairwise with a fixed configuration.
pub struct BatchComparer {
    canonicalizer: Canonicalizer,
    tolerance: ToleranceSpec,
    expected: Vec<ExpectedChange>,
}

impl BatchComparer {
    pub fn new(tolerance: ToleranceSpec, expected: Vec<ExpectedChange>) -> Self {
        Self {
            canonicalizer: Canonicalizer::default(),
            tolerance,
            expected,
        }
    }

    pub fn with_options(mut self, options: CanonicalOptions) -> Self {
        self.canonicalizer = Canonicalizer::new(options);
        self
    }

    /// Canonicalize, diff and reconcile one pair of raw artifacts.
    pub fn compare_item(&self, raw_a: &str, raw_b: &str) -> Result<ItemReport, String> {
        let side = |label: &str, e: ParseError| format!("{}: {}", label, e);
        let a = self.canonicalizer.build(raw_a).map_err(|e| side("collection a", e))?;
        let b = self.canonicalizer.build(raw_b).map_err(|e| side("collection b", e))?;

        let reconciliation = reconcile(diff(&a, &b, &self.tolerance), &self.expected, &self.tolerance);
        Ok(ItemReport {
            differences: reconciliation.residual,
            warnings: reconciliation.unmet.iter().map(unmet_warning).collect(),
        })
    }

    /// Compare every common name on `pool`.
    pub fn run<P>(&self, a: &Collection, b: &Collection, pool: &WorkerPool, progress: P) -> BatchReport
    where
        P: Fn(&str) + Sync,
    {
        let names_a = a.names();
        let names_b = b.names();

        let mut report = BatchReport::new();
        report.missing_in_b = names_a.difference(&names_b).map(|s| s.to_string()).collect();
        report.missing_in_a = names_b.difference(&names_a).map(|s| s.to_string()).collect();
        for name in &report.missing_in_b {
            warn!(name = %name, "present in collection a only");
        }
        for name in &report.missing_in_a {
            warn!(name = %name, "present in collection b only");
        }

        let mut items: Vec<(String, (&str, &str))> = Vec::new();
        for name in names_a.intersection(&names_b) {
            match (a.get(name), b.get(name)) {
                (Some(Ok(raw_a)), Some(Ok(raw_b))) => items.push((name.to_string(), (raw_a, raw_b))),
                (Some(Err(reason)), _) => {
                    warn!(name = %name, error = %reason, "could not compare");
                    report.errors.insert(name.to_string(), format!("collection a: {}", reason));
                }
                (_, Some(Err(reason))) => {
                    warn!(name = %name, error = %reason, "could not compare");
                    report.errors.insert(name.to_string(), format!("collection b: {}", reason));
                }
                _ => {}
            }
        }
        report.compared = items.len() + report.errors.len();
        info!(
            compared = report.compared,
            threads = pool.threads(),
            "comparing collections"
        );

        let output = pool.run(
            items,
            |name, (raw_a, raw_b)| {
                debug!(name = %name, "comparing");
                self.compare_item(raw_a, raw_b)
            },
            |name| progress(name),
        );

        for (name, outcome) in output.completed {
            match outcome {
                Ok(item) => report.record(name, item),
                Err(message) => {
                    warn!(name = %name, error = %message, "could not compare");
                    report.errors.insert(name, message);
                }
            }
        }
        report.cancelled = output.cancelled;

        info!(
            identical = report.identical,
            divergent = report.divergent.len(),
            errors = report.errors.len(),
            cancelled = report.cancelled.len(),
            "batch comparison finished"
        );
        report
    }
}

/// Compare two collections with default canonical options on a default-sized pool.
pub fn compare_batch(
    collection_a: &Collection,
    collection_b: &Collection,
    tolerance: &ToleranceSpec,
    expected: &[ExpectedChange],
) -> BatchResult<BatchReport> {
    let pool = WorkerPool::new(None)?;
    let comparer = BatchComparer::new(tolerance.clone(), expected.to_vec());
    Ok(comparer.run(collection_a, collection_b, &pool, |_| {}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(cutoff: &str) -> String {
        format!(
            r#"<System type="System" version="1">
                <Forces>
                    <Force name="NonbondedForce" type="NonbondedForce" cutoff="{}"/>
                </Forces>
            </System>"#,
            cutoff
        )
    }

    fn collection(items: &[(&str, String)]) -> Collection {
        items
            .iter()
            .map(|(name, text)| (name.to_string(), text.clone()))
            .collect()
    }

    #[test]
    fn name_set_integrity() {
        let a = collection(&[("a", system("1.0")), ("b", system("1.0"))]);
        let b = collection(&[("a", system("1.0")), ("c", system("1.0"))]);
        let report = compare_batch(&a, &b, &ToleranceSpec::default(), &[]).unwrap();
        assert_eq!(report.missing_in_b, vec!["b".to_string()]);
        assert_eq!(report.missing_in_a, vec!["c".to_string()]);
        assert_eq!(report.compared, 1);
        assert_eq!(report.identical, 1);
    }

    #[test]
    fn divergent_items_listed() {
        let a = collection(&[("x", system("1.0")), ("y", system("1.0"))]);
        let b = collection(&[("x", system("1.0")), ("y", system("0.9"))]);
        let report = compare_batch(&a, &b, &ToleranceSpec::default(), &[]).unwrap();
        assert_eq!(report.identical, 1);
        let item = &report.divergent["y"];
        assert_eq!(item.differences[0].path(), "Forces/NonbondedForce/cutoff");
    }

    #[test]
    fn expected_changes_suppress_divergence() {
        let a = collection(&[("x", system("1.0"))]);
        let b = collection(&[("x", system("0.9"))]);
        let expected = vec![
            ExpectedChange::new("Forces/NonbondedForce/cutoff", 1.0, 0.9),
            ExpectedChange::new("Forces/NonbondedForce/switchingDistance", -1.0, 0.8),
        ];
        let report = compare_batch(&a, &b, &ToleranceSpec::default(), &expected).unwrap();
        assert!(report.divergent.is_empty());
        assert_eq!(report.warnings["x"].len(), 1);
        assert!(report.warnings["x"][0].contains("switchingDistance"));
    }

    #[test]
    fn parse_failure_is_recorded_not_fatal() {
        let a = collection(&[("bad", "<System>".to_string()), ("ok", system("1.0"))]);
        let b = collection(&[("bad", system("1.0")), ("ok", system("1.0"))]);
        let report = compare_batch(&a, &b, &ToleranceSpec::default(), &[]).unwrap();
        assert!(report.errors["bad"].starts_with("collection a"));
        assert_eq!(report.identical, 1);
    }

    #[test]
    fn unreadable_artifact_is_an_item_error() {
        let a = collection(&[("good", system("1.0")), ("bad", system("1.0"))]);
        let mut b = collection(&[("good", system("1.0"))]);
        b.insert_unreadable("bad", "invalid UTF-8 in bad.xml");

        let report = compare_batch(&a, &b, &ToleranceSpec::default(), &[]).unwrap();
        assert_eq!(report.compared, 2);
        assert_eq!(report.identical, 1);
        assert_eq!(report.errors["bad"], "collection b: invalid UTF-8 in bad.xml");
        assert!(report.missing_in_a.is_empty() && report.missing_in_b.is_empty());
    }

    #[test]
    fn unreadable_name_on_one_side_is_missing() {
        let mut a = collection(&[("good", system("1.0"))]);
        a.insert_unreadable("orphan", "ambiguous name, matched by orphan.XML, orphan.xml");
        let b = collection(&[("good", system("1.0"))]);

        let report = compare_batch(&a, &b, &ToleranceSpec::default(), &[]).unwrap();
        assert_eq!(report.missing_in_b, vec!["orphan".to_string()]);
        assert!(report.errors.is_empty());
    }
}
