use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parity_types::Difference;
use serde::{Deserialize, Serialize};

/// Residual differences and warnings for one named item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemReport {
    pub differences: Vec<Difference>,
    pub warnings: Vec<String>,
}

/// Result of comparing two named collections.
///
/// Items with no residual differences are only counted. Every name ends up in
/// exactly one of: `identical` (count), `divergent`, `errors`, `cancelled`,
/// `missing_in_a`, `missing_in_b`. Identical items that produced warnings are
/// also listed under `warnings`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    /// Number of names present in both collections.
    pub compared: usize,
    /// Compared names with no residual differences.
    pub identical: usize,
    /// Present in collection B only.
    pub missing_in_a: Vec<String>,
    /// Present in collection A only.
    pub missing_in_b: Vec<String>,
    pub divergent: BTreeMap<String, ItemReport>,
    pub warnings: BTreeMap<String, Vec<String>>,
    pub errors: BTreeMap<String, String>,
    pub cancelled: Vec<String>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            compared: 0,
            identical: 0,
            missing_in_a: Vec::new(),
            missing_in_b: Vec::new(),
            divergent: BTreeMap::new(),
            warnings: BTreeMap::new(),
            errors: BTreeMap::new(),
            cancelled: Vec::new(),
        }
    }

    pub fn has_divergence(&self) -> bool {
        !self.divergent.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Warnings, name-set asymmetry or cancelled items.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
            || !self.missing_in_a.is_empty()
            || !self.missing_in_b.is_empty()
            || !self.cancelled.is_empty()
            || self.divergent.values().any(|item| !item.warnings.is_empty())
    }

    pub fn is_clean(&self) -> bool {
        !self.has_divergence() && !self.has_errors() && !self.has_warnings()
    }

    /// Record one finished comparison.
    pub fn record(&mut self, name: String, item: ItemReport) {
        if !item.differences.is_empty() {
            self.divergent.insert(name, item);
            return;
        }
        self.identical += 1;
        if !item.warnings.is_empty() {
            self.warnings.insert(name, item.warnings);
        }
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_routes_items() {
        let mut report = BatchReport::new();
        report.record("clean".into(), ItemReport::default());
        report.record(
            "warned".into(),
            ItemReport {
                differences: Vec::new(),
                warnings: vec!["expected change did not occur".into()],
            },
        );
        report.record(
            "broken".into(),
            ItemReport {
                differences: vec![Difference::value_changed("x", 1i64.into(), 2i64.into())],
                warnings: Vec::new(),
            },
        );
        assert_eq!(report.identical, 2);
        assert!(report.divergent.contains_key("broken"));
        assert!(report.warnings.contains_key("warned"));
        assert!(report.has_divergence());
        assert!(!report.is_clean());
    }

    #[test]
    fn serializes_with_timestamp() {
        let report = BatchReport::new();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["compared"], 0);
        let restored: BatchReport = serde_json::from_value(json).unwrap();
        assert_eq!(restored, report);
    }
}
