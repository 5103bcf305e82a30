use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Value, ValueKind};

/// One structural difference between two canonical records.
///
/// Produced fresh by each comparison and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    /// Same kind on both sides, different value.
    ValueChanged { path: String, old: Value, new: Value },
    /// The kind of the value differs (e.g. number vs string, list vs record).
    TypeChanged {
        path: String,
        old: Value,
        old_kind: ValueKind,
        new: Value,
        new_kind: ValueKind,
    },
    /// Present only in the second record.
    Added { path: String, new: Value },
    /// Present only in the first record.
    Removed { path: String, old: Value },
}

impl Difference {
    pub fn value_changed(path: impl Into<String>, old: Value, new: Value) -> Self {
        Self::ValueChanged {
            path: path.into(),
            old,
            new,
        }
    }

    pub fn type_changed(path: impl Into<String>, old: Value, new: Value) -> Self {
        let old_kind = old.kind();
        let new_kind = new.kind();
        Self::TypeChanged {
            path: path.into(),
            old,
            old_kind,
            new,
            new_kind,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::ValueChanged { path, .. }
            | Self::TypeChanged { path, .. }
            | Self::Added { path, .. }
            | Self::Removed { path, .. } => path,
        }
    }

    pub fn old(&self) -> Option<&Value> {
        match self {
            Self::ValueChanged { old, .. }
            | Self::TypeChanged { old, .. }
            | Self::Removed { old, .. } => Some(old),
            Self::Added { .. } => None,
        }
    }

    pub fn new_value(&self) -> Option<&Value> {
        match self {
            Self::ValueChanged { new, .. }
            | Self::TypeChanged { new, .. }
            | Self::Added { new, .. } => Some(new),
            Self::Removed { .. } => None,
        }
    }

    /// Whether an expected change can explain this difference.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::ValueChanged { .. } | Self::TypeChanged { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ValueChanged { .. } => "value changed",
            Self::TypeChanged { .. } => "type changed",
            Self::Added { .. } => "added",
            Self::Removed { .. } => "removed",
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueChanged { path, old, new } => {
                write!(f, "value changed at {}: {} -> {}", path, old, new)
            }
            Self::TypeChanged {
                path,
                old,
                old_kind,
                new,
                new_kind,
            } => write!(
                f,
                "type changed at {}: {} ({}) -> {} ({})",
                path, old, old_kind, new, new_kind
            ),
            Self::Added { path, new } => write!(f, "added at {}: {}", path, new),
            Self::Removed { path, old } => write!(f, "removed at {}: {}", path, old),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_changed_records_kinds() {
        let d = Difference::type_changed("a/b", Value::from(1i64), Value::from("x"));
        match &d {
            Difference::TypeChanged {
                old_kind, new_kind, ..
            } => {
                assert_eq!(*old_kind, ValueKind::Int);
                assert_eq!(*new_kind, ValueKind::String);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(d.is_change());
        assert_eq!(d.path(), "a/b");
    }

    #[test]
    fn added_and_removed_are_not_changes() {
        let added = Difference::Added {
            path: "x".into(),
            new: Value::from(1i64),
        };
        assert!(!added.is_change());
        assert!(added.old().is_none());
        assert_eq!(added.new_value(), Some(&Value::from(1i64)));
    }

    #[test]
    fn serde_tagged_by_kind() {
        let d = Difference::value_changed("Forces/NonbondedForce/cutoff", 0.9.into(), 1.0.into());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "value_changed");
        assert_eq!(json["path"], "Forces/NonbondedForce/cutoff");
        let restored: Difference = serde_json::from_value(json).unwrap();
        assert_eq!(restored, d);
    }

    #[test]
    fn display() {
        let d = Difference::value_changed("a", 1i64.into(), 2i64.into());
        assert_eq!(d.to_string(), "value changed at a: 1 -> 2");
    }
}
