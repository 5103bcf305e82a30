//! Canonical record tree.
//!
//! A [`CanonicalRecord`] is an owned, immutable tree of `{key -> value}` nodes
//! where each value is a [`Scalar`], an ordered list, or a nested record.
//! Records use `BTreeMap` so key iteration order is always deterministic.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::{split_path, PathPattern, Segment};

/// Render a float so that it always carries a decimal point.
///
/// `Display` for `f64` is the shortest representation that round-trips and
/// never uses an exponent, so appending `.0` keeps integral floats distinct
/// from integers when the text is parsed again.
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

/// A leaf value.
///
/// Booleans only appear when read from configuration files; the artifact
/// format encodes flags as `0`/`1` integers, which are compared as numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Numeric view of the scalar, if it is an integer or a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Bool(_) | Scalar::Str(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Scalar::Bool(_) => ValueKind::Bool,
            Scalar::Int(_) => ValueKind::Int,
            Scalar::Float(_) => ValueKind::Float,
            Scalar::Str(_) => ValueKind::String,
        }
    }

    /// Equality with a numeric tolerance.
    ///
    /// Two numeric scalars are equal when `|a - b| <= tolerance`; anything else
    /// requires exact equality.
    pub fn approx_eq(&self, other: &Scalar, tolerance: f64) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() <= tolerance,
            (None, None) => self == other,
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Int(_) | Scalar::Float(_) => 0,
            Scalar::Bool(_) => 1,
            Scalar::Str(_) => 2,
        }
    }

    /// Total order used for deterministic sorting.
    pub fn canonical_cmp(&self, other: &Scalar) -> Ordering {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
            (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
            (Scalar::Str(a), Scalar::Str(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a
                    .total_cmp(&b)
                    .then_with(|| self.kind().cmp(&other.kind())),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => f.write_str(&format_float(*v)),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

/// The shape of a value, used when reporting type changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    String,
    List,
    Record,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Record => "record",
        };
        f.write_str(name)
    }
}

/// A nested record: keys in sorted order.
pub type Record = BTreeMap<String, Value>;

/// Any node of a canonical record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Value>),
    Record(Record),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(s) => s.kind(),
            Value::List(_) => ValueKind::List,
            Value::Record(_) => ValueKind::Record,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_f64)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Look up a child by one path segment: a record key or a list index.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Record(record) => record.get(segment),
            Value::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Value::Scalar(_) => None,
        }
    }

    /// Total order used to sort list items deterministically.
    ///
    /// Records compare as the sequence of their `(key, value)` pairs in key
    /// order, lists element-wise, scalars via [`Scalar::canonical_cmp`].
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a.canonical_cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.canonical_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Record(a), Value::Record(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b) {
                    let ord = ka.cmp(kb).then_with(|| va.canonical_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => write!(f, "{}", s),
            _ => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(Scalar::Float(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(Scalar::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// A fully canonicalized artifact.
///
/// Constructed once by the canonical form builder and never mutated
/// afterwards; there are no `&mut` accessors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    root: String,
    fields: Record,
}

impl CanonicalRecord {
    pub fn new(root: impl Into<String>, fields: Record) -> Self {
        Self {
            root: root.into(),
            fields,
        }
    }

    /// Name of the document's root element.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn fields(&self) -> &Record {
        &self.fields
    }

    pub fn into_parts(self) -> (String, Record) {
        (self.root, self.fields)
    }

    /// Look up the value at a concrete path such as `Forces/NonbondedForce/cutoff`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path);
        let (first, rest) = segments.split_first()?;
        let mut current = self.fields.get(*first)?;
        for segment in rest {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Every `(concrete path, value)` matched by a pattern, in tree order.
    pub fn select(&self, pattern: &PathPattern) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        select_in_record(&self.fields, pattern.segments(), &mut prefix, &mut out);
        out
    }
}

fn select_in_record<'a>(
    record: &'a Record,
    segments: &[Segment],
    prefix: &mut Vec<String>,
    out: &mut Vec<(String, &'a Value)>,
) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    for (key, child) in record {
        if head.matches(key) {
            prefix.push(key.clone());
            select_in_value(child, rest, prefix, out);
            prefix.pop();
        }
    }
}

fn select_in_value<'a>(
    value: &'a Value,
    segments: &[Segment],
    prefix: &mut Vec<String>,
    out: &mut Vec<(String, &'a Value)>,
) {
    if segments.is_empty() {
        out.push((prefix.join("/"), value));
        return;
    }
    match value {
        Value::Record(record) => select_in_record(record, segments, prefix, out),
        Value::List(items) => {
            let (head, rest) = (&segments[0], &segments[1..]);
            for (index, child) in items.iter().enumerate() {
                let key = index.to_string();
                if head.matches(&key) {
                    prefix.push(key);
                    select_in_value(child, rest, prefix, out);
                    prefix.pop();
                }
            }
        }
        Value::Scalar(_) => {}
    }
}
