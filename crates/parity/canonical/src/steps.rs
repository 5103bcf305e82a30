//! Structural normalization steps.
//!
//! Each step sees one `(key, value)` pair after the value's own children have
//! been normalized, and returns the replacement value. The builder runs the
//! steps bottom-up over the whole tree in the order they are registered.

use std::collections::BTreeMap;

use parity_types::{Record, Scalar, Value};
use tracing::debug;

use crate::error::{ParseError, ParseResult};
use crate::options::CanonicalOptions;

/// A named, individually testable normalization.
pub trait NormalizeStep: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, key: &str, value: Value) -> ParseResult<Value>;
}

// ---------------------------------------------------------------------------
// Version quirk
// ---------------------------------------------------------------------------

/// Rewrites a bare `major.minor` version to `major.minor.0`.
#[derive(Clone, Debug)]
pub struct VersionPatch {
    keys: Vec<String>,
}

impl VersionPatch {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }
}

fn is_bare_version(text: &str) -> bool {
    let parts: Vec<&str> = text.split('.').collect();
    parts.len() == 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

impl NormalizeStep for VersionPatch {
    fn name(&self) -> &'static str {
        "version-patch"
    }

    fn apply(&self, key: &str, value: Value) -> ParseResult<Value> {
        if !self.keys.iter().any(|k| k == key) {
            return Ok(value);
        }
        match value {
            Value::Scalar(Scalar::Str(text)) if is_bare_version(&text) => {
                Ok(Value::from(format!("{}.0", text).as_str()))
            }
            other => Ok(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Singular un-nesting
// ---------------------------------------------------------------------------

/// Replaces `{Parents: {Parent: x}}` with `{Parents: [x...]}`.
///
/// Applies when the record's only key is the [`singular`] of the parent key.
/// The result is always a list, so a one-item list and a many-item list have
/// the same shape.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnnestSingular;

/// The child element name used for items of a list stored under `key`.
///
/// A one-character key is its own item name.
pub fn singular(key: &str) -> &str {
    match key.char_indices().last() {
        Some((index, _)) if index > 0 => &key[..index],
        _ => key,
    }
}

impl NormalizeStep for UnnestSingular {
    fn name(&self) -> &'static str {
        "unnest-singular"
    }

    fn apply(&self, key: &str, value: Value) -> ParseResult<Value> {
        let child_key = singular(key);
        match value {
            Value::Record(mut record) if record.len() == 1 && record.contains_key(child_key) => {
                let inner = record.remove(child_key).unwrap_or(Value::List(Vec::new()));
                Ok(match inner {
                    Value::List(items) => Value::List(items),
                    single => Value::List(vec![single]),
                })
            }
            other => Ok(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Ordinal sort
// ---------------------------------------------------------------------------

/// Sorts lists whose items reference particles through `p1..pk` keys.
///
/// Every item must be a record carrying the same contiguous set `p1..pk`
/// (`k >= 1`, no gaps). Such lists are sorted by the tuple of all item
/// fields in key order. Other lists keep their order.
#[derive(Clone, Debug)]
pub struct OrdinalSort {
    prefix: String,
}

impl OrdinalSort {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn ordinal(&self, key: &str) -> Option<usize> {
        let digits = key.strip_prefix(self.prefix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    fn ordinal_count(&self, record: &Record) -> Option<usize> {
        let mut ordinals: Vec<usize> = record.keys().filter_map(|k| self.ordinal(k)).collect();
        if ordinals.is_empty() {
            return None;
        }
        ordinals.sort_unstable();
        let contiguous = ordinals.iter().enumerate().all(|(i, n)| *n == i + 1);
        contiguous.then_some(ordinals.len())
    }

    /// Whether `items` is a particle-indexed list.
    pub fn is_ordinal_list(&self, items: &[Value]) -> bool {
        let Some(Value::Record(first)) = items.first() else {
            return false;
        };
        let Some(count) = self.ordinal_count(first) else {
            return false;
        };
        items.iter().all(|item| match item {
            Value::Record(record) => self.ordinal_count(record) == Some(count),
            _ => false,
        })
    }
}

impl NormalizeStep for OrdinalSort {
    fn name(&self) -> &'static str {
        "ordinal-sort"
    }

    fn apply(&self, _key: &str, value: Value) -> ParseResult<Value> {
        match value {
            Value::List(mut items) if self.is_ordinal_list(&items) => {
                items.sort_by(|a, b| a.canonical_cmp(b));
                Ok(Value::List(items))
            }
            other => Ok(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Named blocks
// ---------------------------------------------------------------------------

/// Sorts, filters and re-keys the named block list (e.g. `Forces`).
///
/// Blocks are ordered by `(type, name)`, denylisted types are dropped, and
/// the remaining blocks are keyed by type, or by `type[name]` when a type
/// occurs more than once.
#[derive(Clone, Debug)]
pub struct NamedBlocks {
    block_key: String,
    type_field: String,
    name_field: String,
    denylist: Vec<String>,
}

impl NamedBlocks {
    pub fn from_options(options: &CanonicalOptions) -> Self {
        Self {
            block_key: options.block_key.clone(),
            type_field: options.block_type_field.clone(),
            name_field: options.block_name_field.clone(),
            denylist: options.block_denylist.clone(),
        }
    }

    fn identity(&self, index: usize, block: &Value) -> ParseResult<(String, String)> {
        let missing = || ParseError::MissingBlockField {
            block_key: self.block_key.clone(),
            index,
            field: self.type_field.clone(),
        };
        let record = block.as_record().ok_or_else(missing)?;
        let block_type = record
            .get(&self.type_field)
            .and_then(Value::as_scalar)
            .map(Scalar::to_string)
            .ok_or_else(missing)?;
        let name = record
            .get(&self.name_field)
            .and_then(Value::as_scalar)
            .map(Scalar::to_string)
            .unwrap_or_default();
        Ok((block_type, name))
    }
}

impl NormalizeStep for NamedBlocks {
    fn name(&self) -> &'static str {
        "named-blocks"
    }

    fn apply(&self, key: &str, value: Value) -> ParseResult<Value> {
        if key != self.block_key {
            return Ok(value);
        }
        let Value::List(items) = value else {
            return Ok(value);
        };

        let mut blocks: BTreeMap<(String, String), Value> = BTreeMap::new();
        for (index, block) in items.into_iter().enumerate() {
            let identity = self.identity(index, &block)?;
            if blocks.contains_key(&identity) {
                return Err(ParseError::DuplicateBlock {
                    block_key: self.block_key.clone(),
                    block_type: identity.0,
                    name: identity.1,
                });
            }
            blocks.insert(identity, block);
        }

        blocks.retain(|(block_type, name), _| {
            let denied = self.denylist.iter().any(|t| t == block_type);
            if denied {
                debug!(block_type = %block_type, name = %name, "dropping cosmetic block");
            }
            !denied
        });

        let mut type_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (block_type, _) in blocks.keys() {
            *type_counts.entry(block_type.as_str()).or_default() += 1;
        }
        let keys: Vec<String> = blocks
            .keys()
            .map(|(block_type, name)| {
                if type_counts.get(block_type.as_str()).copied().unwrap_or(0) > 1 {
                    format!("{}[{}]", block_type, name)
                } else {
                    block_type.clone()
                }
            })
            .collect();

        let record: Record = keys.into_iter().zip(blocks.into_values()).collect();
        Ok(Value::Record(record))
    }
}
