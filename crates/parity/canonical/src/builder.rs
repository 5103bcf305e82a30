//! Canonical form builder.

use parity_types::{CanonicalRecord, Record, Value};
use tracing::debug;

use crate::error::ParseResult;
use crate::options::CanonicalOptions;
use crate::render::render_canonical;
use crate::steps::{NamedBlocks, NormalizeStep, OrdinalSort, UnnestSingular, VersionPatch};
use crate::xml::read_tree;

/// Parses raw artifact text into a [`CanonicalRecord`].
///
/// The pipeline is: read the markup (coercing leaf tokens), then run the
/// normalization steps bottom-up over every `(key, value)` pair.
pub struct Canonicalizer {
    options: CanonicalOptions,
    steps: Vec<Box<dyn NormalizeStep>>,
}

impl Canonicalizer {
    /// Builder with the standard step pipeline for `options`.
    pub fn new(options: CanonicalOptions) -> Self {
        let steps: Vec<Box<dyn NormalizeStep>> = vec![
            Box::new(VersionPatch::new(options.version_keys.clone())),
            Box::new(UnnestSingular),
            Box::new(OrdinalSort::new(options.ordinal_prefix.clone())),
            Box::new(NamedBlocks::from_options(&options)),
        ];
        Self { options, steps }
    }

    /// Append an extra step that runs after the standard ones.
    pub fn with_step(mut self, step: Box<dyn NormalizeStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn options(&self) -> &CanonicalOptions {
        &self.options
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn build(&self, text: &str) -> ParseResult<CanonicalRecord> {
        let (root, fields) = read_tree(text, &self.options)?;
        let fields = self.normalize_record(fields)?;
        debug!(root = %root, fields = fields.len(), "built canonical record");
        Ok(CanonicalRecord::new(root, fields))
    }

    pub fn render(&self, record: &CanonicalRecord) -> String {
        render_canonical(record, &self.options)
    }

    fn normalize_record(&self, fields: Record) -> ParseResult<Record> {
        fields
            .into_iter()
            .map(|(key, value)| {
                let value = self.normalize_value(&key, value)?;
                Ok((key, value))
            })
            .collect()
    }

    fn normalize_value(&self, key: &str, value: Value) -> ParseResult<Value> {
        let value = match value {
            Value::Record(fields) => Value::Record(self.normalize_record(fields)?),
            // Items of a repeated element carry the element's own name.
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.normalize_value(key, item))
                    .collect::<ParseResult<Vec<_>>>()?,
            ),
            scalar => scalar,
        };
        self.steps
            .iter()
            .try_fold(value, |value, step| step.apply(key, value))
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(CanonicalOptions::default())
    }
}

/// Build a canonical record with default options.
pub fn build_canonical(text: &str) -> ParseResult<CanonicalRecord> {
    Canonicalizer::default().build(text)
}
