//! Canonical record back to XML.
//!
//! The output reads back to the same canonical record: scalars are written as
//! attributes, records as child elements, lists as a wrapper element whose
//! children carry the singular name, and the named block record as a list of
//! block elements.

use std::fmt::Write;

use parity_types::{CanonicalRecord, Record, Scalar, Value};
use quick_xml::escape::escape;

use crate::options::CanonicalOptions;
use crate::steps::singular;
use crate::xml::TEXT_KEY;

const INDENT: &str = "\t";

pub struct Renderer<'a> {
    options: &'a CanonicalOptions,
    out: String,
}

impl<'a> Renderer<'a> {
    pub fn new(options: &'a CanonicalOptions) -> Self {
        Self {
            options,
            out: String::new(),
        }
    }

    pub fn render(mut self, record: &CanonicalRecord) -> String {
        self.out.push_str("<?xml version=\"1.0\" ?>\n");
        self.element(record.root(), record.fields(), 0);
        self.out
    }

    fn pad(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
    }

    fn attribute(&mut self, key: &str, scalar: &Scalar) {
        let text = scalar.to_string();
        let _ = write!(self.out, " {}=\"{}\"", key, escape(text.as_str()));
    }

    fn element(&mut self, name: &str, fields: &Record, depth: usize) {
        self.pad(depth);
        self.out.push('<');
        self.out.push_str(name);

        let mut text = None;
        let mut children = Vec::new();
        for (key, value) in fields {
            match value {
                Value::Scalar(scalar) if key == TEXT_KEY => text = Some(scalar),
                Value::Scalar(scalar) => self.attribute(key, scalar),
                _ => children.push((key, value)),
            }
        }

        if children.is_empty() && text.is_none() {
            self.out.push_str("/>\n");
            return;
        }
        self.out.push('>');
        if let Some(text) = text {
            self.out.push_str(&escape(text.to_string().as_str()));
        }
        if !children.is_empty() {
            self.out.push('\n');
            for (key, value) in children {
                self.child(key, value, depth + 1);
            }
            self.pad(depth);
        }
        let _ = writeln!(self.out, "</{}>", name);
    }

    fn child(&mut self, name: &str, value: &Value, depth: usize) {
        match value {
            Value::Scalar(scalar) => {
                self.pad(depth);
                let _ = writeln!(
                    self.out,
                    "<{}>{}</{}>",
                    name,
                    escape(scalar.to_string().as_str()),
                    name
                );
            }
            Value::Record(fields) if name == self.options.block_key => {
                self.list(name, fields.values(), depth);
            }
            Value::Record(fields) => self.element(name, fields, depth),
            Value::List(items) => self.list(name, items.iter(), depth),
        }
    }

    fn list<'v>(&mut self, name: &str, items: impl ExactSizeIterator<Item = &'v Value>, depth: usize) {
        let item_name = singular(name);
        if items.len() == 0 {
            self.pad(depth);
            let _ = writeln!(self.out, "<{}/>", name);
            return;
        }
        self.pad(depth);
        let _ = writeln!(self.out, "<{}>", name);
        for item in items {
            self.child(item_name, item, depth + 1);
        }
        self.pad(depth);
        let _ = writeln!(self.out, "</{}>", name);
    }
}

/// Render a canonical record as XML text.
pub fn render_canonical(record: &CanonicalRecord, options: &CanonicalOptions) -> String {
    Renderer::new(options).render(record)
}
