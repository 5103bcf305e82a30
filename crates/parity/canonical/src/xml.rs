//! XML to raw record tree.
//!
//! Attributes become coerced scalars keyed by name. Child elements are keyed
//! by element name; a name that repeats collects into a list in document
//! order. Text-only elements become scalars, text next to attributes or
//! children is kept under [`TEXT_KEY`], and an element with no content at all
//! becomes an empty list.

use std::collections::BTreeSet;

use parity_types::{Record, Scalar, Value};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::coerce::coerce_scalar;
use crate::error::{ParseError, ParseResult};
use crate::options::CanonicalOptions;

/// Key under which mixed text content is stored.
pub const TEXT_KEY: &str = "#text";

struct Frame {
    name: String,
    fields: Record,
    attributes: BTreeSet<String>,
    repeated: BTreeSet<String>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>, options: &CanonicalOptions) -> ParseResult<Self> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|_| ParseError::Utf8 {
                context: "element name".to_string(),
            })?
            .to_string();

        let mut fields = Record::new();
        let mut attributes = BTreeSet::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| ParseError::Attribute {
                element: name.clone(),
                message: e.to_string(),
            })?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|_| ParseError::Utf8 {
                    context: format!("attribute name on <{}>", name),
                })?
                .to_string();
            let raw = attribute.unescape_value().map_err(|e| ParseError::Attribute {
                element: name.clone(),
                message: e.to_string(),
            })?;
            let value = if options.is_version_key(&key) {
                Value::Scalar(Scalar::Str(raw.into_owned()))
            } else {
                Value::Scalar(coerce_scalar(&raw))
            };
            attributes.insert(key.clone());
            fields.insert(key, value);
        }

        Ok(Self {
            name,
            fields,
            attributes,
            repeated: BTreeSet::new(),
            text: String::new(),
        })
    }

    fn add_child(&mut self, key: String, value: Value) -> ParseResult<()> {
        if self.attributes.contains(&key) {
            return Err(ParseError::ConflictingKey {
                element: self.name.clone(),
                key,
            });
        }
        if self.repeated.contains(&key) {
            if let Some(Value::List(items)) = self.fields.get_mut(&key) {
                items.push(value);
            }
            return Ok(());
        }
        match self.fields.remove(&key) {
            Some(existing) => {
                self.fields.insert(key.clone(), Value::List(vec![existing, value]));
                self.repeated.insert(key);
            }
            None => {
                self.fields.insert(key, value);
            }
        }
        Ok(())
    }

    fn text_value(&self, options: &CanonicalOptions) -> Value {
        if options.is_version_key(&self.name) {
            Value::from(self.text.as_str())
        } else {
            Value::Scalar(coerce_scalar(&self.text))
        }
    }

    fn into_value(mut self, options: &CanonicalOptions) -> Value {
        match (self.fields.is_empty(), self.text.is_empty()) {
            (true, true) => Value::List(Vec::new()),
            (true, false) => self.text_value(options),
            (false, true) => Value::Record(self.fields),
            (false, false) => {
                let text = self.text_value(options);
                self.fields.insert(TEXT_KEY.to_string(), text);
                Value::Record(self.fields)
            }
        }
    }

    fn into_root(mut self, options: &CanonicalOptions) -> (String, Record) {
        if !self.text.is_empty() {
            let text = self.text_value(options);
            self.fields.insert(TEXT_KEY.to_string(), text);
        }
        (self.name, self.fields)
    }
}

fn xml_error(reader: &Reader<&[u8]>, error: impl std::fmt::Display) -> ParseError {
    ParseError::Xml {
        position: reader.buffer_position() as u64,
        message: error.to_string(),
    }
}

/// Read a document into its root element name and un-normalized fields.
pub fn read_tree(text: &str, options: &CanonicalOptions) -> ParseResult<(String, Record)> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Record)> = None;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, e))?;
        match event {
            Event::Start(start) => {
                let frame = Frame::open(&start, options)?;
                if stack.is_empty() && root.is_some() {
                    return Err(ParseError::MultipleRoots { element: frame.name });
                }
                stack.push(frame);
            }
            Event::Empty(start) => {
                let frame = Frame::open(&start, options)?;
                close_frame(frame, &mut stack, &mut root, options)?;
            }
            Event::End(end) => {
                let Some(frame) = stack.pop() else {
                    return Err(ParseError::UnexpectedClose {
                        element: String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                    });
                };
                close_frame(frame, &mut stack, &mut root, options)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| xml_error(&reader, e))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                let data = data.into_inner();
                let text = std::str::from_utf8(&data).map_err(|_| ParseError::Utf8 {
                    context: "CDATA section".to_string(),
                })?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(ParseError::UnclosedElement {
            element: frame.name,
        });
    }
    root.ok_or(ParseError::EmptyDocument)
}

fn close_frame(
    frame: Frame,
    stack: &mut Vec<Frame>,
    root: &mut Option<(String, Record)>,
    options: &CanonicalOptions,
) -> ParseResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            let key = frame.name.clone();
            let value = frame.into_value(options);
            parent.add_child(key, value)
        }
        None => {
            if root.is_some() {
                return Err(ParseError::MultipleRoots { element: frame.name });
            }
            *root = Some(frame.into_root(options));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> (String, Record) {
        read_tree(text, &CanonicalOptions::default()).unwrap()
    }

    #[test]
    fn attributes_are_coerced() {
        let (root, fields) = read(r#"<System openmmVersion="8.2" type="System" version="1"/>"#);
        assert_eq!(root, "System");
        assert_eq!(fields["openmmVersion"], Value::from("8.2"));
        assert_eq!(fields["version"], Value::from(1i64));
        assert_eq!(fields["type"], Value::from("System"));
    }

    #[test]
    fn repeated_children_collect_into_list() {
        let (_, fields) = read(
            r#"<System><Particles><Particle mass="1.008"/><Particle mass="12.01"/></Particles></System>"#,
        );
        let particles = fields["Particles"].as_record().unwrap();
        let items = particles["Particle"].as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_record().unwrap()["mass"], Value::from(12.01));
    }

    #[test]
    fn single_child_stays_a_record() {
        let (_, fields) = read(r#"<System><Particles><Particle mass="1.0"/></Particles></System>"#);
        let particles = fields["Particles"].as_record().unwrap();
        assert!(particles["Particle"].as_record().is_some());
    }

    #[test]
    fn empty_element_is_empty_list() {
        let (_, fields) = read("<System><Constraints/></System>");
        assert_eq!(fields["Constraints"], Value::List(Vec::new()));
    }

    #[test]
    fn text_content() {
        let (_, fields) = read("<System><Cutoff>0.9</Cutoff><Note a=\"1\">hi</Note></System>");
        assert_eq!(fields["Cutoff"], Value::Scalar(Scalar::Float(0.9)));
        let note = fields["Note"].as_record().unwrap();
        assert_eq!(note[TEXT_KEY], Value::from("hi"));
    }

    #[test]
    fn escaped_attributes() {
        let (_, fields) = read(r#"<System label="a &amp; b"/>"#);
        assert_eq!(fields["label"], Value::from("a & b"));
    }

    #[test]
    fn malformed_documents() {
        let options = CanonicalOptions::default();
        assert!(matches!(
            read_tree("", &options),
            Err(ParseError::EmptyDocument)
        ));
        assert!(matches!(
            read_tree("<System><Forces></System>", &options),
            Err(ParseError::Xml { .. })
        ));
        assert!(matches!(
            read_tree("<System>", &options),
            Err(ParseError::UnclosedElement { .. }) | Err(ParseError::Xml { .. })
        ));
        assert!(matches!(
            read_tree("<A/><B/>", &options),
            Err(ParseError::MultipleRoots { .. })
        ));
    }

    #[test]
    fn attribute_child_conflict() {
        let options = CanonicalOptions::default();
        let result = read_tree(r#"<System a="1"><a/></System>"#, &options);
        assert!(matches!(result, Err(ParseError::ConflictingKey { .. })));
    }
}
