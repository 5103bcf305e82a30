//! Canonicalization errors.
//!
//! A `ParseError` is fatal for the single artifact being read; batch callers
//! record it against the item's name and continue.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The markup itself is malformed.
    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// An attribute could not be read or unescaped.
    #[error("bad attribute on <{element}>: {message}")]
    Attribute { element: String, message: String },

    /// A name or text node is not valid UTF-8.
    #[error("invalid UTF-8 in {context}")]
    Utf8 { context: String },

    #[error("document has no root element")]
    EmptyDocument,

    #[error("document has more than one root element (found <{element}>)")]
    MultipleRoots { element: String },

    #[error("element <{element}> is never closed")]
    UnclosedElement { element: String },

    #[error("unexpected closing tag </{element}>")]
    UnexpectedClose { element: String },

    /// An attribute and a child element share a name.
    #[error("<{element}> has both an attribute and a child named '{key}'")]
    ConflictingKey { element: String, key: String },

    /// A named block lacks its identifying field.
    #[error("block {index} under '{block_key}' has no '{field}' field")]
    MissingBlockField {
        block_key: String,
        index: usize,
        field: String,
    },

    /// Two named blocks share the same `(type, name)` identity.
    #[error("duplicate block identity ({block_type}, {name}) under '{block_key}'")]
    DuplicateBlock {
        block_key: String,
        block_type: String,
        name: String,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_error_display() {
        let e = ParseError::Xml {
            position: 42,
            message: "unexpected end".into(),
        };
        assert_eq!(e.to_string(), "malformed XML at byte 42: unexpected end");
    }

    #[test]
    fn duplicate_block_display() {
        let e = ParseError::DuplicateBlock {
            block_key: "Forces".into(),
            block_type: "NonbondedForce".into(),
            name: "NonbondedForce".into(),
        };
        assert!(e.to_string().contains("(NonbondedForce, NonbondedForce)"));
    }
}
