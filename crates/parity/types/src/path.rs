//! Slash-separated record paths and wildcard path patterns.
//!
//! A concrete path such as `Forces/NonbondedForce/Particles/3/q` names one
//! value inside a canonical record: record keys and list indices joined by `/`.
//! A [`PathPattern`] may replace any segment with `*`, which matches exactly one
//! key or list index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ConfigError, ConfigResult};

/// Segment separator used by every path in the workspace.
pub const SEPARATOR: char = '/';

/// Wildcard segment.
pub const WILDCARD: &str = "*";

/// Join path segments into a concrete path string.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(segment.as_ref());
    }
    out
}

/// Split a concrete path into its segments.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(SEPARATOR).collect()
}

/// One segment of a [`PathPattern`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches exactly this key or index.
    Literal(String),
    /// Matches any single key or index.
    Wildcard,
}

impl Segment {
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == segment,
            Segment::Wildcard => true,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Segment::Literal(_))
    }
}

/// How specific a pattern is. Larger compares as more specific.
///
/// Ordered first by the number of literal segments before the first wildcard,
/// then by the total number of literal segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub literal_prefix: usize,
    pub literal_segments: usize,
}

/// A path pattern with optional single-segment wildcards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern, failing fast on malformed wildcard syntax.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for an empty pattern, an empty
    /// segment (`a//b`, leading or trailing `/`), or a segment that mixes `*`
    /// with other characters (`Bond*`, `**`).
    pub fn parse(pattern: &str) -> ConfigResult<Self> {
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.trim().is_empty() {
            return Err(invalid("pattern is empty"));
        }

        let mut segments = Vec::new();
        for raw in pattern.split(SEPARATOR) {
            if raw.is_empty() {
                return Err(invalid("empty segment"));
            }
            if raw == WILDCARD {
                segments.push(Segment::Wildcard);
            } else if raw.contains('*') {
                return Err(invalid(&format!(
                    "wildcard must be a whole segment, found '{}'",
                    raw
                )));
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the pattern contains no wildcard.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(Segment::is_literal)
    }

    /// Whether the pattern matches a full concrete path given as segments.
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.segments.len() == path.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(segment, part)| segment.matches(part.as_ref()))
    }

    /// Whether the pattern matches a full concrete path string.
    pub fn matches_path(&self, path: &str) -> bool {
        self.matches(&split_path(path))
    }

    pub fn specificity(&self) -> Specificity {
        let literal_prefix = self
            .segments
            .iter()
            .take_while(|segment| segment.is_literal())
            .count();
        let literal_segments = self.segments.iter().filter(|s| s.is_literal()).count();
        Specificity {
            literal_prefix,
            literal_segments,
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for PathPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PathPattern::parse(&raw).map_err(serde::de::Error::custom)
    }
}
