#![deny(unsafe_code)]
//! # parity-canonical
//!
//! Canonical Form Builder: parses a serialized system XML artifact into an
//! order-normalized [`CanonicalRecord`](parity_types::CanonicalRecord), and
//! renders canonical records back to XML.
//!
//! ## Key Types
//!
//! - [`Canonicalizer`] — read + normalize pipeline
//! - [`NormalizeStep`] — one named structural normalization
//! - [`CanonicalOptions`] — ordinal prefix, named block key, denylist, version keys

pub mod builder;
pub mod coerce;
pub mod error;
pub mod options;
pub mod render;
pub mod steps;
pub mod xml;

pub use builder::{build_canonical, Canonicalizer};
pub use coerce::coerce_scalar;
pub use error::{ParseError, ParseResult};
pub use options::CanonicalOptions;
pub use render::{render_canonical, Renderer};
pub use steps::{singular, NamedBlocks, NormalizeStep, OrdinalSort, UnnestSingular, VersionPatch};
pub use xml::{read_tree, TEXT_KEY};
