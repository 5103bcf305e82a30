#![deny(unsafe_code)]
//! # parity-types
//!
//! Shared data model for regression comparison of derived artifacts.
//!
//! ## Key Types
//!
//! - [`CanonicalRecord`] / [`Value`] / [`Scalar`] — the canonical tree
//! - [`PathPattern`] — `/`-separated paths with `*` wildcard segments
//! - [`ToleranceSpec`] — validated per-path numeric tolerances
//! - [`Difference`] — one typed structural difference
//! - [`ExpectedChange`] / [`Perturbation`] — declared changes and mutations

pub mod change;
pub mod config;
pub mod difference;
pub mod error;
pub mod path;
pub mod record;
pub mod tolerance;

pub use change::{ChangeKind, ExpectedChange, Perturbation};
pub use config::{load_expected_changes, load_model, load_perturbations, load_tolerance, save_model, FileFormat};
pub use difference::Difference;
pub use error::{ConfigError, ConfigResult};
pub use path::{join_path, split_path, PathPattern, Segment, Specificity};
pub use record::{format_float, CanonicalRecord, Record, Scalar, Value, ValueKind};
pub use tolerance::{ComparisonSettings, ToleranceOverride, ToleranceSpec, DEFAULT_NUMERIC_TOLERANCE};
