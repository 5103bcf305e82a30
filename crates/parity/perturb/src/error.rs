use std::fmt;

use parity_batch::BatchError;
use parity_canonical::ParseError;
use parity_types::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a transform failure may be contained to one perturbation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformErrorKind {
    /// Bad input for this call only; recorded and the run continues.
    Recoverable,
    /// The transform itself is broken; re-raised when the caller opts in.
    Fatal,
}

impl fmt::Display for TransformErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformErrorKind::Recoverable => f.write_str("recoverable"),
            TransformErrorKind::Fatal => f.write_str("fatal"),
        }
    }
}

/// Failure raised by a [`Transform`](crate::Transform) call.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind} transform failure: {message}")]
pub struct TransformError {
    pub kind: TransformErrorKind,
    pub message: String,
}

impl TransformError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self {
            kind: TransformErrorKind::Recoverable,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: TransformErrorKind::Fatal,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == TransformErrorKind::Fatal
    }
}

/// Errors from the perturbation harness.
#[derive(Debug, Error)]
pub enum PerturbError {
    #[error("unknown parameter family: {family}")]
    UnknownFamily { family: String },

    #[error("invalid parameter path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("parameter family {family} has no parameter entries")]
    NoParameterEntry { family: String },

    #[error("value for {path} is not numeric")]
    NotNumeric { path: String },

    #[error("unit '{unit}': {reason}")]
    Unit { unit: String, reason: String },

    #[error("propagation rule for {parameter}: {reason}")]
    Rule { parameter: String, reason: String },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("baseline artifact: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

pub type PerturbResult<T> = Result<T, PerturbError>;
