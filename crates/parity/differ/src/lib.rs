#![deny(unsafe_code)]
//! # parity-differ
//!
//! Tolerant structural differ: walks two canonical records in lock-step and
//! reports every [`Difference`](parity_types::Difference), comparing numbers
//! within the tolerance resolved for their path.

pub mod differ;

pub use differ::{diff, is_identical, Differ};
