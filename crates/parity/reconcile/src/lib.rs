#![deny(unsafe_code)]
//! # parity-reconcile
//!
//! Expected-Change Reconciler: separates differences explained by declared
//! [`ExpectedChange`](parity_types::ExpectedChange)s from residual divergence,
//! and reports expectations that never materialized.

pub mod reconciler;

pub use reconciler::{reconcile, Reconciliation};
