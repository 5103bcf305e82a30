#![deny(unsafe_code)]
//! # parity-batch
//!
//! Batch Comparison Driver: compares two `{name -> raw artifact}` collections
//! on a fixed-size worker pool and aggregates a report keyed by name.
//!
//! ## Key Types
//!
//! - [`BatchComparer`] — canonicalize + diff + reconcile per name
//! - [`WorkerPool`] / [`CancelFlag`] — keyed parallel execution with cancellation
//! - [`BatchReport`] — counts, divergent items, warnings, errors, name-set asymmetry

pub mod collection;
pub mod driver;
pub mod error;
pub mod pool;
pub mod report;

pub use collection::{load_collection, Collection};
pub use driver::{compare_batch, unmet_warning, BatchComparer};
pub use error::{BatchError, BatchResult};
pub use pool::{default_threads, CancelFlag, PoolOutput, WorkerPool};
pub use report::{BatchReport, ItemReport};
