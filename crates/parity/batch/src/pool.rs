//! Fixed-size worker pool.
//!
//! Work items are `(key, input)` pairs. Results come back keyed, never by
//! position, so out-of-order completion cannot misattribute a result. Once the
//! [`CancelFlag`] is raised, items that have not started are skipped and
//! reported as cancelled; finished results are kept.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{BatchError, BatchResult};

/// Shared cancellation switch.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Results of one pool run.
#[derive(Debug)]
pub struct PoolOutput<K: Ord, T> {
    pub completed: BTreeMap<K, T>,
    pub cancelled: Vec<K>,
}

/// Number of workers used when none is configured.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
    cancel: CancelFlag,
}

impl WorkerPool {
    /// Build a pool with `threads` workers; `None` or `0` means one per core.
    pub fn new(threads: Option<usize>) -> BatchResult<Self> {
        let threads = match threads {
            Some(n) if n > 0 => n,
            _ => default_threads(),
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("parity-worker-{}", index))
            .build()
            .map_err(|e| BatchError::Pool(e.to_string()))?;
        debug!(threads, "worker pool ready");
        Ok(Self {
            pool,
            threads,
            cancel: CancelFlag::new(),
        })
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run `work` over every item, calling `progress` after each one finishes.
    pub fn run<K, I, T, F, P>(&self, items: Vec<(K, I)>, work: F, progress: P) -> PoolOutput<K, T>
    where
        K: Ord + Send,
        I: Send,
        T: Send,
        F: Fn(&K, I) -> T + Sync,
        P: Fn(&K) + Sync,
    {
        let cancel = &self.cancel;
        let results: Vec<(K, Option<T>)> = self.pool.install(|| {
            items
                .into_par_iter()
                .map(|(key, input)| {
                    if cancel.is_cancelled() {
                        return (key, None);
                    }
                    let output = work(&key, input);
                    progress(&key);
                    (key, Some(output))
                })
                .collect()
        });

        let mut completed = BTreeMap::new();
        let mut cancelled = Vec::new();
        for (key, output) in results {
            match output {
                Some(output) => {
                    completed.insert(key, output);
                }
                None => cancelled.push(key),
            }
        }
        cancelled.sort();
        PoolOutput {
            completed,
            cancelled,
        }
    }
}
