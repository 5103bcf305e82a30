use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a batch before any comparison runs.
///
/// Per-item problems (unparseable artifacts) are not errors at this level;
/// they are recorded in the report.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to start worker pool: {0}")]
    Pool(String),
}

pub type BatchResult<T> = Result<T, BatchError>;
