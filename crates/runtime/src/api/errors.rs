//! Unified error types surfaced by the runtime API.
//!
//! Tracker operations report refusals as `false`; these errors cover setup
//! and the explicit `try_*` style queries where callers want the cause.
use thiserror::Error;

pub use crate::repository::RepositoryError;
pub use crate::store::SnapshotError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to open data directory {path}")]
    DataDir {
        path: std::path::PathBuf,
        #[source]
        source: RepositoryError,
    },
}
