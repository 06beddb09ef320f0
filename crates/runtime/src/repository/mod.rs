//! Repository layer for combat data
//!
//! Repositories persist data that CHANGES during combat:
//! - Combat snapshots (latest state per encounter, for restore)
//! - Combat history (append-only action log per encounter)
//!
//! Two backends ship with the crate: in-memory maps for tests and embedding,
//! and plain files under a data directory.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::{FileHistoryRepository, FileSnapshotRepository};
pub use memory::{InMemoryHistoryRepository, InMemorySnapshotRepository};
pub use traits::{HistoryRepository, SnapshotRepository};
