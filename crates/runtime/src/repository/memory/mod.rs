//! In-memory repository implementations for testing and development.

mod history;
mod snapshot;

pub use history::InMemoryHistoryRepository;
pub use snapshot::InMemorySnapshotRepository;
