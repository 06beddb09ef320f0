//! Repository contracts for combat snapshots and history.
//!
//! Both repositories are keyed by encounter id, and the key is the unit of
//! isolation: operations on different encounters never interfere. Callers
//! serialize mutating operations per encounter themselves.

use combat_core::{CombatActionLogEntry, EncounterId};

use super::Result;

/// Storage for the latest combat snapshot of each encounter.
///
/// Snapshots are opaque text blobs; encoding and integrity checks belong to
/// [`crate::StateStore`], so a repository can be swapped for a database table
/// without touching the snapshot format.
pub trait SnapshotRepository: Send + Sync {
    /// Store `blob` as the snapshot for `encounter_id`, replacing any previous one.
    fn put(&self, encounter_id: &EncounterId, blob: &str) -> Result<()>;

    /// Fetch the stored snapshot, `None` if nothing was saved.
    fn get(&self, encounter_id: &EncounterId) -> Result<Option<String>>;

    /// Remove the snapshot. Removing a missing snapshot is not an error.
    fn delete(&self, encounter_id: &EncounterId) -> Result<()>;

    /// Check if a snapshot exists
    fn exists(&self, encounter_id: &EncounterId) -> bool {
        matches!(self.get(encounter_id), Ok(Some(_)))
    }

    /// List encounters that currently have a snapshot
    fn list_encounters(&self) -> Result<Vec<EncounterId>> {
        Ok(vec![])
    }
}

/// Append-only storage for combat history.
///
/// Entries are returned in insertion order. Nothing is ever updated in place;
/// the only removal is clearing an encounter's whole log.
pub trait HistoryRepository: Send + Sync {
    /// Append one entry to the encounter's log.
    fn append(&self, encounter_id: &EncounterId, entry: &CombatActionLogEntry) -> Result<()>;

    /// All entries for the encounter, oldest first. Unknown encounters yield an empty list.
    fn entries(&self, encounter_id: &EncounterId) -> Result<Vec<CombatActionLogEntry>>;

    /// Drop the encounter's log.
    fn clear(&self, encounter_id: &EncounterId) -> Result<()>;

    /// Most recent entry, if any.
    fn last(&self, encounter_id: &EncounterId) -> Result<Option<CombatActionLogEntry>> {
        Ok(self.entries(encounter_id)?.pop())
    }
}
