//! In-memory SnapshotRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use combat_core::EncounterId;

use crate::repository::{RepositoryError, Result, SnapshotRepository};

/// In-memory implementation of SnapshotRepository.
///
/// Thread-safe but not persistent across process restarts.
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<HashMap<EncounterId, String>>,
}

impl InMemorySnapshotRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySnapshotRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn put(&self, encounter_id: &EncounterId, blob: &str) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(encounter_id.clone(), blob.to_owned());
        Ok(())
    }

    fn get(&self, encounter_id: &EncounterId) -> Result<Option<String>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.get(encounter_id).cloned())
    }

    fn delete(&self, encounter_id: &EncounterId) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(encounter_id);
        Ok(())
    }

    fn exists(&self, encounter_id: &EncounterId) -> bool {
        self.snapshots
            .read()
            .map(|snapshots| snapshots.contains_key(encounter_id))
            .unwrap_or(false)
    }

    fn list_encounters(&self) -> Result<Vec<EncounterId>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut ids: Vec<EncounterId> = snapshots.keys().cloned().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
