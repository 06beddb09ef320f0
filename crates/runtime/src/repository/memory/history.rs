//! In-memory history log implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use combat_core::{CombatActionLogEntry, EncounterId};

use crate::repository::{HistoryRepository, RepositoryError, Result};

/// In-memory history for testing and development.
///
/// Thread-safe but not persistent across process restarts.
pub struct InMemoryHistoryRepository {
    logs: RwLock<HashMap<EncounterId, Vec<CombatActionLogEntry>>>,
}

impl InMemoryHistoryRepository {
    /// Create a new empty in-memory history.
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryHistoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryRepository for InMemoryHistoryRepository {
    fn append(&self, encounter_id: &EncounterId, entry: &CombatActionLogEntry) -> Result<()> {
        let mut logs = self
            .logs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        logs.entry(encounter_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    fn entries(&self, encounter_id: &EncounterId) -> Result<Vec<CombatActionLogEntry>> {
        let logs = self
            .logs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(logs.get(encounter_id).cloned().unwrap_or_default())
    }

    fn clear(&self, encounter_id: &EncounterId) -> Result<()> {
        let mut logs = self
            .logs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        logs.remove(encounter_id);
        Ok(())
    }

    fn last(&self, encounter_id: &EncounterId) -> Result<Option<CombatActionLogEntry>> {
        let logs = self
            .logs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(logs.get(encounter_id).and_then(|log| log.last().cloned()))
    }
}
