//! Snapshot persistence for combat state.
//!
//! [`StateStore`] is the only component that turns a [`CombatState`] into a
//! stored blob and back. Whatever it loads has passed the integrity checks;
//! a rejected snapshot never reaches the caller's state.

mod snapshot;

use std::sync::Arc;

use thiserror::Error;

use combat_core::{CombatState, EncounterId, PhaseFlagsError, ValidationReport};

use crate::repository::{RepositoryError, SnapshotRepository};

pub use snapshot::{CombatSnapshot, SNAPSHOT_VERSION, check_shape, decode, encode};

/// Reasons a snapshot could not be written or accepted.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found}")]
    Version { found: u32 },

    #[error("snapshot checksum mismatch (expected {expected}, actual {actual})")]
    Checksum { expected: String, actual: String },

    #[error("malformed snapshot: {0}")]
    Shape(String),

    #[error("inconsistent combat phase: {0}")]
    Phase(#[from] PhaseFlagsError),

    #[error("snapshot failed validation: {0}")]
    Invalid(ValidationReport),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Save and restore combat snapshots keyed by encounter.
#[derive(Clone)]
pub struct StateStore {
    repository: Arc<dyn SnapshotRepository>,
}

impl StateStore {
    pub fn new(repository: Arc<dyn SnapshotRepository>) -> Self {
        Self { repository }
    }

    /// Persist `state` as the encounter's snapshot. Returns `false` on failure.
    pub fn save(&self, encounter_id: &EncounterId, state: &CombatState) -> bool {
        match self.try_save(encounter_id, state) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Failed to save snapshot for {}: {}", encounter_id, err);
                false
            }
        }
    }

    /// Replace `*state` with the stored snapshot.
    ///
    /// Returns `false` and leaves `state` untouched if nothing was saved or the
    /// snapshot is rejected.
    pub fn load(&self, encounter_id: &EncounterId, state: &mut CombatState) -> bool {
        match self.try_load(encounter_id) {
            Ok(Some(loaded)) => {
                *state = loaded;
                true
            }
            Ok(None) => {
                tracing::debug!("No snapshot stored for {}", encounter_id);
                false
            }
            Err(SnapshotError::Invalid(report)) => {
                tracing::warn!(
                    encounter = %encounter_id,
                    violations = ?report.messages(),
                    "Rejected invalid snapshot"
                );
                false
            }
            Err(err) => {
                tracing::warn!("Rejected snapshot for {}: {}", encounter_id, err);
                false
            }
        }
    }

    /// Drop the encounter's snapshot. Failures are logged.
    pub fn clear(&self, encounter_id: &EncounterId) {
        if let Err(err) = self.repository.delete(encounter_id) {
            tracing::warn!("Failed to clear snapshot for {}: {}", encounter_id, err);
        }
    }

    pub fn try_save(
        &self,
        encounter_id: &EncounterId,
        state: &CombatState,
    ) -> Result<(), SnapshotError> {
        let blob = encode(state)?;
        self.repository.put(encounter_id, &blob)?;
        Ok(())
    }

    /// The stored state, `None` if nothing was saved.
    pub fn try_load(
        &self,
        encounter_id: &EncounterId,
    ) -> Result<Option<CombatState>, SnapshotError> {
        self.repository
            .get(encounter_id)?
            .map(|blob| decode(&blob))
            .transpose()
    }

    pub fn exists(&self, encounter_id: &EncounterId) -> bool {
        self.repository.exists(encounter_id)
    }
}
