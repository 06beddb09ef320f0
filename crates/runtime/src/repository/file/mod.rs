//! File-based repository implementations.

mod history;
mod snapshot;

pub use history::FileHistoryRepository;
pub use snapshot::FileSnapshotRepository;

use combat_core::EncounterId;

use crate::repository::{RepositoryError, Result};

/// Encounter ids become part of file names, so only a conservative character
/// set is accepted.
fn validate_key(encounter_id: &EncounterId) -> Result<()> {
    let key = encounter_id.as_str();
    let well_formed = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if well_formed {
        Ok(())
    } else {
        Err(RepositoryError::InvalidKey(key.to_owned()))
    }
}
