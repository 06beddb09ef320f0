//! File-based SnapshotRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use combat_core::EncounterId;

use super::validate_key;
use crate::repository::{RepositoryError, Result, SnapshotRepository};

/// File-based implementation of SnapshotRepository.
///
/// Stores one snapshot per encounter as `snapshot_{encounter}.json`. Writes go
/// to a temp file first and are renamed into place, so a reader never sees a
/// half-written snapshot.
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
}

impl FileSnapshotRepository {
    /// Create a new file-based snapshot repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    /// Get the path to a snapshot file.
    fn snapshot_path(&self, encounter_id: &EncounterId) -> Result<PathBuf> {
        validate_key(encounter_id)?;
        Ok(self
            .base_dir
            .join(format!("snapshot_{}.json", encounter_id.as_str())))
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn put(&self, encounter_id: &EncounterId, blob: &str) -> Result<()> {
        let path = self.snapshot_path(encounter_id)?;
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, blob).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!("Saved snapshot[{}] to {}", encounter_id, path.display());

        Ok(())
    }

    fn get(&self, encounter_id: &EncounterId) -> Result<Option<String>> {
        let path = self.snapshot_path(encounter_id)?;

        if !path.exists() {
            return Ok(None);
        }

        let blob = fs::read_to_string(&path).map_err(RepositoryError::Io)?;

        tracing::debug!("Loaded snapshot[{}] from {}", encounter_id, path.display());

        Ok(Some(blob))
    }

    fn delete(&self, encounter_id: &EncounterId) -> Result<()> {
        let path = self.snapshot_path(encounter_id)?;

        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Deleted snapshot[{}]", encounter_id);
        }

        Ok(())
    }

    fn exists(&self, encounter_id: &EncounterId) -> bool {
        self.snapshot_path(encounter_id)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    fn list_encounters(&self) -> Result<Vec<EncounterId>> {
        let mut ids = Vec::new();

        let entries = fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)?;

        for entry in entries {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(id) = filename
                    .strip_prefix("snapshot_")
                    .and_then(|s| s.strip_suffix(".json"))
            {
                ids.push(EncounterId::from(id));
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }
}
