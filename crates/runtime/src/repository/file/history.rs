//! Append-only history files.
//!
//! Each encounter's log lives in `history_{encounter}.jsonl`, one JSON entry
//! per line. Every committed entry ends with a newline; bytes after the last
//! newline are a torn append and are never treated as an entry.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use combat_core::{CombatActionLogEntry, EncounterId};

use super::validate_key;
use crate::repository::{HistoryRepository, RepositoryError, Result};

/// Bytes read per step when scanning a log backwards.
const TAIL_CHUNK: usize = 4096;

/// File-based implementation of HistoryRepository.
///
/// Appends within one process are serialized by an internal lock.
pub struct FileHistoryRepository {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileHistoryRepository {
    /// Create a new file-based history repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn log_path(&self, encounter_id: &EncounterId) -> Result<PathBuf> {
        validate_key(encounter_id)?;
        Ok(self
            .base_dir
            .join(format!("history_{}.jsonl", encounter_id.as_str())))
    }
}

/// Position of the last `\n` strictly before `end`, if any.
fn last_newline_before(file: &mut File, end: u64) -> std::io::Result<Option<u64>> {
    let mut chunk = [0u8; TAIL_CHUNK];
    let mut cursor = end;
    while cursor > 0 {
        let size = cursor.min(TAIL_CHUNK as u64) as usize;
        cursor -= size as u64;
        file.seek(SeekFrom::Start(cursor))?;
        file.read_exact(&mut chunk[..size])?;
        if let Some(offset) = chunk[..size].iter().rposition(|&byte| byte == b'\n') {
            return Ok(Some(cursor + offset as u64));
        }
    }
    Ok(None)
}

/// Length of the newline-terminated prefix of the file.
fn committed_len(file: &mut File) -> std::io::Result<u64> {
    let len = file.metadata()?.len();
    Ok(last_newline_before(file, len)?.map_or(0, |newline| newline + 1))
}

impl HistoryRepository for FileHistoryRepository {
    fn append(&self, encounter_id: &EncounterId, entry: &CombatActionLogEntry) -> Result<()> {
        let path = self.log_path(encounter_id)?;
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(RepositoryError::Io)?;

        let len = file.metadata().map_err(RepositoryError::Io)?.len();
        let end = committed_len(&mut file).map_err(RepositoryError::Io)?;
        if end < len {
            tracing::warn!(
                "Dropping {} bytes of partial history entry for {}",
                len - end,
                encounter_id
            );
            file.set_len(end).map_err(RepositoryError::Io)?;
        }

        file.seek(SeekFrom::Start(end)).map_err(RepositoryError::Io)?;
        file.write_all(line.as_bytes())
            .map_err(RepositoryError::Io)?;
        file.flush().map_err(RepositoryError::Io)?;

        Ok(())
    }

    fn entries(&self, encounter_id: &EncounterId) -> Result<Vec<CombatActionLogEntry>> {
        let path = self.log_path(encounter_id)?;

        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(RepositoryError::Io)?;
        let (committed, torn) = match content.rfind('\n') {
            Some(newline) => content.split_at(newline + 1),
            None => ("", content.as_str()),
        };
        if !torn.is_empty() {
            tracing::warn!(
                "Ignoring partial history entry for {} ({} bytes)",
                encounter_id,
                torn.len()
            );
        }

        let mut entries = Vec::new();
        for (number, line) in committed.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(line).map_err(|err| {
                RepositoryError::CorruptedData(format!(
                    "{} line {}: {}",
                    path.display(),
                    number + 1,
                    err
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Reads only the tail of the file instead of the whole log.
    fn last(&self, encounter_id: &EncounterId) -> Result<Option<CombatActionLogEntry>> {
        let path = self.log_path(encounter_id)?;

        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path).map_err(RepositoryError::Io)?;
        let end = committed_len(&mut file).map_err(RepositoryError::Io)?;
        if end == 0 {
            return Ok(None);
        }

        let start = last_newline_before(&mut file, end - 1)
            .map_err(RepositoryError::Io)?
            .map_or(0, |newline| newline + 1);
        file.seek(SeekFrom::Start(start))
            .map_err(RepositoryError::Io)?;
        let mut line = String::new();
        file.take(end - 1 - start)
            .read_to_string(&mut line)
            .map_err(RepositoryError::Io)?;

        if line.trim().is_empty() {
            // Blank trailing lines: fall back to the full scan.
            return Ok(self.entries(encounter_id)?.pop());
        }

        serde_json::from_str(&line).map(Some).map_err(|err| {
            RepositoryError::CorruptedData(format!("{} last entry: {}", path.display(), err))
        })
    }

    fn clear(&self, encounter_id: &EncounterId) -> Result<()> {
        let path = self.log_path(encounter_id)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        if path.exists() {
            fs::remove_file(&path).map_err(RepositoryError::Io)?;
            tracing::debug!("Cleared history for {}", encounter_id);
        }

        Ok(())
    }
}
