//=========================================================================
// Progress Storage
//=========================================================================
//
// Backends that hold the serialized player record under one key.
//
//   FileStorage   → <dir>/<key>.json, replaced atomically (temp + rename)
//   MemoryStorage → shared in-memory slot with injectable write failures
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

//=== Internal Dependencies ===============================================

use super::model::PlayerProgress;
use crate::core::error::PersistenceError;

//=== ProgressStorage Trait ===============================================

/// Key-value persistence for the single player record.
pub trait ProgressStorage {
    /// Reads the stored record, `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<PlayerProgress>, PersistenceError>;

    /// Overwrites the stored record.
    fn save(&mut self, record: &PlayerProgress) -> Result<(), PersistenceError>;
}

impl<S: ProgressStorage + ?Sized> ProgressStorage for Box<S> {
    fn load(&self) -> Result<Option<PlayerProgress>, PersistenceError> {
        (**self).load()
    }

    fn save(&mut self, record: &PlayerProgress) -> Result<(), PersistenceError> {
        (**self).save(record)
    }
}

//=== FileStorage =========================================================

#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Stores the record as `<dir>/<key>.json`.
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProgressStorage for FileStorage {
    fn load(&self) -> Result<Option<PlayerProgress>, PersistenceError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&mut self, record: &PlayerProgress) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(record)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!("Player record written to {}", self.path.display());
        Ok(())
    }
}

//=== MemoryStorage =======================================================

#[derive(Debug, Default)]
struct MemorySlot {
    json: Option<String>,
    writes: u32,
    fail_next: u32,
}

/// In-memory backend. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<MemorySlot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a pre-existing record.
    pub fn with_record(record: &PlayerProgress) -> Result<Self, PersistenceError> {
        let storage = Self::new();
        storage.slot.borrow_mut().json = Some(serde_json::to_string(record)?);
        Ok(storage)
    }

    /// Makes the next `count` writes fail.
    pub fn fail_next_writes(&self, count: u32) {
        self.slot.borrow_mut().fail_next = count;
    }

    /// Successful writes so far.
    pub fn writes(&self) -> u32 {
        self.slot.borrow().writes
    }

    /// The record as last written.
    pub fn stored(&self) -> Option<PlayerProgress> {
        let slot = self.slot.borrow();
        slot.json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
    }
}

impl ProgressStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PlayerProgress>, PersistenceError> {
        match self.slot.borrow().json.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, record: &PlayerProgress) -> Result<(), PersistenceError> {
        let mut slot = self.slot.borrow_mut();
        if slot.fail_next > 0 {
            slot.fail_next -= 1;
            return Err(PersistenceError::Unavailable(
                "in-memory write rejected".to_string(),
            ));
        }
        slot.json = Some(serde_json::to_string(record)?);
        slot.writes += 1;
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PlayerProgress {
        let mut progress = PlayerProgress::default();
        progress.inventory.insert("cedar".into(), 4);
        progress
    }

    #[test]
    fn file_storage_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path(), "playerData");
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn file_storage_saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path(), "playerData");
        storage.save(&sample()).unwrap();

        assert!(dir.path().join("playerData.json").exists());
        assert!(!dir.path().join("playerData.json.tmp").exists());

        let reopened = FileStorage::new(dir.path(), "playerData");
        assert_eq!(reopened.load().unwrap(), Some(sample()));
    }

    #[test]
    fn file_storage_reports_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("playerData.json"), "{ not json").unwrap();
        let storage = FileStorage::new(dir.path(), "playerData");
        assert!(matches!(
            storage.load(),
            Err(PersistenceError::Serialize(_))
        ));
    }

    #[test]
    fn memory_storage_injected_failures() {
        let mut storage = MemoryStorage::new();
        let observer = storage.clone();
        storage.fail_next_writes(1);

        assert!(storage.save(&sample()).is_err());
        assert_eq!(observer.writes(), 0);

        storage.save(&sample()).unwrap();
        assert_eq!(observer.writes(), 1);
        assert_eq!(observer.stored(), Some(sample()));
    }
}
