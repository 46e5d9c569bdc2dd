//! Save slot backends.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GridError, Result};

/// A single save slot holding one encoded record.
pub trait SaveSlot {
    /// The stored bytes, or `None` when nothing has been saved yet.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Human-readable location used in log lines.
    fn describe(&self) -> String;
}

// ============================================================================
// File Slot
// ============================================================================

/// Slot stored as one file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, source: io::Error) -> GridError {
        GridError::PersistenceUnavailable {
            path: self.path.clone(),
            source,
        }
    }
}

impl SaveSlot for FileSlot {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No save file at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(self.unavailable(e)),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        write_bytes_atomic(&self.path, bytes).map_err(|e| self.unavailable(e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("slot");
    path.with_file_name(format!("{file_name}.tmp"))
}

// ============================================================================
// Memory Slot
// ============================================================================

/// In-process slot. Can be switched offline to behave like a missing medium.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    bytes: Option<Vec<u8>>,
    offline: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        Self {
            bytes: None,
            offline: true,
        }
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(GridError::PersistenceUnavailable {
                path: PathBuf::from("<memory>"),
                source: io::Error::new(io::ErrorKind::NotConnected, "memory slot is offline"),
            });
        }
        Ok(())
    }
}

impl SaveSlot for MemorySlot {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        self.check_online()?;
        Ok(self.bytes.clone())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_online()?;
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("SavedGame_0.sav"));
        assert!(slot.read().unwrap().is_none());
    }

    #[test]
    fn test_file_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let mut slot = FileSlot::new(dir.path().join("nested").join("SavedGame_0.sav"));
        slot.write(b"first").unwrap();
        slot.write(b"second").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some(&b"second"[..]));
        assert!(!dir.path().join("nested").join("SavedGame_0.sav.tmp").exists());
    }

    #[test]
    fn test_unwritable_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let mut slot = FileSlot::new(blocker.join("SavedGame_0.sav"));
        assert!(matches!(
            slot.write(b"data"),
            Err(GridError::PersistenceUnavailable { .. })
        ));
    }

    #[test]
    fn test_memory_slot_offline() {
        let mut slot = MemorySlot::new();
        assert!(slot.read().unwrap().is_none());
        slot.write(&[1, 2, 3]).unwrap();
        assert_eq!(slot.bytes(), Some(&[1u8, 2, 3][..]));

        slot.set_offline(true);
        assert!(slot.read().is_err());
        assert!(slot.write(&[4]).is_err());
        assert_eq!(slot.bytes(), Some(&[1u8, 2, 3][..]));
    }
}
