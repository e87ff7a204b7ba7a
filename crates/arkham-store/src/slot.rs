//! Durable key-value slots holding the serialized store
//!
//! A slot stores exactly one string. [`MemorySlot`] keeps it in process and
//! counts writes; [`FileSlot`] keeps it in a JSON file on disk.

use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default slot name, shared with the browser client's local storage key
pub const DEFAULT_SLOT_KEY: &str = "arkhamLogStore";

/// A single durable value that the store is restored from and flushed to
pub trait SnapshotSlot: Send + Sync {
    /// Read the stored value, `None` if the slot is empty
    ///
    /// # Errors
    /// Backend failures other than "nothing stored yet"
    fn load(&self) -> StoreResult<Option<String>>;

    /// Overwrite the stored value
    ///
    /// # Errors
    /// Backend write failures
    fn save(&self, contents: &str) -> StoreResult<()>;

    /// Short description for log lines
    fn describe(&self) -> String;
}

#[derive(Debug, Default)]
struct MemoryState {
    contents: Option<String>,
    saves: usize,
}

/// In-process slot; clones share the same value
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemorySlot {
    /// Create an empty slot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot pre-filled with `contents`
    #[must_use]
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let slot = Self::new();
        slot.inner.lock().contents = Some(contents.into());
        slot
    }

    /// Current stored value
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.inner.lock().contents.clone()
    }

    /// Number of successful saves so far
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.inner.lock().saves
    }
}

impl SnapshotSlot for MemorySlot {
    fn load(&self) -> StoreResult<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> StoreResult<()> {
        let mut state = self.inner.lock();
        state.contents = Some(contents.to_string());
        state.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Slot backed by a JSON file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Slot at an explicit file path
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot named [`DEFAULT_SLOT_KEY`] inside `dir`
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{DEFAULT_SLOT_KEY}.json")))
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotSlot for FileSlot {
    fn load(&self) -> StoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io_error(&self.path, e)),
        }
    }

    fn save(&self, contents: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io_error(parent, e))?;
        }
        // Write-then-rename so readers never observe a half-written snapshot
        let staging = self.staging_path();
        fs::write(&staging, contents).map_err(|e| StoreError::io_error(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| StoreError::io_error(&self.path, e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_slot_starts_empty() {
        let slot = MemorySlot::new();
        assert_eq!(slot.load().unwrap(), None);
        assert_eq!(slot.save_count(), 0);
    }

    #[test]
    fn memory_slot_clones_share_state() {
        let slot = MemorySlot::new();
        let observer = slot.clone();

        slot.save("{}").unwrap();
        slot.save("{\"a\":1}").unwrap();

        assert_eq!(observer.contents().as_deref(), Some("{\"a\":1}"));
        assert_eq!(observer.save_count(), 2);
    }

    #[test]
    fn prefilled_memory_slot_has_no_saves() {
        let slot = MemorySlot::with_contents("garbage");
        assert_eq!(slot.load().unwrap().as_deref(), Some("garbage"));
        assert_eq!(slot.save_count(), 0);
    }

    #[test]
    fn file_slot_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let slot = FileSlot::in_dir(dir.path());
        assert_eq!(slot.load().unwrap(), None);
        assert!(slot.path().ends_with("arkhamLogStore.json"));
    }

    #[test]
    fn file_slot_save_overwrites() {
        let dir = tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("nested").join("store.json"));

        slot.save("first").unwrap();
        slot.save("second").unwrap();

        assert_eq!(slot.load().unwrap().as_deref(), Some("second"));
        assert!(!slot.staging_path().exists());
    }
}
