use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

/// Error type for the local snapshot cache
#[derive(Debug, thiserror::Error)]
pub enum LocalError {
    #[error("local storage is full: {size} bytes exceeds the {capacity} byte quota")]
    QuotaExceeded { size: u64, capacity: u64 },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
}

/// A single-key blob store holding the serialized snapshot.
///
/// Always available and synchronous.
pub trait LocalCache: Send {
    /// The stored blob, or `None` if nothing has been written yet.
    fn read(&self) -> Result<Option<String>, LocalError>;
    /// Replace the stored blob.
    fn write(&mut self, blob: &str) -> Result<(), LocalError>;
    /// Bytes currently stored.
    fn usage_bytes(&self) -> u64;
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Snapshot cache backed by one JSON file, with a byte quota.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
    capacity: Option<u64>,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCache {
            path: path.into(),
            capacity: None,
        }
    }

    /// Reject writes larger than `bytes`.
    pub fn with_capacity(mut self, bytes: u64) -> Self {
        self.capacity = Some(bytes);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalCache for FileCache {
    fn read(&self) -> Result<Option<String>, LocalError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LocalError::ReadError {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn write(&mut self, blob: &str) -> Result<(), LocalError> {
        check_quota(blob, self.capacity)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LocalError::WriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        atomic_write(&self.path, blob.as_bytes()).map_err(|e| LocalError::WriteError {
            path: self.path.clone(),
            source: e,
        })
    }

    fn usage_bytes(&self) -> u64 {
        std::fs::metadata(&self.path).map_or(0, |m| m.len())
    }
}

fn check_quota(blob: &str, capacity: Option<u64>) -> Result<(), LocalError> {
    let size = blob.len() as u64;
    match capacity {
        Some(capacity) if size > capacity => Err(LocalError::QuotaExceeded { size, capacity }),
        _ => Ok(()),
    }
}

/// In-memory cache. Clones share the same slot, so a test can keep a handle
/// and inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    slot: Arc<Mutex<Option<String>>>,
    capacity: Option<u64>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, bytes: u64) -> Self {
        self.capacity = Some(bytes);
        self
    }

    pub fn seeded(blob: impl Into<String>) -> Self {
        let cache = Self::default();
        cache.set(Some(blob.into()));
        cache
    }

    pub fn get(&self) -> Option<String> {
        self.slot.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn set(&self, blob: Option<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = blob;
        }
    }
}

impl LocalCache for MemoryCache {
    fn read(&self) -> Result<Option<String>, LocalError> {
        Ok(self.get())
    }

    fn write(&mut self, blob: &str) -> Result<(), LocalError> {
        check_quota(blob, self.capacity)?;
        self.set(Some(blob.to_string()));
        Ok(())
    }

    fn usage_bytes(&self) -> u64 {
        self.get().map_or(0, |s| s.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path().join("nested/dashboard.json"));
        assert!(cache.read().unwrap().is_none());
        assert_eq!(cache.usage_bytes(), 0);

        cache.write("{\"projects\":[]}").unwrap();
        assert_eq!(cache.read().unwrap().as_deref(), Some("{\"projects\":[]}"));
        assert_eq!(cache.usage_bytes(), 15);
    }

    #[test]
    fn file_cache_quota_keeps_previous_blob() {
        let dir = TempDir::new().unwrap();
        let mut cache = FileCache::new(dir.path().join("d.json")).with_capacity(4);
        cache.write("1234").unwrap();
        let err = cache.write("12345").unwrap_err();
        assert!(matches!(err, LocalError::QuotaExceeded { size: 5, capacity: 4 }));
        assert_eq!(cache.read().unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn memory_cache_clones_share_slot() {
        let handle = MemoryCache::new();
        let mut cache = handle.clone();
        cache.write("abc").unwrap();
        assert_eq!(handle.get().as_deref(), Some("abc"));
        assert_eq!(handle.usage_bytes(), 3);
    }
}
