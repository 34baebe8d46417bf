use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::model::snapshot::RemoteDocument;

/// Opaque, stable identity supplied by the identity source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error type for remote store operations
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid user id {0:?}")]
    InvalidUser(String),
    #[error("remote i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not decode remote document: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One document per user: read it, or replace it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The user's document, or `None` if they have never synced.
    async fn fetch(&self, user: &UserId) -> Result<Option<RemoteDocument>, RemoteError>;
    /// Replace the user's document.
    async fn store(&self, user: &UserId, doc: &RemoteDocument) -> Result<(), RemoteError>;
}

/// A directory acting as the remote store:
/// `<root>/users/<user>/dashboard/state.json`.
#[derive(Debug, Clone)]
pub struct DirRemote {
    root: PathBuf,
}

impl DirRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirRemote { root: root.into() }
    }

    fn doc_path(&self, user: &UserId) -> Result<PathBuf, RemoteError> {
        let id = user.as_str();
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
            && id != "."
            && id != "..";
        if !safe {
            return Err(RemoteError::InvalidUser(id.to_string()));
        }
        Ok(self
            .root
            .join("users")
            .join(id)
            .join("dashboard")
            .join("state.json"))
    }
}

#[async_trait]
impl RemoteStore for DirRemote {
    async fn fetch(&self, user: &UserId) -> Result<Option<RemoteDocument>, RemoteError> {
        let path = self.doc_path(user)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RemoteError::Io { path, source: e }),
        }
    }

    async fn store(&self, user: &UserId, doc: &RemoteDocument) -> Result<(), RemoteError> {
        let path = self.doc_path(user)?;
        let text = serde_json::to_string(doc)?;
        let dir = path.parent().map(PathBuf::from).unwrap_or_default();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RemoteError::Io {
                path: dir.clone(),
                source: e,
            })?;
        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            crate::io::local_cache::atomic_write(&target, text.as_bytes())
        })
        .await
        .map_err(|e| RemoteError::Unavailable(e.to_string()))?
        .map_err(|e| RemoteError::Io { path, source: e })
    }
}

/// In-memory remote store with call counters and an offline switch.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    docs: Mutex<HashMap<UserId, RemoteDocument>>,
    offline: AtomicBool,
    fetches: AtomicUsize,
    stores: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: &UserId, doc: RemoteDocument) {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(user.clone(), doc);
        }
    }

    pub fn get(&self, user: &UserId) -> Option<RemoteDocument> {
        self.docs.lock().ok()?.get(user).cloned()
    }

    /// Make every call fail with `Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable("offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self, user: &UserId) -> Result<Option<RemoteDocument>, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.get(user))
    }

    async fn store(&self, user: &UserId, doc: &RemoteDocument) -> Result<(), RemoteError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.insert(user, doc.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::time::Timestamp;
    use tempfile::TempDir;

    fn doc(ms: i64) -> RemoteDocument {
        RemoteDocument {
            projects: Vec::new(),
            archive: Vec::new(),
            columns_json: Some("[]".into()),
            columns: None,
            settings: Default::default(),
            version: "2.0".into(),
            updated_at: Timestamp::from_millis(ms),
        }
    }

    #[tokio::test]
    async fn dir_remote_round_trip() {
        let dir = TempDir::new().unwrap();
        let remote = DirRemote::new(dir.path());
        let user = UserId::new("alice");

        assert!(remote.fetch(&user).await.unwrap().is_none());
        remote.store(&user, &doc(7)).await.unwrap();
        assert!(dir.path().join("users/alice/dashboard/state.json").exists());

        let back = remote.fetch(&user).await.unwrap().unwrap();
        assert_eq!(back, doc(7));
    }

    #[tokio::test]
    async fn dir_remote_keeps_users_apart() {
        let dir = TempDir::new().unwrap();
        let remote = DirRemote::new(dir.path());
        remote.store(&UserId::new("alice"), &doc(1)).await.unwrap();
        assert!(remote.fetch(&UserId::new("bob")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dir_remote_rejects_path_tricks() {
        let dir = TempDir::new().unwrap();
        let remote = DirRemote::new(dir.path());
        for bad in ["", "..", "a/b", "../x"] {
            let err = remote.fetch(&UserId::new(bad)).await.unwrap_err();
            assert!(matches!(err, RemoteError::InvalidUser(_)), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn memory_remote_offline() {
        let remote = MemoryRemote::new();
        let user = UserId::new("u");
        remote.set_offline(true);
        assert!(remote.store(&user, &doc(1)).await.is_err());
        assert!(remote.get(&user).is_none());
        remote.set_offline(false);
        remote.store(&user, &doc(1)).await.unwrap();
        assert_eq!(remote.store_count(), 2);
    }
}
