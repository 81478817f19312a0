use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::models::{LeaderboardState, ProgressCheckpoint};
use super::ScoringError;

pub const STATE_KEY: &str = "arena_state_v1";
pub const PROGRESS_KEY: &str = "arena_progress_v1";

/// Key/value persistence for string blobs
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ScoringError>;
    async fn set(&self, key: &str, value: String) -> Result<(), ScoringError>;
    async fn remove(&self, key: &str) -> Result<(), ScoringError>;
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ScoringError> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ScoringError> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ScoringError> {
        let mut blobs = self.blobs.write().await;
        blobs.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per blob inside a directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ScoringError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScoringError::Storage(format!("cannot read {}: {}", key, e))),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ScoringError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ScoringError::Storage(format!("cannot create store dir: {}", e)))?;
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(|e| ScoringError::Storage(format!("cannot write {}: {}", key, e)))
    }

    async fn remove(&self, key: &str) -> Result<(), ScoringError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScoringError::Storage(format!("cannot remove {}: {}", key, e))),
        }
    }
}

/// Typed access to the leaderboard and progress blobs. Reads never fail:
/// a missing or unreadable blob comes back empty.
#[derive(Clone)]
pub struct ScoreRepository {
    store: Arc<dyn BlobStore>,
}

impl ScoreRepository {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to read blob, using empty value");
                None
            }
        }
    }

    pub async fn load_state(&self) -> LeaderboardState {
        self.read(STATE_KEY)
            .await
            .map(|raw| LeaderboardState::from_json(&raw))
            .unwrap_or_default()
    }

    pub async fn save_state(&self, state: &LeaderboardState) -> Result<(), ScoringError> {
        let raw = serde_json::to_string(state)?;
        self.store.set(STATE_KEY, raw).await
    }

    pub async fn clear_state(&self) -> Result<(), ScoringError> {
        self.store.remove(STATE_KEY).await
    }

    pub async fn load_progress(&self) -> Option<ProgressCheckpoint> {
        self.read(PROGRESS_KEY)
            .await
            .and_then(|raw| ProgressCheckpoint::from_json(&raw))
    }

    pub async fn save_progress(&self, progress: &ProgressCheckpoint) -> Result<(), ScoringError> {
        let raw = serde_json::to_string(progress)?;
        self.store.set(PROGRESS_KEY, raw).await
    }

    pub async fn clear_progress(&self) -> Result<(), ScoringError> {
        self.store.remove(PROGRESS_KEY).await
    }
}
