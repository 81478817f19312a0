use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use minigame_arena::remote::{
    Credentials, EntrySubmission, PlaySubmission, RemoteError, RemoteSubmitter,
    SessionTokenSource, WheelParticipation,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Remote sink that records every call and the credentials it carried.
/// Queued failures are returned by the next calls, in order.
#[derive(Clone, Default)]
pub struct MockRemote {
    calls: Arc<RwLock<Vec<(String, Credentials)>>>,
    plays: Arc<RwLock<Vec<PlaySubmission>>>,
    entries: Arc<RwLock<Vec<EntrySubmission>>>,
    wheel: Arc<RwLock<Vec<WheelParticipation>>>,
    failures: Arc<RwLock<VecDeque<RemoteError>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_next(&self, error: RemoteError) {
        self.failures.write().await.push_back(error);
    }

    pub async fn calls(&self) -> Vec<(String, Credentials)> {
        self.calls.read().await.clone()
    }

    pub async fn plays(&self) -> Vec<PlaySubmission> {
        self.plays.read().await.clone()
    }

    pub async fn entries(&self) -> Vec<EntrySubmission> {
        self.entries.read().await.clone()
    }

    pub async fn wheel(&self) -> Vec<WheelParticipation> {
        self.wheel.read().await.clone()
    }

    async fn record(&self, kind: &str, credentials: &Credentials) -> Result<(), RemoteError> {
        self.calls
            .write()
            .await
            .push((kind.to_string(), credentials.clone()));
        match self.failures.write().await.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteSubmitter for MockRemote {
    async fn create_entry(
        &self,
        entry: &EntrySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.record("entry", credentials).await?;
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn submit_play(
        &self,
        play: &PlaySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.record("play", credentials).await?;
        self.plays.write().await.push(play.clone());
        Ok(())
    }

    async fn submit_wheel_participation(
        &self,
        participation: &WheelParticipation,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.record("wheel", credentials).await?;
        self.wheel.write().await.push(participation.clone());
        Ok(())
    }
}

/// Hands out a numbered opaque session token per fetch
#[derive(Default)]
pub struct CountingSessionSource {
    fetches: AtomicUsize,
}

impl CountingSessionSource {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionTokenSource for CountingSessionSource {
    async fn session_token(&self) -> Result<String, RemoteError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("session-{}", n))
    }
}
