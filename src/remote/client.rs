use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use super::RemoteError;
use crate::game::GameId;

/// Short-lived proof attached to every submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub session_token: String,
    pub challenge_token: String,
}

// Field names follow the submission server's wire format.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySubmission {
    pub uid: String,
    #[serde(rename = "ingameName")]
    pub display_name: String,
    #[serde(rename = "fbLink")]
    pub facebook_link: String,
    pub image_key: String,
    pub lore_score: u32,
    #[serde(rename = "gaTotal")]
    pub arena_total: u32,
    #[serde(rename = "winBonus")]
    pub bonus_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySubmission {
    pub uid: String,
    #[serde(rename = "ingameName")]
    pub display_name: String,
    pub game: GameId,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelParticipation {
    pub uid: String,
    #[serde(rename = "ingameName")]
    pub display_name: String,
}

/// Remote mirror of the local scores. Treated as an opaque sink.
#[async_trait]
pub trait RemoteSubmitter: Send + Sync {
    async fn create_entry(
        &self,
        entry: &EntrySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError>;

    async fn submit_play(
        &self,
        play: &PlaySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError>;

    async fn submit_wheel_participation(
        &self,
        participation: &WheelParticipation,
        credentials: &Credentials,
    ) -> Result<(), RemoteError>;
}

/// Records submissions in memory and refuses duplicate uids
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    entries: RwLock<HashMap<String, EntrySubmission>>,
    plays: RwLock<Vec<PlaySubmission>>,
    wheel: RwLock<Vec<WheelParticipation>>,
    failure: RwLock<Option<RemoteError>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `error`
    pub async fn fail_with(&self, error: RemoteError) {
        *self.failure.write().await = Some(error);
    }

    pub async fn entries(&self) -> Vec<EntrySubmission> {
        self.entries.read().await.values().cloned().collect()
    }

    pub async fn plays(&self) -> Vec<PlaySubmission> {
        self.plays.read().await.clone()
    }

    pub async fn wheel_participants(&self) -> Vec<WheelParticipation> {
        self.wheel.read().await.clone()
    }

    async fn check(&self, credentials: &Credentials) -> Result<(), RemoteError> {
        if let Some(error) = self.failure.read().await.clone() {
            return Err(error);
        }
        if credentials.session_token.is_empty() || credentials.challenge_token.is_empty() {
            return Err(RemoteError::Rejected("missing credentials".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSubmitter for InMemoryRemote {
    async fn create_entry(
        &self,
        entry: &EntrySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.check(credentials).await?;
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.uid) {
            return Err(RemoteError::AlreadyRegistered(entry.uid.clone()));
        }
        entries.insert(entry.uid.clone(), entry.clone());
        Ok(())
    }

    async fn submit_play(
        &self,
        play: &PlaySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.check(credentials).await?;
        self.plays.write().await.push(play.clone());
        Ok(())
    }

    async fn submit_wheel_participation(
        &self,
        participation: &WheelParticipation,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.check(credentials).await?;
        self.wheel.write().await.push(participation.clone());
        Ok(())
    }
}

/// Sink that only traces what would have been sent
#[derive(Debug, Default, Clone)]
pub struct LoggingRemote;

#[async_trait]
impl RemoteSubmitter for LoggingRemote {
    async fn create_entry(
        &self,
        entry: &EntrySubmission,
        _credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        info!(uid = %entry.uid, arena_total = entry.arena_total, "Remote entry");
        Ok(())
    }

    async fn submit_play(
        &self,
        play: &PlaySubmission,
        _credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        info!(uid = %play.uid, game = %play.game, score = play.score, "Remote play");
        Ok(())
    }

    async fn submit_wheel_participation(
        &self,
        participation: &WheelParticipation,
        _credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        info!(uid = %participation.uid, "Remote wheel participation");
        Ok(())
    }
}
