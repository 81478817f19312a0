use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use super::client::{
    Credentials, EntrySubmission, PlaySubmission, RemoteSubmitter, WheelParticipation,
};
use super::RemoteError;

const SESSION_HEADER: &str = "x-session-token";
const CHALLENGE_HEADER: &str = "x-turnstile-token";
const DUPLICATE_UID: &str = "uid already exists";

/// Submission server reached over HTTP. Every call is a JSON POST under
/// `base` carrying both tokens as headers.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base: String,
}

impl HttpRemote {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let base = base.into().trim_end_matches('/').to_string();
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        uid: &str,
        body: &T,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        let url = format!("{}{}", self.base, path);
        let response = self
            .client
            .post(&url)
            .header(SESSION_HEADER, credentials.session_token.as_str())
            .header(CHALLENGE_HEADER, credentials.challenge_token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(%url, status = status.as_u16(), "Submission accepted");
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(classify(status, &text, uid))
    }
}

/// Server message from a JSON `error` or `message` field, else the raw body
fn error_message(status: StatusCode, text: &str) -> String {
    let from_json = serde_json::from_str::<Value>(text).ok().and_then(|value| {
        ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
    });
    match from_json {
        Some(message) => message,
        None if !text.trim().is_empty() => text.trim().to_string(),
        None => status.to_string(),
    }
}

fn classify(status: StatusCode, text: &str, uid: &str) -> RemoteError {
    let message = error_message(status, text);
    if message.to_lowercase().contains(DUPLICATE_UID) {
        RemoteError::AlreadyRegistered(uid.to_string())
    } else if status.is_client_error() {
        RemoteError::Rejected(message)
    } else {
        RemoteError::Transport(format!("{}: {}", status.as_u16(), message))
    }
}

#[async_trait]
impl RemoteSubmitter for HttpRemote {
    #[instrument(skip(self, entry, credentials), fields(uid = %entry.uid))]
    async fn create_entry(
        &self,
        entry: &EntrySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.post("/entries", &entry.uid, entry, credentials).await
    }

    #[instrument(skip(self, play, credentials), fields(uid = %play.uid, game = %play.game))]
    async fn submit_play(
        &self,
        play: &PlaySubmission,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.post("/plays", &play.uid, play, credentials).await
    }

    #[instrument(skip(self, participation, credentials), fields(uid = %participation.uid))]
    async fn submit_wheel_participation(
        &self,
        participation: &WheelParticipation,
        credentials: &Credentials,
    ) -> Result<(), RemoteError> {
        self.post("/wheel/participate", &participation.uid, participation, credentials)
            .await
    }
}
