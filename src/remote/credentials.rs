use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::client::Credentials;
use super::RemoteError;

/// Issues the session token that authorizes submissions
#[async_trait]
pub trait SessionTokenSource: Send + Sync {
    async fn session_token(&self) -> Result<String, RemoteError>;
}

/// Produces a fresh one-time challenge token per submission
#[async_trait]
pub trait ChallengeSource: Send + Sync {
    async fn challenge_token(&self) -> Result<String, RemoteError>;
}

/// Fixed token, for configured deployments and tests
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl StaticToken {
    fn token(&self, kind: &str) -> Result<String, RemoteError> {
        if self.0.trim().is_empty() {
            return Err(RemoteError::Credential(format!("{} token is not configured", kind)));
        }
        Ok(self.0.clone())
    }
}

#[async_trait]
impl SessionTokenSource for StaticToken {
    async fn session_token(&self) -> Result<String, RemoteError> {
        self.token("session")
    }
}

#[async_trait]
impl ChallengeSource for StaticToken {
    async fn challenge_token(&self) -> Result<String, RemoteError> {
        self.token("challenge")
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT without checking its signature. Returns
/// None for opaque tokens.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let header = decode_header(token).ok()?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<ExpiryClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    DateTime::from_timestamp(data.claims.exp?, 0)
}

#[derive(Debug, Clone)]
struct CachedSession {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Acquires submission credentials. The session token is cached until
/// shortly before it expires; a challenge token is fetched every time.
pub struct CredentialBroker {
    sessions: Arc<dyn SessionTokenSource>,
    challenges: Arc<dyn ChallengeSource>,
    refresh_margin: Duration,
    cached: Mutex<Option<CachedSession>>,
}

impl CredentialBroker {
    pub fn new(
        sessions: Arc<dyn SessionTokenSource>,
        challenges: Arc<dyn ChallengeSource>,
    ) -> Self {
        Self {
            sessions,
            challenges,
            refresh_margin: Duration::seconds(30),
            cached: Mutex::new(None),
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Fetches both tokens concurrently
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<Credentials, RemoteError> {
        let (session_token, challenge_token) =
            futures::try_join!(self.session(), self.challenges.challenge_token())?;
        Ok(Credentials {
            session_token,
            challenge_token,
        })
    }

    /// Drops the cached session token so the next acquire fetches a new one
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn session(&self) -> Result<String, RemoteError> {
        let mut cached = self.cached.lock().await;
        if let Some(session) = cached.as_ref() {
            let fresh = session
                .expires_at
                .map(|exp| Utc::now() + self.refresh_margin < exp)
                .unwrap_or(true);
            if fresh {
                return Ok(session.token.clone());
            }
            debug!("Session token near expiry, refreshing");
        }

        let token = self.sessions.session_token().await?;
        let expires_at = token_expiry(&token);
        *cached = Some(CachedSession {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }
}
