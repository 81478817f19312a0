use thiserror::Error;

use crate::shared::ArenaError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RemoteError {
    #[error("uid already exists: {0}")]
    AlreadyRegistered(String),

    #[error("Submission rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Credential error: {0}")]
    Credential(String),
}

impl RemoteError {
    /// Duplicate registration; the entry is already on the server
    pub fn is_already_registered(&self) -> bool {
        matches!(self, RemoteError::AlreadyRegistered(_))
    }

    /// Whether the cached credentials should be dropped before retrying
    pub fn invalidates_credentials(&self) -> bool {
        matches!(self, RemoteError::Credential(_) | RemoteError::Rejected(_))
    }
}

impl From<RemoteError> for ArenaError {
    fn from(err: RemoteError) -> Self {
        ArenaError::Network(err.to_string())
    }
}
