use thiserror::Error;

use crate::shared::ArenaError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ScoringError> for ArenaError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::Validation(msg) => ArenaError::Validation(msg),
            other => ArenaError::Storage(other.to_string()),
        }
    }
}
