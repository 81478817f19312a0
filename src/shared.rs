use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::arena::ArenaController;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ArenaController>,
}

impl AppState {
    pub fn new(controller: Arc<ArenaController>) -> Self {
        Self { controller }
    }
}

/// Error taxonomy shared by every flow in the arena.
///
/// Only `Validation` is meant to be shown back to the participant verbatim;
/// the other variants terminate the flow that raised them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArenaError {
    /// Catalog missing, malformed or too small to start a flow
    #[error("Data error: {0}")]
    Data(String),

    /// A single image failed to load
    #[error("Asset error: {0}")]
    Asset(String),

    /// Remote submission or registration failed
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed participant input; the flow is not advanced
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ArenaError {
    pub fn data(msg: impl Into<String>) -> Self {
        ArenaError::Data(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        ArenaError::Asset(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ArenaError::Validation(msg.into())
    }
}

impl IntoResponse for ArenaError {
    fn into_response(self) -> Response {
        let status = match &self {
            ArenaError::Validation(_) => StatusCode::BAD_REQUEST,
            ArenaError::NotFound(_) => StatusCode::NOT_FOUND,
            ArenaError::Data(_) | ArenaError::Asset(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ArenaError::Network(_) => StatusCode::BAD_GATEWAY,
            ArenaError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::arena::ArenaController;
    use crate::assets::{
        weapon_image_path, CharacterEntry, InMemoryAssetStore, InMemoryCatalog, ResourceLoader,
        SkillIcons, WeaponEntry,
    };
    use crate::config::ArenaConfig;
    use crate::quiz::RawQuestion;
    use crate::remote::{CredentialBroker, InMemoryRemote, StaticToken, SubmissionDispatcher};
    use crate::scoring::{InMemoryBlobStore, ScoringService};
    use serde_json::json;

    pub fn weapons() -> Vec<WeaponEntry> {
        ["Wolf's Gravestone", "Skyward Pride", "Aqua Simulacra", "Mistsplitter Reforged"]
            .iter()
            .enumerate()
            .map(|(i, name)| WeaponEntry {
                name: name.to_string(),
                icon: format!("UI_EquipIcon_{}", i),
            })
            .collect()
    }

    pub fn characters() -> Vec<CharacterEntry> {
        ["Nilou", "Kamisato Ayaka"]
            .iter()
            .map(|name| {
                let key = name.replace(' ', "");
                CharacterEntry {
                    name: name.to_string(),
                    icon: format!("UI_AvatarIcon_{}", key),
                    skill: SkillIcons {
                        normal: None,
                        elemental: Some(format!("Skill_S_{}_01", key)),
                        burst: None,
                    },
                    talent: Vec::new(),
                    cons: Vec::new(),
                }
            })
            .collect()
    }

    /// Ten single-point questions whose first choice is right
    pub fn questions() -> Vec<RawQuestion> {
        (1..=10)
            .map(|i| RawQuestion {
                id: Some(json!(i)),
                question: Some(format!("Question {}", i)),
                choices: Some(vec!["right".to_string(), "wrong".to_string()]),
                correct_index: Some(0),
                difficulty: Some(json!(1)),
                points: Some(json!(1)),
                tags: None,
            })
            .collect()
    }

    /// Builder for an AppState wired to in-memory collaborators
    pub struct AppStateBuilder {
        catalog: InMemoryCatalog,
        assets: Option<InMemoryAssetStore>,
        remote: Arc<InMemoryRemote>,
        config: ArenaConfig,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                catalog: InMemoryCatalog::new()
                    .with_weapons(weapons())
                    .with_characters(characters())
                    .with_questions(questions()),
                assets: None,
                remote: Arc::new(InMemoryRemote::new()),
                config: ArenaConfig::default(),
            }
        }

        pub fn with_catalog(mut self, catalog: InMemoryCatalog) -> Self {
            self.catalog = catalog;
            self
        }

        pub fn with_assets(mut self, assets: InMemoryAssetStore) -> Self {
            self.assets = Some(assets);
            self
        }

        pub fn with_remote(mut self, remote: Arc<InMemoryRemote>) -> Self {
            self.remote = remote;
            self
        }

        pub fn build(self) -> AppState {
            let assets = self.assets.unwrap_or_else(|| {
                InMemoryAssetStore::with_paths(
                    weapons().iter().map(|w| weapon_image_path(&w.icon)),
                )
            });
            let loader = ResourceLoader::new(Arc::new(self.catalog), Arc::new(assets));
            let broker = CredentialBroker::new(
                Arc::new(StaticToken("session".to_string())),
                Arc::new(StaticToken("challenge".to_string())),
            );
            let controller = ArenaController::new(
                self.config,
                Arc::new(loader),
                Arc::new(ScoringService::new(Arc::new(InMemoryBlobStore::new()))),
                SubmissionDispatcher::new(self.remote, Arc::new(broker)),
            )
            .with_seed(7);
            AppState::new(Arc::new(controller))
        }
    }
}
