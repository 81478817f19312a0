use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::catalog::CatalogSource;
use crate::shared::ArenaError;

/// Icon id prefixes that make a usable word-fill clue
const CLUE_PREFIXES: [&str; 3] = ["Skill_S_", "Skill_E_", "UI_Talent_S_"];

pub fn weapon_image_path(icon: &str) -> String {
    format!("Weapon/{}_Awaken.png", icon)
}

pub fn clue_image_path(icon_id: &str) -> String {
    format!("Skills/{}.png", icon_id)
}

pub fn portrait_image_path(icon: &str) -> String {
    format!("Character/{}.png", icon)
}

fn is_clue_icon(icon_id: &str) -> bool {
    !icon_id.contains("_U_") && CLUE_PREFIXES.iter().any(|p| icon_id.starts_with(p))
}

/// A loaded image, addressed by its path under the asset root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableWeapon {
    pub name: String,
    pub icon: String,
    pub image_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterClue {
    pub name: String,
    pub icon_id: String,
    pub image_path: String,
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<ImageAsset, ArenaError>;
}

/// Serves images from a directory on disk
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn fetch(&self, path: &str) -> Result<ImageAsset, ArenaError> {
        let full = self.root.join(path);
        match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => Ok(ImageAsset {
                path: path.to_string(),
                size_bytes: meta.len(),
            }),
            Ok(_) => Err(ArenaError::asset(format!("{} is not a file", path))),
            Err(e) => Err(ArenaError::asset(format!("cannot load {}: {}", path, e))),
        }
    }
}

/// Asset store backed by a set of known paths
#[derive(Debug, Default)]
pub struct InMemoryAssetStore {
    available: std::sync::RwLock<HashSet<String>>,
    fetches: std::sync::atomic::AtomicUsize,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for path in paths {
            store.insert(path);
        }
        store
    }

    pub fn insert(&self, path: impl Into<String>) {
        if let Ok(mut available) = self.available.write() {
            available.insert(path.into());
        }
    }

    pub fn remove(&self, path: &str) {
        if let Ok(mut available) = self.available.write() {
            available.remove(path);
        }
    }

    /// Number of fetches that reached the store
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn fetch(&self, path: &str) -> Result<ImageAsset, ArenaError> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let found = self
            .available
            .read()
            .map(|available| available.contains(path))
            .unwrap_or(false);
        if found {
            Ok(ImageAsset {
                path: path.to_string(),
                size_bytes: 0,
            })
        } else {
            Err(ArenaError::asset(format!("cannot load {}", path)))
        }
    }
}

/// Owns catalog and image access for the minigames.
///
/// Catalogs are shaped once and memoized; image probes are memoized by path
/// so an unloadable entry is only tried once per loader.
pub struct ResourceLoader {
    catalog: Arc<dyn CatalogSource>,
    assets: Arc<dyn AssetStore>,
    weapons: RwLock<Option<Arc<Vec<PlayableWeapon>>>>,
    clues: RwLock<Option<Arc<Vec<CharacterClue>>>>,
    portraits: RwLock<Option<Arc<Vec<String>>>>,
    probes: RwLock<HashMap<String, bool>>,
}

impl ResourceLoader {
    pub fn new(catalog: Arc<dyn CatalogSource>, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            catalog,
            assets,
            weapons: RwLock::new(None),
            clues: RwLock::new(None),
            portraits: RwLock::new(None),
            probes: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> Arc<dyn CatalogSource> {
        Arc::clone(&self.catalog)
    }

    /// Weapons whose image loads, deduped by icon
    #[instrument(skip(self))]
    pub async fn playable_weapons(&self) -> Result<Arc<Vec<PlayableWeapon>>, ArenaError> {
        if let Some(cached) = self.weapons.read().await.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let entries = self.catalog.weapons().await?;
        let mut seen = HashSet::new();
        let mut playable = Vec::new();

        for entry in entries {
            let name = entry.name.trim();
            let icon = entry.icon.trim();
            if name.is_empty() || icon.is_empty() || seen.contains(icon) {
                continue;
            }
            let image_path = weapon_image_path(icon);
            if self.probe(&image_path).await {
                seen.insert(icon.to_string());
                playable.push(PlayableWeapon {
                    name: name.to_string(),
                    icon: icon.to_string(),
                    image_path,
                });
            }
        }

        info!(count = playable.len(), "Weapon catalog loaded");
        let playable = Arc::new(playable);
        *self.weapons.write().await = Some(Arc::clone(&playable));
        Ok(playable)
    }

    /// One clue per distinct skill/talent icon across the character catalog.
    /// Images are not probed here; rounds skip unloadable clues lazily.
    #[instrument(skip(self))]
    pub async fn character_clues(&self) -> Result<Arc<Vec<CharacterClue>>, ArenaError> {
        if let Some(cached) = self.clues.read().await.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let characters = self.catalog.characters().await?;
        let mut seen = HashSet::new();
        let mut clues = Vec::new();

        for character in characters {
            let name = character.name.trim();
            if name.is_empty() {
                continue;
            }
            for icon_id in character.clue_icon_ids() {
                if !is_clue_icon(&icon_id) || !seen.insert(icon_id.clone()) {
                    continue;
                }
                clues.push(CharacterClue {
                    name: name.to_string(),
                    image_path: clue_image_path(&icon_id),
                    icon_id,
                });
            }
        }

        if clues.is_empty() {
            return Err(ArenaError::data("character clue list is empty"));
        }

        info!(count = clues.len(), "Character clues loaded");
        let clues = Arc::new(clues);
        *self.clues.write().await = Some(Arc::clone(&clues));
        Ok(clues)
    }

    /// Distinct portrait ids for the tile-swap backgrounds
    #[instrument(skip(self))]
    pub async fn portrait_ids(&self) -> Result<Arc<Vec<String>>, ArenaError> {
        if let Some(cached) = self.portraits.read().await.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let characters = self.catalog.characters().await?;
        let mut ids: Vec<String> = Vec::new();
        for character in characters {
            let icon = character.icon.trim();
            if !icon.is_empty() && !ids.iter().any(|id| id == icon) {
                ids.push(icon.to_string());
            }
        }

        if ids.is_empty() {
            return Err(ArenaError::data("character portrait list is empty"));
        }

        let ids = Arc::new(ids);
        *self.portraits.write().await = Some(Arc::clone(&ids));
        Ok(ids)
    }

    /// Whether the image at `path` loads. Memoized per path.
    pub async fn probe(&self, path: &str) -> bool {
        if let Some(known) = self.probes.read().await.get(path) {
            return *known;
        }
        self.fetch(path).await.is_ok()
    }

    /// Loads an image, recording the outcome for later probes
    pub async fn fetch(&self, path: &str) -> Result<ImageAsset, ArenaError> {
        let result = self.assets.fetch(path).await;
        if let Err(e) = &result {
            debug!(path, error = %e, "Image failed to load");
        }
        self.probes
            .write()
            .await
            .insert(path.to_string(), result.is_ok());
        result
    }
}
