use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

use crate::quiz::RawQuestion;
use crate::shared::ArenaError;

pub const WEAPONS_FILE: &str = "weapons.json";
pub const CHARACTERS_FILE: &str = "characters.json";
pub const QUESTIONS_FILE: &str = "questions.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponEntry {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillIcons {
    #[serde(default)]
    pub normal: Option<String>,
    #[serde(default)]
    pub elemental: Option<String>,
    #[serde(default)]
    pub burst: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEntry {
    pub name: String,
    /// Portrait id, used as the tile-swap background
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub skill: SkillIcons,
    #[serde(default)]
    pub talent: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

impl CharacterEntry {
    /// Icon ids usable as a word-fill clue, in catalog order and deduped.
    /// Normal attacks look alike across characters and are left out.
    pub fn clue_icon_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        let candidates = self
            .skill
            .elemental
            .iter()
            .chain(self.skill.burst.iter())
            .chain(self.talent.iter())
            .chain(self.cons.iter());

        for id in candidates {
            let id = id.trim();
            if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// Source of the externally supplied catalogs
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn weapons(&self) -> Result<Vec<WeaponEntry>, ArenaError>;
    async fn characters(&self) -> Result<Vec<CharacterEntry>, ArenaError>;
    async fn questions(&self) -> Result<Vec<RawQuestion>, ArenaError>;
}

/// Reads the catalogs from JSON array files inside a data directory
pub struct JsonCatalogSource {
    data_dir: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[instrument(skip(self))]
    async fn read_array<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, ArenaError> {
        let path = self.data_dir.join(file);
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to read catalog");
            ArenaError::data(format!("cannot read catalog {}: {}", file, e))
        })?;
        parse_catalog(&raw, file)
    }
}

/// Parses a JSON array, dropping elements that do not fit the entry shape
pub fn parse_catalog<T: DeserializeOwned>(raw: &str, name: &str) -> Result<Vec<T>, ArenaError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ArenaError::data(format!("catalog {} is not valid JSON: {}", name, e)))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Err(ArenaError::data(format!("catalog {} is not an array", name))),
    };

    let total = items.len();
    let parsed: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if parsed.len() < total {
        debug!(
            catalog = name,
            dropped = total - parsed.len(),
            "Dropped malformed catalog entries"
        );
    }
    Ok(parsed)
}

#[async_trait]
impl CatalogSource for JsonCatalogSource {
    async fn weapons(&self) -> Result<Vec<WeaponEntry>, ArenaError> {
        self.read_array(WEAPONS_FILE).await
    }

    async fn characters(&self) -> Result<Vec<CharacterEntry>, ArenaError> {
        self.read_array(CHARACTERS_FILE).await
    }

    async fn questions(&self) -> Result<Vec<RawQuestion>, ArenaError> {
        self.read_array(QUESTIONS_FILE).await
    }
}

/// Fixed catalogs held in memory, for tests and embedded data sets
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    pub weapons: Vec<WeaponEntry>,
    pub characters: Vec<CharacterEntry>,
    pub questions: Vec<RawQuestion>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weapons(mut self, weapons: Vec<WeaponEntry>) -> Self {
        self.weapons = weapons;
        self
    }

    pub fn with_characters(mut self, characters: Vec<CharacterEntry>) -> Self {
        self.characters = characters;
        self
    }

    pub fn with_questions(mut self, questions: Vec<RawQuestion>) -> Self {
        self.questions = questions;
        self
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn weapons(&self) -> Result<Vec<WeaponEntry>, ArenaError> {
        Ok(self.weapons.clone())
    }

    async fn characters(&self) -> Result<Vec<CharacterEntry>, ArenaError> {
        Ok(self.characters.clone())
    }

    async fn questions(&self) -> Result<Vec<RawQuestion>, ArenaError> {
        Ok(self.questions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clue_ids_skip_normal_attack_and_dedupe() {
        let character = CharacterEntry {
            name: "Lan Yan".to_string(),
            icon: "UI_AvatarIcon_LanYan".to_string(),
            skill: SkillIcons {
                normal: Some("Skill_A_Catalyst".to_string()),
                elemental: Some("Skill_S_LanYan_01".to_string()),
                burst: Some(" Skill_E_LanYan_01 ".to_string()),
            },
            talent: vec!["UI_Talent_S_LanYan_01".to_string()],
            cons: vec!["Skill_S_LanYan_01".to_string(), "".to_string()],
        };

        assert_eq!(
            character.clue_icon_ids(),
            vec![
                "Skill_S_LanYan_01".to_string(),
                "Skill_E_LanYan_01".to_string(),
                "UI_Talent_S_LanYan_01".to_string(),
            ]
        );
    }

    #[test]
    fn parse_catalog_drops_malformed_entries() {
        let raw = r#"[{"name":"Wolf","icon":"UI_Claymore_Wolfmound"},{"name":3},"junk"]"#;
        let weapons: Vec<WeaponEntry> = parse_catalog(raw, "weapons").unwrap();
        assert_eq!(weapons.len(), 1);
        assert_eq!(weapons[0].icon, "UI_Claymore_Wolfmound");
    }

    #[test]
    fn parse_catalog_rejects_non_array() {
        let result: Result<Vec<WeaponEntry>, _> = parse_catalog(r#"{"name":"x"}"#, "weapons");
        assert!(matches!(result, Err(ArenaError::Data(_))));

        let result: Result<Vec<WeaponEntry>, _> = parse_catalog("not json", "weapons");
        assert!(matches!(result, Err(ArenaError::Data(_))));
    }

    #[tokio::test]
    async fn json_source_reports_missing_file_as_data_error() {
        let source = JsonCatalogSource::new(std::env::temp_dir().join("arena-missing-catalog"));
        let result = source.weapons().await;
        assert!(matches!(result, Err(ArenaError::Data(_))));
    }
}
