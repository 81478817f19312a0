use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::game::GameId;

/// One finished minigame run. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    pub uid: String,
    #[serde(alias = "ingameName", default)]
    pub display_name: String,
    #[serde(alias = "gameId")]
    pub game: GameId,
    pub score: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub global_rank: Option<u32>,
    #[serde(default, alias = "completed")]
    pub rounds_completed: Option<u32>,
}

impl PlayRecord {
    pub fn new(
        uid: impl Into<String>,
        display_name: impl Into<String>,
        game: GameId,
        score: u32,
    ) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            game,
            score,
            timestamp: Utc::now(),
            global_rank: None,
            rounds_completed: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds_completed = Some(rounds);
        self
    }
}

/// Aggregate standing of one participant, keyed by uid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub uid: String,
    #[serde(alias = "ingameName", default)]
    pub display_name: String,
    #[serde(alias = "fbLink", default)]
    pub facebook_link: String,
    #[serde(default)]
    pub lore_score: u32,
    #[serde(alias = "gaTotal", default)]
    pub arena_total: u32,
    #[serde(alias = "winBonus", default)]
    pub bonus_percent: f64,
    pub updated_at: DateTime<Utc>,
}

/// Partial update merged into a ScoreRecord; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreUpdate {
    pub uid: String,
    pub display_name: Option<String>,
    pub facebook_link: Option<String>,
    pub lore_score: Option<u32>,
    pub arena_total: Option<u32>,
    pub bonus_percent: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScoreUpdate {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn facebook_link(mut self, link: impl Into<String>) -> Self {
        self.facebook_link = Some(link.into());
        self
    }

    pub fn lore_score(mut self, score: u32) -> Self {
        self.lore_score = Some(score);
        self
    }

    pub fn arena_total(mut self, total: u32) -> Self {
        self.arena_total = Some(total);
        self
    }

    pub fn bonus_percent(mut self, bonus: f64) -> Self {
        self.bonus_percent = Some(bonus);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub(crate) fn apply(self, record: &mut ScoreRecord) {
        if let Some(name) = self.display_name {
            record.display_name = name;
        }
        if let Some(link) = self.facebook_link {
            record.facebook_link = link;
        }
        if let Some(lore) = self.lore_score {
            record.lore_score = lore;
        }
        if let Some(total) = self.arena_total {
            record.arena_total = total;
        }
        if let Some(bonus) = self.bonus_percent {
            record.bonus_percent = bonus;
        }
        if let Some(at) = self.updated_at {
            record.updated_at = at;
        }
    }

    pub(crate) fn into_record(self) -> ScoreRecord {
        let mut record = ScoreRecord {
            uid: self.uid.clone(),
            display_name: String::new(),
            facebook_link: String::new(),
            lore_score: 0,
            arena_total: 0,
            bonus_percent: 0.0,
            updated_at: Utc::now(),
        };
        self.apply(&mut record);
        record
    }
}

/// Local leaderboard blob: every participant's standing plus retained plays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardState {
    pub scores: Vec<ScoreRecord>,
    pub plays: Vec<PlayRecord>,
    #[serde(default)]
    pub wheel_participated: bool,
}

fn decode_list<T: DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

impl LeaderboardState {
    /// Decodes a stored blob. Anything unreadable becomes empty state and
    /// malformed records are dropped individually.
    pub fn from_json(raw: &str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Self::default();
        };
        Self {
            scores: decode_list(value.get("scores")),
            plays: decode_list(value.get("plays")),
            wheel_participated: value
                .get("wheelParticipated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Single-user resume point saved after intake and after the quiz
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressCheckpoint {
    pub uid: String,
    #[serde(alias = "ingameName", default)]
    pub display_name: String,
    #[serde(alias = "fbLink", default)]
    pub facebook_link: String,
    #[serde(default)]
    pub image_key: String,
    #[serde(default)]
    pub lore_score: u32,
    #[serde(default)]
    pub quiz_done: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressCheckpoint {
    /// Decodes a stored checkpoint; None when missing, corrupt or without a uid
    pub fn from_json(raw: &str) -> Option<Self> {
        let checkpoint: Self = serde_json::from_str(raw).ok()?;
        if checkpoint.uid.trim().is_empty() {
            return None;
        }
        Some(checkpoint)
    }
}

/// Where a participant landed after submitting their arena total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaStanding {
    pub rank: usize,
    pub players: usize,
    pub arena_total: u32,
    pub bonus_percent: f64,
}

/// A participant's best play in one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestScore {
    pub uid: String,
    pub display_name: String,
    pub score: u32,
    pub timestamp: DateTime<Utc>,
}

/// Everything the leaderboard screen shows, from one consistent read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    /// All participants in standing order
    pub standings: Vec<ScoreRecord>,
    /// The requesting participant's best plays
    pub top_plays: Vec<PlayRecord>,
    pub games: BTreeMap<GameId, Vec<BestScore>>,
    pub wheel_win_rate: f64,
    pub wheel_participated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_state_decodes_to_empty() {
        assert_eq!(LeaderboardState::from_json("{not json"), LeaderboardState::default());
        assert_eq!(LeaderboardState::from_json("null"), LeaderboardState::default());
        assert_eq!(
            LeaderboardState::from_json(r#"{"scores": 5, "plays": "x"}"#),
            LeaderboardState::default()
        );
    }

    #[test]
    fn malformed_records_are_dropped_individually() {
        let raw = r#"{
            "scores": [
                {"uid": "1", "ingameName": "Lumine", "gaTotal": 900, "updatedAt": "2025-01-01T00:00:00Z"},
                {"uid": "2"}
            ],
            "plays": [
                {"uid": "1", "game": "g1", "score": 1000, "timestamp": "2025-01-01T00:00:00Z"},
                {"uid": "1", "game": "g9", "score": 5, "timestamp": "2025-01-01T00:00:00Z"}
            ],
            "wheelParticipated": true
        }"#;
        let state = LeaderboardState::from_json(raw);

        assert_eq!(state.scores.len(), 1);
        assert_eq!(state.scores[0].display_name, "Lumine");
        assert_eq!(state.scores[0].arena_total, 900);
        assert_eq!(state.plays.len(), 1);
        assert!(state.wheel_participated);
    }

    #[test]
    fn checkpoint_without_uid_is_ignored() {
        assert!(ProgressCheckpoint::from_json(r#"{"uid": "  ", "quizDone": true}"#).is_none());
        assert!(ProgressCheckpoint::from_json("garbage").is_none());

        let raw = r#"{"uid": "800123456", "loreScore": 7, "quizDone": true}"#;
        let checkpoint = ProgressCheckpoint::from_json(raw).unwrap();
        assert_eq!(checkpoint.lore_score, 7);
        assert!(checkpoint.quiz_done);
    }

    #[test]
    fn update_merges_only_set_fields() {
        let mut record = ScoreUpdate::new("1")
            .display_name("Aether")
            .facebook_link("fb.com/aether")
            .lore_score(8)
            .into_record();

        ScoreUpdate::new("1").arena_total(1200).apply(&mut record);

        assert_eq!(record.display_name, "Aether");
        assert_eq!(record.facebook_link, "fb.com/aether");
        assert_eq!(record.lore_score, 8);
        assert_eq!(record.arena_total, 1200);
    }
}
