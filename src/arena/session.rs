use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

use crate::game::{GameId, GameView};
use crate::remote::EntrySubmission;
use crate::scoring::{ProgressCheckpoint, ScoreUpdate};
use crate::shared::ArenaError;

const UID_DIGITS: std::ops::RangeInclusive<usize> = 8..=10;
const FACEBOOK_HOSTS: [&str; 2] = ["facebook.com", "fb.com"];

/// Registration form submitted at intake
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRequest {
    pub uid: String,
    #[serde(alias = "ingameName")]
    pub display_name: String,
    #[serde(alias = "fbLink", default)]
    pub facebook_link: String,
    #[serde(default)]
    pub image_key: String,
}

/// Strips whitespace and accepts 8 to 10 digits
pub fn normalize_uid(input: &str) -> Option<String> {
    let uid: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let valid = UID_DIGITS.contains(&uid.len()) && uid.chars().all(|c| c.is_ascii_digit());
    valid.then_some(uid)
}

/// Accepts http(s) links on a Facebook host. Blank input means no link.
pub fn normalize_facebook_link(input: &str) -> Result<String, ArenaError> {
    let link = input.trim();
    if link.is_empty() {
        return Ok(String::new());
    }

    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .ok_or_else(|| ArenaError::validation("facebook link must be an http(s) URL"))?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority
        .rsplit('@')
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    let on_facebook = FACEBOOK_HOSTS
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)));
    if !on_facebook {
        return Err(ArenaError::validation(format!(
            "facebook link must point to facebook.com, got {}",
            host
        )));
    }
    Ok(link.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub uid: String,
    pub display_name: String,
    pub facebook_link: String,
    pub image_key: String,
    pub lore_score: u32,
}

impl Participant {
    /// Validates an intake form
    pub fn from_intake(intake: IntakeRequest) -> Result<Self, ArenaError> {
        let uid = normalize_uid(&intake.uid)
            .ok_or_else(|| ArenaError::validation("uid must be 8 to 10 digits"))?;
        let display_name = intake.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(ArenaError::validation("display name is required"));
        }
        let facebook_link = normalize_facebook_link(&intake.facebook_link)?;

        Ok(Self {
            uid,
            display_name,
            facebook_link,
            image_key: intake.image_key.trim().to_string(),
            lore_score: 0,
        })
    }

    pub fn checkpoint(&self, quiz_done: bool) -> ProgressCheckpoint {
        ProgressCheckpoint {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            facebook_link: self.facebook_link.clone(),
            image_key: self.image_key.clone(),
            lore_score: self.lore_score,
            quiz_done,
            updated_at: None,
        }
    }

    /// Profile fields carried into every score upsert
    pub fn profile(&self) -> ScoreUpdate {
        ScoreUpdate::new(self.uid.as_str())
            .display_name(self.display_name.as_str())
            .facebook_link(self.facebook_link.as_str())
            .lore_score(self.lore_score)
    }

    pub fn entry(&self, arena_total: u32, bonus_percent: f64) -> EntrySubmission {
        EntrySubmission {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            facebook_link: self.facebook_link.clone(),
            image_key: self.image_key.clone(),
            lore_score: self.lore_score,
            arena_total,
            bonus_percent,
        }
    }
}

impl From<ProgressCheckpoint> for Participant {
    fn from(checkpoint: ProgressCheckpoint) -> Self {
        Self {
            uid: checkpoint.uid,
            display_name: checkpoint.display_name,
            facebook_link: checkpoint.facebook_link,
            image_key: checkpoint.image_key,
            lore_score: checkpoint.lore_score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intake,
    Quiz,
    Arena,
}

/// Last known score of each minigame in the current session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArenaScores(BTreeMap<GameId, u32>);

impl ArenaScores {
    pub fn new() -> Self {
        Self(GameId::iter().map(|game| (game, 0)).collect())
    }

    pub fn set(&mut self, game: GameId, score: u32) {
        self.0.insert(game, score);
    }

    pub fn get(&self, game: GameId) -> u32 {
        self.0.get(&game).copied().unwrap_or_default()
    }

    pub fn total(&self) -> u32 {
        self.0.values().fold(0u32, |sum, score| sum.saturating_add(*score))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub participant: Option<Participant>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaView {
    pub scores: ArenaScores,
    pub total: u32,
    pub active: Option<GameView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelSpin {
    pub win_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("12345678", Some("12345678"))]
    #[case(" 812 345 6789 ", Some("8123456789"))]
    #[case("1234567", None)]
    #[case("12345678901", None)]
    #[case("12a45678", None)]
    #[case("", None)]
    fn uid_normalization(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_uid(input).as_deref(), expected);
    }

    #[rstest]
    #[case("https://www.facebook.com/someone", true)]
    #[case("http://fb.com/someone", true)]
    #[case("https://m.facebook.com:443/profile.php?id=1", true)]
    #[case("https://notfacebook.com/someone", false)]
    #[case("ftp://facebook.com/someone", false)]
    #[case("facebook.com/someone", false)]
    fn facebook_link_validation(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(normalize_facebook_link(input).is_ok(), ok);
    }

    #[test]
    fn intake_requires_name() {
        let intake = IntakeRequest {
            uid: "12345678".to_string(),
            display_name: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Participant::from_intake(intake),
            Err(ArenaError::Validation(_))
        ));
    }

    #[test]
    fn intake_accepts_legacy_field_names() {
        let intake: IntakeRequest =
            serde_json::from_str(r#"{"uid":"12345678","ingameName":"Lyney","fbLink":""}"#)
                .unwrap();
        let participant = Participant::from_intake(intake).unwrap();
        assert_eq!(participant.display_name, "Lyney");
        assert_eq!(participant.lore_score, 0);
    }

    #[test]
    fn scores_total_all_games() {
        let mut scores = ArenaScores::new();
        scores.set(GameId::G1, 1500);
        scores.set(GameId::G3, 410);
        assert_eq!(scores.get(GameId::G2), 0);
        assert_eq!(scores.total(), 1910);

        scores.set(GameId::G1, 0);
        assert_eq!(scores.total(), 410);
    }
}
