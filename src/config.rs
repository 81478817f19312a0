use std::path::PathBuf;
use std::time::Duration;

use crate::game::{ReactionConfig, TileSwapConfig, WordFillConfig};
use crate::quiz::QuizConfig;

/// Top-level configuration for the arena host
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    /// Address the HTTP surface binds to
    pub bind_addr: String,
    /// Directory holding the catalogs and the persisted blobs
    pub data_dir: PathBuf,
    /// Root directory for game images
    pub asset_dir: PathBuf,
    /// Wall-clock length of one game tick
    pub tick_interval: Duration,
    /// Pre-shared submission credentials; empty when unset
    pub session_token: String,
    pub challenge_token: String,
    /// Submission server base URL; submissions are only logged when unset
    pub api_base: Option<String>,
    pub api_timeout: Duration,
    pub reaction: ReactionConfig,
    pub tile_swap: TileSwapConfig,
    pub word_fill: WordFillConfig,
    pub quiz: QuizConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            data_dir: PathBuf::from("data"),
            asset_dir: PathBuf::from("assets"),
            tick_interval: Duration::from_secs(1),
            session_token: String::new(),
            challenge_token: String::new(),
            api_base: None,
            api_timeout: Duration::from_secs(10),
            reaction: ReactionConfig::default(),
            tile_swap: TileSwapConfig::default(),
            word_fill: WordFillConfig::default(),
            quiz: QuizConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Builds the configuration from `ARENA_*` environment variables,
    /// falling back to defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tick_interval = std::env::var("ARENA_TICK_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);
        let api_timeout = std::env::var("ARENA_API_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.api_timeout);

        Self {
            bind_addr: std::env::var("ARENA_BIND_ADDR").unwrap_or(defaults.bind_addr),
            data_dir: std::env::var("ARENA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            asset_dir: std::env::var("ARENA_ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_dir),
            tick_interval,
            session_token: std::env::var("ARENA_SESSION_TOKEN").unwrap_or_default(),
            challenge_token: std::env::var("ARENA_CHALLENGE_TOKEN").unwrap_or_default(),
            api_base: std::env::var("ARENA_API_BASE")
                .ok()
                .and_then(|base| normalize_api_base(&base)),
            api_timeout,
            ..defaults
        }
    }

    /// Directory for the persisted leaderboard and progress blobs
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }
}

/// Trims the base URL; blank means no submission server
fn normalize_api_base(raw: &str) -> Option<String> {
    let base = raw.trim().trim_end_matches('/');
    (!base.is_empty()).then(|| base.to_string())
}
