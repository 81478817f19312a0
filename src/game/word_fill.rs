use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::countdown::{Countdown, Tick};
use super::lifecycle::{
    CompletionReason, GameEventSender, GameId, GameState, GameView, Minigame, PlayerInput,
    RunTracker,
};
use super::matching::{answer_targets, matches};
use crate::assets::{CharacterClue, ResourceLoader};
use crate::shared::ArenaError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFillConfig {
    pub round_ticks: u32,
    pub base_points: u32,
    pub points_per_tick: u32,
}

impl Default for WordFillConfig {
    fn default() -> Self {
        Self {
            round_ticks: 15,
            base_points: 320,
            points_per_tick: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordFillView {
    pub state: GameState,
    pub score: u32,
    pub round: u32,
    pub total_clues: usize,
    pub time_left: u32,
    pub clue_image: Option<String>,
    pub input: String,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct Round {
    clue: CharacterClue,
    targets: Vec<String>,
    countdown: Countdown,
}

/// Name the character from one of their skill icons, typed live
pub struct WordFillGame {
    config: WordFillConfig,
    loader: Arc<ResourceLoader>,
    rng: StdRng,
    run: RunTracker,
    clues: Arc<Vec<CharacterClue>>,
    asked: HashSet<String>,
    round: Option<Round>,
    input: String,
}

impl WordFillGame {
    pub fn new(config: WordFillConfig, loader: Arc<ResourceLoader>) -> Self {
        Self {
            config,
            loader,
            rng: StdRng::from_rng(&mut rand::rng()),
            run: RunTracker::new(GameId::G3),
            clues: Arc::new(Vec::new()),
            asked: HashSet::new(),
            round: None,
            input: String::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_events(mut self, events: GameEventSender) -> Self {
        self.run.set_events(events);
        self
    }

    /// Character name behind the current clue
    pub fn current_answer(&self) -> Option<&str> {
        self.round.as_ref().map(|round| round.clue.name.as_str())
    }

    pub fn time_left(&self) -> u32 {
        self.round
            .as_ref()
            .map(|round| round.countdown.remaining())
            .unwrap_or_default()
    }

    /// Evaluates the current contents of the input box
    #[instrument(skip(self), fields(game = %GameId::G3))]
    pub async fn type_input(&mut self, text: &str) -> Result<(), ArenaError> {
        if !self.run.is_running() {
            return Err(ArenaError::validation("game is not running"));
        }
        let round = self
            .round
            .as_mut()
            .ok_or_else(|| ArenaError::validation("no round in progress"))?;
        self.input = text.to_string();

        if !matches(text, &round.targets) {
            return Ok(());
        }

        round.countdown.cancel();
        let points =
            self.config.base_points + round.countdown.remaining() * self.config.points_per_tick;
        debug!(character = %round.clue.name, points, "Clue solved");
        self.input.clear();
        self.run.award(points);
        self.next_round().await;
        Ok(())
    }

    /// Draws the next unasked clue whose image loads. Unloadable clues are
    /// used up and skipped. When clues remained but none of them loaded the
    /// run fails with an asset error.
    async fn next_round(&mut self) {
        self.round = None;
        let mut unloadable = 0usize;
        loop {
            let next = {
                let remaining: Vec<&CharacterClue> = self
                    .clues
                    .iter()
                    .filter(|c| !self.asked.contains(&c.icon_id))
                    .collect();
                remaining.choose(&mut self.rng).map(|c| (*c).clone())
            };
            let Some(clue) = next else {
                if unloadable > 0 {
                    let error = ArenaError::asset(format!(
                        "no loadable clue image among {} remaining",
                        unloadable
                    ));
                    warn!(game = %GameId::G3, %error, "Word fill run cannot continue");
                    self.run.fail(&error);
                } else {
                    self.run.complete(CompletionReason::Exhausted);
                }
                return;
            };
            self.asked.insert(clue.icon_id.clone());

            if !self.loader.probe(&clue.image_path).await {
                debug!(icon = %clue.icon_id, "Skipping clue without image");
                unloadable += 1;
                continue;
            }

            self.round = Some(Round {
                targets: answer_targets(&clue.name),
                clue,
                countdown: Countdown::start(self.config.round_ticks),
            });
            return;
        }
    }
}

#[async_trait]
impl Minigame for WordFillGame {
    fn id(&self) -> GameId {
        GameId::G3
    }

    async fn start(&mut self) {
        if !self.run.begin() {
            return;
        }
        self.asked.clear();
        self.round = None;
        self.input.clear();

        let clues = match self.loader.character_clues().await {
            Ok(clues) => clues,
            Err(e) => {
                warn!(game = %GameId::G3, error = %e, "Character catalog unavailable");
                self.run.fail(&e);
                return;
            }
        };

        info!(clues = clues.len(), "Word fill run started");
        self.clues = clues;
        self.next_round().await;
    }

    fn give_up(&mut self) {
        if let Some(round) = self.round.as_mut() {
            round.countdown.cancel();
        }
        self.round = None;
        self.run.complete(CompletionReason::Forfeited);
    }

    fn is_running(&self) -> bool {
        self.run.is_running()
    }

    fn state(&self) -> GameState {
        self.run.state()
    }

    fn score(&self) -> u32 {
        self.run.score()
    }

    async fn tick(&mut self) {
        if !self.run.is_running() {
            return;
        }
        let Some(round) = self.round.as_mut() else {
            return;
        };
        if let Tick::Expired = round.countdown.tick() {
            debug!(character = %round.clue.name, "Clue timed out");
            self.round = None;
            self.run.complete(CompletionReason::Timeout);
        }
    }

    async fn handle_input(&mut self, input: PlayerInput) -> Result<(), ArenaError> {
        match input {
            PlayerInput::Type { text } => self.type_input(&text).await,
            other => Err(ArenaError::validation(format!(
                "unsupported input for the word fill game: {:?}",
                other
            ))),
        }
    }

    fn view(&self) -> GameView {
        GameView::WordFill(WordFillView {
            state: self.run.state(),
            score: self.run.score(),
            round: self.asked.len() as u32,
            total_clues: self.clues.len(),
            time_left: self.time_left(),
            clue_image: self.round.as_ref().map(|r| r.clue.image_path.clone()),
            input: self.input.clone(),
            last_error: self.run.last_error().map(str::to_string),
        })
    }
}
