use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
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
use crate::assets::{PlayableWeapon, ResourceLoader};
use crate::shared::ArenaError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    pub round_ticks: u32,
    pub decoys: usize,
    pub base_points: u32,
    pub points_per_tick: u32,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            round_ticks: 10,
            decoys: 3,
            base_points: 500,
            points_per_tick: 50,
        }
    }
}

/// Blur strength for the target image. Starts at 16 and falls to 2 as the
/// round runs out, so waiting reveals more but scores less.
pub fn obscurity(time_left: u32, total: u32) -> u32 {
    if total == 0 {
        return 2;
    }
    let ratio = f64::from(time_left.min(total)) / f64::from(total);
    (2.0 + 14.0 * ratio).round() as u32
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionView {
    pub state: GameState,
    pub score: u32,
    pub round: u32,
    pub total_rounds: usize,
    pub time_left: u32,
    pub obscurity: u32,
    pub image_path: Option<String>,
    pub options: Vec<String>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct Round {
    target: PlayableWeapon,
    options: Vec<String>,
    correct: usize,
    countdown: Countdown,
}

/// Weapon identification game: name the blurred weapon before time runs out
pub struct ReactionGame {
    config: ReactionConfig,
    loader: Arc<ResourceLoader>,
    rng: StdRng,
    run: RunTracker,
    pool: Arc<Vec<PlayableWeapon>>,
    asked: HashSet<String>,
    round: Option<Round>,
}

impl ReactionGame {
    pub fn new(config: ReactionConfig, loader: Arc<ResourceLoader>) -> Self {
        Self {
            config,
            loader,
            rng: StdRng::from_rng(&mut rand::rng()),
            run: RunTracker::new(GameId::G1),
            pool: Arc::new(Vec::new()),
            asked: HashSet::new(),
            round: None,
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

    /// Index of the correct option in the current round
    pub fn correct_option(&self) -> Option<usize> {
        self.round.as_ref().map(|round| round.correct)
    }

    pub fn time_left(&self) -> u32 {
        self.round
            .as_ref()
            .map(|round| round.countdown.remaining())
            .unwrap_or_default()
    }

    #[instrument(skip(self), fields(game = %GameId::G1))]
    pub fn answer(&mut self, option: usize) -> Result<(), ArenaError> {
        if !self.run.is_running() {
            return Err(ArenaError::validation("game is not running"));
        }
        let round = self
            .round
            .as_mut()
            .ok_or_else(|| ArenaError::validation("no round in progress"))?;
        if option >= round.options.len() {
            return Err(ArenaError::validation(format!(
                "option {} is out of range",
                option
            )));
        }

        round.countdown.cancel();
        let time_left = round.countdown.remaining();

        if option != round.correct {
            debug!(weapon = %round.target.name, chosen = %round.options[option], "Wrong answer");
            self.round = None;
            self.run.complete(CompletionReason::WrongAnswer);
            return Ok(());
        }

        let points = self.config.base_points + time_left * self.config.points_per_tick;
        let total = self.run.award(points);
        debug!(points, total, "Correct answer");
        self.next_round();
        Ok(())
    }

    fn next_round(&mut self) {
        let next = {
            let remaining: Vec<&PlayableWeapon> = self
                .pool
                .iter()
                .filter(|w| !self.asked.contains(&w.icon))
                .collect();
            remaining.choose(&mut self.rng).map(|w| (*w).clone())
        };

        let Some(target) = next else {
            self.round = None;
            self.run.complete(CompletionReason::Exhausted);
            return;
        };

        // Decoys come from the whole pool and may repeat across rounds
        let mut others: Vec<&PlayableWeapon> =
            self.pool.iter().filter(|w| w.icon != target.icon).collect();
        others.shuffle(&mut self.rng);

        let mut options: Vec<String> = others
            .into_iter()
            .take(self.config.decoys)
            .map(|w| w.name.clone())
            .collect();
        options.push(target.name.clone());
        options.shuffle(&mut self.rng);

        let correct = options
            .iter()
            .position(|name| *name == target.name)
            .unwrap_or_default();

        self.asked.insert(target.icon.clone());
        self.round = Some(Round {
            target,
            options,
            correct,
            countdown: Countdown::start(self.config.round_ticks),
        });
    }
}

#[async_trait]
impl Minigame for ReactionGame {
    fn id(&self) -> GameId {
        GameId::G1
    }

    async fn start(&mut self) {
        if !self.run.begin() {
            return;
        }
        self.asked.clear();
        self.round = None;

        let pool = match self.loader.playable_weapons().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(game = %GameId::G1, error = %e, "Weapon catalog unavailable");
                self.run.fail(&e);
                return;
            }
        };

        let needed = self.config.decoys + 1;
        if pool.len() < needed {
            let e = ArenaError::data(format!(
                "need at least {} playable weapons, found {}",
                needed,
                pool.len()
            ));
            warn!(game = %GameId::G1, error = %e, "Not enough weapons");
            self.run.fail(&e);
            return;
        }

        info!(weapons = pool.len(), "Reaction run started");
        self.pool = pool;
        self.next_round();
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
            debug!(weapon = %round.target.name, "Round timed out");
            self.round = None;
            self.run.complete(CompletionReason::Timeout);
        }
    }

    async fn handle_input(&mut self, input: PlayerInput) -> Result<(), ArenaError> {
        match input {
            PlayerInput::Choose { option } => self.answer(option),
            other => Err(ArenaError::validation(format!(
                "unsupported input for the weapon game: {:?}",
                other
            ))),
        }
    }

    fn view(&self) -> GameView {
        let time_left = self.time_left();
        GameView::Reaction(ReactionView {
            state: self.run.state(),
            score: self.run.score(),
            round: self.asked.len() as u32,
            total_rounds: self.pool.len(),
            time_left,
            obscurity: obscurity(time_left, self.config.round_ticks),
            image_path: self.round.as_ref().map(|r| r.target.image_path.clone()),
            options: self
                .round
                .as_ref()
                .map(|r| r.options.clone())
                .unwrap_or_default(),
            last_error: self.run.last_error().map(str::to_string),
        })
    }
}
