// Shared lifecycle every minigame follows.
//
// Idle -> Running -> Completed | Failed, and start() from either terminal
// state begins a fresh run. A run reports through a single-producer event
// channel; the arena controller drains it after every command it forwards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use strum_macros::{Display, EnumIter, EnumString};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::reaction::ReactionView;
use super::tile_swap::TileSwapView;
use super::word_fill::WordFillView;
use crate::shared::ArenaError;

/// Identifies one of the three arena minigames
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameId {
    /// Weapon reaction/guess game
    G1,
    /// Tile-swap puzzle
    G2,
    /// Character word-fill game
    G3,
}

impl GameId {
    pub fn title(&self) -> &'static str {
        match self {
            GameId::G1 => "Game 1: Weapon",
            GameId::G2 => "Game 2: Tile Swap",
            GameId::G3 => "Game 3: Word Fill",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Idle,
    Running,
    Completed,
    /// Terminated by an error; distinct from a normal completion
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Every catalog item was played
    Exhausted,
    Timeout,
    WrongAnswer,
    Forfeited,
}

/// Final result of a run, handed to the scoring store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOutcome {
    pub run_id: Uuid,
    pub game: GameId,
    pub score: u32,
    pub reason: CompletionReason,
    pub duration_ms: u64,
    pub rounds_completed: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started { run_id: Uuid },
    /// The running total changed
    ScoreChanged { score: u32 },
    /// Fired exactly once per run that reaches Completed
    Completed(GameOutcome),
    Failed { message: String },
}

pub type GameEventSender = mpsc::UnboundedSender<GameEvent>;
pub type GameEventReceiver = mpsc::UnboundedReceiver<GameEvent>;

pub fn event_channel() -> (GameEventSender, GameEventReceiver) {
    mpsc::unbounded_channel()
}

/// Participant actions routed to the active minigame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerInput {
    /// Pick one of the displayed options (reaction game)
    Choose { option: usize },
    /// Select a grid cell (tile-swap puzzle)
    Select { cell: usize },
    /// Current contents of the free-text box (word-fill game)
    Type { text: String },
}

/// Read-only view of a game for the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameView {
    Reaction(ReactionView),
    TileSwap(TileSwapView),
    WordFill(WordFillView),
}

#[async_trait]
pub trait Minigame: Send + Sync {
    fn id(&self) -> GameId;

    /// Begins a run. Ignored while a run is already in progress.
    async fn start(&mut self);

    /// Forfeits the current run, keeping the accumulated score
    fn give_up(&mut self);

    fn is_running(&self) -> bool;

    fn state(&self) -> GameState;

    fn score(&self) -> u32;

    /// Advances timers by one time unit
    async fn tick(&mut self);

    async fn handle_input(&mut self, input: PlayerInput) -> Result<(), ArenaError>;

    /// Whether forfeiting needs an explicit confirmation from the participant
    fn requires_forfeit_confirmation(&self) -> bool {
        false
    }

    fn view(&self) -> GameView;
}

/// Per-run bookkeeping shared by the minigames: state, running total,
/// run timing and the exactly-once completion guarantee.
#[derive(Debug)]
pub struct RunTracker {
    game: GameId,
    state: GameState,
    score: u32,
    rounds_completed: u32,
    run_id: Option<Uuid>,
    started_at: Option<Instant>,
    last_error: Option<String>,
    events: Option<GameEventSender>,
}

impl RunTracker {
    pub fn new(game: GameId) -> Self {
        Self {
            game,
            state: GameState::Idle,
            score: 0,
            rounds_completed: 0,
            run_id: None,
            started_at: None,
            last_error: None,
            events: None,
        }
    }

    pub fn set_events(&mut self, events: GameEventSender) {
        self.events = Some(events);
    }

    /// Starts a new run. Returns false when a run is already in progress.
    pub fn begin(&mut self) -> bool {
        if self.state == GameState::Running {
            debug!(game = %self.game, "Ignoring start while running");
            return false;
        }

        let run_id = Uuid::new_v4();
        self.state = GameState::Running;
        self.score = 0;
        self.rounds_completed = 0;
        self.run_id = Some(run_id);
        self.started_at = Some(Instant::now());
        self.last_error = None;

        self.emit(GameEvent::Started { run_id });
        self.emit(GameEvent::ScoreChanged { score: 0 });
        true
    }

    /// Adds a cleared round's points to the running total
    pub fn award(&mut self, points: u32) -> u32 {
        if self.state != GameState::Running {
            return self.score;
        }
        self.score = self.score.saturating_add(points);
        self.rounds_completed += 1;
        self.emit(GameEvent::ScoreChanged { score: self.score });
        self.score
    }

    /// Moves a running run to Completed. Returns None if the run was not
    /// running, which keeps `Completed` to one emission per run.
    pub fn complete(&mut self, reason: CompletionReason) -> Option<GameOutcome> {
        if self.state != GameState::Running {
            return None;
        }
        self.state = GameState::Completed;

        let outcome = GameOutcome {
            run_id: self.run_id.unwrap_or_else(Uuid::new_v4),
            game: self.game,
            score: self.score,
            reason,
            duration_ms: self.elapsed_ms(),
            rounds_completed: self.rounds_completed,
        };

        debug!(game = %self.game, score = outcome.score, ?reason, "Run completed");
        self.emit(GameEvent::Completed(outcome.clone()));
        Some(outcome)
    }

    /// Terminates a running run with an error. The reported score drops to 0.
    pub fn fail(&mut self, error: &ArenaError) {
        if self.state != GameState::Running {
            return;
        }
        self.state = GameState::Failed;
        self.score = 0;
        self.last_error = Some(error.to_string());

        debug!(game = %self.game, %error, "Run failed");
        self.emit(GameEvent::ScoreChanged { score: 0 });
        self.emit(GameEvent::Failed {
            message: error.to_string(),
        });
    }

    pub fn is_running(&self) -> bool {
        self.state == GameState::Running
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn elapsed_ms(&self) -> u64 {
        self.started_at
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or_default()
    }

    fn emit(&self, event: GameEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!(game = %self.game, "Game event dropped with no receiver");
            }
        }
    }
}
