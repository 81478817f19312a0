use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::board::Board;
use super::lifecycle::{
    CompletionReason, GameEventSender, GameId, GameState, GameView, Minigame, PlayerInput,
    RunTracker,
};
use crate::assets::{portrait_image_path, ResourceLoader};
use crate::shared::ArenaError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSwapConfig {
    pub start_size: usize,
    pub max_size: usize,
    /// Levels to clear before the run completes; the portrait count when unset
    pub max_levels: Option<u32>,
    pub hint_interval_ticks: u32,
    pub hint_duration_ticks: u32,
    /// Portraits tried per level before the run fails
    pub fetch_attempts: usize,
}

impl Default for TileSwapConfig {
    fn default() -> Self {
        Self {
            start_size: 3,
            max_size: 10,
            max_levels: None,
            hint_interval_ticks: 15,
            hint_duration_ticks: 3,
            fetch_attempts: 10,
        }
    }
}

/// Points for clearing an n x n level: n²·10 minus two per move and one per
/// elapsed second, never below 1.
pub fn level_score(size: usize, moves: u32, elapsed_secs: u32) -> u32 {
    let base = (size * size * 10) as i64;
    let penalty = i64::from(moves) * 2 + i64::from(elapsed_secs);
    (base - penalty).max(1) as u32
}

/// Temporarily shows which piece belongs in a misplaced cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub cell: usize,
    /// 1-based label of the piece currently in `cell`
    pub label: usize,
    pub ticks_left: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSwapView {
    pub state: GameState,
    pub score: u32,
    pub level: u32,
    pub max_levels: u32,
    pub size: usize,
    pub cells: Vec<usize>,
    pub selected: Option<usize>,
    pub moves: u32,
    pub elapsed: u32,
    pub hint: Option<Hint>,
    pub image_path: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct Level {
    number: u32,
    board: Board,
    image_path: String,
    moves: u32,
    elapsed: u32,
    selected: Option<usize>,
    hint: Option<Hint>,
}

/// Progressive sliding-image puzzle: rebuild each portrait by swapping cells
pub struct TileSwapGame {
    config: TileSwapConfig,
    loader: Arc<ResourceLoader>,
    rng: StdRng,
    run: RunTracker,
    portraits: Arc<Vec<String>>,
    used: HashSet<String>,
    max_levels: u32,
    level: Option<Level>,
}

impl TileSwapGame {
    pub fn new(config: TileSwapConfig, loader: Arc<ResourceLoader>) -> Self {
        Self {
            config,
            loader,
            rng: StdRng::from_rng(&mut rand::rng()),
            run: RunTracker::new(GameId::G2),
            portraits: Arc::new(Vec::new()),
            used: HashSet::new(),
            max_levels: 0,
            level: None,
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

    pub fn board(&self) -> Option<&Board> {
        self.level.as_ref().map(|level| &level.board)
    }

    pub fn hint(&self) -> Option<Hint> {
        self.level.as_ref().and_then(|level| level.hint)
    }

    /// Selects a cell. The second distinct selection swaps the two cells;
    /// selecting the same cell again clears the selection.
    #[instrument(skip(self), fields(game = %GameId::G2))]
    pub async fn select(&mut self, cell: usize) -> Result<(), ArenaError> {
        if !self.run.is_running() {
            return Err(ArenaError::validation("game is not running"));
        }
        let level = self
            .level
            .as_mut()
            .ok_or_else(|| ArenaError::validation("no level in progress"))?;
        if cell >= level.board.len() {
            return Err(ArenaError::validation(format!("cell {} is out of range", cell)));
        }

        let first = match level.selected.take() {
            None => {
                level.selected = Some(cell);
                return Ok(());
            }
            Some(first) if first == cell => return Ok(()),
            Some(first) => first,
        };

        level.board.swap(first, cell)?;
        level.moves += 1;

        if !level.board.is_solved() {
            return Ok(());
        }

        let points = level_score(level.board.size(), level.moves, level.elapsed);
        let size = level.board.size();
        debug!(
            level = level.number,
            size,
            moves = level.moves,
            elapsed = level.elapsed,
            points,
            "Level cleared"
        );
        self.run.award(points);
        self.level = None;

        if self.run.rounds_completed() >= self.max_levels {
            self.run.complete(CompletionReason::Exhausted);
            return Ok(());
        }

        let next_size = (size + 1).min(self.config.max_size);
        self.start_level(next_size).await;
        Ok(())
    }

    async fn start_level(&mut self, size: usize) {
        let image_path = match self.fetch_background().await {
            Ok(path) => path,
            Err(e) => {
                warn!(game = %GameId::G2, error = %e, "Level background unavailable");
                self.level = None;
                self.run.fail(&e);
                return;
            }
        };

        let number = self.run.rounds_completed() + 1;
        debug!(level = number, size, image = %image_path, "Level started");
        self.level = Some(Level {
            number,
            board: Board::scrambled(size, &mut self.rng),
            image_path,
            moves: 0,
            elapsed: 0,
            selected: None,
            hint: None,
        });
    }

    /// Tries random unused portraits until one loads
    async fn fetch_background(&mut self) -> Result<String, ArenaError> {
        let mut candidates: Vec<String> = self
            .portraits
            .iter()
            .filter(|id| !self.used.contains(*id))
            .cloned()
            .collect();
        candidates.shuffle(&mut self.rng);

        for id in candidates.into_iter().take(self.config.fetch_attempts) {
            self.used.insert(id.clone());
            let path = portrait_image_path(&id);
            if let Ok(asset) = self.loader.fetch(&path).await {
                return Ok(asset.path);
            }
        }
        Err(ArenaError::asset("no puzzle background could be loaded"))
    }

    fn advance_hint(&mut self) {
        let Some(level) = self.level.as_mut() else {
            return;
        };
        level.elapsed += 1;

        if let Some(hint) = level.hint.as_mut() {
            hint.ticks_left = hint.ticks_left.saturating_sub(1);
            if hint.ticks_left == 0 {
                level.hint = None;
            }
        }

        let interval = self.config.hint_interval_ticks;
        if interval == 0 || level.elapsed % interval != 0 {
            return;
        }
        let misplaced = level.board.misplaced();
        if let Some(&cell) = misplaced.choose(&mut self.rng) {
            let label = level.board.piece_at(cell).unwrap_or_default() + 1;
            level.hint = Some(Hint {
                cell,
                label,
                ticks_left: self.config.hint_duration_ticks,
            });
        }
    }
}

#[async_trait]
impl Minigame for TileSwapGame {
    fn id(&self) -> GameId {
        GameId::G2
    }

    async fn start(&mut self) {
        if !self.run.begin() {
            return;
        }
        self.used.clear();
        self.level = None;

        let portraits = match self.loader.portrait_ids().await {
            Ok(portraits) => portraits,
            Err(e) => {
                warn!(game = %GameId::G2, error = %e, "Portrait catalog unavailable");
                self.run.fail(&e);
                return;
            }
        };

        self.max_levels = self
            .config
            .max_levels
            .unwrap_or(portraits.len() as u32)
            .max(1);
        self.portraits = portraits;
        info!(max_levels = self.max_levels, "Tile swap run started");

        let size = self.config.start_size.min(self.config.max_size);
        self.start_level(size).await;
    }

    fn give_up(&mut self) {
        self.level = None;
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
        if self.run.is_running() {
            self.advance_hint();
        }
    }

    async fn handle_input(&mut self, input: PlayerInput) -> Result<(), ArenaError> {
        match input {
            PlayerInput::Select { cell } => self.select(cell).await,
            other => Err(ArenaError::validation(format!(
                "unsupported input for the tile swap game: {:?}",
                other
            ))),
        }
    }

    fn requires_forfeit_confirmation(&self) -> bool {
        true
    }

    fn view(&self) -> GameView {
        let level = self.level.as_ref();
        GameView::TileSwap(TileSwapView {
            state: self.run.state(),
            score: self.run.score(),
            level: level.map(|l| l.number).unwrap_or_default(),
            max_levels: self.max_levels,
            size: level.map(|l| l.board.size()).unwrap_or_default(),
            cells: level.map(|l| l.board.cells().to_vec()).unwrap_or_default(),
            selected: level.and_then(|l| l.selected),
            moves: level.map(|l| l.moves).unwrap_or_default(),
            elapsed: level.map(|l| l.elapsed).unwrap_or_default(),
            hint: level.and_then(|l| l.hint),
            image_path: level.map(|l| l.image_path.clone()),
            last_error: self.run.last_error().map(str::to_string),
        })
    }
}
