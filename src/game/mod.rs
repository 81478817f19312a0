// Public API
pub use board::Board;
pub use countdown::{Countdown, Tick};
pub use lifecycle::{
    event_channel, CompletionReason, GameEvent, GameEventReceiver, GameEventSender, GameId,
    GameOutcome, GameState, GameView, Minigame, PlayerInput, RunTracker,
};
pub use matching::{answer_targets, matches, normalize_answer, MIN_ANSWER_LEN};
pub use reaction::{obscurity, ReactionConfig, ReactionGame, ReactionView};
pub use tile_swap::{level_score, Hint, TileSwapConfig, TileSwapGame, TileSwapView};
pub use word_fill::{WordFillConfig, WordFillGame, WordFillView};

// Internal modules
mod board;
mod countdown;
mod lifecycle;
mod matching;
mod reaction;
mod tile_swap;
mod word_fill;
