// Library crate for the minigame arena
// This file exposes the public API for the binary and integration tests

pub mod arena;
pub mod assets;
pub mod config;
pub mod game;
pub mod quiz;
pub mod remote;
pub mod scoring;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use arena::{router, start_clock, ArenaController, ClockHandle, IntakeRequest, Phase};
pub use assets::{AssetStore, CatalogSource, ResourceLoader};
pub use config::ArenaConfig;
pub use game::{GameId, GameState, GameView, Minigame, PlayerInput};
pub use remote::{RemoteSubmitter, SubmissionDispatcher};
pub use scoring::{BlobStore, ScoringService};
pub use shared::{AppState, ArenaError};
