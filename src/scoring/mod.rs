pub mod leaderboard;
pub mod models;
pub mod repository;
pub mod service;

mod errors;

pub use errors::ScoringError;
pub use leaderboard::{compute_bonus, compute_rank};
pub use models::*;
pub use repository::{BlobStore, FileBlobStore, InMemoryBlobStore, ScoreRepository};
pub use service::ScoringService;
