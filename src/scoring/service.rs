use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument};

use super::leaderboard::{compute_bonus, compute_rank};
use super::models::{
    ArenaStanding, BestScore, LeaderboardSnapshot, LeaderboardState, PlayRecord,
    ProgressCheckpoint, ScoreRecord, ScoreUpdate,
};
use super::repository::{BlobStore, ScoreRepository};
use super::ScoringError;
use crate::game::GameId;

/// Entries shown per game board in a snapshot
pub const GAME_BOARD_LIMIT: usize = 10;

/// Local source of truth for scores. Every read-modify-write of the
/// leaderboard blob runs under one lock so concurrent submissions
/// cannot lose each other's updates.
pub struct ScoringService {
    repository: ScoreRepository,
    write_lock: AsyncMutex<()>,
}

impl ScoringService {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            repository: ScoreRepository::new(store),
            write_lock: AsyncMutex::new(()),
        }
    }

    pub async fn state(&self) -> LeaderboardState {
        self.repository.load_state().await
    }

    #[instrument(skip(self, update), fields(uid = %update.uid))]
    pub async fn upsert_score(&self, update: ScoreUpdate) -> Result<ScoreRecord, ScoringError> {
        if update.uid.trim().is_empty() {
            return Err(ScoringError::Validation("uid is required".to_string()));
        }
        let _guard = self.write_lock.lock().await;

        let mut state = self.repository.load_state().await;
        let record = state.upsert_score(update).clone();
        self.repository.save_state(&state).await?;
        Ok(record)
    }

    #[instrument(skip(self, play), fields(uid = %play.uid, game = %play.game, score = play.score))]
    pub async fn record_play(&self, play: PlayRecord) -> Result<(), ScoringError> {
        if play.uid.trim().is_empty() {
            return Err(ScoringError::Validation("uid is required".to_string()));
        }
        let _guard = self.write_lock.lock().await;

        let mut state = self.repository.load_state().await;
        state.record_play(play);
        self.repository.save_state(&state).await?;
        debug!(plays = state.plays.len(), "Play recorded");
        Ok(())
    }

    /// Folds a new arena total into the participant's record, then ranks
    /// them and stores the bonus their rank earns.
    #[instrument(skip(self, profile), fields(uid = %profile.uid))]
    pub async fn submit_arena_total(
        &self,
        profile: ScoreUpdate,
        arena_total: u32,
    ) -> Result<ArenaStanding, ScoringError> {
        if profile.uid.trim().is_empty() {
            return Err(ScoringError::Validation("uid is required".to_string()));
        }
        let _guard = self.write_lock.lock().await;

        let uid = profile.uid.clone();
        let mut state = self.repository.load_state().await;
        state.upsert_score(
            profile
                .arena_total(arena_total)
                .bonus_percent(0.0)
                .updated_at(Utc::now()),
        );

        let players = state.scores.len();
        let rank = compute_rank(&uid, &state.scores).unwrap_or(players);
        let bonus_percent = compute_bonus(rank, players);
        state.upsert_score(ScoreUpdate::new(uid.as_str()).bonus_percent(bonus_percent));
        self.repository.save_state(&state).await?;

        info!(arena_total, rank, players, bonus_percent, "Arena total submitted");
        Ok(ArenaStanding {
            rank,
            players,
            arena_total,
            bonus_percent,
        })
    }

    pub async fn top_plays_for(&self, uid: &str) -> Vec<PlayRecord> {
        self.repository.load_state().await.top_plays_for(uid)
    }

    pub async fn game_leaderboard(&self, game: GameId, limit: usize) -> Vec<BestScore> {
        self.repository
            .load_state()
            .await
            .game_leaderboard(game, limit)
    }

    pub async fn wheel_win_rate(&self, uid: &str) -> f64 {
        self.repository.load_state().await.wheel_win_rate(uid)
    }

    pub async fn snapshot(&self, uid: Option<&str>) -> LeaderboardSnapshot {
        let state = self.repository.load_state().await;
        let games: BTreeMap<GameId, Vec<BestScore>> = GameId::iter()
            .map(|game| (game, state.game_leaderboard(game, GAME_BOARD_LIMIT)))
            .collect();

        LeaderboardSnapshot {
            standings: state.standings(),
            top_plays: uid.map(|uid| state.top_plays_for(uid)).unwrap_or_default(),
            games,
            wheel_win_rate: uid.map(|uid| state.wheel_win_rate(uid)).unwrap_or(0.0),
            wheel_participated: state.wheel_participated,
        }
    }

    /// Marks the wheel as spun. Returns false if it already was.
    pub async fn mark_wheel_participation(&self) -> Result<bool, ScoringError> {
        let _guard = self.write_lock.lock().await;

        let mut state = self.repository.load_state().await;
        if state.wheel_participated {
            return Ok(false);
        }
        state.wheel_participated = true;
        self.repository.save_state(&state).await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn clear_scores(&self) -> Result<(), ScoringError> {
        let _guard = self.write_lock.lock().await;
        self.repository.clear_state().await?;
        info!("Local leaderboard cleared");
        Ok(())
    }

    pub async fn load_progress(&self) -> Option<ProgressCheckpoint> {
        self.repository.load_progress().await
    }

    pub async fn save_progress(
        &self,
        mut progress: ProgressCheckpoint,
    ) -> Result<(), ScoringError> {
        progress.updated_at = Some(Utc::now());
        self.repository.save_progress(&progress).await
    }

    pub async fn clear_progress(&self) -> Result<(), ScoringError> {
        self.repository.clear_progress().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::repository::InMemoryBlobStore;

    fn service() -> ScoringService {
        ScoringService::new(Arc::new(InMemoryBlobStore::new()))
    }

    #[tokio::test]
    async fn first_submission_ranks_first_with_full_bonus() {
        let service = service();
        let standing = service
            .submit_arena_total(ScoreUpdate::new("800000001").display_name("Kaveh"), 2500)
            .await
            .unwrap();

        assert_eq!(standing.rank, 1);
        assert_eq!(standing.players, 1);
        assert_eq!(standing.bonus_percent, 1.0);

        let state = service.state().await;
        let record = state.score_for("800000001").unwrap();
        assert_eq!(record.arena_total, 2500);
        assert_eq!(record.bonus_percent, 1.0);
        assert_eq!(record.display_name, "Kaveh");
    }

    #[tokio::test]
    async fn resubmission_replaces_the_total() {
        let service = service();
        service
            .submit_arena_total(ScoreUpdate::new("A").lore_score(4), 900)
            .await
            .unwrap();
        service
            .submit_arena_total(ScoreUpdate::new("B"), 1200)
            .await
            .unwrap();
        let standing = service
            .submit_arena_total(ScoreUpdate::new("A"), 1500)
            .await
            .unwrap();

        assert_eq!(standing.rank, 1);
        let state = service.state().await;
        assert_eq!(state.score_for("A").unwrap().arena_total, 1500);
        assert_eq!(state.score_for("A").unwrap().lore_score, 4);
        assert_eq!(state.scores.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_plays_are_all_kept() {
        let service = Arc::new(service());
        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let game = [GameId::G1, GameId::G2, GameId::G3][i % 3];
                    service
                        .record_play(PlayRecord::new(format!("u{}", i), "p", game, i as u32))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(service.state().await.plays.len(), 20);
    }

    #[tokio::test]
    async fn wheel_participation_is_recorded_once() {
        let service = service();
        assert!(service.mark_wheel_participation().await.unwrap());
        assert!(!service.mark_wheel_participation().await.unwrap());

        service.clear_scores().await.unwrap();
        assert!(service.mark_wheel_participation().await.unwrap());
    }

    #[tokio::test]
    async fn blank_uid_is_rejected() {
        let service = service();
        let result = service
            .record_play(PlayRecord::new(" ", "nobody", GameId::G1, 10))
            .await;
        assert!(matches!(result, Err(ScoringError::Validation(_))));
    }

    #[tokio::test]
    async fn snapshot_collects_boards_and_rate() {
        let service = service();
        service
            .record_play(PlayRecord::new("A", "Alhaitham", GameId::G2, 88))
            .await
            .unwrap();

        let snapshot = service.snapshot(Some("A")).await;
        assert_eq!(snapshot.top_plays.len(), 1);
        assert_eq!(snapshot.games[&GameId::G2].len(), 1);
        assert!(snapshot.games[&GameId::G1].is_empty());
        assert_eq!(snapshot.wheel_win_rate, 6.0);
    }
}
