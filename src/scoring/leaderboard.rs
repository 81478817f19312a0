use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use strum::IntoEnumIterator;

use super::models::{BestScore, LeaderboardState, PlayRecord, ScoreRecord, ScoreUpdate};
use crate::game::GameId;

/// Plays retained per (uid, game)
pub const PLAYS_PER_GAME: usize = 5;
/// Plays shown on a participant's personal board
pub const TOP_PLAYS_SHOWN: usize = 5;
pub const WHEEL_BASE_RATE: f64 = 5.0;
pub const WHEEL_MAX_RATE: f64 = 100.0;

/// Best play first: higher score, then the more recent play
fn by_score_then_recent(a: &PlayRecord, b: &PlayRecord) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
}

/// Leaderboard order: arena total, then lore score, then whoever reached
/// the total first.
fn by_standing(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.arena_total
        .cmp(&a.arena_total)
        .then_with(|| b.lore_score.cmp(&a.lore_score))
        .then_with(|| a.updated_at.cmp(&b.updated_at))
}

/// 1-based position of `uid` in the standing order, None if absent
pub fn compute_rank(uid: &str, scores: &[ScoreRecord]) -> Option<usize> {
    let mut ordered: Vec<&ScoreRecord> = scores.iter().collect();
    ordered.sort_by(|a, b| by_standing(a, b));
    ordered
        .iter()
        .position(|record| record.uid == uid)
        .map(|index| index + 1)
}

/// Reward percentage for a rank. Tiers do not stack.
pub fn compute_bonus(rank: usize, players: usize) -> f64 {
    if players == 0 {
        return 0.0;
    }
    match rank {
        1 => 1.0,
        2 => 0.5,
        3 => 0.25,
        _ => 0.0,
    }
}

impl LeaderboardState {
    /// Merges `update` into the uid's record, creating it when missing
    pub fn upsert_score(&mut self, update: ScoreUpdate) -> &ScoreRecord {
        let index = match self.scores.iter().position(|s| s.uid == update.uid) {
            Some(index) => {
                update.apply(&mut self.scores[index]);
                index
            }
            None => {
                self.scores.push(update.into_record());
                self.scores.len() - 1
            }
        };
        &self.scores[index]
    }

    pub fn score_for(&self, uid: &str) -> Option<&ScoreRecord> {
        self.scores.iter().find(|s| s.uid == uid)
    }

    /// Score records in leaderboard order
    pub fn standings(&self) -> Vec<ScoreRecord> {
        let mut ordered = self.scores.clone();
        ordered.sort_by(by_standing);
        ordered
    }

    /// Appends a play and trims every (uid, game) group to its best plays.
    /// Plays that fall out of a group are removed from the state.
    pub fn record_play(&mut self, play: PlayRecord) {
        self.plays.push(play);
        self.trim_plays();
    }

    fn trim_plays(&mut self) {
        let mut groups: BTreeMap<(String, GameId), Vec<PlayRecord>> = BTreeMap::new();
        for play in self.plays.drain(..) {
            groups
                .entry((play.uid.clone(), play.game))
                .or_default()
                .push(play);
        }

        for (_, mut group) in groups {
            group.sort_by(by_score_then_recent);
            group.truncate(PLAYS_PER_GAME);
            self.plays.extend(group);
        }
    }

    /// A participant's best plays across all games
    pub fn top_plays_for(&self, uid: &str) -> Vec<PlayRecord> {
        if uid.is_empty() {
            return Vec::new();
        }
        let mut plays: Vec<PlayRecord> = self
            .plays
            .iter()
            .filter(|p| p.uid == uid)
            .cloned()
            .collect();
        plays.sort_by(by_score_then_recent);
        plays.truncate(TOP_PLAYS_SHOWN);
        plays
    }

    /// Best score per participant in one game, highest first. The earlier
    /// play wins a tie.
    pub fn game_leaderboard(&self, game: GameId, limit: usize) -> Vec<BestScore> {
        let mut best: HashMap<&str, &PlayRecord> = HashMap::new();
        for play in self.plays.iter().filter(|p| p.game == game) {
            best.entry(play.uid.as_str())
                .and_modify(|current| {
                    if play.score > current.score
                        || (play.score == current.score && play.timestamp < current.timestamp)
                    {
                        *current = play;
                    }
                })
                .or_insert(play);
        }

        let mut board: Vec<BestScore> = best
            .into_values()
            .map(|play| BestScore {
                uid: play.uid.clone(),
                display_name: play.display_name.clone(),
                score: play.score,
                timestamp: play.timestamp,
            })
            .collect();
        board.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
                .then_with(|| a.uid.cmp(&b.uid))
        });
        board.truncate(limit);
        board
    }

    /// Chance to win on the reward wheel: the base rate plus the bonus for
    /// the participant's rank on each game board.
    pub fn wheel_win_rate(&self, uid: &str) -> f64 {
        let bonus: f64 = GameId::iter()
            .map(|game| {
                let board = self.game_leaderboard(game, usize::MAX);
                board
                    .iter()
                    .position(|entry| entry.uid == uid)
                    .map(|index| compute_bonus(index + 1, board.len()))
                    .unwrap_or(0.0)
            })
            .sum();
        (WHEEL_BASE_RATE + bonus).min(WHEEL_MAX_RATE)
    }
}
