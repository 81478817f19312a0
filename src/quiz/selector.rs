use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::models::QuizQuestion;
use crate::shared::ArenaError;

const TAG_BOOST: f64 = 2.5;
const DIFFICULTY_STEP: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Weighted draws made from the catalog before ordering
    pub pool_size: usize,
    /// Questions asked per quiz
    pub ask_count: usize,
    pub preferred_tags: Vec<String>,
    pub question_ticks: u32,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            pool_size: 30,
            ask_count: 10,
            preferred_tags: vec!["nod-krai".to_string()],
            question_ticks: 10,
        }
    }
}

/// Draw weight: tagged questions are 2.5x as likely, and each difficulty
/// step above 1 adds 20%.
pub fn question_weight(question: &QuizQuestion, preferred_tags: &[String]) -> f64 {
    let tag_boost = if question.has_any_tag(preferred_tags) {
        TAG_BOOST
    } else {
        1.0
    };
    let difficulty_boost = 1.0 + (question.difficulty - 1.0) * DIFFICULTY_STEP;
    tag_boost * difficulty_boost
}

fn weighted_index<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.random_range(0..weights.len());
    }
    let mut target = rng.random_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        if target < *weight {
            return index;
        }
        target -= weight;
    }
    weights.len() - 1
}

/// Builds a quiz of `ask_count` distinct questions ordered easy to hard.
///
/// A pool of up to `pool_size` questions is drawn by weight without
/// replacement; the easiest distinct ones are kept and any shortfall is
/// backfilled at random from the rest of the pool.
pub fn pick_quiz_set<R: Rng>(
    questions: &[QuizQuestion],
    config: &QuizConfig,
    rng: &mut R,
) -> Result<Vec<QuizQuestion>, ArenaError> {
    if questions.len() < config.ask_count {
        return Err(ArenaError::data(format!(
            "not enough questions: have {}, need at least {}",
            questions.len(),
            config.ask_count
        )));
    }

    let mut remaining: Vec<&QuizQuestion> = questions.iter().collect();
    let mut pool: Vec<&QuizQuestion> = Vec::new();
    while pool.len() < config.pool_size && !remaining.is_empty() {
        let weights: Vec<f64> = remaining
            .iter()
            .map(|q| question_weight(q, &config.preferred_tags))
            .collect();
        let index = weighted_index(&weights, rng);
        pool.push(remaining.swap_remove(index));
    }

    let mut sorted = pool.clone();
    sorted.sort_by(|a, b| a.difficulty.total_cmp(&b.difficulty));

    let mut used: HashSet<&str> = HashSet::new();
    let mut picked: Vec<&QuizQuestion> = Vec::new();
    for question in sorted {
        if picked.len() >= config.ask_count {
            break;
        }
        if used.insert(question.dedup_key()) {
            picked.push(question);
        }
    }

    if picked.len() < config.ask_count {
        let mut extra = pool;
        extra.shuffle(rng);
        for question in extra {
            if picked.len() >= config.ask_count {
                break;
            }
            if used.insert(question.dedup_key()) {
                picked.push(question);
            }
        }
        picked.sort_by(|a, b| a.difficulty.total_cmp(&b.difficulty));
    }

    debug!(catalog = questions.len(), picked = picked.len(), "Quiz set selected");
    Ok(picked.into_iter().cloned().collect())
}
