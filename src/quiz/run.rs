use serde::Serialize;
use tracing::debug;

use super::models::QuizQuestion;
use crate::game::{Countdown, Tick};
use crate::shared::ArenaError;

/// A question as shown to the participant, without its answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub choices: Vec<String>,
    pub difficulty: f64,
    pub points: u32,
}

impl From<&QuizQuestion> for QuestionView {
    fn from(question: &QuizQuestion) -> Self {
        Self {
            id: question.id.clone(),
            text: question.text.clone(),
            choices: question.choices.clone(),
            difficulty: question.difficulty,
            points: question.points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizProgress {
    /// 1-based number of the question on screen; total + 1 once finished
    pub number: usize,
    pub total: usize,
    pub score: u32,
    pub correct: usize,
    pub time_left: u32,
    pub question: Option<QuestionView>,
    pub finished: bool,
}

/// Steps through a selected quiz, one timed question at a time
#[derive(Debug)]
pub struct QuizRun {
    questions: Vec<QuizQuestion>,
    index: usize,
    score: u32,
    correct: usize,
    question_ticks: u32,
    countdown: Countdown,
}

impl QuizRun {
    pub fn new(questions: Vec<QuizQuestion>, question_ticks: u32) -> Self {
        let mut countdown = Countdown::start(question_ticks);
        if questions.is_empty() {
            countdown.cancel();
        }
        Self {
            questions,
            index: 0,
            score: 0,
            correct: 0,
            question_ticks,
            countdown,
        }
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// Points earned so far; the lore score once the run is finished
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn answer(&mut self, choice: usize) -> Result<QuizProgress, ArenaError> {
        let question = self
            .current()
            .ok_or_else(|| ArenaError::validation("quiz is already finished"))?;
        if choice >= question.choices.len() {
            return Err(ArenaError::validation(format!(
                "choice {} is out of range",
                choice
            )));
        }

        let is_correct = choice == question.correct_index;
        let points = question.points;
        debug!(question = %question.id, is_correct, "Quiz answer");
        if is_correct {
            self.score += points;
            self.correct += 1;
        }
        self.advance();
        Ok(self.progress())
    }

    pub fn skip(&mut self) -> Result<QuizProgress, ArenaError> {
        if self.is_finished() {
            return Err(ArenaError::validation("quiz is already finished"));
        }
        self.advance();
        Ok(self.progress())
    }

    /// Advances the question timer. Returns true when the current question
    /// timed out and the run moved on.
    pub fn tick(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        match self.countdown.tick() {
            Tick::Expired => {
                debug!(index = self.index, "Quiz question timed out");
                self.advance();
                true
            }
            _ => false,
        }
    }

    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            number: self.index + 1,
            total: self.questions.len(),
            score: self.score,
            correct: self.correct,
            time_left: if self.is_finished() {
                0
            } else {
                self.countdown.remaining()
            },
            question: self.current().map(QuestionView::from),
            finished: self.is_finished(),
        }
    }

    fn advance(&mut self) {
        self.countdown.cancel();
        self.index += 1;
        if !self.is_finished() {
            self.countdown = Countdown::start(self.question_ticks);
        }
    }
}
