use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::session::{
    ArenaScores, ArenaView, IntakeRequest, Participant, Phase, SessionView, WheelSpin,
};
use crate::assets::ResourceLoader;
use crate::config::ArenaConfig;
use crate::game::{
    event_channel, GameEvent, GameEventReceiver, GameId, GameView, Minigame, PlayerInput,
    ReactionGame, TileSwapGame, WordFillGame,
};
use crate::quiz::{normalize_questions, pick_quiz_set, QuizProgress, QuizRun};
use crate::remote::{PlaySubmission, Submission, SubmissionDispatcher, WheelParticipation};
use crate::scoring::{ArenaStanding, LeaderboardSnapshot, PlayRecord, ScoringService};
use crate::shared::ArenaError;

struct ActiveGame {
    game: Box<dyn Minigame>,
    events: GameEventReceiver,
}

struct Session {
    phase: Phase,
    participant: Option<Participant>,
    quiz: Option<QuizRun>,
    active: Option<ActiveGame>,
    scores: ArenaScores,
    runs: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            phase: Phase::Intake,
            participant: None,
            quiz: None,
            active: None,
            scores: ArenaScores::new(),
            runs: 0,
        }
    }

    fn participant(&self) -> Result<&Participant, ArenaError> {
        self.participant
            .as_ref()
            .ok_or_else(|| ArenaError::validation("register before continuing"))
    }

    fn require_phase(&self, phase: Phase) -> Result<(), ArenaError> {
        if self.phase != phase {
            return Err(ArenaError::validation(format!(
                "not available in the {:?} phase",
                self.phase
            )));
        }
        Ok(())
    }

    fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase,
            participant: self.participant.clone(),
        }
    }

    fn arena_view(&self) -> ArenaView {
        ArenaView {
            scores: self.scores.clone(),
            total: self.scores.total(),
            active: self.active.as_ref().map(|active| active.game.view()),
        }
    }
}

/// Drives one participant from intake through the quiz into the arena.
///
/// All commands run under a single session lock; game events are drained
/// before each command returns so scores and plays never lag the game.
pub struct ArenaController {
    config: ArenaConfig,
    loader: Arc<ResourceLoader>,
    scoring: Arc<ScoringService>,
    dispatcher: SubmissionDispatcher,
    seed: Option<u64>,
    session: Mutex<Session>,
}

impl ArenaController {
    pub fn new(
        config: ArenaConfig,
        loader: Arc<ResourceLoader>,
        scoring: Arc<ScoringService>,
        dispatcher: SubmissionDispatcher,
    ) -> Self {
        Self {
            config,
            loader,
            scoring,
            dispatcher,
            seed: None,
            session: Mutex::new(Session::new()),
        }
    }

    /// Makes quiz selection and every game run deterministic
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn scoring(&self) -> Arc<ScoringService> {
        Arc::clone(&self.scoring)
    }

    pub async fn session(&self) -> SessionView {
        self.session.lock().await.view()
    }

    #[instrument(skip(self, intake), fields(uid = %intake.uid))]
    pub async fn register(&self, intake: IntakeRequest) -> Result<SessionView, ArenaError> {
        let participant = Participant::from_intake(intake)?;
        self.scoring
            .save_progress(participant.checkpoint(false))
            .await?;

        let mut session = self.session.lock().await;
        if let Some(mut active) = session.active.take() {
            active.game.give_up();
        }
        *session = Session::new();
        session.phase = Phase::Quiz;
        session.participant = Some(participant.clone());

        info!(uid = %participant.uid, "Participant registered");
        self.dispatcher
            .dispatch(Submission::Entry(participant.entry(0, 0.0)));
        Ok(session.view())
    }

    /// Resumes straight into the arena when the saved checkpoint has a
    /// finished quiz. Returns None when there is nothing to resume.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Option<SessionView> {
        let checkpoint = self.scoring.load_progress().await?;
        if !checkpoint.quiz_done {
            debug!(uid = %checkpoint.uid, "Checkpoint has no finished quiz");
            return None;
        }

        let mut session = self.session.lock().await;
        *session = Session::new();
        session.phase = Phase::Arena;
        session.participant = Some(Participant::from(checkpoint));

        info!("Session restored into the arena");
        Some(session.view())
    }

    #[instrument(skip(self))]
    pub async fn start_quiz(&self) -> Result<QuizProgress, ArenaError> {
        let mut session = self.session.lock().await;
        session.participant()?;
        session.require_phase(Phase::Quiz)?;

        let raw = self.loader.catalog().questions().await?;
        let questions = normalize_questions(&raw);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let selected = pick_quiz_set(&questions, &self.config.quiz, &mut rng)?;

        info!(
            catalog = questions.len(),
            asked = selected.len(),
            "Quiz started"
        );
        let run = QuizRun::new(selected, self.config.quiz.question_ticks);
        let progress = run.progress();
        session.quiz = Some(run);
        Ok(progress)
    }

    pub async fn answer_quiz(&self, choice: usize) -> Result<QuizProgress, ArenaError> {
        let mut session = self.session.lock().await;
        let progress = Self::quiz_mut(&mut session)?.answer(choice)?;
        self.finish_quiz_if_done(&mut session).await?;
        Ok(progress)
    }

    pub async fn skip_quiz(&self) -> Result<QuizProgress, ArenaError> {
        let mut session = self.session.lock().await;
        let progress = Self::quiz_mut(&mut session)?.skip()?;
        self.finish_quiz_if_done(&mut session).await?;
        Ok(progress)
    }

    pub async fn quiz_progress(&self) -> Result<QuizProgress, ArenaError> {
        let session = self.session.lock().await;
        session
            .quiz
            .as_ref()
            .map(QuizRun::progress)
            .ok_or_else(|| ArenaError::NotFound("no quiz has been started".to_string()))
    }

    fn quiz_mut(session: &mut Session) -> Result<&mut QuizRun, ArenaError> {
        session
            .quiz
            .as_mut()
            .ok_or_else(|| ArenaError::NotFound("no quiz has been started".to_string()))
    }

    /// Moves to the arena once the last question is done: the lore score
    /// is checkpointed and folded into the participant's score record.
    async fn finish_quiz_if_done(&self, session: &mut Session) -> Result<(), ArenaError> {
        let lore_score = match &session.quiz {
            Some(quiz) if quiz.is_finished() && session.phase == Phase::Quiz => quiz.score(),
            _ => return Ok(()),
        };
        let Some(participant) = session.participant.as_mut() else {
            return Ok(());
        };
        participant.lore_score = lore_score;
        let participant = participant.clone();

        self.scoring
            .save_progress(participant.checkpoint(true))
            .await?;
        self.scoring.upsert_score(participant.profile()).await?;
        session.phase = Phase::Arena;

        info!(uid = %participant.uid, lore_score, "Quiz finished");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn start_game(&self, game: GameId) -> Result<GameView, ArenaError> {
        let mut session = self.session.lock().await;
        session.participant()?;
        session.require_phase(Phase::Arena)?;

        if let Some(active) = session.active.as_ref() {
            if active.game.is_running() {
                let running = active.game.id();
                if running == game {
                    return Ok(active.game.view());
                }
                return Err(ArenaError::validation(format!(
                    "{} is still running; finish or give up first",
                    running.title()
                )));
            }
        }

        session.runs += 1;
        let seed = self.seed.map(|seed| seed.wrapping_add(session.runs));
        let (tx, events) = event_channel();
        let mut minigame: Box<dyn Minigame> = match game {
            GameId::G1 => {
                let g = ReactionGame::new(self.config.reaction.clone(), Arc::clone(&self.loader))
                    .with_events(tx);
                Box::new(match seed {
                    Some(seed) => g.with_seed(seed),
                    None => g,
                })
            }
            GameId::G2 => {
                let g = TileSwapGame::new(self.config.tile_swap.clone(), Arc::clone(&self.loader))
                    .with_events(tx);
                Box::new(match seed {
                    Some(seed) => g.with_seed(seed),
                    None => g,
                })
            }
            GameId::G3 => {
                let g = WordFillGame::new(self.config.word_fill.clone(), Arc::clone(&self.loader))
                    .with_events(tx);
                Box::new(match seed {
                    Some(seed) => g.with_seed(seed),
                    None => g,
                })
            }
        };

        minigame.start().await;
        session.active = Some(ActiveGame {
            game: minigame,
            events,
        });
        self.drain_events(&mut session).await;
        self.active_view(&session)
    }

    pub async fn input(&self, input: PlayerInput) -> Result<GameView, ArenaError> {
        let mut session = self.session.lock().await;
        let active = session
            .active
            .as_mut()
            .ok_or_else(|| ArenaError::NotFound("no game has been started".to_string()))?;
        let result = active.game.handle_input(input).await;
        self.drain_events(&mut session).await;
        result?;
        self.active_view(&session)
    }

    /// Forfeits the running game. Games that ask for confirmation are
    /// only forfeited when `confirmed` is set.
    #[instrument(skip(self))]
    pub async fn give_up(&self, confirmed: bool) -> Result<GameView, ArenaError> {
        let mut session = self.session.lock().await;
        let active = session
            .active
            .as_mut()
            .filter(|active| active.game.is_running())
            .ok_or_else(|| ArenaError::validation("no game is running"))?;
        if active.game.requires_forfeit_confirmation() && !confirmed {
            return Err(ArenaError::validation(format!(
                "giving up {} needs confirmation",
                active.game.id().title()
            )));
        }

        active.game.give_up();
        self.drain_events(&mut session).await;
        self.active_view(&session)
    }

    pub async fn arena(&self) -> ArenaView {
        self.session.lock().await.arena_view()
    }

    /// Stores the sum of the last known game scores, ranks the participant
    /// and mirrors the result remotely.
    #[instrument(skip(self))]
    pub async fn submit_arena(&self) -> Result<ArenaStanding, ArenaError> {
        let session = self.session.lock().await;
        session.require_phase(Phase::Arena)?;
        let participant = session.participant()?.clone();
        let arena_total = session.scores.total();
        drop(session);

        let standing = self
            .scoring
            .submit_arena_total(participant.profile(), arena_total)
            .await?;
        self.dispatcher.dispatch(Submission::Entry(
            participant.entry(arena_total, standing.bonus_percent),
        ));
        Ok(standing)
    }

    pub async fn leaderboard(&self) -> LeaderboardSnapshot {
        let uid = self
            .session
            .lock()
            .await
            .participant
            .as_ref()
            .map(|participant| participant.uid.clone());
        self.scoring.snapshot(uid.as_deref()).await
    }

    pub async fn clear_scores(&self) -> Result<(), ArenaError> {
        self.scoring.clear_scores().await?;
        Ok(())
    }

    /// Enters the reward wheel, once per local store
    #[instrument(skip(self))]
    pub async fn spin_wheel(&self) -> Result<WheelSpin, ArenaError> {
        let participant = self.session.lock().await.participant()?.clone();
        let win_rate = self.scoring.wheel_win_rate(&participant.uid).await;
        if !self.scoring.mark_wheel_participation().await? {
            return Err(ArenaError::validation("the wheel has already been spun"));
        }

        info!(uid = %participant.uid, win_rate, "Wheel spun");
        self.dispatcher
            .dispatch(Submission::Wheel(WheelParticipation {
                uid: participant.uid,
                display_name: participant.display_name,
            }));
        Ok(WheelSpin { win_rate })
    }

    /// Advances the quiz timer and the active game by one tick
    pub async fn tick(&self) {
        let mut session = self.session.lock().await;

        if session.phase == Phase::Quiz {
            if let Some(quiz) = session.quiz.as_mut() {
                quiz.tick();
            }
            if let Err(e) = self.finish_quiz_if_done(&mut session).await {
                error!(error = %e, "Failed to finish quiz on timeout");
            }
        }

        if let Some(active) = session.active.as_mut() {
            if active.game.is_running() {
                active.game.tick().await;
            }
        }
        self.drain_events(&mut session).await;
    }

    fn active_view(&self, session: &Session) -> Result<GameView, ArenaError> {
        session
            .active
            .as_ref()
            .map(|active| active.game.view())
            .ok_or_else(|| ArenaError::NotFound("no game has been started".to_string()))
    }

    async fn drain_events(&self, session: &mut Session) {
        let Some(active) = session.active.as_mut() else {
            return;
        };
        let game = active.game.id();
        let mut pending = Vec::new();
        while let Ok(event) = active.events.try_recv() {
            pending.push(event);
        }

        for event in pending {
            match event {
                GameEvent::Started { run_id } => {
                    debug!(%game, %run_id, "Game run started");
                }
                GameEvent::ScoreChanged { score } => session.scores.set(game, score),
                GameEvent::Failed { message } => {
                    warn!(%game, error = %message, "Game run failed");
                    session.scores.set(game, 0);
                }
                GameEvent::Completed(outcome) => {
                    session.scores.set(game, outcome.score);
                    let Some(participant) = session.participant.as_ref() else {
                        continue;
                    };

                    let play = PlayRecord::new(
                        participant.uid.as_str(),
                        participant.display_name.as_str(),
                        game,
                        outcome.score,
                    )
                    .with_rounds(outcome.rounds_completed);
                    if let Err(e) = self.scoring.record_play(play).await {
                        error!(%game, error = %e, "Failed to record play locally");
                    }

                    info!(
                        %game,
                        score = outcome.score,
                        reason = ?outcome.reason,
                        "Game run completed"
                    );
                    self.dispatcher.dispatch(Submission::Play(PlaySubmission {
                        uid: participant.uid.clone(),
                        display_name: participant.display_name.clone(),
                        game,
                        score: outcome.score,
                    }));
                }
            }
        }
    }
}
