use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use super::session::{ArenaView, IntakeRequest, SessionView, WheelSpin};
use crate::game::{GameId, GameView, PlayerInput};
use crate::quiz::QuizProgress;
use crate::scoring::{ArenaStanding, LeaderboardSnapshot};
use crate::shared::{ArenaError, AppState};

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub choice: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct GiveUpRequest {
    #[serde(default)]
    pub confirmed: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/session", get(get_session).post(register))
        .route("/session/restore", post(restore_session))
        .route("/quiz", get(quiz_progress))
        .route("/quiz/start", post(start_quiz))
        .route("/quiz/answer", post(answer_quiz))
        .route("/quiz/skip", post(skip_quiz))
        .route("/arena", get(arena))
        .route("/arena/games/:game/start", post(start_game))
        .route("/arena/input", post(game_input))
        .route("/arena/give-up", post(give_up))
        .route("/arena/submit", post(submit_arena))
        .route("/leaderboard", get(leaderboard).delete(clear_leaderboard))
        .route("/wheel/spin", post(spin_wheel))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /session
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<IntakeRequest>,
) -> Result<Json<SessionView>, ArenaError> {
    info!(uid = %request.uid, "Registering participant");
    let session = state.controller.register(request).await?;
    Ok(Json(session))
}

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.controller.session().await)
}

/// POST /session/restore
///
/// 404 when there is no finished quiz to resume from.
pub async fn restore_session(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, ArenaError> {
    state
        .controller
        .restore()
        .await
        .map(Json)
        .ok_or_else(|| ArenaError::NotFound("no saved progress to resume".to_string()))
}

/// POST /quiz/start
#[instrument(name = "start_quiz", skip(state))]
pub async fn start_quiz(State(state): State<AppState>) -> Result<Json<QuizProgress>, ArenaError> {
    Ok(Json(state.controller.start_quiz().await?))
}

/// POST /quiz/answer
pub async fn answer_quiz(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<QuizProgress>, ArenaError> {
    Ok(Json(state.controller.answer_quiz(request.choice).await?))
}

/// POST /quiz/skip
pub async fn skip_quiz(State(state): State<AppState>) -> Result<Json<QuizProgress>, ArenaError> {
    Ok(Json(state.controller.skip_quiz().await?))
}

/// GET /quiz
pub async fn quiz_progress(
    State(state): State<AppState>,
) -> Result<Json<QuizProgress>, ArenaError> {
    Ok(Json(state.controller.quiz_progress().await?))
}

/// GET /arena
pub async fn arena(State(state): State<AppState>) -> Json<ArenaView> {
    Json(state.controller.arena().await)
}

/// POST /arena/games/:game/start
#[instrument(name = "start_game", skip(state))]
pub async fn start_game(
    State(state): State<AppState>,
    Path(game): Path<GameId>,
) -> Result<Json<GameView>, ArenaError> {
    info!(%game, "Starting game");
    Ok(Json(state.controller.start_game(game).await?))
}

/// POST /arena/input
pub async fn game_input(
    State(state): State<AppState>,
    Json(input): Json<PlayerInput>,
) -> Result<Json<GameView>, ArenaError> {
    Ok(Json(state.controller.input(input).await?))
}

/// POST /arena/give-up
///
/// An empty body counts as unconfirmed.
pub async fn give_up(
    State(state): State<AppState>,
    request: Option<Json<GiveUpRequest>>,
) -> Result<Json<GameView>, ArenaError> {
    let confirmed = request.map(|Json(r)| r.confirmed).unwrap_or_default();
    Ok(Json(state.controller.give_up(confirmed).await?))
}

/// POST /arena/submit
#[instrument(name = "submit_arena", skip(state))]
pub async fn submit_arena(
    State(state): State<AppState>,
) -> Result<Json<ArenaStanding>, ArenaError> {
    let standing = state.controller.submit_arena().await?;
    info!(
        rank = standing.rank,
        players = standing.players,
        "Arena total submitted"
    );
    Ok(Json(standing))
}

/// GET /leaderboard
pub async fn leaderboard(State(state): State<AppState>) -> Json<LeaderboardSnapshot> {
    Json(state.controller.leaderboard().await)
}

/// DELETE /leaderboard
#[instrument(name = "clear_leaderboard", skip(state))]
pub async fn clear_leaderboard(State(state): State<AppState>) -> Result<StatusCode, ArenaError> {
    state.controller.clear_scores().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /wheel/spin
pub async fn spin_wheel(State(state): State<AppState>) -> Result<Json<WheelSpin>, ArenaError> {
    Ok(Json(state.controller.spin_wheel().await?))
}
