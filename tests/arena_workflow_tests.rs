mod utils;

use minigame_arena::assets::{clue_image_path, weapon_image_path};
use minigame_arena::game::{GameId, GameState, GameView, PlayerInput};
use minigame_arena::remote::RemoteError;
use minigame_arena::{ArenaConfig, ArenaError, Phase};
use utils::setup::{character_key, weapon_icon, CHARACTERS, WEAPONS};
use utils::TestSetupBuilder;

const UID: &str = "812345678";

fn reaction_choice(view: &GameView) -> usize {
    let GameView::Reaction(view) = view else {
        panic!("expected the weapon game, got {:?}", view);
    };
    let path = view.image_path.clone().expect("round in progress");
    let index = (0..WEAPONS.len())
        .find(|i| weapon_image_path(&weapon_icon(*i)) == path)
        .expect("known weapon image");
    view.options
        .iter()
        .position(|option| option == WEAPONS[index])
        .expect("target among the options")
}

fn clue_answer(view: &GameView) -> String {
    let GameView::WordFill(view) = view else {
        panic!("expected the word-fill game, got {:?}", view);
    };
    let path = view.clue_image.clone().expect("round in progress");
    CHARACTERS
        .iter()
        .find(|name| clue_image_path(&format!("Skill_S_{}_01", character_key(name))) == path)
        .map(|name| name.to_string())
        .expect("known clue image")
}

/// Next (cell, cell) swap that puts one more piece in place
fn next_swap(view: &GameView) -> Option<(usize, usize)> {
    let GameView::TileSwap(view) = view else {
        panic!("expected the tile-swap game, got {:?}", view);
    };
    let target = (0..view.cells.len()).find(|cell| view.cells[*cell] != *cell)?;
    let source = view.cells.iter().position(|piece| *piece == target)?;
    Some((target, source))
}

fn state_of(view: &GameView) -> GameState {
    match view {
        GameView::Reaction(view) => view.state,
        GameView::TileSwap(view) => view.state,
        GameView::WordFill(view) => view.state,
    }
}

#[tokio::test]
async fn test_full_arena_run() {
    let setup = TestSetupBuilder::new().build();
    setup.enter_arena(UID, "Clorinde", 10).await;
    assert_eq!(setup.controller.session().await.phase, Phase::Arena);

    // Game 1: every weapon named with the full clock
    let mut view = setup.controller.start_game(GameId::G1).await.unwrap();
    while state_of(&view) == GameState::Running {
        let choice = reaction_choice(&view);
        view = setup
            .controller
            .input(PlayerInput::Choose { option: choice })
            .await
            .unwrap();
    }
    assert_eq!(state_of(&view), GameState::Completed);

    // Game 3: type each character's name
    let mut view = setup.controller.start_game(GameId::G3).await.unwrap();
    while state_of(&view) == GameState::Running {
        let answer = clue_answer(&view);
        view = setup
            .controller
            .input(PlayerInput::Type { text: answer })
            .await
            .unwrap();
    }
    assert_eq!(state_of(&view), GameState::Completed);

    // Game 2: one level per portrait
    let mut view = setup.controller.start_game(GameId::G2).await.unwrap();
    while state_of(&view) == GameState::Running {
        let (a, b) = next_swap(&view).expect("running level is unsolved");
        setup
            .controller
            .input(PlayerInput::Select { cell: a })
            .await
            .unwrap();
        view = setup
            .controller
            .input(PlayerInput::Select { cell: b })
            .await
            .unwrap();
    }
    assert_eq!(state_of(&view), GameState::Completed);

    let arena = setup.controller.arena().await;
    assert_eq!(arena.scores.get(GameId::G1), 4 * 1000);
    assert_eq!(arena.scores.get(GameId::G3), 2 * (320 + 15 * 30));
    assert!(arena.scores.get(GameId::G2) > 0);
    assert_eq!(arena.total, 4000 + 1540 + arena.scores.get(GameId::G2));

    let standing = setup.controller.submit_arena().await.unwrap();
    assert_eq!(standing.rank, 1);
    assert_eq!(standing.arena_total, arena.total);

    let snapshot = setup.controller.leaderboard().await;
    assert_eq!(snapshot.standings.len(), 1);
    assert_eq!(snapshot.standings[0].lore_score, 20);
    assert_eq!(snapshot.top_plays.len(), 3);
    assert_eq!(snapshot.games[&GameId::G1][0].score, 4000);

    setup.settle().await;
    let plays = setup.remote.plays().await;
    assert_eq!(plays.len(), 3);
    assert!(plays.iter().all(|play| play.uid == UID));
}

#[tokio::test]
async fn test_replay_keeps_last_known_score() {
    let setup = TestSetupBuilder::new().build();
    setup.enter_arena(UID, "Clorinde", 0).await;

    let view = setup.controller.start_game(GameId::G1).await.unwrap();
    let choice = reaction_choice(&view);
    setup
        .controller
        .input(PlayerInput::Choose { option: choice })
        .await
        .unwrap();
    setup.controller.give_up(false).await.unwrap();
    assert_eq!(setup.controller.arena().await.scores.get(GameId::G1), 1000);

    // a second run that times out at once replaces the last known score
    setup.controller.start_game(GameId::G1).await.unwrap();
    for _ in 0..11 {
        setup.controller.tick().await;
    }
    assert_eq!(setup.controller.arena().await.scores.get(GameId::G1), 0);

    let plays = setup.scoring.top_plays_for(UID).await;
    assert_eq!(plays.len(), 2);
    assert_eq!(plays[0].score, 1000);
}

#[tokio::test]
async fn test_too_few_weapons_fails_the_run() {
    let setup = TestSetupBuilder::new().with_weapons(3).build();
    setup.enter_arena(UID, "Clorinde", 10).await;

    let view = setup.controller.start_game(GameId::G1).await.unwrap();
    let GameView::Reaction(reaction) = &view else {
        panic!("expected the weapon game");
    };
    assert_eq!(reaction.state, GameState::Failed);
    assert!(reaction.last_error.as_deref().unwrap().contains("weapons"));

    // the failed run does not block other games
    let view = setup.controller.start_game(GameId::G3).await.unwrap();
    assert_eq!(state_of(&view), GameState::Running);
}

#[tokio::test]
async fn test_tile_swap_needs_confirmed_give_up() {
    let setup = TestSetupBuilder::new().build();
    setup.enter_arena(UID, "Clorinde", 10).await;

    setup.controller.start_game(GameId::G2).await.unwrap();
    let err = setup.controller.give_up(false).await.unwrap_err();
    assert!(matches!(err, ArenaError::Validation(_)));

    let view = setup.controller.give_up(true).await.unwrap();
    assert_eq!(state_of(&view), GameState::Completed);

    let plays = setup.scoring.top_plays_for(UID).await;
    assert_eq!(plays.len(), 1);
    assert_eq!(plays[0].game, GameId::G2);
    assert_eq!(plays[0].score, 0);
}

#[tokio::test]
async fn test_missing_portraits_fail_the_puzzle() {
    let setup = TestSetupBuilder::new().without_portraits().build();
    setup.enter_arena(UID, "Clorinde", 10).await;

    let view = setup.controller.start_game(GameId::G2).await.unwrap();
    assert_eq!(state_of(&view), GameState::Failed);
    assert!(setup.scoring.top_plays_for(UID).await.is_empty());
}

#[tokio::test]
async fn test_unloadable_clues_fail_word_fill() {
    let setup = TestSetupBuilder::new().without_clue_images().build();
    setup.enter_arena(UID, "Clorinde", 10).await;

    let view = setup.controller.start_game(GameId::G3).await.unwrap();
    let GameView::WordFill(word_fill) = &view else {
        panic!("expected the word-fill game");
    };
    assert_eq!(word_fill.state, GameState::Failed);
    assert!(word_fill.last_error.as_deref().unwrap().contains("clue image"));
    assert_eq!(setup.controller.arena().await.scores.get(GameId::G3), 0);
    assert!(setup.scoring.top_plays_for(UID).await.is_empty());
}

#[tokio::test]
async fn test_quiz_needs_enough_questions() {
    let setup = TestSetupBuilder::new().with_questions(4).build();
    setup.register(UID, "Clorinde").await;

    let err = setup.controller.start_quiz().await.unwrap_err();
    assert!(matches!(err, ArenaError::Data(_)));
    assert_eq!(setup.controller.session().await.phase, Phase::Quiz);
}

#[tokio::test]
async fn test_progress_survives_restart() {
    let first = TestSetupBuilder::new().build();
    first.enter_arena(UID, "Clorinde", 7).await;

    let second = TestSetupBuilder::new()
        .with_store(first.store.clone())
        .build();
    let session = second.controller.restore().await.unwrap();
    assert_eq!(session.phase, Phase::Arena);
    let participant = session.participant.unwrap();
    assert_eq!(participant.uid, UID);
    assert_eq!(participant.lore_score, 14);

    second.controller.start_game(GameId::G1).await.unwrap();
}

#[tokio::test]
async fn test_registration_is_mirrored_once() {
    let setup = TestSetupBuilder::new().build();
    setup.enter_arena(UID, "Clorinde", 10).await;
    setup.settle().await;

    let entries = setup.remote.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].lore_score, 0);

    setup
        .remote
        .fail_next(RemoteError::AlreadyRegistered(UID.to_string()))
        .await;
    setup.controller.submit_arena().await.unwrap();
    setup.settle().await;
    assert_eq!(setup.remote.entries().await.len(), 1);
}

#[tokio::test]
async fn test_rejected_submission_refreshes_session_token() {
    let setup = TestSetupBuilder::new().build();
    setup.enter_arena(UID, "Clorinde", 10).await;
    setup.settle().await;
    assert_eq!(setup.sessions.fetches(), 1);

    setup
        .remote
        .fail_next(RemoteError::Rejected("stale session".to_string()))
        .await;
    setup.controller.spin_wheel().await.unwrap();
    setup.settle().await;
    assert!(setup.remote.wheel().await.is_empty());

    setup.controller.submit_arena().await.unwrap();
    setup.settle().await;

    let calls = setup.remote.calls().await;
    let last = &calls.last().unwrap().1;
    assert_eq!(last.session_token, "session-2");
    assert_eq!(setup.sessions.fetches(), 2);
}

#[tokio::test]
async fn test_quiz_clock_advances_questions() {
    let mut config = ArenaConfig::default();
    config.quiz.question_ticks = 2;
    let setup = TestSetupBuilder::new().with_config(config).build();
    setup.register(UID, "Clorinde").await;
    setup.controller.start_quiz().await.unwrap();

    setup.controller.answer_quiz(0).await.unwrap();
    for _ in 0..3 {
        setup.controller.tick().await;
    }
    let progress = setup.controller.quiz_progress().await.unwrap();
    assert!(progress.number >= 3);
    assert_eq!(progress.score, 2);
}
