//! Session tests - full transitions through the public API

use hexfall::core::hex::{hex_to_pixel, neighbors};
use hexfall::core::{Board, GameSession, Layout, SavedState};
use hexfall::types::{
    Action, Cell, CellKey, Direction, GameMode, MatchMode, ModeConfig, Phase, SessionConfig,
    Slot,
};
use hexfall::GameEvent;

fn config(game: GameMode, match_mode: MatchMode) -> SessionConfig {
    SessionConfig::new(ModeConfig::new(game, match_mode))
}

fn checkered_grid() -> Vec<Vec<Slot>> {
    let mut grid = vec![vec![None; 9]; 9];
    for (col, column) in grid.iter_mut().enumerate() {
        for (row, slot) in column.iter_mut().enumerate() {
            *slot = Some(Cell::regular(((col + row) % 5) as i8));
        }
    }
    grid
}

fn saved(grid: Vec<Vec<Slot>>, mode_id: &str) -> SavedState {
    SavedState {
        grid,
        move_count: 0,
        score: 0,
        display_score: 0,
        chain_level: 0,
        combo_count: 0,
        rng_seed: Some(777),
        mode_id: mode_id.into(),
    }
}

fn cluster_pixel(center: CellKey, i: usize) -> (f32, f32) {
    let layout = Layout::default();
    let ring = neighbors(center.0, center.1);
    let c = hex_to_pixel(center, &layout);
    let b = hex_to_pixel(ring[i], &layout);
    let d = hex_to_pixel(ring[(i + 1) % 6], &layout);
    let centroid = ((c.0 + b.0 + d.0) / 3.0, (c.1 + b.1 + d.1) / 3.0);
    (
        c.0 + (centroid.0 - c.0) * 0.6,
        c.1 + (centroid.1 - c.1) * 0.6,
    )
}

#[test]
fn test_select_emits_phase_change() {
    let mut session = GameSession::new(config(GameMode::Arcade, MatchMode::Line), 11);
    let (x, y) = cluster_pixel((4, 4), 0);

    let events = session.apply_action(Action::Select { x, y });
    assert_eq!(
        events,
        vec![GameEvent::PhaseChanged {
            phase: Phase::Selected
        }]
    );
}

#[test]
fn test_invalid_actions_are_silently_ignored() {
    let mut session = GameSession::new(config(GameMode::Arcade, MatchMode::Line), 11);

    // Rotate without a selection
    assert!(session
        .apply_action(Action::Rotate(Direction::Cw))
        .is_empty());
    // EndSession outside chill
    assert!(session.apply_action(Action::EndSession).is_empty());
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(session.move_count(), 0);
}

#[test]
fn test_save_restore_replay_equivalence() {
    // A session restored from a save replays identically to the original
    let mut grid = checkered_grid();
    for row in [2, 3, 4] {
        grid[4][row] = Some(Cell::regular(3));
    }
    let state = saved(grid, "arcade_line");

    let mut original =
        GameSession::restore(&state, config(GameMode::Arcade, MatchMode::Line)).unwrap();
    let mut replica = GameSession::restore(
        &original.save(),
        config(GameMode::Arcade, MatchMode::Line),
    )
    .unwrap();

    let (x, y) = cluster_pixel((2, 6), 0);
    for action in [
        Action::Select { x, y },
        Action::Rotate(Direction::Ccw),
    ] {
        let a = original.apply_action(action);
        let b = replica.apply_action(action);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
    assert_eq!(original.score(), replica.score());
    assert_eq!(original.board(), replica.board());
}

#[test]
fn test_chill_session_has_no_bomb_traffic() {
    let mut grid = checkered_grid();
    // A bomb in the record converts to a regular cell on chill load
    grid[6][6] = Some(Cell::bomb(2, 5));
    for row in [2, 3, 4] {
        grid[4][row] = Some(Cell::regular(3));
    }
    let state = saved(grid, "chill_line");

    let mut session =
        GameSession::restore(&state, config(GameMode::Chill, MatchMode::Line)).unwrap();
    assert_eq!(session.board().cell_at((6, 6)), Some(Cell::regular(2)));

    let (x, y) = cluster_pixel((2, 6), 0);
    session.apply_action(Action::Select { x, y });
    let events = session.apply_action(Action::Rotate(Direction::Ccw));

    assert_eq!(session.move_count(), 1);
    assert!(!events
        .iter()
        .any(|e| matches!(e, GameEvent::BombTicked { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, GameEvent::BombSpawned { .. })));
}

#[test]
fn test_bomb_spawns_on_move_interval() {
    // Score 55000 tightens the spawn interval to max(4, 15 - 11) = 4
    let mut grid = checkered_grid();
    for row in [2, 3, 4] {
        grid[4][row] = Some(Cell::regular(3));
    }
    // A uniform patch whose rotation is a guaranteed no-op
    for key in [(8, 7), (8, 6), (7, 6)] {
        grid[key.0][key.1] = Some(Cell::regular(0));
    }
    let mut state = saved(grid, "arcade_line");
    state.score = 55_000;
    state.display_score = 55_000;

    let mut session =
        GameSession::restore(&state, config(GameMode::Arcade, MatchMode::Line)).unwrap();

    // Three counted no-op moves on the uniform patch
    let (px, py) = cluster_pixel((8, 7), 2);
    session.apply_action(Action::Select { x: px, y: py });
    for _ in 0..3 {
        let events = session.apply_action(Action::Rotate(Direction::Cw));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Matched { .. })));
    }
    assert_eq!(session.move_count(), 3);

    // Move 4 hits the interval: the bomb queues, the planted run cascades,
    // and the refill spawns the bomb
    let (x, y) = cluster_pixel((2, 6), 0);
    session.apply_action(Action::Select { x, y });
    let events = session.apply_action(Action::Rotate(Direction::Ccw));

    assert_eq!(session.move_count(), 4);
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::BombSpawned { .. })));
    // The spawned bomb survives unless a later cascade level happened to
    // clear it by color; either way at most one exists
    let bombs = Board::keys()
        .filter(|&key| {
            session
                .board()
                .cell_at(key)
                .is_some_and(|cell| cell.special.is_bomb())
        })
        .count();
    assert!(bombs <= 1);
}

#[test]
fn test_end_session_unconditional_in_chill() {
    let mut session = GameSession::new(config(GameMode::Chill, MatchMode::Line), 11);

    let first = session.apply_action(Action::EndSession);
    assert_eq!(session.phase(), Phase::GameOver);
    assert!(first
        .iter()
        .any(|e| matches!(e, GameEvent::GameOver { .. })));

    // EndSession carries no phase precondition; repeating it from
    // GameOver still emits rather than falling into the ignore arm
    let second = session.apply_action(Action::EndSession);
    assert_eq!(session.phase(), Phase::GameOver);
    assert!(second
        .iter()
        .any(|e| matches!(e, GameEvent::GameOver { .. })));
}

#[test]
fn test_new_game_fresh_board_same_mode() {
    let mut session = GameSession::new(config(GameMode::Arcade, MatchMode::Line), 20);
    let first_board = session.board().clone();

    let (x, y) = cluster_pixel((4, 4), 0);
    session.apply_action(Action::Select { x, y });
    session.apply_action(Action::NewGame);

    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.selection().is_none());
    assert_eq!(session.move_count(), 0);
    assert_eq!(session.score(), 0);
    assert_ne!(session.board(), &first_board);
    assert!(session.board().is_full());
}

#[test]
fn test_mode_id_round_trip_through_save() {
    for (game, match_mode, id) in [
        (GameMode::Arcade, MatchMode::Line, "arcade_line"),
        (GameMode::Arcade, MatchMode::Triangle, "arcade_triangle"),
        (GameMode::Chill, MatchMode::Line, "chill_line"),
        (GameMode::Chill, MatchMode::Triangle, "chill_triangle"),
    ] {
        let session = GameSession::new(config(game, match_mode), 3);
        let saved = session.save();
        assert_eq!(saved.mode_id, id);
        assert!(GameSession::restore(&saved, config(game, match_mode)).is_ok());
    }
}
