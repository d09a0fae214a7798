//! Tests for the run state machine.

use strictly_2048::{
    Board, Direction, ManualClock, MoveOutcome, MoveRejection, Run, RunPhase, ScriptedTiles,
    SessionToken,
};

fn token() -> SessionToken {
    SessionToken::parse("00112233445566778899aabbccddeeff").unwrap()
}

fn run_from(rows: [[u32; 4]; 4], script: Vec<(usize, u32)>) -> (Run<ScriptedTiles, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let board = Board::from_rows(rows).unwrap();
    let run = Run::from_board(token(), board, ScriptedTiles::new(script), clock.clone());
    (run, clock)
}

/// Two 1024s about to merge, plus room to keep playing afterwards.
fn near_win() -> [[u32; 4]; 4] {
    [[1024, 1024, 0, 0], [2, 0, 0, 0], [0; 4], [0; 4]]
}

#[test]
fn test_first_accepted_move_starts_clock() {
    let (mut run, clock) = run_from([[0, 2, 0, 0], [0; 4], [0; 4], [0; 4]], vec![]);
    assert_eq!(run.phase(), RunPhase::Idle);
    clock.advance_ms(10_000);

    assert!(run.make_move(Direction::Left).is_accepted());
    assert_eq!(run.phase(), RunPhase::InProgress);
    assert_eq!(run.elapsed_ms(), Some(0));

    clock.advance_ms(1_500);
    assert_eq!(run.elapsed_ms(), Some(1_500));
}

#[test]
fn test_unchanged_move_has_no_side_effects() {
    let (mut run, _clock) = run_from([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]], vec![(0, 4)]);
    let before = *run.board();

    let outcome = run.make_move(Direction::Left);

    assert_eq!(outcome, MoveOutcome::Rejected(MoveRejection::Unchanged));
    assert_eq!(*run.board(), before);
    assert_eq!(run.move_count(), 0);
    assert_eq!(run.elapsed_ms(), None);
}

#[test]
fn test_accepted_move_counts_and_spawns() {
    let (mut run, _clock) = run_from([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]], vec![(0, 4)]);
    let outcome = run.make_move(Direction::Left);

    match outcome {
        MoveOutcome::Accepted { spawned, reached_win, lost } => {
            let spawn = spawned.expect("tile spawned");
            assert_eq!((spawn.row, spawn.col, spawn.value), (0, 1, 4));
            assert!(!reached_win);
            assert!(!lost);
        }
        MoveOutcome::Rejected(reason) => panic!("unexpected rejection: {reason}"),
    }
    assert_eq!(run.move_count(), 1);
    assert_eq!(run.board().tile_sum(), 6);
}

#[test]
fn test_win_freezes_elapsed_time() {
    let rows = [[1024, 1024, 0, 0], [0, 0, 0, 2], [0; 4], [0; 4]];
    let (mut run, clock) = run_from(rows, vec![]);

    let outcome = run.make_move(Direction::Up);
    assert!(matches!(outcome, MoveOutcome::Accepted { reached_win: false, .. }));
    clock.advance_ms(42_000);

    let outcome = run.make_move(Direction::Left);
    assert!(matches!(outcome, MoveOutcome::Accepted { reached_win: true, .. }));
    assert_eq!(run.phase(), RunPhase::Won);
    assert_eq!(run.elapsed_ms(), Some(42_000));

    // Continued play after the win keeps the frozen time.
    clock.advance_ms(60_000);
    assert!(run.make_move(Direction::Right).is_accepted());
    assert!(run.has_won());
    assert_eq!(run.elapsed_ms(), Some(42_000));

    let completed = run.completion().expect("won run is submittable");
    assert_eq!(completed.completion_time_ms, 42_000);
    assert_eq!(completed.move_count, 3);
    assert_eq!(completed.final_board, *run.board());
}

#[test]
fn test_win_is_monotonic() {
    let (mut run, _clock) = run_from(near_win(), vec![]);
    assert!(run.make_move(Direction::Left).is_accepted());
    assert!(run.has_won());

    for dir in [Direction::Down, Direction::Right, Direction::Up, Direction::Left] {
        run.make_move(dir);
        assert!(run.has_won());
    }
}

#[test]
fn test_submitted_run_rejects_moves() {
    let (mut run, _clock) = run_from(near_win(), vec![]);
    assert!(run.make_move(Direction::Left).is_accepted());

    assert!(run.mark_submitted());
    assert!(!run.mark_submitted(), "cannot submit twice");
    assert!(run.completion().is_none());
    assert_eq!(
        run.make_move(Direction::Down),
        MoveOutcome::Rejected(MoveRejection::AlreadySubmitted)
    );
}

#[test]
fn test_unwon_run_cannot_be_submitted() {
    let (mut run, _clock) = run_from([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]], vec![]);
    assert!(run.completion().is_none());
    assert!(!run.mark_submitted());
}

#[test]
fn test_loss_blocks_further_moves() {
    // One empty cell; sliding left and spawning a 2 leaves no merges.
    let rows = [
        [0, 2, 4, 8],
        [4, 8, 16, 32],
        [8, 16, 32, 64],
        [4, 8, 16, 32],
    ];
    let (mut run, _clock) = run_from(rows, vec![(0, 2)]);

    let outcome = run.make_move(Direction::Left);
    assert!(matches!(outcome, MoveOutcome::Accepted { lost: true, .. }));
    assert_eq!(run.phase(), RunPhase::Lost);

    for dir in Direction::ALL {
        assert_eq!(run.make_move(dir), MoveOutcome::Rejected(MoveRejection::Lost));
    }
    assert_eq!(run.move_count(), 1);
}

#[test]
fn test_start_draws_initial_tiles_from_source() {
    let tiles = ScriptedTiles::new([(15, 2), (0, 2)]);
    let run = Run::start_with_clock(token(), tiles, ManualClock::new());
    assert_eq!(run.board().get(3, 3), 2);
    assert_eq!(run.board().get(0, 0), 2);
    assert_eq!(run.move_count(), 0);
}
