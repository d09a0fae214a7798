//! Tests for the submission pipeline against a real database.

use tempfile::NamedTempFile;

use strictly_scores::{
    ErrorKind, Identity, RankResult, RankingService, ScoreCandidate, ScoreRepository,
    SubmissionError, SubmissionPipeline,
};

fn setup() -> (NamedTempFile, SubmissionPipeline) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repo = ScoreRepository::new(db_path).expect("Failed to create repository");
    repo.initialize().expect("Migrations failed");
    (db_file, SubmissionPipeline::new(repo))
}

fn account(pipeline: &SubmissionPipeline, nickname: &str) -> Identity {
    let account = pipeline
        .repository()
        .create_account(nickname.to_string())
        .expect("Create failed");
    Identity::Account(*account.id())
}

fn candidate(n: u32, time: i64, moves: i64) -> ScoreCandidate {
    ScoreCandidate::new(
        format!("{:032x}", n),
        time,
        moves,
        vec![
            vec![2048, 8, 4, 2],
            vec![16, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 2, 0],
        ],
    )
}

fn submit(pipeline: &SubmissionPipeline, c: &ScoreCandidate, who: &Identity) -> RankResult {
    pipeline.submit(c, who).expect("Submission failed")
}

#[test]
fn test_first_ranked_submission() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");

    let result = submit(&pipeline, &candidate(1, 60_000, 700), &alice);
    assert_eq!(result.rank, Some(1));
    assert_eq!(result.total_entries, Some(1));
    assert_eq!(result.is_personal_best, Some(true));
}

#[test]
fn test_time_dominates_then_moves_break_ties() {
    let (_db, pipeline) = setup();
    let a = account(&pipeline, "a");
    let b = account(&pipeline, "b");
    let c = account(&pipeline, "c");

    let ra = submit(&pipeline, &candidate(1, 10_000, 80), &a);
    let rb = submit(&pipeline, &candidate(2, 10_000, 60), &b);
    let rc = submit(&pipeline, &candidate(3, 9_000, 200), &c);

    assert_eq!((ra.rank, ra.total_entries), (Some(1), Some(1)));
    assert_eq!((rb.rank, rb.total_entries), (Some(1), Some(2)));
    assert_eq!((rc.rank, rc.total_entries), (Some(1), Some(3)));

    let board = RankingService::new(pipeline.repository().clone())
        .leaderboard(None)
        .expect("Leaderboard failed");
    let names: Vec<&str> = board.iter().map(|e| e.nickname.as_str()).collect();
    assert_eq!(names, vec!["c", "b", "a"]);
    let ranks: Vec<i64> = board.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn test_faster_run_is_personal_best_despite_more_moves() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");

    submit(&pipeline, &candidate(1, 20_000, 100), &alice);
    let result = submit(&pipeline, &candidate(2, 15_000, 150), &alice);
    assert_eq!(result.is_personal_best, Some(true));
    assert_eq!(result.rank, Some(1));
    assert_eq!(result.total_entries, Some(2));
}

#[test]
fn test_slower_run_is_not_personal_best() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    let bob = account(&pipeline, "bob");

    submit(&pipeline, &candidate(1, 20_000, 100), &alice);
    submit(&pipeline, &candidate(2, 25_000, 100), &bob);
    let result = submit(&pipeline, &candidate(3, 30_000, 60), &alice);
    assert_eq!(result.is_personal_best, Some(false));
    assert_eq!(result.rank, Some(3));
    assert_eq!(result.total_entries, Some(3));
}

#[test]
fn test_other_accounts_do_not_affect_personal_best() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    let bob = account(&pipeline, "bob");

    submit(&pipeline, &candidate(1, 8_000, 70), &bob);
    let result = submit(&pipeline, &candidate(2, 30_000, 300), &alice);
    assert_eq!(result.rank, Some(2));
    assert_eq!(result.is_personal_best, Some(true));
}

#[test]
fn test_duplicate_token_rejected() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    let c = candidate(7, 20_000, 100);

    submit(&pipeline, &c, &alice);
    let err = pipeline.submit(&c, &alice).expect_err("Duplicate accepted");
    assert_eq!(err.kind(), ErrorKind::DuplicateSubmission);
    assert!(matches!(err, SubmissionError::Duplicate { .. }));
    assert_eq!(pipeline.repository().count_scores().expect("Count failed"), 1);
}

#[test]
fn test_duplicate_token_from_another_identity_rejected() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    let c = candidate(7, 20_000, 100);

    submit(&pipeline, &c, &alice);
    let err = pipeline
        .submit(&c, &Identity::anonymous("198.51.100.4", "curl/8"))
        .expect_err("Duplicate accepted");
    assert_eq!(err.kind(), ErrorKind::DuplicateSubmission);
}

#[test]
fn test_concurrent_duplicates_store_one_record() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    let c = candidate(9, 20_000, 100);

    let results: Vec<Result<RankResult, SubmissionError>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pipeline = pipeline.clone();
                let c = c.clone();
                let alice = alice.clone();
                s.spawn(move || pipeline.submit(&c, &alice))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("Thread panicked"))
            .collect()
    });

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::DuplicateSubmission))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(pipeline.repository().count_scores().expect("Count failed"), 1);
}

#[test]
fn test_invalid_candidate_writes_nothing() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");

    let cases = [
        (candidate(1, 4_999, 60), ErrorKind::TimeTooShort),
        (candidate(2, 5_000, 49), ErrorKind::MoveCountTooLow),
        (
            ScoreCandidate::new("not-a-token".to_string(), 9_000, 90, vec![vec![2048; 4]; 4]),
            ErrorKind::InvalidSessionToken,
        ),
        (
            ScoreCandidate::new(format!("{:032x}", 3), 9_000, 90, vec![vec![2048; 4]; 3]),
            ErrorKind::InvalidBoardState,
        ),
        (
            ScoreCandidate::new(format!("{:032x}", 4), 9_000, 90, vec![vec![1024; 4]; 4]),
            ErrorKind::NoWinTile,
        ),
    ];

    for (c, kind) in cases {
        let err = pipeline.submit(&c, &alice).expect_err("Invalid accepted");
        assert_eq!(err.kind(), kind);
        assert!(err.kind().is_client_error());
    }
    assert_eq!(pipeline.repository().count_scores().expect("Count failed"), 0);
}

#[test]
fn test_exact_thresholds_accepted() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    let result = submit(&pipeline, &candidate(1, 5_000, 50), &alice);
    assert_eq!(result.rank, Some(1));
}

#[test]
fn test_guest_score_stored_but_unranked() {
    let (_db, pipeline) = setup();
    let guest = Identity::anonymous("203.0.113.7", "Mozilla/5.0");

    let result = submit(&pipeline, &candidate(1, 6_000, 60), &guest);
    assert_eq!(result, RankResult::unranked());
    assert_eq!(pipeline.repository().count_scores().expect("Count failed"), 1);

    let stored = pipeline
        .repository()
        .find_by_session_token(&format!("{:032x}", 1))
        .expect("Query failed")
        .expect("Record missing");
    assert_eq!(*stored.account_id(), None);
    assert_eq!(stored.identity_fingerprint(), &guest.fingerprint());

    let ranking = RankingService::new(pipeline.repository().clone());
    assert!(ranking.leaderboard(None).expect("Leaderboard failed").is_empty());
    assert!(ranking.history(&guest, None).expect("History failed").is_empty());
}

#[test]
fn test_guest_scores_do_not_count_toward_totals() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    submit(&pipeline, &candidate(1, 5_500, 55), &Identity::anonymous("a", "b"));

    let result = submit(&pipeline, &candidate(2, 40_000, 400), &alice);
    assert_eq!(result.rank, Some(1));
    assert_eq!(result.total_entries, Some(1));
}

#[test]
fn test_account_fingerprint_stored() {
    let (_db, pipeline) = setup();
    let alice = account(&pipeline, "alice");
    submit(&pipeline, &candidate(1, 9_000, 90), &alice);

    let stored = pipeline
        .repository()
        .find_by_session_token(&format!("{:032x}", 1))
        .expect("Query failed")
        .expect("Record missing");
    assert_eq!(*stored.account_id(), alice.account_id());
    assert_eq!(stored.identity_fingerprint(), &alice.fingerprint());
    assert_eq!(stored.board().expect("Board decode failed").max_tile(), 2048);
}

#[test]
fn test_unregistered_account_writes_nothing() {
    let (_db, pipeline) = setup();
    let err = pipeline
        .submit(&candidate(1, 9_000, 90), &Identity::Account(777))
        .expect_err("Unknown account accepted");
    assert_eq!(err.kind(), ErrorKind::UnknownAccount);
    assert!(err.kind().is_client_error());
    assert!(matches!(err, SubmissionError::UnknownAccount { account_id: 777 }));
    assert_eq!(pipeline.repository().count_scores().expect("Count failed"), 0);
}
