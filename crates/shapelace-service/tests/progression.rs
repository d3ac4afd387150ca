//! End-to-end tests of the completion pipeline.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    thread,
};

use shapelace_core::{
    AchievementId, Cell, Coord, Difficulty, GridTemplate, LevelId, Placements, Puzzle, PuzzleId,
    Scoring, ShapeId, UserId,
};
use shapelace_progress::{Achievement, Level, LevelSlot, Requirement, RequirementKind};
use shapelace_service::{Capabilities, PlatformService, Role, ServiceError};
use shapelace_store::{MemoryStore, PlatformStore, StoreError};

const USER: UserId = UserId::new(1);
const SHAPE_X: ShapeId = ShapeId::new(1);
const SHAPE_Y: ShapeId = ShapeId::new(2);

/// Single-blank puzzle solved by `SHAPE_X`, worth `points` when correct.
fn puzzle(id: u64, points: u32) -> Puzzle {
    let template = GridTemplate::new(
        3,
        vec![
            vec![Cell::Fixed(SHAPE_X), Cell::Empty, Cell::Empty],
            vec![Cell::Empty, Cell::Blank, Cell::Empty],
            vec![Cell::Empty, Cell::Empty, Cell::Fixed(SHAPE_Y)],
        ],
        Difficulty::Easy,
    )
    .unwrap();
    Puzzle::new(
        PuzzleId::new(id),
        template,
        BTreeSet::from([SHAPE_X, SHAPE_Y]),
        BTreeMap::from([(Coord::new(1, 1), SHAPE_X)]),
        Scoring::new(points, 5),
        30,
    )
    .unwrap()
}

fn level(id: u64, number: u32, required: u32) -> Level {
    Level {
        id: LevelId::new(id),
        number,
        name: format!("Level {number}"),
        puzzles_required: required,
        is_active: true,
    }
}

fn solved() -> Placements {
    BTreeMap::from([(Coord::new(1, 1), SHAPE_X)])
}

/// Two levels of two puzzles each (50- and 30-point solves in level 1),
/// plus one registered user.
fn platform() -> PlatformService<MemoryStore> {
    let service = PlatformService::new(MemoryStore::new());
    let admin = Capabilities::for_role(Role::Admin);

    service.register_level(admin, level(1, 1, 2)).unwrap();
    service.register_level(admin, level(2, 2, 2)).unwrap();

    for (puzzle_id, points, level_id, order) in
        [(1, 50, 1, 1), (2, 30, 1, 2), (3, 40, 2, 1), (4, 40, 2, 2)]
    {
        service.register_puzzle(admin, puzzle(puzzle_id, points)).unwrap();
        service
            .assign_puzzle_to_level(
                admin,
                LevelSlot {
                    level: LevelId::new(level_id),
                    puzzle: PuzzleId::new(puzzle_id),
                    order_in_level: order,
                },
            )
            .unwrap();
    }

    service.register_user(USER).unwrap();
    service
}

fn play_and_finalize(
    service: &PlatformService<MemoryStore>,
    puzzle_id: u64,
) -> shapelace_service::FinalizeReport {
    service.start_attempt(USER, PuzzleId::new(puzzle_id)).unwrap();
    service
        .finalize_attempt(USER, PuzzleId::new(puzzle_id), Some(solved()))
        .unwrap()
}

#[test]
fn completing_level_quota_unlocks_next_level() {
    let service = platform();

    let first = play_and_finalize(&service, 1);
    assert_eq!(first.score, 50);
    let progress = first.level.expect("puzzle 1 sits in level 1");
    assert_eq!(progress.puzzles_completed, 1);
    assert!(!progress.is_completed);
    assert!(!service.is_level_unlocked(USER, 2).unwrap());

    let second = play_and_finalize(&service, 2);
    assert_eq!(second.score, 30);
    let progress = second.level.expect("puzzle 2 sits in level 1");
    assert_eq!(progress.puzzles_completed, 2);
    assert!(progress.is_completed);
    assert!(progress.newly_completed);

    // The cascade created level 2's progress row and the unlock rule sees
    // level 1 completed.
    assert!(service.is_level_unlocked(USER, 2).unwrap());
    let next_row = service
        .store()
        .progress(USER, LevelId::new(2))
        .unwrap()
        .expect("cascade creates the next level's row");
    assert_eq!(next_row.puzzles_completed(), 0);

    // Only the immediate next level unlocks.
    assert!(!service.is_level_unlocked(USER, 3).unwrap());

    // Level score accumulated both solves.
    let row = service
        .store()
        .progress(USER, LevelId::new(1))
        .unwrap()
        .unwrap();
    assert_eq!(row.total_score(), 80);
}

#[test]
fn replaying_a_credited_puzzle_does_not_double_count() {
    let service = platform();
    play_and_finalize(&service, 1);
    play_and_finalize(&service, 2);

    // Replay puzzle 2 from scratch.
    let replay = play_and_finalize(&service, 2);
    assert!(replay.newly_completed);
    let progress = replay.level.expect("slot still reports level state");
    assert_eq!(progress.puzzles_completed, 2);
    assert!(!progress.newly_completed);

    let row = service
        .store()
        .progress(USER, LevelId::new(1))
        .unwrap()
        .unwrap();
    assert_eq!(row.puzzles_completed(), 2);
    assert_eq!(row.total_score(), 80);
}

#[test]
fn duplicate_finalize_returns_stored_result_without_side_effects() {
    let service = platform();
    let first = play_and_finalize(&service, 1);
    assert!(first.newly_completed);

    let second = service
        .finalize_attempt(USER, PuzzleId::new(1), Some(solved()))
        .unwrap();
    assert!(!second.newly_completed);
    assert_eq!(second.score, first.score);
    assert_eq!(second.accuracy, first.accuracy);
    assert_eq!(second.status, first.status);
    assert_eq!(second.level, None);
    assert!(second.granted_achievements.is_empty());

    let row = service
        .store()
        .progress(USER, LevelId::new(1))
        .unwrap()
        .unwrap();
    assert_eq!(row.puzzles_completed(), 1);
}

#[test]
fn achievements_grant_exactly_once() {
    let service = platform();
    let admin = Capabilities::for_role(Role::Admin);
    service
        .register_achievement(
            admin,
            Achievement {
                id: AchievementId::new(1),
                name: "First Win".into(),
                description: "Complete a puzzle".into(),
                points_reward: 50,
                requirement: Requirement::new(RequirementKind::PuzzlesSolved, 1),
                is_active: true,
            },
        )
        .unwrap();
    service
        .register_achievement(
            admin,
            Achievement {
                id: AchievementId::new(2),
                name: "Point Collector".into(),
                description: "Reach 120 points".into(),
                points_reward: 25,
                requirement: Requirement::new(RequirementKind::ScoreReached, 120),
                is_active: true,
            },
        )
        .unwrap();

    let first = play_and_finalize(&service, 1);
    assert_eq!(first.granted_achievements, [AchievementId::new(1)]);

    // Re-running the evaluator grants nothing new: total is 50 + 50
    // (reward) = 100, short of the score threshold.
    assert!(service.evaluate_achievements(USER).unwrap().is_empty());

    // Second solve brings the total to 100 + 30 = 130, crossing it.
    let second = play_and_finalize(&service, 2);
    assert_eq!(second.granted_achievements, [AchievementId::new(2)]);
    assert!(service.evaluate_achievements(USER).unwrap().is_empty());
}

#[test]
fn free_play_puzzle_has_no_level_report() {
    let service = platform();
    let admin = Capabilities::for_role(Role::Admin);
    service.register_puzzle(admin, puzzle(99, 10)).unwrap();

    let report = play_and_finalize(&service, 99);
    assert!(report.newly_completed);
    assert_eq!(report.level, None);
}

#[test]
fn finalize_without_attempt_is_not_found() {
    let service = platform();
    let result = service.finalize_attempt(USER, PuzzleId::new(1), Some(solved()));
    assert_eq!(
        result.unwrap_err(),
        ServiceError::Store(StoreError::AttemptNotFound {
            user: USER,
            puzzle: PuzzleId::new(1)
        })
    );
}

#[test]
fn save_state_is_last_write_wins() {
    let service = platform();
    service.start_attempt(USER, PuzzleId::new(1)).unwrap();

    service
        .save_attempt_state(
            USER,
            PuzzleId::new(1),
            BTreeMap::from([(Coord::new(1, 1), SHAPE_Y)]),
        )
        .unwrap();
    service
        .save_attempt_state(USER, PuzzleId::new(1), BTreeMap::new())
        .unwrap();

    let attempt = service
        .store()
        .attempt(USER, PuzzleId::new(1))
        .unwrap()
        .unwrap();
    assert!(attempt.current_state().is_empty());
}

#[test]
fn wire_format_payload_round_trips_through_the_pipeline() {
    let service = platform();

    // A placement payload exactly as clients send it.
    let placements: Placements = serde_json::from_str(r#"{"1,1": 1}"#).unwrap();
    service.start_attempt(USER, PuzzleId::new(1)).unwrap();
    let report = service
        .finalize_attempt(USER, PuzzleId::new(1), Some(placements))
        .unwrap();
    assert_eq!(report.score, 50);
    assert_eq!(report.accuracy, 100.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "completed");
}

#[test]
fn concurrent_finalizes_credit_once() {
    let service = Arc::new(platform());
    service.start_attempt(USER, PuzzleId::new(1)).unwrap();
    service
        .save_attempt_state(USER, PuzzleId::new(1), solved())
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service
                    .finalize_attempt(USER, PuzzleId::new(1), None)
                    .unwrap()
            })
        })
        .collect();

    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let newly = reports.iter().filter(|r| r.newly_completed).count();
    assert_eq!(newly, 1, "exactly one finalize performs the scoring");
    assert!(reports.iter().all(|r| r.score == 50));

    let row = service
        .store()
        .progress(USER, LevelId::new(1))
        .unwrap()
        .unwrap();
    assert_eq!(row.puzzles_completed(), 1);
    assert_eq!(row.total_score(), 50);
}

#[test]
fn concurrent_level_completions_for_different_users_are_independent() {
    let service = Arc::new(platform());
    let other = UserId::new(2);
    service.register_user(other).unwrap();

    let handles: Vec<_> = [USER, other]
        .into_iter()
        .map(|user| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for puzzle_id in [1u64, 2] {
                    service.start_attempt(user, PuzzleId::new(puzzle_id)).unwrap();
                    service
                        .finalize_attempt(user, PuzzleId::new(puzzle_id), Some(solved()))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for user in [USER, other] {
        let row = service.store().progress(user, LevelId::new(1)).unwrap().unwrap();
        assert_eq!(row.puzzles_completed(), 2);
        assert!(row.is_completed());
        assert!(service.is_level_unlocked(user, 2).unwrap());
    }
}
