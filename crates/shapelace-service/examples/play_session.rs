//! Walks a user through a two-puzzle level, printing each pipeline step.
//!
//! Run with logging enabled to watch the service's lifecycle events:
//!
//! ```console
//! RUST_LOG=info cargo run -p shapelace-service --example play_session
//! ```

use std::collections::{BTreeMap, BTreeSet};

use shapelace_core::{
    AchievementId, Cell, Coord, Difficulty, GridTemplate, LevelId, Puzzle, PuzzleId, Scoring,
    ShapeId, UserId,
};
use shapelace_progress::{Achievement, Level, LevelSlot, Requirement, RequirementKind};
use shapelace_service::{Capabilities, PlatformService, Role};
use shapelace_store::MemoryStore;

const CIRCLE: ShapeId = ShapeId::new(1);
const SQUARE: ShapeId = ShapeId::new(2);
const STAR: ShapeId = ShapeId::new(3);

fn puzzle(id: u64) -> Result<Puzzle, Box<dyn std::error::Error>> {
    let template = GridTemplate::new(
        3,
        vec![
            vec![Cell::Fixed(CIRCLE), Cell::Empty, Cell::Fixed(SQUARE)],
            vec![Cell::Empty, Cell::Blank, Cell::Empty],
            vec![Cell::Fixed(STAR), Cell::Empty, Cell::Blank],
        ],
        Difficulty::Easy,
    )?;
    let solution = BTreeMap::from([
        (Coord::new(1, 1), SQUARE),
        (Coord::new(2, 2), CIRCLE),
    ]);
    Ok(Puzzle::new(
        PuzzleId::new(id),
        template,
        BTreeSet::from([CIRCLE, SQUARE, STAR]),
        solution,
        Scoring::new(10, 5),
        10,
    )?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let service = PlatformService::new(MemoryStore::new());
    let admin = Capabilities::for_role(Role::Admin);

    // Author a level with two puzzles and a pair of achievements.
    service.register_level(
        admin,
        Level {
            id: LevelId::new(1),
            number: 1,
            name: "Warmup".into(),
            puzzles_required: 2,
            is_active: true,
        },
    )?;
    service.register_level(
        admin,
        Level {
            id: LevelId::new(2),
            number: 2,
            name: "Patterns".into(),
            puzzles_required: 3,
            is_active: true,
        },
    )?;
    for (id, order) in [(1, 1), (2, 2)] {
        service.register_puzzle(admin, puzzle(id)?)?;
        service.assign_puzzle_to_level(
            admin,
            LevelSlot {
                level: LevelId::new(1),
                puzzle: PuzzleId::new(id),
                order_in_level: order,
            },
        )?;
    }
    service.register_achievement(
        admin,
        Achievement {
            id: AchievementId::new(1),
            name: "First Win".into(),
            description: "Complete your first puzzle".into(),
            points_reward: 50,
            requirement: Requirement::new(RequirementKind::PuzzlesSolved, 1),
            is_active: true,
        },
    )?;
    service.register_achievement(
        admin,
        Achievement {
            id: AchievementId::new(2),
            name: "Flawless".into(),
            description: "Finish two puzzles in a row without a mistake".into(),
            points_reward: 100,
            requirement: Requirement::new(RequirementKind::Streak, 2),
            is_active: true,
        },
    )?;

    let user = UserId::new(1);
    service.register_user(user)?;

    // First puzzle: place one shape, check progress, ask for a hint.
    service.start_attempt(user, PuzzleId::new(1))?;
    let partial = BTreeMap::from([(Coord::new(1, 1), SQUARE)]);
    let live = service.validate_placement(PuzzleId::new(1), &partial)?;
    println!(
        "live check: {}/{} correct, accuracy {}%",
        live.correct_count, live.total_blanks, live.accuracy
    );
    service.save_attempt_state(user, PuzzleId::new(1), partial)?;

    if let Some(hint) = service.hint(user, PuzzleId::new(1))? {
        println!("hint: place shape {} at {}", hint.shape, hint.coord);
    }

    let full = BTreeMap::from([
        (Coord::new(1, 1), SQUARE),
        (Coord::new(2, 2), CIRCLE),
    ]);
    let report = service.finalize_attempt(user, PuzzleId::new(1), Some(full.clone()))?;
    println!(
        "puzzle 1 finalized: score {} accuracy {}%, achievements {:?}",
        report.score, report.accuracy, report.granted_achievements
    );
    println!("level 2 unlocked: {}", service.is_level_unlocked(user, 2)?);

    // Second puzzle completes the level and cascades the unlock.
    service.start_attempt(user, PuzzleId::new(2))?;
    let report = service.finalize_attempt(user, PuzzleId::new(2), Some(full))?;
    if let Some(level) = &report.level {
        println!(
            "level {} progress: {}/{} ({}%), completed: {}",
            level.level_number,
            level.puzzles_completed,
            level.puzzles_required,
            level.completion_percentage,
            level.is_completed
        );
    }
    println!("achievements: {:?}", report.granted_achievements);
    println!("level 2 unlocked: {}", service.is_level_unlocked(user, 2)?);

    Ok(())
}
