//! Scoring, leveling, and badge policy.
//!
//! Level tiers and badge tiers deliberately use different thresholds; the
//! product shipped that way and downstream displays depend on it, so both
//! tables are kept side by side instead of unified.

use crate::session::LearningMode;

/// Points granted for every correctly answered question.
pub const POINTS_PER_CORRECT_ANSWER: u64 = 10;

/// Badge names with the running point total that earns them.
pub const BADGE_TIERS: [(u64, &str); 3] = [
    (100, "Starter"),
    (500, "Lernprofi"),
    (1000, "Quiz-König"),
];

/// Flat bonus granted once when a session's working set is fully traversed.
pub fn completion_bonus(mode: LearningMode) -> u64 {
    match mode {
        LearningMode::Practice => 50,
        LearningMode::Exam => 100,
        LearningMode::Repeat => 75,
    }
}

/// Level tier derived from the persisted point total. Never stored.
pub fn level_for_points(points: u64) -> u8 {
    if points >= 1500 {
        4
    } else if points >= 1000 {
        3
    } else if points >= 500 {
        2
    } else {
        1
    }
}

/// Badges a running point total qualifies for, lowest tier first.
pub fn badges_for_points(points: u64) -> impl Iterator<Item = &'static str> {
    BADGE_TIERS
        .into_iter()
        .filter(move |(threshold, _)| points >= *threshold)
        .map(|(_, name)| name)
}
