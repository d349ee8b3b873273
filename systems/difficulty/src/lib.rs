#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Score-driven difficulty ladder.
//!
//! The primary snake's score selects one of ten levels. Each level speeds up
//! the external frame loop and raises the value of food, which the system
//! pushes into the world through [`Command::SetItemPoints`] once the primary
//! climbs past the first level.

use std::time::Duration;

use gridsnake_core::{Command, Event, ItemKind, SnakeId};
use tracing::info;

/// One rung of the difficulty ladder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Level {
    /// Display name of the level.
    pub name: &'static str,
    /// Lowest score that reaches the level.
    pub threshold: u32,
    /// Factor applied to the base tick rate.
    pub speed_multiplier: f32,
    /// Points awarded for each food item.
    pub food_points: u32,
}

/// Levels in ascending threshold order.
pub static LEVELS: [Level; 10] = [
    level("Beginner", 0, 1.0, 10),
    level("Easy", 50, 1.2, 10),
    level("Normal", 100, 1.4, 15),
    level("Medium", 150, 1.6, 15),
    level("Hard", 250, 1.8, 20),
    level("Very Hard", 400, 2.0, 20),
    level("Expert", 600, 2.3, 25),
    level("Master", 800, 2.6, 25),
    level("Legendary", 1000, 3.0, 30),
    level("Impossible", 1500, 3.5, 30),
];

const fn level(
    name: &'static str,
    threshold: u32,
    speed_multiplier: f32,
    food_points: u32,
) -> Level {
    Level {
        name,
        threshold,
        speed_multiplier,
        food_points,
    }
}

/// Pure system that tracks the primary score and adjusts item values.
#[derive(Debug, Default)]
pub struct Difficulty {
    score: u32,
    level: usize,
}

impl Difficulty {
    /// Creates a tracker at the first level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and emits a point update whenever the level changes.
    ///
    /// A session reset rebuilds the world with its configured item rules, so
    /// the ladder drops back to the first level without emitting anything.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SessionReset { .. } => {
                    self.score = 0;
                    self.level = 0;
                }
                Event::ItemConsumed { snake, points, .. } if *snake == SnakeId::PRIMARY => {
                    self.score = self.score.saturating_add(*points);
                }
                _ => {}
            }
        }

        let level = level_for(self.score);
        if level != self.level {
            self.level = level;
            let current = self.level();
            info!(level = current.name, score = self.score, "difficulty changed");
            out.push(Command::SetItemPoints {
                kind: ItemKind::Food,
                points: current.food_points,
            });
        }
    }

    /// Score observed for the primary snake.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Level currently in force.
    #[must_use]
    pub fn level(&self) -> &'static Level {
        &LEVELS[self.level.min(LEVELS.len() - 1)]
    }

    /// Fraction of the way from the current threshold to the next, in `[0, 1]`.
    ///
    /// The final level always reports `1.0`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        let Some(next) = LEVELS.get(self.level + 1) else {
            return 1.0;
        };
        let current = self.level();
        let span = next.threshold - current.threshold;
        let gained = self.score.saturating_sub(current.threshold);
        (gained as f32 / span as f32).clamp(0.0, 1.0)
    }

    /// Delay between ticks for a loop whose beginner delay is `base`.
    #[must_use]
    pub fn tick_interval(&self, base: Duration) -> Duration {
        let nanos = base.as_nanos() as f64 / f64::from(self.level().speed_multiplier);
        Duration::from_nanos(nanos as u64)
    }
}

/// Index of the highest level whose threshold the score has reached.
#[must_use]
pub fn level_for(score: u32) -> usize {
    LEVELS
        .iter()
        .rposition(|level| score >= level.threshold)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_select_levels() {
        assert_eq!(level_for(0), 0);
        assert_eq!(level_for(49), 0);
        assert_eq!(level_for(50), 1);
        assert_eq!(level_for(399), 4);
        assert_eq!(level_for(400), 5);
        assert_eq!(level_for(1499), 8);
        assert_eq!(level_for(u32::MAX), 9);
    }

    #[test]
    fn ladder_is_monotonic() {
        for pair in LEVELS.windows(2) {
            assert!(pair[0].threshold < pair[1].threshold);
            assert!(pair[0].speed_multiplier < pair[1].speed_multiplier);
            assert!(pair[0].food_points <= pair[1].food_points);
        }
    }
}
