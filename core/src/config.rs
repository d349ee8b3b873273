//! Session configuration records.
//!
//! The records deserialize from TOML with every field optional; missing
//! fields fall back to the classic 20×15 board with a single player snake.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Controller, Direction, ItemEffect, ItemKind, Temperament, Topology};

/// Seed used when the configuration does not provide one.
pub const DEFAULT_SEED: u64 = 0x5eed_0f_5a4e;

/// Everything needed to build a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Board shape.
    pub topology: Topology,
    /// Seed for the session's random stream.
    pub seed: u64,
    /// Segments a snake starts with when its spawn does not override it.
    pub initial_length: u32,
    /// Explicit snake placements. Empty means one player snake at the centre.
    pub snakes: Vec<SnakeSpawn>,
    /// Extra autopilot snakes placed on random free cells.
    pub autopilot_snakes: u32,
    /// Cells permanently blocked by walls.
    pub obstacles: Vec<CellCoord>,
    /// Scoring and population rules for items.
    pub items: ItemRules,
    /// Items pinned to exact cells when the session starts.
    pub initial_items: Vec<ItemPlacement>,
    /// Rule deciding when the session ends and who wins.
    pub mode: GameMode,
    /// Ticks a [`GameMode::ScoreRace`] lasts. Other modes ignore it.
    pub tick_limit: Option<u64>,
    /// Temperaments handed to the random autopilot snakes in turn.
    /// Empty gives every one of them the default temperament.
    pub rival_temperaments: Vec<Temperament>,
}

/// Rule deciding when a session ends and who wins it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// The session ends when the primary snake is terminated.
    #[default]
    Classic,
    /// Colliding snakes are both eliminated; the last snake alive wins.
    Survival,
    /// Highest score when the tick limit runs out wins.
    ScoreRace,
    /// The snake that runs into another is eliminated; the last snake alive wins.
    FreeForAll,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            topology: Topology::square(20, 15),
            seed: DEFAULT_SEED,
            initial_length: 3,
            snakes: Vec::new(),
            autopilot_snakes: 0,
            obstacles: Vec::new(),
            items: ItemRules::default(),
            initial_items: Vec::new(),
            mode: GameMode::Classic,
            tick_limit: None,
            rival_temperaments: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Creates the default configuration on the provided topology.
    #[must_use]
    pub fn with_topology(topology: Topology) -> Self {
        Self {
            topology,
            ..Self::default()
        }
    }
}

/// Placement of a single snake at session start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnakeSpawn {
    /// Cell occupied by the head.
    pub head: CellCoord,
    /// Initial heading. The body trails behind the head, opposite to it.
    pub direction: Direction,
    /// Overrides [`SessionConfig::initial_length`] when present.
    #[serde(default)]
    pub length: Option<u32>,
    /// Source of the snake's steering decisions.
    #[serde(default)]
    pub controller: Controller,
    /// Personality and skill used when the autopilot steers the snake.
    #[serde(default)]
    pub temperament: Temperament,
}

/// Rules for every item kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemRules {
    /// Rule for regular food.
    pub food: ItemRule,
    /// Rule for bonus items.
    pub bonus: ItemRule,
}

impl Default for ItemRules {
    fn default() -> Self {
        Self {
            food: ItemRule {
                points: 10,
                growth: 1,
                max_live: 1,
                effect: None,
            },
            bonus: ItemRule {
                points: 30,
                growth: 2,
                max_live: 0,
                effect: Some(ItemEffect::Haste),
            },
        }
    }
}

impl ItemRules {
    /// Rule that applies to the item kind.
    #[must_use]
    pub const fn rule(&self, kind: ItemKind) -> &ItemRule {
        match kind {
            ItemKind::Food => &self.food,
            ItemKind::Bonus => &self.bonus,
        }
    }

    /// Mutable access to the rule that applies to the item kind.
    pub fn rule_mut(&mut self, kind: ItemKind) -> &mut ItemRule {
        match kind {
            ItemKind::Food => &mut self.food,
            ItemKind::Bonus => &mut self.bonus,
        }
    }

    /// Total number of items that may be live at once.
    #[must_use]
    pub fn capacity(&self) -> usize {
        ItemKind::ALL
            .iter()
            .map(|kind| self.rule(*kind).max_live as usize)
            .sum()
    }
}

/// Scoring and population rule for one item kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemRule {
    /// Points awarded on consumption.
    pub points: u32,
    /// Segments the consuming snake grows by.
    pub growth: u32,
    /// Number of items of this kind kept on the board. Zero disables the kind.
    pub max_live: u32,
    /// Effect tag reported on consumption.
    #[serde(default)]
    pub effect: Option<ItemEffect>,
}

/// Item pinned to a cell at session start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemPlacement {
    /// Category of the item.
    pub kind: ItemKind,
    /// Cell holding the item.
    pub cell: CellCoord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Personality;

    #[test]
    fn empty_document_yields_defaults() {
        let config: SessionConfig = toml::from_str("").expect("parse");
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.topology, Topology::square(20, 15));
        assert_eq!(config.initial_length, 3);
        assert_eq!(config.items.capacity(), 1);
    }

    #[test]
    fn hexagonal_session_parses_from_toml() {
        let document = r#"
            seed = 7
            autopilot_snakes = 2

            [topology]
            kind = "hexagonal"
            radius = 6

            [[snakes]]
            head = { x = 1, y = -1 }
            direction = "south_east"

            [items.bonus]
            points = 50
            growth = 3
            max_live = 1
            effect = "slow"

            [[initial_items]]
            kind = "food"
            cell = { x = 2, y = -1 }
        "#;

        let config: SessionConfig = toml::from_str(document).expect("parse");
        assert_eq!(config.topology, Topology::hexagonal(6));
        assert_eq!(config.seed, 7);
        assert_eq!(config.autopilot_snakes, 2);
        assert_eq!(config.snakes.len(), 1);
        assert_eq!(config.snakes[0].direction, Direction::SouthEast);
        assert_eq!(config.snakes[0].controller, Controller::Player);
        assert_eq!(config.items.food, ItemRules::default().food);
        assert_eq!(config.items.bonus.effect, Some(ItemEffect::Slow));
        assert_eq!(config.items.capacity(), 2);
        assert_eq!(config.initial_items[0].cell, CellCoord::new(2, -1));
    }

    #[test]
    fn configuration_round_trips_through_toml() {
        let mut config = SessionConfig::with_topology(Topology::square(8, 6));
        config.obstacles = vec![CellCoord::new(1, 1), CellCoord::new(2, 1)];
        config.snakes.push(SnakeSpawn {
            head: CellCoord::new(4, 3),
            direction: Direction::West,
            length: Some(4),
            controller: Controller::Autopilot,
            temperament: Temperament::new(Personality::Cautious, 60),
        });
        config.mode = GameMode::ScoreRace;
        config.tick_limit = Some(120);
        config.rival_temperaments = vec![Temperament::default()];

        let text = toml::to_string(&config).expect("serialize");
        let restored: SessionConfig = toml::from_str(&text).expect("parse");
        assert_eq!(restored, config);
    }

    #[test]
    fn game_mode_and_temperaments_parse_from_toml() {
        let document = r#"
            mode = "survival"
            autopilot_snakes = 3
            rival_temperaments = [
                { personality = "aggressive" },
                { personality = "random", skill = 40 },
            ]

            [[snakes]]
            head = { x = 3, y = 3 }
            direction = "north"
            controller = "autopilot"
            temperament = { personality = "cautious", skill = 80 }
        "#;

        let config: SessionConfig = toml::from_str(document).expect("parse");
        assert_eq!(config.mode, GameMode::Survival);
        assert_eq!(config.tick_limit, None);
        assert_eq!(
            config.rival_temperaments,
            vec![
                Temperament::new(Personality::Aggressive, 100),
                Temperament::new(Personality::Random, 40),
            ]
        );
        assert_eq!(
            config.snakes[0].temperament,
            Temperament::new(Personality::Cautious, 80)
        );
        assert!(toml::from_str::<SessionConfig>("mode = \"cooperative\"").is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<SessionConfig>("grid_size = 4").is_err());
    }
}
