//! Session configuration loading and command-line overrides.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::ValueEnum;
use gridsnake_core::{
    config::{GameMode, SessionConfig, SnakeSpawn},
    Controller, Temperament, Topology,
};

const DEFAULT_WIDTH: u32 = 20;
const DEFAULT_HEIGHT: u32 = 15;
const DEFAULT_RADIUS: u32 = 7;

/// Board shape selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum TopologyKind {
    /// Rectangular board with four headings.
    Square,
    /// Hexagon-shaped board with six headings.
    Hexagonal,
}

/// Rules for ending a match, selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeKind {
    /// Ends when the primary snake is terminated.
    Classic,
    /// Colliding snakes are both eliminated; the last one alive wins.
    Survival,
    /// Highest score when the tick limit runs out wins.
    ScoreRace,
    /// Only the striking snake is eliminated; the last one alive wins.
    FreeForAll,
}

impl From<ModeKind> for GameMode {
    fn from(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Classic => Self::Classic,
            ModeKind::Survival => Self::Survival,
            ModeKind::ScoreRace => Self::ScoreRace,
            ModeKind::FreeForAll => Self::FreeForAll,
        }
    }
}

/// Flag values that take precedence over the configuration file.
#[derive(Clone, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) topology: Option<TopologyKind>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) radius: Option<u32>,
    pub(crate) seed: Option<u64>,
    pub(crate) autopilot_snakes: Option<u32>,
    pub(crate) autopilot: bool,
    pub(crate) mode: Option<ModeKind>,
    pub(crate) tick_limit: Option<u64>,
}

/// Reads a session configuration from a TOML file.
pub(crate) fn load(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid session config in {}", path.display()))
}

fn parse(contents: &str) -> Result<SessionConfig> {
    toml::from_str(contents).context("failed to parse session config toml contents")
}

/// Folds the flag overrides into `config`.
pub(crate) fn apply_overrides(mut config: SessionConfig, overrides: &Overrides) -> SessionConfig {
    config.topology = resolve_topology(config.topology, overrides);
    if let Some(seed) = overrides.seed {
        config.seed = seed;
    }
    if let Some(count) = overrides.autopilot_snakes {
        config.autopilot_snakes = count;
    }
    if let Some(mode) = overrides.mode {
        config.mode = mode.into();
    }
    if let Some(limit) = overrides.tick_limit {
        config.tick_limit = Some(limit);
    }
    if overrides.autopilot {
        match config.snakes.first_mut() {
            Some(primary) => primary.controller = Controller::Autopilot,
            None => config.snakes.push(SnakeSpawn {
                head: config.topology.center(),
                direction: config.topology.default_direction(),
                length: None,
                controller: Controller::Autopilot,
                temperament: Temperament::default(),
            }),
        }
    }
    config
}

fn resolve_topology(current: Topology, overrides: &Overrides) -> Topology {
    let kind = overrides.topology.unwrap_or(match current {
        Topology::Square { .. } => TopologyKind::Square,
        Topology::Hexagonal { .. } => TopologyKind::Hexagonal,
    });

    match (kind, current) {
        (TopologyKind::Square, Topology::Square { width, height }) => Topology::square(
            overrides.width.unwrap_or(width),
            overrides.height.unwrap_or(height),
        ),
        (TopologyKind::Square, Topology::Hexagonal { .. }) => Topology::square(
            overrides.width.unwrap_or(DEFAULT_WIDTH),
            overrides.height.unwrap_or(DEFAULT_HEIGHT),
        ),
        (TopologyKind::Hexagonal, Topology::Hexagonal { radius }) => {
            Topology::hexagonal(overrides.radius.unwrap_or(radius))
        }
        (TopologyKind::Hexagonal, Topology::Square { .. }) => {
            Topology::hexagonal(overrides.radius.unwrap_or(DEFAULT_RADIUS))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsnake_core::{CellCoord, Direction};

    #[test]
    fn empty_overrides_keep_file_values() {
        let config = parse("seed = 9\n[topology]\nkind = \"hexagonal\"\nradius = 4\n")
            .expect("config parses");
        let merged = apply_overrides(config.clone(), &Overrides::default());
        assert_eq!(merged, config);
    }

    #[test]
    fn switching_topology_uses_flag_dimensions() {
        let overrides = Overrides {
            topology: Some(TopologyKind::Hexagonal),
            radius: Some(5),
            ..Overrides::default()
        };
        let merged = apply_overrides(SessionConfig::default(), &overrides);
        assert_eq!(merged.topology, Topology::hexagonal(5));

        let overrides = Overrides {
            topology: Some(TopologyKind::Square),
            width: Some(8),
            ..Overrides::default()
        };
        let merged = apply_overrides(
            SessionConfig::with_topology(Topology::hexagonal(3)),
            &overrides,
        );
        assert_eq!(merged.topology, Topology::square(8, 15));
    }

    #[test]
    fn dimension_flags_resize_current_topology() {
        let overrides = Overrides {
            height: Some(30),
            ..Overrides::default()
        };
        let merged = apply_overrides(SessionConfig::default(), &overrides);
        assert_eq!(merged.topology, Topology::square(20, 30));
    }

    #[test]
    fn autopilot_flag_hands_primary_to_autopilot() {
        let overrides = Overrides {
            topology: Some(TopologyKind::Hexagonal),
            autopilot: true,
            seed: Some(3),
            autopilot_snakes: Some(2),
            ..Overrides::default()
        };
        let merged = apply_overrides(SessionConfig::default(), &overrides);
        assert_eq!(merged.seed, 3);
        assert_eq!(merged.autopilot_snakes, 2);
        assert_eq!(
            merged.snakes,
            vec![SnakeSpawn {
                head: CellCoord::new(0, 0),
                direction: Direction::SouthEast,
                length: None,
                controller: Controller::Autopilot,
                temperament: Temperament::default(),
            }]
        );

        let mut config = SessionConfig::default();
        config.snakes.push(SnakeSpawn {
            head: CellCoord::new(4, 4),
            direction: Direction::North,
            length: Some(2),
            controller: Controller::Player,
            temperament: Temperament::default(),
        });
        let overrides = Overrides {
            autopilot: true,
            ..Overrides::default()
        };
        let merged = apply_overrides(config, &overrides);
        assert_eq!(merged.snakes.len(), 1);
        assert_eq!(merged.snakes[0].controller, Controller::Autopilot);
    }

    #[test]
    fn mode_flags_replace_file_values() {
        let config = parse("mode = \"survival\"\n").expect("config parses");
        assert_eq!(config.mode, GameMode::Survival);

        let overrides = Overrides {
            mode: Some(ModeKind::ScoreRace),
            tick_limit: Some(90),
            ..Overrides::default()
        };
        let merged = apply_overrides(config, &overrides);
        assert_eq!(merged.mode, GameMode::ScoreRace);
        assert_eq!(merged.tick_limit, Some(90));
    }

    #[test]
    fn bundled_hexagonal_config_parses() {
        let config = parse(include_str!("../../../config/hexagonal.toml")).expect("config parses");
        assert_eq!(config.topology, Topology::hexagonal(8));
        assert_eq!(config.autopilot_snakes, 2);
        assert_eq!(config.obstacles.len(), 3);
        assert_eq!(config.snakes[0].controller, Controller::Autopilot);
        assert_eq!(config.items.capacity(), 3);
        assert_eq!(config.mode, GameMode::FreeForAll);
        assert_eq!(config.rival_temperaments.len(), 2);
    }

    #[test]
    fn unknown_keys_are_reported() {
        let error = parse("speed = 3\n").expect_err("unknown key rejected");
        assert!(error.to_string().contains("session config"));
    }
}
