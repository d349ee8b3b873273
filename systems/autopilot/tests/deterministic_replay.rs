use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use gridsnake_core::{
    config::{SessionConfig, SnakeSpawn},
    CellCoord, Command, Controller, Event, Occupant, Personality, SnakeSnapshot, Temperament,
    Topology, Transition,
};
use gridsnake_system_autopilot::Autopilot;
use gridsnake_world::{self as world, query, World};

const TICKS: usize = 300;

#[test]
fn deterministic_replay_produces_identical_runs() {
    for topology in [Topology::square(16, 12), Topology::hexagonal(7)] {
        let first = replay(topology);
        let second = replay(topology);

        assert_eq!(first, second, "replay diverged between runs on {topology:?}");
        assert!(
            first.consumed > 0,
            "autopilot never reached an item on {topology:?}"
        );
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ReplayOutcome {
    snakes: Vec<SnakeSnapshot>,
    consumed: usize,
    ticks: u64,
    fingerprint: u64,
}

fn replay(topology: Topology) -> ReplayOutcome {
    let mut config = SessionConfig::with_topology(topology);
    config.seed = 2024;
    config.autopilot_snakes = 2;
    config.items.food.max_live = 2;
    config.rival_temperaments = vec![
        Temperament::new(Personality::Cautious, 100),
        Temperament::new(Personality::Aggressive, 80),
    ];
    config.snakes = vec![SnakeSpawn {
        head: topology.center(),
        direction: topology.default_direction(),
        length: None,
        controller: Controller::Autopilot,
        temperament: Temperament::default(),
    }];

    let mut autopilot = Autopilot::with_seed(config.seed);
    let mut world = World::new_session(config).expect("session");
    assert_consistent(&world);
    let mut hasher = DefaultHasher::new();
    let mut consumed = 0;

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::RequestTransition {
            transition: Transition::Start,
        },
        &mut events,
    );

    for _ in 0..TICKS {
        let mut commands = Vec::new();
        autopilot.handle(
            &events,
            &query::snake_view(&world),
            query::occupancy_view(&world),
            &query::item_view(&world),
            &mut commands,
        );

        let mut steering_events = Vec::new();
        for command in commands {
            world::apply(&mut world, command, &mut steering_events);
        }

        let Ok(report) = world.tick(None) else {
            break;
        };
        assert_consistent(&world);
        for change in &report.grid_delta {
            change.cell.hash(&mut hasher);
            change.occupant.hash(&mut hasher);
        }
        consumed += report
            .events
            .iter()
            .filter(|event| matches!(event, Event::ItemConsumed { .. }))
            .count();
        events = steering_events;
        events.extend(report.events);
    }

    let snakes = query::snake_view(&world).into_vec();
    for snake in &snakes {
        snake.body.iter().for_each(|cell: &CellCoord| cell.hash(&mut hasher));
        snake.direction.hash(&mut hasher);
    }

    ReplayOutcome {
        snakes,
        consumed,
        ticks: query::tick_index(&world),
        fingerprint: hasher.finish(),
    }
}

/// Checks that snake bodies and the occupancy grid agree with each other.
fn assert_consistent(world: &World) {
    let grid = query::occupancy_view(world);
    let mut body_cells = 0;
    for snake in query::snake_view(world).iter().filter(|snake| snake.alive) {
        for (position, cell) in snake.body.iter().enumerate() {
            assert!(
                !snake.body[..position].contains(cell),
                "snake {:?} occupies {cell:?} twice",
                snake.id
            );
            assert_eq!(
                grid.occupant(*cell),
                Some(Occupant::Segment(snake.id)),
                "grid disagrees with snake {:?} at {cell:?}",
                snake.id
            );
        }
        body_cells += snake.len();
    }

    let segment_cells = grid
        .iter()
        .filter(|(_, occupant)| matches!(occupant, Occupant::Segment(_)))
        .count();
    assert_eq!(segment_cells, body_cells);
    assert_eq!(query::empty_cell_count(world), grid.empty_count());
}
