#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autopilot system that steers computer-controlled snakes toward items.
//!
//! Each autopilot snake keeps a cached plan toward the nearest item. Plans are
//! only recomputed when they run out, when the goal moves or when the next
//! planned cell stops being enterable, which bounds the per-tick search cost
//! when several autopilot snakes share a board. Without a route the snake
//! turns toward the neighbour with the most open space.
//!
//! A snake's [`Temperament`] shapes its choices. Balanced snakes only follow
//! a route into room at least as large as their body, cautious snakes want
//! twice that and keep clear of rival heads, aggressive snakes take any
//! route and hold their heading when none exists, and random snakes wander.
//! Below full skill a snake sometimes blunders into a random legal heading.

use std::collections::{BTreeMap, VecDeque};

use gridsnake_core::{
    CellCoord, Command, Controller, Direction, Event, Heading, ItemView, OccupancyView, Path,
    Personality, SnakeId, SnakeSnapshot, SnakeView, Temperament, Topology, Unreachable,
};
use gridsnake_system_pathfinding::Pathfinder;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Ticks an autopilot snake waits before retrying an unreachable goal.
pub const RETRY_COOLDOWN: u32 = 3;

const OPEN_AREA_LIMIT: usize = 256;

const DEFAULT_SEED: u64 = 0x5eed_a11e;

#[derive(Clone, Debug)]
enum Plan {
    Route {
        goal: CellCoord,
        steps: VecDeque<CellCoord>,
    },
    Unreachable {
        goal: CellCoord,
        cooldown: u32,
    },
}

/// Pure system that reacts to world events and emits steering commands.
#[derive(Debug)]
pub struct Autopilot {
    pathfinder: Pathfinder,
    plans: BTreeMap<SnakeId, Plan>,
    recomputations: u64,
    rng: ChaCha8Rng,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl Autopilot {
    /// Creates an autopilot with no cached plans.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an autopilot whose blunders and wandering follow `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            pathfinder: Pathfinder::default(),
            plans: BTreeMap::new(),
            recomputations: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Number of path searches performed since creation.
    #[must_use]
    pub const fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Consumes world events and immutable views to emit steering commands.
    ///
    /// Live autopilot snakes are processed in identifier order. A command is
    /// only emitted when the wanted heading differs from the buffered one.
    /// Snakes at full skill with a deliberate personality never draw from the
    /// random stream.
    pub fn handle(
        &mut self,
        events: &[Event],
        snakes: &SnakeView,
        grid: OccupancyView<'_>,
        items: &ItemView,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::SessionReset { .. } => self.plans.clear(),
                Event::SnakeTerminated { snake, .. } => {
                    let _ = self.plans.remove(snake);
                }
                _ => {}
            }
        }

        for snake in snakes.iter() {
            if !snake.alive || snake.controller != Controller::Autopilot {
                continue;
            }
            let Some(head) = snake.head() else {
                continue;
            };

            let temperament = snake.temperament;
            let direction = if temperament.personality == Personality::Random
                || self.blunders(temperament)
            {
                self.wander(snake, head, grid)
            } else {
                self.deliberate(snake, head, snakes, grid, items)
            };

            if let Some(direction) = direction {
                if direction != snake.buffered_direction {
                    out.push(Command::Steer {
                        snake: snake.id,
                        direction,
                    });
                }
            }
        }
    }

    /// Computes a route from the snake's head to `goal` on demand.
    ///
    /// Unknown or terminated snakes yield [`Unreachable`] starting at the goal.
    pub fn request_path(
        &mut self,
        snake: SnakeId,
        goal: CellCoord,
        snakes: &SnakeView,
        grid: OccupancyView<'_>,
    ) -> Result<Path, Unreachable> {
        let Some(head) = snakes
            .get(snake)
            .filter(|snapshot| snapshot.alive)
            .and_then(SnakeSnapshot::head)
        else {
            return Err(Unreachable { start: goal, goal });
        };
        self.recomputations += 1;
        self.pathfinder.find_path(grid, head, goal)
    }

    fn blunders(&mut self, temperament: Temperament) -> bool {
        let mistakes = temperament.mistake_percent();
        mistakes > 0 && self.rng.gen_range(0..100) < mistakes
    }

    /// Any legal heading, chosen uniformly.
    fn wander(
        &mut self,
        snake: &SnakeSnapshot,
        head: CellCoord,
        grid: OccupancyView<'_>,
    ) -> Option<Direction> {
        let options: Vec<Direction> = legal_headings(snake, head, grid)
            .map(|heading| heading.direction())
            .collect();
        options.choose(&mut self.rng).copied()
    }

    fn deliberate(
        &mut self,
        snake: &SnakeSnapshot,
        head: CellCoord,
        snakes: &SnakeView,
        grid: OccupancyView<'_>,
        items: &ItemView,
    ) -> Option<Direction> {
        let planned = match nearest_item(grid, head, items) {
            Some(goal) => self.planned_direction(snake.id, head, goal, grid),
            None => None,
        };
        if let Some(direction) = planned {
            if self.is_safe_step(snake, head, direction, snakes, grid) {
                return Some(direction);
            }
        }

        if snake.temperament.personality == Personality::Aggressive {
            let ahead = grid
                .topology()
                .heading(snake.direction)
                .map(|heading| head.translate(heading));
            if ahead.map_or(false, |cell| !grid.is_blocked(cell)) {
                return Some(snake.direction);
            }
        }
        self.escape_direction(snake, head, grid)
    }

    /// Whether the snake's personality accepts stepping toward `direction`.
    fn is_safe_step(
        &mut self,
        snake: &SnakeSnapshot,
        head: CellCoord,
        direction: Direction,
        snakes: &SnakeView,
        grid: OccupancyView<'_>,
    ) -> bool {
        let topology = grid.topology();
        let Some(heading) = topology.heading(direction) else {
            return false;
        };
        let next = head.translate(heading);
        let body = snake.len().max(1);
        match snake.temperament.personality {
            Personality::Aggressive | Personality::Random => true,
            Personality::Balanced => {
                self.pathfinder.open_area(grid, next, OPEN_AREA_LIMIT) >= body.min(OPEN_AREA_LIMIT)
            }
            Personality::Cautious => {
                let wanted = body.saturating_mul(2).min(OPEN_AREA_LIMIT);
                !near_rival_head(topology, snake.id, next, snakes)
                    && self.pathfinder.open_area(grid, next, OPEN_AREA_LIMIT) >= wanted
            }
        }
    }

    fn planned_direction(
        &mut self,
        snake: SnakeId,
        head: CellCoord,
        goal: CellCoord,
        grid: OccupancyView<'_>,
    ) -> Option<Direction> {
        let topology = grid.topology();
        let reuse = match self.plans.get_mut(&snake) {
            Some(Plan::Route {
                goal: planned,
                steps,
            }) if *planned == goal => {
                if let Some(reached) = steps.iter().position(|cell| *cell == head) {
                    let _ = steps.drain(..=reached);
                }
                steps.front().copied().filter(|next| {
                    topology.distance(head, *next) == 1
                        && (*next == goal || !grid.is_blocked(*next))
                })
            }
            Some(Plan::Unreachable {
                goal: planned,
                cooldown,
            }) if *planned == goal && *cooldown > 0 => {
                *cooldown -= 1;
                return None;
            }
            _ => None,
        };

        let next = match reuse {
            Some(next) => next,
            None => self.replan(snake, head, goal, grid)?,
        };
        topology.direction_between(head, next)
    }

    fn replan(
        &mut self,
        snake: SnakeId,
        head: CellCoord,
        goal: CellCoord,
        grid: OccupancyView<'_>,
    ) -> Option<CellCoord> {
        self.recomputations += 1;
        match self.pathfinder.find_path(grid, head, goal) {
            Ok(path) => {
                debug!(
                    snake = snake.get(),
                    ?goal,
                    steps = path.steps(),
                    expanded = self.pathfinder.last_expanded(),
                    "autopilot route planned"
                );
                let steps: VecDeque<CellCoord> = path.into_cells().into_iter().skip(1).collect();
                let next = steps.front().copied();
                let _ = self.plans.insert(snake, Plan::Route { goal, steps });
                next
            }
            Err(unreachable) => {
                debug!(snake = snake.get(), %unreachable, "autopilot goal unreachable");
                let _ = self.plans.insert(
                    snake,
                    Plan::Unreachable {
                        goal,
                        cooldown: RETRY_COOLDOWN,
                    },
                );
                None
            }
        }
    }

    /// Picks the legal neighbour with the largest reachable area.
    ///
    /// Ties go to the earlier direction in neighbour order.
    fn escape_direction(
        &mut self,
        snake: &SnakeSnapshot,
        head: CellCoord,
        grid: OccupancyView<'_>,
    ) -> Option<Direction> {
        let mut best: Option<(usize, Direction)> = None;

        for heading in legal_headings(snake, head, grid) {
            let cell = head.translate(heading);
            let area = self
                .pathfinder
                .open_area(grid, cell, OPEN_AREA_LIMIT)
                .max(1);
            if best.map_or(true, |(best_area, _)| area > best_area) {
                best = Some((area, heading.direction()));
            }
        }

        best.map(|(_, direction)| direction)
    }
}

/// Headings the snake may take next: the cell ahead is enterable and, for
/// bodies longer than one cell, the heading is not a reversal.
fn legal_headings<'a>(
    snake: &'a SnakeSnapshot,
    head: CellCoord,
    grid: OccupancyView<'a>,
) -> impl Iterator<Item = Heading> + 'a {
    let reverse = (snake.len() > 1).then(|| snake.direction.opposite());
    let tail_vacates = snake.len() > 1 && snake.pending_growth == 0;
    grid.topology().headings().filter(move |heading| {
        if Some(heading.direction()) == reverse {
            return false;
        }
        let cell = head.translate(*heading);
        !grid.is_blocked(cell) || (tail_vacates && snake.tail() == Some(cell))
    })
}

fn near_rival_head(topology: Topology, own: SnakeId, cell: CellCoord, snakes: &SnakeView) -> bool {
    snakes
        .iter()
        .filter(|other| other.alive && other.id != own)
        .filter_map(SnakeSnapshot::head)
        .any(|rival| topology.distance(cell, rival) <= 1)
}

/// Closest live item by topology distance; ties go to the lower item id.
fn nearest_item(grid: OccupancyView<'_>, head: CellCoord, items: &ItemView) -> Option<CellCoord> {
    let topology = grid.topology();
    items
        .iter()
        .min_by_key(|item| (topology.distance(head, item.cell), item.id))
        .map(|item| item.cell)
}
