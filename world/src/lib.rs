#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for the grid snake engine.
//!
//! The [`World`] owns the occupancy grid, every snake, the item arena and the
//! play-state machine. Adapters drive it either through [`World::tick`] or by
//! submitting [`Command`]s to [`apply`]; both paths append [`Event`]s that
//! systems consume on the next frame. Read access goes through [`query`].

mod grid;
mod items;
mod snake;

use gridsnake_core::{
    config::{GameMode, ItemRules, SessionConfig, SnakeSpawn},
    CellChange, CellCoord, Command, Controller, Direction, Event, GridError, ItemKind, Occupant,
    PlayState, SnakeId, SnakeView, Standing, Steering, Temperament, TerminationCause, TickOutcome,
    Topology, Transition, Verdict,
};
use gridsnake_system_collision::resolve;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    grid::Grid,
    items::{Item, ItemArena},
    snake::Snake,
};

const PLACEMENT_ATTEMPTS: usize = 64;

/// Reasons a session cannot be built from its configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The topology is empty or exceeds the supported extent.
    #[error("topology {topology:?} is not playable")]
    InvalidTopology {
        /// Offending topology.
        topology: Topology,
    },
    /// A snake was configured with a heading its topology lacks.
    #[error("direction {direction:?} is not supported by the topology")]
    UnsupportedHeading {
        /// Offending direction.
        direction: Direction,
    },
    /// A snake segment would lie off the board.
    #[error("snake cell {cell:?} lies outside the grid")]
    SpawnOutOfBounds {
        /// First offending cell.
        cell: CellCoord,
    },
    /// A snake was configured with no segments.
    #[error("snakes need at least one segment")]
    InitialLengthZero,
    /// A snake was configured with more segments than the board has cells.
    #[error("snake length {length} exceeds the {cells} cells of the board")]
    SnakeTooLong {
        /// Requested number of segments.
        length: u32,
        /// Cells on the board.
        cells: usize,
    },
    /// A score race was configured without a positive tick limit.
    #[error("score race sessions need a positive tick limit")]
    MissingTickLimit,
    /// Two configured entities claim the same cell.
    #[error("cell {cell:?} is claimed twice")]
    Overlap {
        /// Contested cell.
        cell: CellCoord,
    },
    /// No free run of cells could be found for an autopilot snake.
    #[error("no room left to place a snake")]
    NoRoomForSnake,
    /// More items of a kind were pinned than its live cap allows.
    #[error("too many initial {kind:?} items for the configured cap")]
    ItemCapacityExceeded {
        /// Item kind over its cap.
        kind: ItemKind,
    },
    /// A configured cell could not be written to the grid.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Reasons a tick cannot be performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    /// Ticks only advance while playing.
    #[error("cannot tick while {state:?}")]
    NotPlaying {
        /// State the session was in.
        state: PlayState,
    },
    /// The grid rejected an update the tick produced internally.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Everything a single [`World::tick`] produced.
#[derive(Clone, Debug)]
pub struct TickReport {
    /// Number of ticks completed in the current session.
    pub tick: u64,
    /// Occupancy changes in the order they were applied.
    pub grid_delta: Vec<CellChange>,
    /// State of every snake after the tick.
    pub snakes: SnakeView,
    /// Result from the primary snake's perspective.
    pub outcome: TickOutcome,
    /// Events emitted while processing the tick.
    pub events: Vec<Event>,
}

/// Mutable state rebuilt from the configuration for every session generation.
#[derive(Debug)]
struct Session {
    grid: Grid,
    snakes: Vec<Snake>,
    items: ItemArena,
    rules: ItemRules,
    rng: ChaCha8Rng,
    tick_index: u64,
    mode: GameMode,
    tick_limit: Option<u64>,
    decided: bool,
    winner: Option<SnakeId>,
}

impl Session {
    fn build(config: &SessionConfig, generation: u64) -> Result<Self, SessionError> {
        let topology = config.topology;
        if !topology.is_well_formed() {
            return Err(SessionError::InvalidTopology { topology });
        }
        if config.mode == GameMode::ScoreRace && config.tick_limit.unwrap_or(0) == 0 {
            return Err(SessionError::MissingTickLimit);
        }

        let mut grid = Grid::new(topology);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(generation));

        for cell in &config.obstacles {
            let _ = grid.set_occupant(*cell, Occupant::Obstacle)?;
        }

        let default_spawn = [SnakeSpawn {
            head: topology.center(),
            direction: topology.default_direction(),
            length: None,
            controller: Controller::Player,
            temperament: Temperament::default(),
        }];
        let spawns: &[SnakeSpawn] = if config.snakes.is_empty() {
            &default_spawn
        } else {
            &config.snakes
        };

        let mut snakes = Vec::with_capacity(spawns.len() + config.autopilot_snakes as usize);
        for spawn in spawns {
            let id = next_snake_id(&snakes);
            let length = spawn.length.unwrap_or(config.initial_length);
            if length == 0 {
                return Err(SessionError::InitialLengthZero);
            }
            let body = Snake::trailing_body(topology, spawn.head, spawn.direction, length)?;
            let snake = Snake::new(id, spawn.controller, topology, body, spawn.direction)?
                .with_temperament(spawn.temperament);
            occupy(&mut grid, &snake)?;
            snakes.push(snake);
        }

        let temperaments = &config.rival_temperaments;
        for rival in 0..config.autopilot_snakes as usize {
            let id = next_snake_id(&snakes);
            let temperament = match temperaments.len() {
                0 => Temperament::default(),
                count => temperaments[rival % count],
            };
            let snake = place_autopilot(&grid, &mut rng, id, config.initial_length)?
                .with_temperament(temperament);
            occupy(&mut grid, &snake)?;
            snakes.push(snake);
        }

        let rules = config.items;
        let mut items = ItemArena::with_capacity(rules.capacity());
        for placement in &config.initial_items {
            if items.count(placement.kind) >= rules.rule(placement.kind).max_live as usize {
                return Err(SessionError::ItemCapacityExceeded {
                    kind: placement.kind,
                });
            }
            if !grid.occupant(placement.cell)?.is_empty() {
                return Err(SessionError::Overlap {
                    cell: placement.cell,
                });
            }
            let item = Item {
                kind: placement.kind,
                cell: placement.cell,
            };
            if let Some(id) = items.insert(item) {
                let _ = grid.set_occupant(placement.cell, Occupant::Item(id))?;
            }
        }

        let mut session = Self {
            grid,
            snakes,
            items,
            rules,
            rng,
            tick_index: 0,
            mode: config.mode,
            tick_limit: config.tick_limit,
            decided: false,
            winner: None,
        };
        let mut spawn_events = Vec::new();
        session.refill_items(&mut spawn_events)?;
        let _ = session.grid.drain_journal();

        info!(
            ?topology,
            generation,
            mode = ?session.mode,
            snakes = session.snakes.len(),
            empty_cells = session.grid.empty_count(),
            "session built"
        );
        Ok(session)
    }

    fn snake_index(&self, id: SnakeId) -> Option<usize> {
        self.snakes.binary_search_by_key(&id, Snake::id).ok()
    }

    fn steer(&mut self, id: SnakeId, direction: Direction, out_events: &mut Vec<Event>) {
        let Some(snake) = self
            .snake_index(id)
            .and_then(|index| self.snakes.get_mut(index))
        else {
            return;
        };
        if !snake.is_alive() {
            return;
        }

        match snake.buffer_direction(direction) {
            Steering::Accepted | Steering::Unchanged => {}
            reason => {
                debug!(snake = id.get(), ?direction, ?reason, "steering ignored");
                out_events.push(Event::SteeringIgnored {
                    snake: id,
                    direction,
                    reason,
                });
            }
        }
    }

    /// Advances every live snake once, in identifier order, then refills items
    /// and checks whether the game mode ends the match.
    fn step(&mut self, out_events: &mut Vec<Event>) -> Result<TickOutcome, GridError> {
        let _ = self.grid.drain_journal();
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
        });

        let mut outcome = TickOutcome::Continue;
        for index in 0..self.snakes.len() {
            let snake = &self.snakes[index];
            if !snake.is_alive() {
                continue;
            }
            let id = snake.id();
            let proposed = snake.propose_move();
            let verdict = resolve(proposed, self.grid.view(), snake.mover());

            match verdict {
                Verdict::Continue => self.advance(index, proposed, out_events)?,
                Verdict::Consume(item_id) => {
                    let item = self.items.remove(item_id);
                    self.advance(index, proposed, out_events)?;
                    let Some(item) = item else {
                        continue;
                    };
                    let rule = *self.rules.rule(item.kind);
                    let snake = &mut self.snakes[index];
                    snake.award(rule.points);
                    snake.grow(rule.growth);
                    debug!(
                        snake = id.get(),
                        kind = ?item.kind,
                        points = rule.points,
                        length = snake.len(),
                        "item consumed"
                    );
                    out_events.push(Event::ItemConsumed {
                        snake: id,
                        item: item_id,
                        kind: item.kind,
                        cell: item.cell,
                        points: rule.points,
                        effect: rule.effect,
                    });
                    if id == SnakeId::PRIMARY {
                        outcome = TickOutcome::Scored(rule.points);
                    }
                }
                Verdict::Terminate(cause) => {
                    self.terminate(index, cause, proposed, out_events)?;
                    if let TerminationCause::SnakeCollision { other } = cause {
                        if self.mode == GameMode::Survival {
                            self.eliminate_struck(other, id, out_events)?;
                        }
                    }
                    if id == SnakeId::PRIMARY && self.mode == GameMode::Classic {
                        outcome = TickOutcome::GameOver(cause);
                    }
                }
            }
        }

        self.refill_items(out_events)?;
        if let Some(winner) = self.decide() {
            self.decided = true;
            self.winner = winner;
            info!(mode = ?self.mode, winner = ?winner.map(|id| id.get()), "match decided");
            out_events.push(Event::MatchDecided { winner });
            outcome = TickOutcome::MatchOver { winner };
        }
        Ok(outcome)
    }

    /// Terminates the snake that was run into, when it is still alive.
    fn eliminate_struck(
        &mut self,
        struck: SnakeId,
        striker: SnakeId,
        out_events: &mut Vec<Event>,
    ) -> Result<(), GridError> {
        let Some(index) = self.snake_index(struck) else {
            return Ok(());
        };
        let snake = &self.snakes[index];
        if !snake.is_alive() {
            return Ok(());
        }
        let cell = snake.head();
        let cause = TerminationCause::SnakeCollision { other: striker };
        self.terminate(index, cause, cell, out_events)
    }

    /// Winner of the match once the game mode's end condition holds.
    ///
    /// The outer `None` means the match goes on; the inner one is a draw or a
    /// match nobody survived.
    fn decide(&self) -> Option<Option<SnakeId>> {
        if self.decided {
            return None;
        }
        let mut alive = self.snakes.iter().filter(|snake| snake.is_alive());
        match self.mode {
            GameMode::Classic => None,
            GameMode::Survival | GameMode::FreeForAll => {
                let first = alive.next().map(Snake::id);
                let rivals_left = alive.next().is_some();
                let contested = self.snakes.len() > 1 || first.is_none();
                (!rivals_left && contested).then_some(first)
            }
            GameMode::ScoreRace => {
                let expired = self
                    .tick_limit
                    .map_or(false, |limit| self.tick_index >= limit);
                (expired || alive.next().is_none()).then(|| self.score_leader())
            }
        }
    }

    /// Sole holder of the highest score; ties are a draw.
    fn score_leader(&self) -> Option<SnakeId> {
        let standings = self.standings();
        match standings.as_slice() {
            [first, second, ..] if first.score == second.score => None,
            [first, ..] => Some(first.snake),
            [] => None,
        }
    }

    /// Every snake ordered by score, highest first, then by identifier.
    fn standings(&self) -> Vec<Standing> {
        let mut standings: Vec<Standing> = self
            .snakes
            .iter()
            .map(|snake| Standing {
                snake: snake.id(),
                score: snake.score(),
                length: snake.len(),
                alive: snake.is_alive(),
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score).then(a.snake.cmp(&b.snake)));
        standings
    }

    fn advance(
        &mut self,
        index: usize,
        new_head: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), GridError> {
        let snake = &mut self.snakes[index];
        let id = snake.id();
        let from = snake.head();
        if let Some(vacated) = snake.commit_move(new_head, false) {
            if vacated != new_head {
                let _ = self.grid.clear(vacated)?;
            }
        }
        let _ = self.grid.set_occupant(new_head, Occupant::Segment(id))?;
        out_events.push(Event::SnakeAdvanced {
            snake: id,
            from,
            to: new_head,
        });
        Ok(())
    }

    fn terminate(
        &mut self,
        index: usize,
        cause: TerminationCause,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), GridError> {
        let snake = &mut self.snakes[index];
        let id = snake.id();
        let score = snake.score();
        for released in snake.terminate() {
            let _ = self.grid.clear(released)?;
        }
        info!(snake = id.get(), ?cause, score, "snake terminated");
        out_events.push(Event::SnakeTerminated {
            snake: id,
            cause,
            cell,
        });
        Ok(())
    }

    /// Tops every item kind up to its live cap.
    ///
    /// A full board defers the remaining spawns to a later tick.
    fn refill_items(&mut self, out_events: &mut Vec<Event>) -> Result<(), GridError> {
        for kind in ItemKind::ALL {
            let cap = self.rules.rule(kind).max_live as usize;
            while self.items.count(kind) < cap {
                let cell = match self.grid.random_empty_cell(&mut self.rng) {
                    Ok(cell) => cell,
                    Err(GridError::GridFull) => {
                        warn!(?kind, "board full, item spawn deferred");
                        out_events.push(Event::ItemSpawnDeferred { kind });
                        return Ok(());
                    }
                    Err(error) => return Err(error),
                };
                let Some(item) = self.items.insert(Item { kind, cell }) else {
                    break;
                };
                let _ = self.grid.set_occupant(cell, Occupant::Item(item))?;
                debug!(?kind, ?cell, "item spawned");
                out_events.push(Event::ItemSpawned { item, kind, cell });
            }
        }
        Ok(())
    }
}

fn next_snake_id(snakes: &[Snake]) -> SnakeId {
    SnakeId::new(u32::try_from(snakes.len()).unwrap_or(u32::MAX))
}

fn occupy(grid: &mut Grid, snake: &Snake) -> Result<(), SessionError> {
    for cell in snake.body() {
        if !grid.is_empty(cell)? {
            return Err(SessionError::Overlap { cell });
        }
        let _ = grid.set_occupant(cell, Occupant::Segment(snake.id()))?;
    }
    Ok(())
}

/// Finds a straight run of free cells with a free cell ahead of the head.
fn place_autopilot<R: Rng + ?Sized>(
    grid: &Grid,
    rng: &mut R,
    id: SnakeId,
    length: u32,
) -> Result<Snake, SessionError> {
    if length == 0 {
        return Err(SessionError::InitialLengthZero);
    }
    let topology = grid.topology();
    for _ in 0..PLACEMENT_ATTEMPTS {
        let head = grid
            .random_empty_cell(rng)
            .map_err(|_| SessionError::NoRoomForSnake)?;
        for heading in topology.headings() {
            let ahead = head.translate(heading);
            let body = Snake::trailing_body(topology, head, heading.direction(), length)?;
            let free = |cell: &CellCoord| grid.is_empty(*cell).unwrap_or(false);
            if free(&ahead) && body.iter().all(free) {
                return Snake::new(id, Controller::Autopilot, topology, body, heading.direction());
            }
        }
    }
    Err(SessionError::NoRoomForSnake)
}

/// Represents the authoritative grid snake world state.
#[derive(Debug)]
pub struct World {
    config: SessionConfig,
    generation: u64,
    state: PlayState,
    session: Session,
}

impl World {
    /// Builds a session from the configuration, waiting in [`PlayState::Menu`].
    ///
    /// Fails when the configuration is inconsistent: malformed topology,
    /// entities off the board or overlapping, or too many pinned items.
    pub fn new_session(config: SessionConfig) -> Result<Self, SessionError> {
        let session = Session::build(&config, 0)?;
        Ok(Self {
            config,
            generation: 0,
            state: PlayState::Menu,
            session,
        })
    }

    /// Advances the session by one step.
    ///
    /// `input` steers every player-controlled snake before it moves. Only
    /// legal while [`PlayState::Playing`]. The session moves to
    /// [`PlayState::GameOver`] within the same call when the primary snake is
    /// terminated in [`GameMode::Classic`], or when another mode decides the
    /// match.
    pub fn tick(&mut self, input: Option<Direction>) -> Result<TickReport, StateError> {
        if self.state != PlayState::Playing {
            return Err(StateError::NotPlaying { state: self.state });
        }

        let mut events = Vec::new();
        if let Some(direction) = input {
            let players: Vec<SnakeId> = self
                .session
                .snakes
                .iter()
                .filter(|snake| snake.controller() == Controller::Player)
                .map(Snake::id)
                .collect();
            for id in players {
                self.session.steer(id, direction, &mut events);
            }
        }

        let outcome = self.advance(&mut events)?;
        Ok(TickReport {
            tick: self.session.tick_index,
            grid_delta: self.session.grid.drain_journal(),
            snakes: query::snake_view(self),
            outcome,
            events,
        })
    }

    fn advance(&mut self, out_events: &mut Vec<Event>) -> Result<TickOutcome, StateError> {
        let outcome = self.session.step(out_events)?;
        match outcome {
            TickOutcome::GameOver(cause) => {
                info!(?cause, tick = self.session.tick_index, "game over");
                self.enter(PlayState::GameOver, out_events);
            }
            TickOutcome::MatchOver { .. } => {
                self.enter(PlayState::GameOver, out_events);
            }
            TickOutcome::Continue | TickOutcome::Scored(_) => {}
        }
        Ok(outcome)
    }

    fn request_transition(&mut self, transition: Transition, out_events: &mut Vec<Event>) {
        let Some(next) = self.state.after(transition) else {
            debug!(state = ?self.state, ?transition, "transition rejected");
            out_events.push(Event::TransitionRejected {
                state: self.state,
                request: transition,
            });
            return;
        };

        if matches!(transition, Transition::Restart | Transition::ReturnToMenu) {
            let generation = self.generation.saturating_add(1);
            match Session::build(&self.config, generation) {
                Ok(session) => {
                    self.session = session;
                    self.generation = generation;
                    out_events.push(Event::SessionReset { generation });
                }
                Err(error) => {
                    warn!(%error, "session rebuild failed");
                    out_events.push(Event::TransitionRejected {
                        state: self.state,
                        request: transition,
                    });
                    return;
                }
            }
        }

        self.enter(next, out_events);
    }

    fn enter(&mut self, next: PlayState, out_events: &mut Vec<Event>) {
        let from = self.state;
        self.state = next;
        info!(?from, to = ?next, "play state changed");
        out_events.push(Event::PlayStateChanged { from, to: next });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Ticks requested outside [`PlayState::Playing`] are ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RequestTransition { transition } => {
            world.request_transition(transition, out_events);
        }
        Command::Steer { snake, direction } => {
            world.session.steer(snake, direction, out_events);
        }
        Command::Tick => {
            if world.state != PlayState::Playing {
                return;
            }
            if let Err(error) = world.advance(out_events) {
                warn!(%error, "tick aborted");
            }
        }
        Command::SetItemPoints { kind, points } => {
            world.session.rules.rule_mut(kind).points = points;
            out_events.push(Event::ItemPointsChanged { kind, points });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use gridsnake_core::{
        config::{GameMode, ItemRules, SessionConfig},
        CellCoord, GridSnapshot, ItemId, ItemSnapshot, ItemView, OccupancyView, PlayState,
        SnakeId, SnakeSnapshot, SnakeView, Standing, Topology,
    };

    /// Current play state.
    #[must_use]
    pub fn play_state(world: &World) -> PlayState {
        world.state
    }

    /// Number of times the session has been rebuilt.
    #[must_use]
    pub fn generation(world: &World) -> u64 {
        world.generation
    }

    /// Ticks completed in the current session.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.session.tick_index
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Topology of the board.
    #[must_use]
    pub fn topology(world: &World) -> Topology {
        world.config.topology
    }

    /// Reports whether the cell lies on the board.
    #[must_use]
    pub fn in_bounds(world: &World, cell: CellCoord) -> bool {
        world.session.grid.in_bounds(cell)
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.session.grid.view()
    }

    /// Owned copy of the occupancy grid for use on another thread.
    #[must_use]
    pub fn grid_snapshot(world: &World) -> GridSnapshot {
        world.session.grid.snapshot()
    }

    /// Number of empty cells on the board.
    #[must_use]
    pub fn empty_cell_count(world: &World) -> usize {
        world.session.grid.empty_count()
    }

    /// Captures a read-only view of every snake.
    #[must_use]
    pub fn snake_view(world: &World) -> SnakeView {
        SnakeView::from_snapshots(
            world
                .session
                .snakes
                .iter()
                .map(|snake| snake.snapshot())
                .collect(),
        )
    }

    /// Snapshot of the identified snake.
    #[must_use]
    pub fn snake(world: &World, id: SnakeId) -> Option<SnakeSnapshot> {
        world
            .session
            .snake_index(id)
            .and_then(|index| world.session.snakes.get(index))
            .map(|snake| snake.snapshot())
    }

    /// Scoring rules currently in force.
    #[must_use]
    pub fn item_rules(world: &World) -> &ItemRules {
        &world.session.rules
    }

    /// Captures a read-only view of every live item.
    #[must_use]
    pub fn item_view(world: &World) -> ItemView {
        let rules = &world.session.rules;
        ItemView::from_snapshots(
            world
                .session
                .items
                .snapshots(|kind| rules.rule(kind).points),
        )
    }

    /// Snapshot of the identified item, if it is still live.
    #[must_use]
    pub fn item(world: &World, id: ItemId) -> Option<ItemSnapshot> {
        world.session.items.get(id).map(|item| ItemSnapshot {
            id,
            kind: item.kind,
            cell: item.cell,
            points: world.session.rules.rule(item.kind).points,
        })
    }

    /// Rule deciding when the session ends.
    #[must_use]
    pub fn mode(world: &World) -> GameMode {
        world.session.mode
    }

    /// Every snake ordered by score, highest first; ties go to the lower id.
    #[must_use]
    pub fn leaderboard(world: &World) -> Vec<Standing> {
        world.session.standings()
    }

    /// Winner declared by the game mode, once the match is decided.
    #[must_use]
    pub fn winner(world: &World) -> Option<SnakeId> {
        world.session.winner
    }
}
