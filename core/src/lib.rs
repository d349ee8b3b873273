#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the grid snake engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems read borrowed views such as
//! [`OccupancyView`] and [`SnakeView`] and respond exclusively with new
//! command batches.
//!
//! The board shape is described by [`Topology`], which supports square and
//! hexagonal grids through one set of capabilities.

pub mod config;
mod topology;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use topology::{Heading, Topology, MAX_CELLS, MAX_EXTENT};

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Requests a change of the session's play state.
    RequestTransition {
        /// Transition the caller would like to perform.
        transition: Transition,
    },
    /// Requests that a snake buffer a new heading for its next move.
    Steer {
        /// Snake that should change course.
        snake: SnakeId,
        /// Direction the snake should face on its next move.
        direction: Direction,
    },
    /// Advances the simulation by a single discrete step.
    Tick,
    /// Replaces the point value awarded for consuming items of a kind.
    SetItemPoints {
        /// Kind of item whose value changes.
        kind: ItemKind,
        /// Points awarded for subsequent consumptions.
        points: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the session entered a new play state.
    PlayStateChanged {
        /// State that was active before the change.
        from: PlayState,
        /// State that became active.
        to: PlayState,
    },
    /// Reports that a transition request was not legal in the current state.
    TransitionRejected {
        /// State that was active when the request arrived.
        state: PlayState,
        /// Transition that was refused.
        request: Transition,
    },
    /// Indicates that the simulation advanced by one step.
    TimeAdvanced {
        /// Number of steps completed in the current session, including this one.
        tick: u64,
    },
    /// Reports that a steering request did not change the buffered heading.
    SteeringIgnored {
        /// Snake that received the request.
        snake: SnakeId,
        /// Direction that was requested.
        direction: Direction,
        /// Reason the request was discarded.
        reason: Steering,
    },
    /// Confirms that a snake moved its head between two cells.
    SnakeAdvanced {
        /// Snake that advanced.
        snake: SnakeId,
        /// Cell the head occupied before moving.
        from: CellCoord,
        /// Cell the head occupies after moving.
        to: CellCoord,
    },
    /// Confirms that an item was placed on the board.
    ItemSpawned {
        /// Identifier allocated to the item.
        item: ItemId,
        /// Category of the item.
        kind: ItemKind,
        /// Cell holding the item.
        cell: CellCoord,
    },
    /// Reports that a snake consumed an item.
    ItemConsumed {
        /// Snake that consumed the item.
        snake: SnakeId,
        /// Identifier of the consumed item.
        item: ItemId,
        /// Category of the consumed item.
        kind: ItemKind,
        /// Cell where the item was consumed.
        cell: CellCoord,
        /// Points awarded to the snake.
        points: u32,
        /// Effect tag carried by the item, if any.
        effect: Option<ItemEffect>,
    },
    /// Reports that an item could not be placed because the board is full.
    ItemSpawnDeferred {
        /// Category of the item that will be retried on a later tick.
        kind: ItemKind,
    },
    /// Reports that a snake collided and stopped.
    SnakeTerminated {
        /// Snake that was terminated.
        snake: SnakeId,
        /// Collision that ended the snake.
        cause: TerminationCause,
        /// Cell the snake attempted to enter.
        cell: CellCoord,
    },
    /// Announces that the session was rebuilt from its configuration.
    SessionReset {
        /// Generation counter of the rebuilt session.
        generation: u64,
    },
    /// Confirms that the point value of an item kind changed.
    ItemPointsChanged {
        /// Kind of item whose value changed.
        kind: ItemKind,
        /// Points awarded for subsequent consumptions.
        points: u32,
    },
    /// Announces that the session's game mode declared the match finished.
    MatchDecided {
        /// Snake that won, or `None` for a draw or when nobody survived.
        winner: Option<SnakeId>,
    },
}

/// Location of a single cell on the board.
///
/// Square boards read the pair as `(x, y)`; hexagonal boards read it as axial
/// `(q, r)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// First coordinate component (`x` or axial `q`).
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Second coordinate component (`y` or axial `r`).
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Cell reached by taking one step along the heading.
    #[must_use]
    pub const fn translate(self, heading: Heading) -> Self {
        let (dx, dy) = heading.offset();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Compass directions understood by the engine.
///
/// Each topology supports a subset; see [`Topology::directions`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward decreasing `y`.
    North,
    /// Hexagonal step toward increasing `q` and decreasing `r`.
    NorthEast,
    /// Toward increasing `x` on square boards.
    East,
    /// Hexagonal step toward increasing `q`.
    SouthEast,
    /// Toward increasing `y`.
    South,
    /// Hexagonal step toward decreasing `q` and increasing `r`.
    SouthWest,
    /// Toward decreasing `x` on square boards.
    West,
    /// Hexagonal step toward decreasing `q`.
    NorthWest,
}

impl Direction {
    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::East => Self::West,
            Self::SouthEast => Self::NorthWest,
            Self::South => Self::North,
            Self::SouthWest => Self::NorthEast,
            Self::West => Self::East,
            Self::NorthWest => Self::SouthEast,
        }
    }
}

/// Unique identifier assigned to a snake.
///
/// The snake with identifier zero is the primary, player-facing snake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnakeId(u32);

impl SnakeId {
    /// Identifier of the snake whose fate decides the session outcome.
    pub const PRIMARY: Self = Self(0);

    /// Creates a new snake identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying numeric value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Stable handle into the item arena.
///
/// The generation distinguishes successive items stored in the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

impl ItemId {
    /// Creates a new item identifier.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot that holds the item.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Number of times the slot had been reused when the item was stored.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Tag describing what occupies a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    /// Nothing occupies the cell.
    #[default]
    Empty,
    /// A segment of the identified snake.
    Segment(SnakeId),
    /// The identified item.
    Item(ItemId),
    /// A static wall placed by the session configuration.
    Obstacle,
}

impl Occupant {
    /// Reports whether the cell is free.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Categories of consumable items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Regular food that keeps a board populated at all times.
    Food,
    /// Rarer item worth more points.
    Bonus,
}

impl ItemKind {
    /// Every item kind in refill order.
    pub const ALL: [Self; 2] = [Self::Food, Self::Bonus];
}

/// Optional effect tag carried by an item.
///
/// The engine reports effects on consumption; adapters decide what they mean.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    /// Temporarily quickens the consuming snake.
    Haste,
    /// Temporarily slows the consuming snake.
    Slow,
}

/// Ordered sequence of cells from a start cell to a goal cell.
///
/// Consecutive cells are neighbours under the topology that produced them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    cells: Vec<CellCoord>,
}

impl Path {
    /// Wraps an ordered list of cells that includes both endpoints.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Cells along the path, start first.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of cells on the path, both endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of moves needed to walk the path.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// First cell of the path.
    #[must_use]
    pub fn start(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    /// Last cell of the path.
    #[must_use]
    pub fn goal(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Consumes the path, yielding its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<CellCoord> {
        self.cells
    }
}

/// Reported when no route connects two cells under current occupancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("no path from {start:?} to {goal:?}")]
pub struct Unreachable {
    /// Cell the search started from.
    pub start: CellCoord,
    /// Cell the search attempted to reach.
    pub goal: CellCoord,
}

/// Failures raised by grid occupancy operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The cell lies outside the board.
    #[error("cell {0:?} is outside the grid")]
    OutOfBounds(CellCoord),
    /// Every valid cell is occupied.
    #[error("no empty cell is left on the grid")]
    GridFull,
}

/// Classification of a proposed move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The move lands on a free cell.
    Continue,
    /// The move lands on the identified item.
    Consume(ItemId),
    /// The move ends the snake.
    Terminate(TerminationCause),
}

/// Reasons a snake may be terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationCause {
    /// The snake left the board.
    WallCollision,
    /// The snake ran into one of its own segments.
    SelfCollision,
    /// The snake ran into a segment of another snake.
    SnakeCollision {
        /// Snake whose body was hit.
        other: SnakeId,
    },
    /// The snake ran into a static obstacle.
    ObstacleCollision,
}

/// Minimal description of a moving snake used to resolve collisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mover {
    /// Snake that is moving.
    pub id: SnakeId,
    /// Current tail cell of the snake.
    pub tail: CellCoord,
    /// Whether the tail stays in place this tick because the snake is growing.
    pub growing: bool,
}

/// Outcome of a steering request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Steering {
    /// The direction was buffered for the next move.
    Accepted,
    /// The direction already matched the buffered heading.
    Unchanged,
    /// The direction reverses the current heading of a multi-cell snake.
    IgnoredReversal,
    /// The topology has no such direction.
    IgnoredUnsupported,
    /// A different direction was already accepted during this tick.
    IgnoredLocked,
}

/// Source of a snake's steering decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    /// Steered by the input stream passed to each tick.
    #[default]
    Player,
    /// Steered by the autopilot system.
    Autopilot,
}

/// Decision style of an autopilot snake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Takes the shortest route to food regardless of the space it leads into.
    Aggressive,
    /// Only follows a route into ample space away from rival heads.
    Cautious,
    /// Follows a route unless it leads into a pocket smaller than its body.
    #[default]
    Balanced,
    /// Wanders between safe cells and ignores food.
    Random,
}

/// Personality and skill of an autopilot snake.
///
/// Player snakes carry one too; only the autopilot reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Temperament {
    /// Decision style.
    pub personality: Personality,
    /// Skill in percent. Values are clamped to `10..=100`; anything below
    /// 100 leaves a matching chance of a random move each tick.
    pub skill: u8,
}

impl Temperament {
    /// Lowest effective skill.
    pub const MIN_SKILL: u8 = 10;
    /// Highest effective skill.
    pub const MAX_SKILL: u8 = 100;

    /// Creates a temperament.
    #[must_use]
    pub const fn new(personality: Personality, skill: u8) -> Self {
        Self { personality, skill }
    }

    /// Chance in percent that a decision is replaced by a random move.
    #[must_use]
    pub fn mistake_percent(&self) -> u8 {
        Self::MAX_SKILL - self.skill.clamp(Self::MIN_SKILL, Self::MAX_SKILL)
    }
}

impl Default for Temperament {
    fn default() -> Self {
        Self::new(Personality::Balanced, Self::MAX_SKILL)
    }
}

/// One line of the session leaderboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Snake the line describes.
    pub snake: SnakeId,
    /// Points collected.
    pub score: u32,
    /// Segments currently held.
    pub length: usize,
    /// Whether the snake is still moving.
    pub alive: bool,
}

/// Play states of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayState {
    /// Waiting to start.
    Menu,
    /// Ticks advance the simulation.
    Playing,
    /// Simulation is suspended.
    Paused,
    /// The primary snake was terminated or the match was decided.
    GameOver,
}

/// Requests that move a session between play states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Leaves the menu and begins play.
    Start,
    /// Suspends play.
    Pause,
    /// Continues suspended play.
    Resume,
    /// Rebuilds the session after a game over and resumes play immediately.
    Restart,
    /// Rebuilds the session and waits in the menu.
    ReturnToMenu,
}

impl PlayState {
    /// State reached by applying the transition, or `None` when it is illegal.
    #[must_use]
    pub const fn after(self, transition: Transition) -> Option<Self> {
        match (self, transition) {
            (Self::Menu, Transition::Start) => Some(Self::Playing),
            (Self::Playing, Transition::Pause) => Some(Self::Paused),
            (Self::Paused, Transition::Resume) => Some(Self::Playing),
            (Self::Paused | Self::GameOver, Transition::ReturnToMenu) => Some(Self::Menu),
            (Self::GameOver, Transition::Restart) => Some(Self::Playing),
            _ => None,
        }
    }
}

/// Result of a tick from the primary snake's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing notable happened.
    Continue,
    /// The primary snake consumed an item worth the provided points.
    Scored(u32),
    /// The primary snake was terminated.
    GameOver(TerminationCause),
    /// The game mode declared the match finished.
    MatchOver {
        /// Snake that won, or `None` for a draw or when nobody survived.
        winner: Option<SnakeId>,
    },
}

/// Single occupancy change recorded by the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    /// Cell that changed.
    pub cell: CellCoord,
    /// Occupant stored in the cell after the change.
    pub occupant: Occupant,
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    topology: Topology,
    cells: &'a [Occupant],
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by cells in [`Topology::index`] order.
    #[must_use]
    pub fn new(topology: Topology, cells: &'a [Occupant]) -> Self {
        Self { topology, cells }
    }

    /// Topology the view is laid out in.
    #[must_use]
    pub const fn topology(&self) -> Topology {
        self.topology
    }

    /// Returns the occupant of the cell, or `None` when it is off the board.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.topology
            .index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell lies on the board.
    #[must_use]
    pub fn in_bounds(&self, cell: CellCoord) -> bool {
        self.topology.is_valid(cell)
    }

    /// Reports whether the cell is on the board and unoccupied.
    #[must_use]
    pub fn is_empty(&self, cell: CellCoord) -> bool {
        self.occupant(cell).map_or(false, Occupant::is_empty)
    }

    /// Reports whether a snake cannot pass through the cell.
    ///
    /// Off-board cells, segments and obstacles block; items do not.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        match self.occupant(cell) {
            None | Some(Occupant::Segment(_) | Occupant::Obstacle) => true,
            Some(Occupant::Empty | Occupant::Item(_)) => false,
        }
    }

    /// Iterates over `(cell, occupant)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Occupant)> + 'a {
        self.topology.cells().zip(self.cells.iter().copied())
    }

    /// Number of unoccupied cells.
    #[must_use]
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|occupant| occupant.is_empty()).count()
    }
}

/// Owned copy of the occupancy grid, suitable for handing to another thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Topology the cells are laid out in.
    pub topology: Topology,
    /// Occupants in [`Topology::index`] order.
    pub cells: Vec<Occupant>,
}

impl GridSnapshot {
    /// Borrows the snapshot as an occupancy view.
    #[must_use]
    pub fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(self.topology, &self.cells)
    }
}

/// Immutable representation of a single snake's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnakeSnapshot {
    /// Unique identifier assigned to the snake.
    pub id: SnakeId,
    /// Source of the snake's steering decisions.
    pub controller: Controller,
    /// Occupied cells, head first.
    pub body: Vec<CellCoord>,
    /// Heading used by the most recent move.
    pub direction: Direction,
    /// Heading the next move will use.
    pub buffered_direction: Direction,
    /// Segments still to be appended.
    pub pending_growth: u32,
    /// Whether the snake is still moving.
    pub alive: bool,
    /// Points collected by the snake.
    pub score: u32,
    /// Personality and skill read by the autopilot.
    pub temperament: Temperament,
}

impl SnakeSnapshot {
    /// Cell occupied by the head.
    #[must_use]
    pub fn head(&self) -> Option<CellCoord> {
        self.body.first().copied()
    }

    /// Cell occupied by the tail.
    #[must_use]
    pub fn tail(&self) -> Option<CellCoord> {
        self.body.last().copied()
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Reports whether the snake has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Read-only snapshot describing all snakes in the session.
#[derive(Clone, Debug, Default)]
pub struct SnakeView {
    snapshots: Vec<SnakeSnapshot>,
}

impl SnakeView {
    /// Creates a new snake view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SnakeSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snake snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &SnakeSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the identified snake.
    #[must_use]
    pub fn get(&self, id: SnakeId) -> Option<&SnakeSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SnakeSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a live item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemSnapshot {
    /// Identifier allocated to the item.
    pub id: ItemId,
    /// Category of the item.
    pub kind: ItemKind,
    /// Cell holding the item.
    pub cell: CellCoord,
    /// Points awarded on consumption.
    pub points: u32,
}

/// Read-only snapshot describing all live items.
#[derive(Clone, Debug, Default)]
pub struct ItemView {
    snapshots: Vec<ItemSnapshot>,
}

impl ItemView {
    /// Creates a new item view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ItemSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured item snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ItemSnapshot> {
        self.snapshots
    }
}
