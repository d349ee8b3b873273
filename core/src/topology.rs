//! Coordinate systems understood by the grid.
//!
//! A [`Topology`] fixes which cells exist, how they neighbour each other,
//! how far apart two cells are and where each cell lands in pixel space.
//! Every higher layer (grid, entities, collision, pathfinding) talks to the
//! topology through these capabilities and never matches on the concrete
//! variant itself.

use std::ops::RangeInclusive;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{CellCoord, Direction};

/// Largest width, height or radius accepted for a topology.
pub const MAX_EXTENT: u32 = 1 << 14;

/// Largest number of cells a topology may describe.
pub const MAX_CELLS: u64 = 1 << 20;

const SQUARE_DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

const HEXAGONAL_DIRECTIONS: [Direction; 6] = [
    Direction::North,
    Direction::NorthEast,
    Direction::SouthEast,
    Direction::South,
    Direction::SouthWest,
    Direction::NorthWest,
];

const SQRT_3: f32 = 1.732_050_8;

/// Direction resolved against a topology, carrying the cell offset it applies.
///
/// Headings can only be obtained through [`Topology::heading`], so holding one
/// proves the direction is part of the topology that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Heading {
    direction: Direction,
    dx: i32,
    dy: i32,
}

impl Heading {
    /// Compass direction described by the heading.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Coordinate delta applied by a single step along the heading.
    #[must_use]
    pub const fn offset(&self) -> (i32, i32) {
        (self.dx, self.dy)
    }
}

/// Shape and adjacency rules of the playing field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Topology {
    /// Four-neighbour Cartesian grid addressed as `(x, y)`.
    Square {
        /// Number of columns in the grid.
        width: u32,
        /// Number of rows in the grid.
        height: u32,
    },
    /// Six-neighbour flat-top hexagonal grid addressed in axial `(q, r)`.
    ///
    /// The valid cells form a hexagon centred on the origin.
    Hexagonal {
        /// Largest axial distance from the origin that is still on the board.
        radius: u32,
    },
}

impl Topology {
    /// Creates a square topology with the provided dimensions.
    #[must_use]
    pub const fn square(width: u32, height: u32) -> Self {
        Self::Square { width, height }
    }

    /// Creates a hexagonal topology with the provided radius.
    #[must_use]
    pub const fn hexagonal(radius: u32) -> Self {
        Self::Hexagonal { radius }
    }

    /// Reports whether the topology describes a non-empty board of supported size.
    #[must_use]
    pub const fn is_well_formed(self) -> bool {
        match self {
            Self::Square { width, height } => {
                width > 0
                    && height > 0
                    && width <= MAX_EXTENT
                    && height <= MAX_EXTENT
                    && width as u64 * height as u64 <= MAX_CELLS
            }
            Self::Hexagonal { radius } => {
                let radius = radius as u64;
                radius <= MAX_EXTENT as u64 && 3 * radius * (radius + 1) + 1 <= MAX_CELLS
            }
        }
    }

    /// Directions supported by the topology in neighbour enumeration order.
    ///
    /// Both variants list their directions clockwise starting at North. The
    /// order is part of the contract: pathfinding tie-breaks and input
    /// mapping rely on it.
    #[must_use]
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Self::Square { .. } => &SQUARE_DIRECTIONS,
            Self::Hexagonal { .. } => &HEXAGONAL_DIRECTIONS,
        }
    }

    /// Resolves a compass direction into a heading, if the topology supports it.
    #[must_use]
    pub fn heading(self, direction: Direction) -> Option<Heading> {
        let (dx, dy) = match (self, direction) {
            (Self::Square { .. }, Direction::North) => (0, -1),
            (Self::Square { .. }, Direction::East) => (1, 0),
            (Self::Square { .. }, Direction::South) => (0, 1),
            (Self::Square { .. }, Direction::West) => (-1, 0),
            (Self::Hexagonal { .. }, Direction::North) => (0, -1),
            (Self::Hexagonal { .. }, Direction::NorthEast) => (1, -1),
            (Self::Hexagonal { .. }, Direction::SouthEast) => (1, 0),
            (Self::Hexagonal { .. }, Direction::South) => (0, 1),
            (Self::Hexagonal { .. }, Direction::SouthWest) => (-1, 1),
            (Self::Hexagonal { .. }, Direction::NorthWest) => (-1, 0),
            _ => return None,
        };

        Some(Heading { direction, dx, dy })
    }

    /// Iterates over every supported heading in neighbour enumeration order.
    pub fn headings(self) -> impl Iterator<Item = Heading> {
        self.directions()
            .iter()
            .filter_map(move |direction| self.heading(*direction))
    }

    /// Candidate neighbours of `cell` in enumeration order.
    ///
    /// Always yields 4 (square) or 6 (hexagonal) cells. No bounds filtering is
    /// applied; callers check validity separately.
    pub fn neighbors(self, cell: CellCoord) -> impl Iterator<Item = CellCoord> {
        self.headings().map(move |heading| cell.translate(heading))
    }

    /// Heading that points the opposite way.
    #[must_use]
    pub const fn opposite(self, heading: Heading) -> Heading {
        Heading {
            direction: heading.direction.opposite(),
            dx: -heading.dx,
            dy: -heading.dy,
        }
    }

    /// Direction that leads from `from` to the adjacent cell `to`.
    ///
    /// Returns `None` when the cells are not neighbours.
    #[must_use]
    pub fn direction_between(self, from: CellCoord, to: CellCoord) -> Option<Direction> {
        self.headings()
            .find(|heading| from.translate(*heading) == to)
            .map(|heading| heading.direction())
    }

    /// Reports whether the cell lies inside the board.
    #[must_use]
    pub fn is_valid(self, cell: CellCoord) -> bool {
        match self {
            Self::Square { width, height } => {
                u32::try_from(cell.x()).map_or(false, |x| x < width)
                    && u32::try_from(cell.y()).map_or(false, |y| y < height)
            }
            Self::Hexagonal { radius } => {
                let radius = i64::from(radius);
                let q = i64::from(cell.x());
                let r = i64::from(cell.y());
                q.abs() <= radius && r.abs() <= radius && (q + r).abs() <= radius
            }
        }
    }

    /// Number of single steps separating two cells on an open board.
    ///
    /// Manhattan distance on square boards and axial distance on hexagonal
    /// boards. Never overestimates the true step count, so it is an admissible
    /// and consistent heuristic.
    #[must_use]
    pub fn distance(self, a: CellCoord, b: CellCoord) -> u32 {
        let dx = i64::from(b.x()) - i64::from(a.x());
        let dy = i64::from(b.y()) - i64::from(a.y());
        let steps = match self {
            Self::Square { .. } => dx.abs() + dy.abs(),
            Self::Hexagonal { .. } => (dx.abs() + dy.abs() + (dx + dy).abs()) / 2,
        };
        u32::try_from(steps).unwrap_or(u32::MAX)
    }

    /// Heading new entities face when none is configured.
    #[must_use]
    pub const fn default_direction(self) -> Direction {
        match self {
            Self::Square { .. } => Direction::East,
            Self::Hexagonal { .. } => Direction::SouthEast,
        }
    }

    /// Cell closest to the middle of the board.
    #[must_use]
    pub fn center(self) -> CellCoord {
        match self {
            Self::Square { width, height } => CellCoord::new(
                i32::try_from(width / 2).unwrap_or(i32::MAX),
                i32::try_from(height / 2).unwrap_or(i32::MAX),
            ),
            Self::Hexagonal { .. } => CellCoord::new(0, 0),
        }
    }

    /// Total number of valid cells.
    #[must_use]
    pub fn cell_count(self) -> usize {
        let count = match self {
            Self::Square { width, height } => u64::from(width) * u64::from(height),
            Self::Hexagonal { radius } => {
                let radius = u64::from(radius);
                3 * radius * (radius + 1) + 1
            }
        };
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    /// Dense row-major index of the cell, or `None` when it is off the board.
    #[must_use]
    pub fn index(self, cell: CellCoord) -> Option<usize> {
        if !self.is_valid(cell) {
            return None;
        }

        match self {
            Self::Square { width, .. } => {
                let column = usize::try_from(cell.x()).ok()?;
                let row = usize::try_from(cell.y()).ok()?;
                let width = usize::try_from(width).ok()?;
                row.checked_mul(width)?.checked_add(column)
            }
            Self::Hexagonal { radius } => {
                let radius = i64::from(radius);
                let row = i64::from(cell.y()) + radius;
                let row_offset = if row <= radius {
                    hex_rows_before(radius, row)
                } else {
                    let total = 3 * radius * (radius + 1) + 1;
                    total - hex_rows_before(radius, 2 * radius - row + 1)
                };
                let first_column = (-radius).max(-i64::from(cell.y()) - radius);
                usize::try_from(row_offset + i64::from(cell.x()) - first_column).ok()
            }
        }
    }

    /// Every valid cell in index order.
    pub fn cells(self) -> impl Iterator<Item = CellCoord> {
        self.rows().flat_map(move |row| {
            self.columns(row)
                .map(move |column| CellCoord::new(column, row))
        })
    }

    /// Centre of the cell in pixel space for cells of the given size.
    ///
    /// Square cells have side `cell_size`; hexagons have circumradius
    /// `cell_size` with the origin cell centred on the pixel origin.
    #[must_use]
    pub fn project(self, cell: CellCoord, cell_size: f32) -> Vec2 {
        let x = cell.x() as f32;
        let y = cell.y() as f32;
        match self {
            Self::Square { .. } => Vec2::new((x + 0.5) * cell_size, (y + 0.5) * cell_size),
            Self::Hexagonal { .. } => {
                Vec2::new(cell_size * 1.5 * x, cell_size * SQRT_3 * (y + x / 2.0))
            }
        }
    }

    /// Cell containing the pixel-space point, the inverse of [`Topology::project`].
    ///
    /// The result may lie off the board; pair with [`Topology::is_valid`].
    #[must_use]
    pub fn cell_at_point(self, point: Vec2, cell_size: f32) -> CellCoord {
        match self {
            Self::Square { .. } => CellCoord::new(
                (point.x / cell_size).floor() as i32,
                (point.y / cell_size).floor() as i32,
            ),
            Self::Hexagonal { .. } => {
                let q = (2.0 / 3.0 * point.x) / cell_size;
                let r = (-1.0 / 3.0 * point.x + SQRT_3 / 3.0 * point.y) / cell_size;
                axial_round(q, r)
            }
        }
    }

    fn rows(self) -> RangeInclusive<i32> {
        match self {
            Self::Square { height, .. } => 0..=extent(height) - 1,
            Self::Hexagonal { radius } => -extent(radius)..=extent(radius),
        }
    }

    fn columns(self, row: i32) -> RangeInclusive<i32> {
        match self {
            Self::Square { width, .. } => 0..=extent(width) - 1,
            Self::Hexagonal { radius } => {
                let radius = extent(radius);
                (-radius).max(-row - radius)..=radius.min(radius - row)
            }
        }
    }
}

fn extent(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// Cells stored in the first `rows` rows of a hexagon, valid while rows <= radius + 1.
fn hex_rows_before(radius: i64, rows: i64) -> i64 {
    rows * (radius + 1) + rows * (rows - 1) / 2
}

fn axial_round(q: f32, r: f32) -> CellCoord {
    let s = -q - r;
    let mut rounded_q = q.round();
    let mut rounded_r = r.round();
    let rounded_s = s.round();

    let q_diff = (rounded_q - q).abs();
    let r_diff = (rounded_r - r).abs();
    let s_diff = (rounded_s - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rounded_q = -rounded_r - rounded_s;
    } else if r_diff > s_diff {
        rounded_r = -rounded_q - rounded_s;
    }

    CellCoord::new(rounded_q as i32, rounded_r as i32)
}
