#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Topology-agnostic A* pathfinding over the occupancy grid.
//!
//! The search only talks to [`Topology`] through its neighbour enumeration,
//! dense cell index and distance heuristic, so square and hexagonal boards
//! share one implementation. Step cost is uniform. Ties on the priority key
//! are broken first-in-first-out, which makes expansion follow the
//! topology's neighbour order and keeps results reproducible.

use std::{cmp::Reverse, collections::BinaryHeap, collections::VecDeque};

use gridsnake_core::{CellCoord, OccupancyView, Occupant, Path, Topology, Unreachable};

const UNVISITED: u32 = u32::MAX;

/// Reusable search workspace.
///
/// Buffers are sized to the board once and reset between searches, so
/// repeated queries on the same topology do not allocate.
#[derive(Debug, Default)]
pub struct Pathfinder {
    prepared: Option<Topology>,
    cells: Vec<CellCoord>,
    g_costs: Vec<u32>,
    came_from: Vec<Option<usize>>,
    closed: Vec<bool>,
    open: BinaryHeap<Reverse<(u32, u64, usize)>>,
    frontier: VecDeque<usize>,
    expanded: usize,
}

impl Pathfinder {
    /// Creates an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells expanded by the most recent search.
    #[must_use]
    pub const fn last_expanded(&self) -> usize {
        self.expanded
    }

    /// Finds a shortest route from `start` to `goal`.
    ///
    /// Segments and obstacles block, except that a segment on the goal cell
    /// does not. The start cell itself is never checked, since it normally
    /// holds the searching snake's head.
    pub fn find_path(
        &mut self,
        grid: OccupancyView<'_>,
        start: CellCoord,
        goal: CellCoord,
    ) -> Result<Path, Unreachable> {
        let unreachable = Unreachable { start, goal };
        let topology = grid.topology();
        let (Some(start_index), Some(goal_index)) = (topology.index(start), topology.index(goal))
        else {
            return Err(unreachable);
        };
        if matches!(grid.occupant(goal), Some(Occupant::Obstacle)) {
            return Err(unreachable);
        }

        self.prepare(topology);
        self.expanded = 0;
        if start_index == goal_index {
            return Ok(Path::new(vec![start]));
        }

        let mut sequence: u64 = 0;
        self.g_costs[start_index] = 0;
        self.open
            .push(Reverse((topology.distance(start, goal), sequence, start_index)));

        while let Some(Reverse((_, _, current))) = self.open.pop() {
            if self.closed[current] {
                continue;
            }
            self.closed[current] = true;
            self.expanded += 1;
            if current == goal_index {
                return Ok(self.reconstruct(start_index, goal_index));
            }

            let cell = self.cells[current];
            let next_cost = self.g_costs[current].saturating_add(1);
            for neighbor in topology.neighbors(cell) {
                let Some(index) = topology.index(neighbor) else {
                    continue;
                };
                if self.closed[index] || next_cost >= self.g_costs[index] {
                    continue;
                }
                if index != goal_index && grid.is_blocked(neighbor) {
                    continue;
                }

                self.g_costs[index] = next_cost;
                self.came_from[index] = Some(current);
                sequence += 1;
                let priority = next_cost.saturating_add(topology.distance(neighbor, goal));
                self.open.push(Reverse((priority, sequence, index)));
            }
        }

        Err(unreachable)
    }

    /// Counts passable cells reachable from `from`, stopping at `limit`.
    ///
    /// Returns zero when `from` itself is blocked. Used to rank escape moves
    /// when no route to a goal exists.
    pub fn open_area(&mut self, grid: OccupancyView<'_>, from: CellCoord, limit: usize) -> usize {
        let topology = grid.topology();
        let Some(origin) = topology.index(from) else {
            return 0;
        };
        if grid.is_blocked(from) {
            return 0;
        }

        self.prepare(topology);
        self.frontier.clear();
        self.closed[origin] = true;
        self.frontier.push_back(origin);
        let mut count = 0;

        while let Some(current) = self.frontier.pop_front() {
            count += 1;
            if count >= limit {
                break;
            }
            for neighbor in topology.neighbors(self.cells[current]) {
                let Some(index) = topology.index(neighbor) else {
                    continue;
                };
                if self.closed[index] || grid.is_blocked(neighbor) {
                    continue;
                }
                self.closed[index] = true;
                self.frontier.push_back(index);
            }
        }

        count
    }

    fn prepare(&mut self, topology: Topology) {
        if self.prepared != Some(topology) {
            self.cells = topology.cells().collect();
            let count = self.cells.len();
            self.g_costs = vec![UNVISITED; count];
            self.came_from = vec![None; count];
            self.closed = vec![false; count];
            self.prepared = Some(topology);
        } else {
            self.g_costs.fill(UNVISITED);
            self.came_from.fill(None);
            self.closed.fill(false);
        }
        self.open.clear();
    }

    fn reconstruct(&self, start: usize, goal: usize) -> Path {
        let mut cells = vec![self.cells[goal]];
        let mut current = goal;
        while current != start {
            let Some(previous) = self.came_from[current] else {
                break;
            };
            cells.push(self.cells[previous]);
            current = previous;
        }
        cells.reverse();
        Path::new(cells)
    }
}

/// Finds a shortest route using a temporary workspace.
///
/// Prefer a long-lived [`Pathfinder`] when searching every tick.
pub fn find_path(
    grid: OccupancyView<'_>,
    start: CellCoord,
    goal: CellCoord,
) -> Result<Path, Unreachable> {
    Pathfinder::new().find_path(grid, start, goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsnake_core::SnakeId;

    #[test]
    fn workspace_is_rebuilt_when_topology_changes() {
        let square = Topology::square(3, 3);
        let hexagon = Topology::hexagonal(2);
        let square_cells = vec![Occupant::Empty; square.cell_count()];
        let hex_cells = vec![Occupant::Empty; hexagon.cell_count()];
        let mut pathfinder = Pathfinder::new();

        let path = pathfinder
            .find_path(
                OccupancyView::new(square, &square_cells),
                CellCoord::new(0, 0),
                CellCoord::new(2, 2),
            )
            .expect("square path");
        assert_eq!(path.steps(), 4);
        assert_eq!(pathfinder.cells.len(), 9);

        let path = pathfinder
            .find_path(
                OccupancyView::new(hexagon, &hex_cells),
                CellCoord::new(-2, 0),
                CellCoord::new(2, 0),
            )
            .expect("hex path");
        assert_eq!(path.steps(), 4);
        assert_eq!(pathfinder.cells.len(), 19);
    }

    #[test]
    fn open_area_stops_at_limit_and_walls() {
        let topology = Topology::square(5, 1);
        let mut cells = vec![Occupant::Empty; 5];
        cells[2] = Occupant::Segment(SnakeId::new(0));
        let view = OccupancyView::new(topology, &cells);
        let mut pathfinder = Pathfinder::new();

        assert_eq!(pathfinder.open_area(view, CellCoord::new(0, 0), 100), 2);
        assert_eq!(pathfinder.open_area(view, CellCoord::new(4, 0), 1), 1);
        assert_eq!(pathfinder.open_area(view, CellCoord::new(2, 0), 100), 0);
        assert_eq!(pathfinder.open_area(view, CellCoord::new(9, 0), 100), 0);
    }
}
