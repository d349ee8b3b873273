//! Dense occupancy grid with an incrementally maintained empty-cell index.

use gridsnake_core::{
    CellChange, CellCoord, GridError, GridSnapshot, OccupancyView, Occupant, Topology,
};
use rand::Rng;

/// Occupancy of every valid cell for one session.
///
/// Cells are stored densely in [`Topology::index`] order. Alongside them the
/// grid keeps the list of empty cells plus, for every cell, its slot in that
/// list, so sampling and updates never rescan the board.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    topology: Topology,
    cells: Vec<Occupant>,
    empty: Vec<CellCoord>,
    empty_slots: Vec<Option<usize>>,
    journal: Vec<CellChange>,
}

impl Grid {
    /// Creates a grid whose cells are all empty.
    pub(crate) fn new(topology: Topology) -> Self {
        let count = topology.cell_count();
        let empty: Vec<CellCoord> = topology.cells().collect();
        let empty_slots = (0..count).map(Some).collect();

        Self {
            topology,
            cells: vec![Occupant::Empty; count],
            empty,
            empty_slots,
            journal: Vec::new(),
        }
    }

    pub(crate) const fn topology(&self) -> Topology {
        self.topology
    }

    pub(crate) fn in_bounds(&self, cell: CellCoord) -> bool {
        self.topology.is_valid(cell)
    }

    pub(crate) fn occupant(&self, cell: CellCoord) -> Result<Occupant, GridError> {
        let index = self.index(cell)?;
        Ok(self.cells[index])
    }

    pub(crate) fn is_empty(&self, cell: CellCoord) -> Result<bool, GridError> {
        self.occupant(cell).map(Occupant::is_empty)
    }

    /// Stores `occupant` in the cell and returns what was there before.
    pub(crate) fn set_occupant(
        &mut self,
        cell: CellCoord,
        occupant: Occupant,
    ) -> Result<Occupant, GridError> {
        let index = self.index(cell)?;
        let previous = std::mem::replace(&mut self.cells[index], occupant);
        if previous == occupant {
            return Ok(previous);
        }

        match (previous.is_empty(), occupant.is_empty()) {
            (true, false) => self.remove_empty(index),
            (false, true) => self.insert_empty(index, cell),
            _ => {}
        }
        self.journal.push(CellChange { cell, occupant });
        Ok(previous)
    }

    pub(crate) fn clear(&mut self, cell: CellCoord) -> Result<Occupant, GridError> {
        self.set_occupant(cell, Occupant::Empty)
    }

    /// Uniformly samples one of the currently empty cells.
    pub(crate) fn random_empty_cell<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<CellCoord, GridError> {
        if self.empty.is_empty() {
            return Err(GridError::GridFull);
        }
        let slot = rng.gen_range(0..self.empty.len());
        Ok(self.empty[slot])
    }

    pub(crate) fn empty_count(&self) -> usize {
        self.empty.len()
    }

    pub(crate) fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(self.topology, &self.cells)
    }

    pub(crate) fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            topology: self.topology,
            cells: self.cells.clone(),
        }
    }

    /// Removes and returns the changes recorded since the previous drain.
    pub(crate) fn drain_journal(&mut self) -> Vec<CellChange> {
        std::mem::take(&mut self.journal)
    }

    fn index(&self, cell: CellCoord) -> Result<usize, GridError> {
        self.topology
            .index(cell)
            .ok_or(GridError::OutOfBounds(cell))
    }

    fn remove_empty(&mut self, index: usize) {
        let Some(slot) = self.empty_slots[index].take() else {
            return;
        };
        let _ = self.empty.swap_remove(slot);
        if let Some(moved) = self.empty.get(slot).copied() {
            if let Some(moved_index) = self.topology.index(moved) {
                self.empty_slots[moved_index] = Some(slot);
            }
        }
    }

    fn insert_empty(&mut self, index: usize, cell: CellCoord) {
        if self.empty_slots[index].is_some() {
            return;
        }
        self.empty_slots[index] = Some(self.empty.len());
        self.empty.push(cell);
    }
}
