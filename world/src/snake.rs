//! Segmented entity state and movement rules.

use std::collections::VecDeque;

use gridsnake_core::{
    CellCoord, Controller, Direction, Heading, Mover, SnakeId, SnakeSnapshot, Steering,
    Temperament, Topology,
};

use crate::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Liveness {
    Alive,
    Terminated,
}

/// Ordered run of cells, head first, moving one cell per tick.
#[derive(Clone, Debug)]
pub(crate) struct Snake {
    id: SnakeId,
    controller: Controller,
    topology: Topology,
    body: VecDeque<CellCoord>,
    direction: Heading,
    buffered: Heading,
    pending_growth: u32,
    steering_locked: bool,
    liveness: Liveness,
    score: u32,
    temperament: Temperament,
}

impl Snake {
    /// Builds a snake from its cells, head first.
    ///
    /// Every cell must be valid for the topology and distinct, and the
    /// heading must belong to the topology.
    pub(crate) fn new(
        id: SnakeId,
        controller: Controller,
        topology: Topology,
        body: Vec<CellCoord>,
        direction: Direction,
    ) -> Result<Self, SessionError> {
        let heading = topology
            .heading(direction)
            .ok_or(SessionError::UnsupportedHeading { direction })?;
        if body.is_empty() {
            return Err(SessionError::InitialLengthZero);
        }
        for (position, cell) in body.iter().enumerate() {
            if !topology.is_valid(*cell) {
                return Err(SessionError::SpawnOutOfBounds { cell: *cell });
            }
            if body[..position].contains(cell) {
                return Err(SessionError::Overlap { cell: *cell });
            }
        }

        Ok(Self {
            id,
            controller,
            topology,
            body: body.into(),
            direction: heading,
            buffered: heading,
            pending_growth: 0,
            steering_locked: false,
            liveness: Liveness::Alive,
            score: 0,
            temperament: Temperament::default(),
        })
    }

    pub(crate) fn with_temperament(mut self, temperament: Temperament) -> Self {
        self.temperament = temperament;
        self
    }

    /// Cells a snake of `length` occupies when its head sits on `head` and it
    /// faces `direction`; the body trails opposite to the heading.
    ///
    /// Lengths beyond the board's cell count are rejected before anything is
    /// allocated.
    pub(crate) fn trailing_body(
        topology: Topology,
        head: CellCoord,
        direction: Direction,
        length: u32,
    ) -> Result<Vec<CellCoord>, SessionError> {
        let heading = topology
            .heading(direction)
            .ok_or(SessionError::UnsupportedHeading { direction })?;
        let cells = topology.cell_count();
        if usize::try_from(length).map_or(true, |length| length > cells) {
            return Err(SessionError::SnakeTooLong { length, cells });
        }
        let behind = topology.opposite(heading);
        let mut body = Vec::with_capacity(length as usize);
        let mut cell = head;
        for _ in 0..length {
            body.push(cell);
            cell = cell.translate(behind);
        }
        Ok(body)
    }

    pub(crate) const fn id(&self) -> SnakeId {
        self.id
    }

    pub(crate) const fn controller(&self) -> Controller {
        self.controller
    }

    pub(crate) fn head(&self) -> CellCoord {
        self.body[0]
    }

    pub(crate) fn tail(&self) -> CellCoord {
        self.body[self.body.len() - 1]
    }

    pub(crate) fn body(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.body.iter().copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.body.len()
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.liveness == Liveness::Alive
    }

    pub(crate) const fn score(&self) -> u32 {
        self.score
    }

    /// Candidate head cell for the next move. Does not mutate state.
    pub(crate) fn propose_move(&self) -> CellCoord {
        self.head().translate(self.buffered)
    }

    /// Whether the tail stays in place on the next commit.
    pub(crate) const fn is_growing(&self) -> bool {
        self.pending_growth > 0
    }

    pub(crate) fn mover(&self) -> Mover {
        Mover {
            id: self.id,
            tail: self.tail(),
            growing: self.is_growing(),
        }
    }

    /// Prepends the new head and drops the tail unless the snake grows.
    ///
    /// Returns the vacated tail cell, if any. Commits the buffered heading and
    /// releases the steering lock for the next tick.
    pub(crate) fn commit_move(&mut self, new_head: CellCoord, grew: bool) -> Option<CellCoord> {
        let vacated = if grew {
            None
        } else if self.pending_growth > 0 {
            self.pending_growth -= 1;
            None
        } else {
            self.body.pop_back()
        };

        self.body.push_front(new_head);
        self.direction = self.buffered;
        self.steering_locked = false;
        vacated
    }

    /// Buffers a heading for the next move.
    ///
    /// The first change accepted within a tick wins; later different requests
    /// in the same tick are ignored until the next commit. Reversals are
    /// judged against the committed heading, not the buffered one.
    pub(crate) fn buffer_direction(&mut self, requested: Direction) -> Steering {
        let Some(heading) = self.topology.heading(requested) else {
            return Steering::IgnoredUnsupported;
        };
        if heading == self.buffered {
            return Steering::Unchanged;
        }
        if self.steering_locked {
            return Steering::IgnoredLocked;
        }
        if self.body.len() > 1 && heading == self.topology.opposite(self.direction) {
            return Steering::IgnoredReversal;
        }

        self.buffered = heading;
        self.steering_locked = true;
        Steering::Accepted
    }

    pub(crate) fn grow(&mut self, segments: u32) {
        self.pending_growth = self.pending_growth.saturating_add(segments);
    }

    pub(crate) fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Marks the snake as terminated and hands back the cells it occupied.
    pub(crate) fn terminate(&mut self) -> Vec<CellCoord> {
        self.liveness = Liveness::Terminated;
        self.body.iter().copied().collect()
    }

    pub(crate) fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            id: self.id,
            controller: self.controller,
            body: self.body.iter().copied().collect(),
            direction: self.direction.direction(),
            buffered_direction: self.buffered.direction(),
            pending_growth: self.pending_growth,
            alive: self.is_alive(),
            score: self.score,
            temperament: self.temperament,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_snake() -> Snake {
        let topology = Topology::square(10, 10);
        let body = Snake::trailing_body(topology, CellCoord::new(5, 5), Direction::East, 3)
            .expect("body");
        Snake::new(SnakeId::new(0), Controller::Player, topology, body, Direction::East)
            .expect("snake")
    }

    fn assert_no_duplicates(snake: &Snake) {
        let cells: Vec<_> = snake.body().collect();
        for (position, cell) in cells.iter().enumerate() {
            assert!(!cells[position + 1..].contains(cell), "duplicate {cell:?}");
        }
    }

    #[test]
    fn trailing_body_extends_behind_head() {
        let snake = square_snake();
        let cells: Vec<_> = snake.body().collect();
        assert_eq!(
            cells,
            vec![CellCoord::new(5, 5), CellCoord::new(4, 5), CellCoord::new(3, 5)]
        );
    }

    #[test]
    fn trailing_body_rejects_lengths_beyond_the_board() {
        let topology = Topology::square(3, 2);
        let head = CellCoord::new(2, 0);
        assert!(Snake::trailing_body(topology, head, Direction::East, 6).is_ok());
        assert_eq!(
            Snake::trailing_body(topology, head, Direction::East, 7).unwrap_err(),
            SessionError::SnakeTooLong {
                length: 7,
                cells: 6
            }
        );
        assert_eq!(
            Snake::trailing_body(topology, head, Direction::East, u32::MAX).unwrap_err(),
            SessionError::SnakeTooLong {
                length: u32::MAX,
                cells: 6
            }
        );
    }

    #[test]
    fn construction_rejects_invalid_bodies() {
        let topology = Topology::square(4, 4);
        let overlapping = vec![CellCoord::new(1, 1), CellCoord::new(1, 1)];
        assert!(matches!(
            Snake::new(SnakeId::new(0), Controller::Player, topology, overlapping, Direction::East),
            Err(SessionError::Overlap { .. })
        ));

        let outside = vec![CellCoord::new(4, 1)];
        assert!(matches!(
            Snake::new(SnakeId::new(0), Controller::Player, topology, outside, Direction::East),
            Err(SessionError::SpawnOutOfBounds { .. })
        ));

        let body = vec![CellCoord::new(1, 1)];
        assert!(matches!(
            Snake::new(SnakeId::new(0), Controller::Player, topology, body, Direction::NorthEast),
            Err(SessionError::UnsupportedHeading { .. })
        ));
    }

    #[test]
    fn propose_move_does_not_mutate() {
        let snake = square_snake();
        assert_eq!(snake.propose_move(), CellCoord::new(6, 5));
        assert_eq!(snake.propose_move(), CellCoord::new(6, 5));
        assert_eq!(snake.head(), CellCoord::new(5, 5));
    }

    #[test]
    fn commit_move_drops_tail_unless_growing() {
        let mut snake = square_snake();
        let vacated = snake.commit_move(CellCoord::new(6, 5), false);
        assert_eq!(vacated, Some(CellCoord::new(3, 5)));
        assert_eq!(snake.len(), 3);

        snake.grow(1);
        assert!(snake.is_growing());
        let vacated = snake.commit_move(CellCoord::new(7, 5), false);
        assert_eq!(vacated, None);
        assert_eq!(snake.len(), 4);
        assert!(!snake.is_growing());

        let vacated = snake.commit_move(CellCoord::new(8, 5), true);
        assert_eq!(vacated, None);
        assert_eq!(snake.len(), 5);
        assert_no_duplicates(&snake);
    }

    #[test]
    fn reversal_is_ignored_for_multi_cell_snakes() {
        let mut snake = square_snake();
        assert_eq!(snake.buffer_direction(Direction::West), Steering::IgnoredReversal);
        assert_eq!(snake.propose_move(), CellCoord::new(6, 5));
    }

    #[test]
    fn single_cell_snake_may_reverse() {
        let topology = Topology::square(5, 5);
        let mut snake = Snake::new(
            SnakeId::new(0),
            Controller::Player,
            topology,
            vec![CellCoord::new(2, 2)],
            Direction::East,
        )
        .expect("snake");
        assert_eq!(snake.buffer_direction(Direction::West), Steering::Accepted);
        assert_eq!(snake.propose_move(), CellCoord::new(1, 2));
    }

    #[test]
    fn first_accepted_change_wins_until_commit() {
        let mut snake = square_snake();
        assert_eq!(snake.buffer_direction(Direction::North), Steering::Accepted);
        assert_eq!(snake.buffer_direction(Direction::South), Steering::IgnoredLocked);
        assert_eq!(snake.buffer_direction(Direction::North), Steering::Unchanged);
        assert_eq!(snake.propose_move(), CellCoord::new(5, 4));

        let head = snake.propose_move();
        let _ = snake.commit_move(head, false);
        assert_eq!(snake.buffer_direction(Direction::East), Steering::Accepted);
    }

    #[test]
    fn unsupported_direction_is_reported() {
        let mut snake = square_snake();
        assert_eq!(
            snake.buffer_direction(Direction::SouthEast),
            Steering::IgnoredUnsupported
        );
    }

    #[test]
    fn terminate_releases_every_cell() {
        let mut snake = square_snake();
        let cells = snake.terminate();
        assert_eq!(cells.len(), 3);
        assert!(!snake.is_alive());
        assert!(!snake.snapshot().alive);
    }
}
