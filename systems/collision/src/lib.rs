#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure collision resolver that classifies a proposed head cell.

use gridsnake_core::{CellCoord, Mover, OccupancyView, Occupant, TerminationCause, Verdict};

/// Classifies the cell a snake is about to enter.
///
/// Rules, in order:
/// 1. Off the board terminates with [`TerminationCause::WallCollision`].
/// 2. A segment terminates, except the mover's own tail while it is not
///    growing, since the tail vacates the cell during the same move.
/// 3. An obstacle terminates with [`TerminationCause::ObstacleCollision`].
/// 4. An item is consumed.
/// 5. Anything else continues.
#[must_use]
pub fn resolve(proposed_head: CellCoord, grid: OccupancyView<'_>, mover: Mover) -> Verdict {
    let Some(occupant) = grid.occupant(proposed_head) else {
        return Verdict::Terminate(TerminationCause::WallCollision);
    };

    match occupant {
        Occupant::Empty => Verdict::Continue,
        Occupant::Item(item) => Verdict::Consume(item),
        Occupant::Obstacle => Verdict::Terminate(TerminationCause::ObstacleCollision),
        Occupant::Segment(owner) if owner == mover.id => {
            if proposed_head == mover.tail && !mover.growing {
                Verdict::Continue
            } else {
                Verdict::Terminate(TerminationCause::SelfCollision)
            }
        }
        Occupant::Segment(other) => Verdict::Terminate(TerminationCause::SnakeCollision { other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsnake_core::{ItemId, SnakeId, Topology};

    #[test]
    fn obstacle_terminates() {
        let topology = Topology::square(2, 1);
        let cells = [Occupant::Obstacle, Occupant::Empty];
        let view = OccupancyView::new(topology, &cells);
        let mover = Mover {
            id: SnakeId::new(0),
            tail: CellCoord::new(1, 0),
            growing: false,
        };
        assert_eq!(
            resolve(CellCoord::new(0, 0), view, mover),
            Verdict::Terminate(TerminationCause::ObstacleCollision)
        );
    }

    #[test]
    fn item_is_consumed() {
        let topology = Topology::square(2, 1);
        let item = ItemId::new(0, 4);
        let cells = [Occupant::Item(item), Occupant::Segment(SnakeId::new(0))];
        let view = OccupancyView::new(topology, &cells);
        let mover = Mover {
            id: SnakeId::new(0),
            tail: CellCoord::new(1, 0),
            growing: false,
        };
        assert_eq!(resolve(CellCoord::new(0, 0), view, mover), Verdict::Consume(item));
    }
}
