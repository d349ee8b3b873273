use gridsnake_core::{
    CellCoord, ItemId, Mover, OccupancyView, Occupant, SnakeId, TerminationCause, Topology,
    Verdict,
};
use gridsnake_system_collision::resolve;

struct Board {
    topology: Topology,
    cells: Vec<Occupant>,
}

impl Board {
    fn new(topology: Topology) -> Self {
        Self {
            topology,
            cells: vec![Occupant::Empty; topology.cell_count()],
        }
    }

    fn place(&mut self, cell: CellCoord, occupant: Occupant) {
        let index = self.topology.index(cell).expect("cell on board");
        self.cells[index] = occupant;
    }

    fn view(&self) -> OccupancyView<'_> {
        OccupancyView::new(self.topology, &self.cells)
    }
}

fn snake_on(board: &mut Board, id: SnakeId, body: &[CellCoord]) {
    for cell in body {
        board.place(*cell, Occupant::Segment(id));
    }
}

#[test]
fn leaving_the_board_is_a_wall_collision() {
    for topology in [Topology::square(4, 4), Topology::hexagonal(2)] {
        let board = Board::new(topology);
        let mover = Mover {
            id: SnakeId::new(0),
            tail: CellCoord::new(0, 0),
            growing: false,
        };
        assert_eq!(
            resolve(CellCoord::new(3, 3), board.view(), mover),
            if topology.is_valid(CellCoord::new(3, 3)) {
                Verdict::Continue
            } else {
                Verdict::Terminate(TerminationCause::WallCollision)
            }
        );
        assert_eq!(
            resolve(CellCoord::new(-3, 0), board.view(), mover),
            Verdict::Terminate(TerminationCause::WallCollision)
        );
    }
}

#[test]
fn moving_into_vacating_tail_continues() {
    // Body [A, B, C] curled so the head is adjacent to its own tail.
    let mut board = Board::new(Topology::square(4, 4));
    let id = SnakeId::new(0);
    let a = CellCoord::new(1, 1);
    let b = CellCoord::new(1, 2);
    let c = CellCoord::new(2, 2);
    let d = CellCoord::new(2, 1);
    snake_on(&mut board, id, &[a, b, c, d]);

    let mover = Mover {
        id,
        tail: d,
        growing: false,
    };
    assert_eq!(resolve(d, board.view(), mover), Verdict::Continue);
}

#[test]
fn forgiving_tail_on_three_cell_snake() {
    let mut board = Board::new(Topology::hexagonal(3));
    let id = SnakeId::new(0);
    let a = CellCoord::new(0, 0);
    let b = CellCoord::new(1, 0);
    let c = CellCoord::new(1, -1);
    snake_on(&mut board, id, &[a, b, c]);

    // (1, -1) is the NorthEast neighbour of the head, and the current tail.
    let mover = Mover {
        id,
        tail: c,
        growing: false,
    };
    assert_eq!(resolve(c, board.view(), mover), Verdict::Continue);
}

#[test]
fn growing_snake_collides_with_its_tail() {
    let mut board = Board::new(Topology::square(4, 4));
    let id = SnakeId::new(0);
    let body = [
        CellCoord::new(1, 1),
        CellCoord::new(1, 2),
        CellCoord::new(2, 2),
        CellCoord::new(2, 1),
    ];
    snake_on(&mut board, id, &body);

    let mover = Mover {
        id,
        tail: body[3],
        growing: true,
    };
    assert_eq!(
        resolve(body[3], board.view(), mover),
        Verdict::Terminate(TerminationCause::SelfCollision)
    );
}

#[test]
fn own_body_other_than_tail_is_self_collision() {
    let mut board = Board::new(Topology::square(5, 5));
    let id = SnakeId::new(0);
    let body = [
        CellCoord::new(2, 2),
        CellCoord::new(2, 3),
        CellCoord::new(3, 3),
        CellCoord::new(3, 2),
        CellCoord::new(4, 2),
    ];
    snake_on(&mut board, id, &body);

    let mover = Mover {
        id,
        tail: body[4],
        growing: false,
    };
    assert_eq!(
        resolve(body[3], board.view(), mover),
        Verdict::Terminate(TerminationCause::SelfCollision)
    );
}

#[test]
fn another_snake_tail_is_never_forgiven() {
    let mut board = Board::new(Topology::square(5, 5));
    let me = SnakeId::new(0);
    let other = SnakeId::new(1);
    snake_on(&mut board, me, &[CellCoord::new(0, 0)]);
    snake_on(&mut board, other, &[CellCoord::new(1, 1), CellCoord::new(1, 0)]);

    let mover = Mover {
        id: me,
        tail: CellCoord::new(0, 0),
        growing: false,
    };
    assert_eq!(
        resolve(CellCoord::new(1, 0), board.view(), mover),
        Verdict::Terminate(TerminationCause::SnakeCollision { other })
    );
}

#[test]
fn items_and_empty_cells_are_passable() {
    let mut board = Board::new(Topology::hexagonal(2));
    let item = ItemId::new(1, 0);
    board.place(CellCoord::new(2, -1), Occupant::Item(item));

    let mover = Mover {
        id: SnakeId::new(0),
        tail: CellCoord::new(0, 0),
        growing: false,
    };
    assert_eq!(
        resolve(CellCoord::new(2, -1), board.view(), mover),
        Verdict::Consume(item)
    );
    assert_eq!(
        resolve(CellCoord::new(1, -1), board.view(), mover),
        Verdict::Continue
    );
}
