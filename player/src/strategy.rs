use rand::Rng;
use rand::seq::SliceRandom;

use domain::{BOARD_SIZE, Board, Position};

/// Picks a random empty cell, preferring cells next to pieces already on the board.
/// Opens in the center; `None` when the board is full.
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    rng: &mut R,
) -> Option<Position> {
    let empty: Vec<Position> = (0..BOARD_SIZE)
        .flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
        .filter(|&position| board.is_empty_at(position))
        .collect();
    if empty.len() == BOARD_SIZE * BOARD_SIZE {
        return Some(Position::new(BOARD_SIZE / 2, BOARD_SIZE / 2));
    }

    let near: Vec<Position> = empty.iter().copied().filter(|&position| has_neighbor(board, position)).collect();
    let pool = if near.is_empty() { &empty } else { &near };
    pool.choose(rng).copied()
}

fn has_neighbor(
    board: &Board,
    position: Position,
) -> bool {
    const OFFSETS: [(isize, isize); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];
    OFFSETS.iter().any(|&(dr, dc)| {
        match (position.row.checked_add_signed(dr), position.col.checked_add_signed(dc)) {
            (Some(row), Some(col)) => board.get(Position::new(row, col)).is_some(),
            _ => false,
        }
    })
}
