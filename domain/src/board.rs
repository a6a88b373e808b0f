use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BOARD_SIZE, SessionError, WIN_LENGTH};

/// Axes scanned by win detection: vertical, horizontal and both diagonals.
const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PieceType {
    Black,
    White,
}

impl PieceType {
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            PieceType::Black => PieceType::White,
            PieceType::White => PieceType::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid piece type {0}, expected 1 (black) or 2 (white)")]
pub struct InvalidPieceType(pub u8);

impl From<PieceType> for u8 {
    fn from(piece: PieceType) -> Self {
        match piece {
            PieceType::Black => 1,
            PieceType::White => 2,
        }
    }
}

impl TryFrom<u8> for PieceType {
    type Error = InvalidPieceType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PieceType::Black),
            2 => Ok(PieceType::White),
            other => Err(InvalidPieceType(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[must_use]
    pub fn new(
        row: usize,
        col: usize,
    ) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }
}

type Cells = [[Option<PieceType>; BOARD_SIZE]; BOARD_SIZE];

/// Fixed 15x15 grid. `None` is an empty cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Cells,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Piece at `position`, `None` for empty or off-board cells.
    pub fn get(
        &self,
        position: Position,
    ) -> Option<PieceType> {
        if !position.in_bounds() {
            return None;
        }
        self.cells[position.row][position.col]
    }

    pub fn is_empty_at(
        &self,
        position: Position,
    ) -> bool {
        position.in_bounds() && self.cells[position.row][position.col].is_none()
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Writes `piece` at `position`, overwriting whatever is there.
    pub fn place(
        &mut self,
        position: Position,
        piece: PieceType,
    ) -> Result<(), SessionError> {
        if !position.in_bounds() {
            return Err(SessionError::OutOfBounds {
                row: position.row,
                col: position.col,
            });
        }
        self.cells[position.row][position.col] = Some(piece);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells = [[None; BOARD_SIZE]; BOARD_SIZE];
    }

    /// True when `position`, counted as `piece`, completes a run of at least five on any axis.
    pub fn is_winning_move(
        &self,
        position: Position,
        piece: PieceType,
    ) -> bool {
        if !position.in_bounds() {
            return false;
        }
        AXES.iter().any(|&(d_row, d_col)| {
            let run = 1
                + self.count_direction(position, piece, d_row, d_col)
                + self.count_direction(position, piece, -d_row, -d_col);
            run >= WIN_LENGTH
        })
    }

    fn count_direction(
        &self,
        from: Position,
        piece: PieceType,
        d_row: isize,
        d_col: isize,
    ) -> usize {
        let mut count = 0;
        let mut row = from.row as isize;
        let mut col = from.col as isize;
        loop {
            row += d_row;
            col += d_col;
            if row < 0 || col < 0 {
                break;
            }
            let next = Position::new(row as usize, col as usize);
            if self.get(next) != Some(piece) {
                break;
            }
            count += 1;
        }
        count
    }
}
