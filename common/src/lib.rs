use std::fmt;

pub mod board;
pub mod error;
pub mod game;
pub mod knowledge;
pub mod oracle;
pub mod selector;
pub mod sentence;

pub use board::{Board, Minefield};
pub use error::{Error, Result};
pub use game::{Game, GameState, Tile};
pub use knowledge::KnowledgeBase;
pub use selector::{Guess, Move};
pub use sentence::Sentence;

/// A (row, col) position on the board, 0-indexed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    pub fn in_bounds(self, height: usize, width: usize) -> bool {
        self.row < height && self.col < width
    }

    /// All in-bounds cells adjacent to this one, diagonals included.
    /// Corners yield 3 cells, edges 5, interior cells 8.
    pub fn neighbors(self, height: usize, width: usize) -> impl Iterator<Item = Cell> {
        (-1isize..=1).flat_map(move |dr| {
            (-1isize..=1).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }
                let row = self.row.checked_add_signed(dr)?;
                let col = self.col.checked_add_signed(dc)?;
                let cell = Cell { row, col };
                cell.in_bounds(height, width).then_some(cell)
            })
        })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

/// Every cell of a `height` x `width` board in row-major order.
pub fn all_cells(height: usize, width: usize) -> impl Iterator<Item = Cell> {
    (0..height).flat_map(move |row| (0..width).map(move |col| Cell { row, col }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors() {
        // Corner, edge and interior cells on a 3x3 board
        let corner: Vec<Cell> = Cell::new(0, 0).neighbors(3, 3).collect();
        assert_eq!(
            corner,
            vec![Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)]
        );

        assert_eq!(Cell::new(0, 1).neighbors(3, 3).count(), 5);
        assert_eq!(Cell::new(1, 1).neighbors(3, 3).count(), 8);
        assert_eq!(Cell::new(2, 2).neighbors(3, 3).count(), 3);
    }

    #[test]
    fn test_neighbors_single_row() {
        let cells: Vec<Cell> = Cell::new(0, 1).neighbors(1, 3).collect();
        assert_eq!(cells, vec![Cell::new(0, 0), Cell::new(0, 2)]);
    }

    #[test]
    fn test_all_cells_row_major() {
        let cells: Vec<Cell> = all_cells(2, 2).collect();
        assert_eq!(
            cells,
            vec![
                Cell::new(0, 0),
                Cell::new(0, 1),
                Cell::new(1, 0),
                Cell::new(1, 1)
            ]
        );
    }
}
