use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::IteratorRandom;

use crate::error::{Error, Result};
use crate::{Cell, all_cells};

/// Read-only view of the hidden mine layout.
///
/// The knowledge base never sees this; the driver queries it when a cell is
/// revealed and passes the resulting count on as an observation.
pub trait Board {
    fn height(&self) -> usize;

    fn width(&self) -> usize;

    fn is_mine(&self, cell: Cell) -> bool;

    /// Number of mines in the (up to 8) cells around `cell`, not counting `cell` itself.
    fn nearby_mine_count(&self, cell: Cell) -> usize {
        cell.neighbors(self.height(), self.width())
            .filter(|&neighbor| self.is_mine(neighbor))
            .count()
    }

    fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.height(), self.width())
    }
}

/// A fixed mine layout on a `height` x `width` grid.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Minefield {
    height: usize,
    width: usize,
    mines: BTreeSet<Cell>,
}

impl Minefield {
    /// Places `mines` mines uniformly at random.
    pub fn random<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let cells = height * width;
        if mines >= cells {
            return Err(Error::TooManyMines { mines, cells });
        }
        let mines = all_cells(height, width).choose_multiple(rng, mines);
        Ok(Minefield {
            height,
            width,
            mines: mines.into_iter().collect(),
        })
    }

    /// Builds a minefield with mines at exactly the given cells.
    pub fn with_mines(
        height: usize,
        width: usize,
        mines: impl IntoIterator<Item = Cell>,
    ) -> Result<Self> {
        let mines: BTreeSet<Cell> = mines.into_iter().collect();
        if let Some(&cell) = mines.iter().find(|cell| !cell.in_bounds(height, width)) {
            return Err(Error::OutOfBounds {
                cell,
                height,
                width,
            });
        }
        if mines.len() >= height * width {
            return Err(Error::TooManyMines {
                mines: mines.len(),
                cells: height * width,
            });
        }
        Ok(Minefield {
            height,
            width,
            mines,
        })
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }
}

impl Board for Minefield {
    fn height(&self) -> usize {
        self.height
    }

    fn width(&self) -> usize {
        self.width
    }

    fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_random_places_requested_mines() {
        let mut rng = StdRng::seed_from_u64(1);
        let field = Minefield::random(8, 8, 10, &mut rng).unwrap();
        assert_eq!(field.mine_count(), 10);
        assert!(field.mines().iter().all(|&cell| field.contains(cell)));
    }

    #[test]
    fn test_too_many_mines() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            Minefield::random(3, 3, 9, &mut rng),
            Err(Error::TooManyMines { mines: 9, cells: 9 })
        );
    }

    #[test]
    fn test_with_mines_rejects_out_of_bounds() {
        assert!(matches!(
            Minefield::with_mines(3, 3, [Cell::new(3, 1)]),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_nearby_mine_count() {
        // X . .
        // . . .
        // . . X
        let field = Minefield::with_mines(3, 3, [Cell::new(0, 0), Cell::new(2, 2)]).unwrap();
        assert_eq!(field.nearby_mine_count(Cell::new(1, 1)), 2);
        assert_eq!(field.nearby_mine_count(Cell::new(0, 1)), 1);
        assert_eq!(field.nearby_mine_count(Cell::new(2, 0)), 0);
        // A mine does not count itself
        assert_eq!(field.nearby_mine_count(Cell::new(0, 0)), 0);
    }
}
