//! Error types for the knowledge base and the game session.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::Cell;

/// Errors raised when the caller feeds the engine input it cannot reconcile.
///
/// None of these are retryable: they mean the observations handed to the
/// knowledge base are wrong, and the caller has to fix its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("cell {cell} is outside the {height}x{width} board")]
    OutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },

    #[error("cell {cell} reports {count} nearby mines but only has {neighbors} neighbors")]
    CountExceedsNeighbors {
        cell: Cell,
        count: usize,
        neighbors: usize,
    },

    #[error("cell {cell} cannot be both a mine and safe")]
    Contradiction { cell: Cell },

    #[error("inconsistent sentence: {sentence}")]
    Inconsistent { sentence: String },

    #[error("{mines} mines do not fit on a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },

    #[error("game already over")]
    GameOver,
}

impl Error {
    /// Builds an `Inconsistent` error from the raw pieces of a sentence that
    /// could not be constructed. `count` is signed so underflow can be shown.
    pub(crate) fn inconsistent(cells: &BTreeSet<Cell>, count: i64) -> Self {
        let cells = cells.iter().map(Cell::to_string).collect::<Vec<_>>();
        Error::Inconsistent {
            sentence: format!("{{{}}} = {}", cells.join(", "), count),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
