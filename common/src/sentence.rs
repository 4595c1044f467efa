use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::Cell;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// Cells are kept in a `BTreeSet`, so two sentences over the same cells and
/// count compare, hash and order equal no matter how they were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Sentence {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Sentence {
    /// Fails with [`Error::Inconsistent`] when `count` exceeds the number of cells.
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Result<Self> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if count > cells.len() {
            return Err(Error::inconsistent(&cells, count as i64));
        }
        Ok(Sentence { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// An empty sentence asserts nothing and can be dropped.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every cell is a mine.
    pub fn all_mines(&self) -> bool {
        !self.cells.is_empty() && self.count == self.cells.len()
    }

    /// No cell is a mine.
    pub fn all_safe(&self) -> bool {
        !self.cells.is_empty() && self.count == 0
    }

    /// The sentence left after learning that `cell` is a mine.
    pub fn without_mine(&self, cell: Cell) -> Result<Self> {
        if !self.cells.contains(&cell) {
            return Ok(self.clone());
        }
        let mut cells = self.cells.clone();
        cells.remove(&cell);
        match self.count.checked_sub(1) {
            Some(count) => Ok(Sentence { cells, count }),
            None => Err(Error::inconsistent(&cells, -1)),
        }
    }

    /// The sentence left after learning that `cell` is safe.
    pub fn without_safe(&self, cell: Cell) -> Result<Self> {
        if !self.cells.contains(&cell) {
            return Ok(self.clone());
        }
        let mut cells = self.cells.clone();
        cells.remove(&cell);
        Sentence::new(cells, self.count)
    }

    /// Subset resolution: if `self` is a non-empty subset of `other`, the
    /// mines outside `self` in `other` number `other.count - self.count`.
    ///
    /// Returns `Ok(None)` when the rule does not apply or the result would
    /// be an empty, zero-count sentence.
    pub fn resolve_against(&self, other: &Sentence) -> Result<Option<Sentence>> {
        if self.cells.is_empty() || !self.cells.is_subset(&other.cells) {
            return Ok(None);
        }
        let cells: BTreeSet<Cell> = other.cells.difference(&self.cells).copied().collect();
        let Some(count) = other.count.checked_sub(self.count) else {
            return Err(Error::inconsistent(
                &cells,
                other.count as i64 - self.count as i64,
            ));
        };
        if cells.is_empty() && count == 0 {
            return Ok(None);
        }
        Sentence::new(cells, count).map(Some)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.cells.iter().map(Cell::to_string).collect::<Vec<_>>();
        write!(f, "{{{}}} = {}", cells.join(", "), self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(row: usize, col: usize) -> Cell {
        Cell::new(row, col)
    }

    #[test]
    fn test_equality_ignores_cell_order() {
        let a = Sentence::new([c(0, 0), c(0, 1), c(1, 1)], 1).unwrap();
        let b = Sentence::new([c(1, 1), c(0, 0), c(0, 1)], 1).unwrap();
        assert_eq!(a, b);

        let set: std::collections::HashSet<Sentence> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_count_above_len_is_rejected() {
        let err = Sentence::new([c(0, 0)], 2).unwrap_err();
        assert!(matches!(err, Error::Inconsistent { .. }));
    }

    #[test]
    fn test_without_mine_decrements() {
        let s = Sentence::new([c(0, 0), c(0, 1)], 1).unwrap();
        let s = s.without_mine(c(0, 0)).unwrap();
        assert_eq!(s, Sentence::new([c(0, 1)], 0).unwrap());

        // Unrelated cells leave the sentence untouched
        assert_eq!(s.without_mine(c(5, 5)).unwrap(), s);
    }

    #[test]
    fn test_without_mine_underflow() {
        let s = Sentence::new([c(0, 0), c(0, 1)], 0).unwrap();
        assert!(matches!(
            s.without_mine(c(0, 0)),
            Err(Error::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_without_safe_keeps_count() {
        let s = Sentence::new([c(0, 0), c(0, 1), c(0, 2)], 1).unwrap();
        let s = s.without_safe(c(0, 2)).unwrap();
        assert_eq!(s.count(), 1);
        assert_eq!(s.len(), 2);

        // Removing a safe cell from an all-mine sentence is a contradiction
        let full = Sentence::new([c(1, 0), c(1, 1)], 2).unwrap();
        assert!(full.without_safe(c(1, 0)).is_err());
    }

    #[test]
    fn test_resolve_against_subset() {
        let small = Sentence::new([c(0, 0), c(0, 1)], 1).unwrap();
        let big = Sentence::new([c(0, 0), c(0, 1), c(0, 2)], 1).unwrap();

        let derived = small.resolve_against(&big).unwrap();
        assert_eq!(derived, Some(Sentence::new([c(0, 2)], 0).unwrap()));

        // Not a subset the other way round
        assert_eq!(big.resolve_against(&small).unwrap(), None);
    }

    #[test]
    fn test_resolve_against_equal_sets() {
        let a = Sentence::new([c(0, 0), c(0, 1)], 1).unwrap();
        assert_eq!(a.resolve_against(&a).unwrap(), None);

        // Same cells, different counts cannot both hold
        let b = Sentence::new([c(0, 0), c(0, 1)], 2).unwrap();
        assert!(a.resolve_against(&b).is_err());
        assert!(b.resolve_against(&a).is_err());
    }

    #[test]
    fn test_empty_sentence_never_resolves() {
        let empty = Sentence::new(Vec::new(), 0).unwrap();
        let big = Sentence::new([c(0, 0)], 1).unwrap();
        assert_eq!(empty.resolve_against(&big).unwrap(), None);
    }

    #[test]
    fn test_rules() {
        assert!(Sentence::new([c(0, 0), c(0, 1)], 2).unwrap().all_mines());
        assert!(Sentence::new([c(0, 0), c(0, 1)], 0).unwrap().all_safe());

        let empty = Sentence::new(Vec::new(), 0).unwrap();
        assert!(!empty.all_mines());
        assert!(!empty.all_safe());
    }

    #[test]
    fn test_display() {
        let s = Sentence::new([c(1, 0), c(0, 2)], 1).unwrap();
        assert_eq!(s.to_string(), "{(0, 2), (1, 0)} = 1");
    }
}
