//! Move selection on top of a [`KnowledgeBase`].
//!
//! Strategy: play a cell that is provably safe whenever one exists,
//! otherwise guess among the cells the sentences consider least dangerous.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::Result;
use crate::{Cell, KnowledgeBase, all_cells};

/// Score given to a cell that no sentence mentions.
pub const NEUTRAL_SAFETY: f64 = 50.0;

/// A heuristic pick made when no cell is provably safe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guess {
    pub cell: Cell,
    /// Estimated chance, 0 to 100, that the cell is not a mine.
    pub safety: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Move {
    Safe(Cell),
    Guess(Guess),
}

impl Move {
    pub fn cell(&self) -> Cell {
        match self {
            Move::Safe(cell) => *cell,
            Move::Guess(guess) => guess.cell,
        }
    }
}

/// Settles the knowledge base, then returns a known-safe cell that has not
/// been played yet. The smallest such cell is returned so play is reproducible.
pub fn pick_safe_move(kb: &mut KnowledgeBase) -> Result<Option<Cell>> {
    kb.settle()?;
    Ok(kb.safes().difference(kb.moves_made()).min().copied())
}

/// Safety score of every unplayed cell not known to be a mine.
///
/// A cell's score is `100 - max(100 * count / len)` over the sentences that
/// contain it, or [`NEUTRAL_SAFETY`] when no sentence does.
pub fn safety_scores(kb: &KnowledgeBase) -> HashMap<Cell, f64> {
    let mut danger: HashMap<Cell, f64> = HashMap::new();
    for sentence in kb.sentences().iter().filter(|s| !s.is_empty()) {
        let percent = 100.0 * sentence.count() as f64 / sentence.len() as f64;
        for cell in sentence.cells() {
            let entry = danger.entry(*cell).or_insert(percent);
            *entry = entry.max(percent);
        }
    }

    all_cells(kb.height(), kb.width())
        .filter(|cell| !kb.moves_made().contains(cell) && !kb.mines().contains(cell))
        .map(|cell| {
            let safety = danger
                .get(&cell)
                .map_or(NEUTRAL_SAFETY, |percent| 100.0 - percent);
            (cell, safety)
        })
        .collect()
}

/// Picks uniformly among the candidates with the highest safety score.
/// Returns `None` when every remaining cell is played or a known mine.
pub fn pick_random_move<R: Rng + ?Sized>(kb: &KnowledgeBase, rng: &mut R) -> Option<Guess> {
    let scores = safety_scores(kb);
    let best = scores.values().copied().reduce(f64::max)?;

    let mut candidates: Vec<Cell> = scores
        .iter()
        .filter(|&(_, &safety)| safety == best)
        .map(|(&cell, _)| cell)
        .collect();
    // HashMap order is unstable; sort so a seeded rng gives a repeatable pick.
    candidates.sort_unstable();

    let cell = *candidates.choose(rng)?;
    Some(Guess { cell, safety: best })
}

/// A safe move if one is known, otherwise the best guess.
pub fn next_move<R: Rng + ?Sized>(kb: &mut KnowledgeBase, rng: &mut R) -> Result<Option<Move>> {
    if let Some(cell) = pick_safe_move(kb)? {
        return Ok(Some(Move::Safe(cell)));
    }
    Ok(pick_random_move(kb, rng).map(Move::Guess))
}
