//! Propositional knowledge base over the cells of one board.
//!
//! Every revealed cell contributes a [`Sentence`] over its unresolved
//! neighbors. Inference combines three rules until nothing new follows:
//!
//! 1. a sentence whose count equals its size makes every cell a mine;
//! 2. a sentence with count zero makes every cell safe;
//! 3. if `A ⊆ B`, then `B - A` holds exactly `B.count - A.count` mines.
//!
//! Once a cell is proven it is removed from every sentence, so sentences
//! only ever mention unresolved cells.

use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::{Cell, Sentence};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeBase {
    height: usize,
    width: usize,
    /// Cells the driver has already revealed.
    moves_made: HashSet<Cell>,
    /// Cells proven mine-free.
    safes: HashSet<Cell>,
    /// Cells proven to be mines.
    mines: HashSet<Cell>,
    sentences: BTreeSet<Sentence>,
}

impl KnowledgeBase {
    pub fn new(height: usize, width: usize) -> Self {
        KnowledgeBase {
            height,
            width,
            ..Default::default()
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    pub fn safes(&self) -> &HashSet<Cell> {
        &self.safes
    }

    pub fn mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    pub fn sentences(&self) -> &BTreeSet<Sentence> {
        &self.sentences
    }

    pub fn is_resolved(&self, cell: &Cell) -> bool {
        self.safes.contains(cell) || self.mines.contains(cell)
    }

    /// Adds a sentence directly, pruning cells that are already resolved.
    ///
    /// Observations normally arrive through [`add_observation`](Self::add_observation);
    /// this is the lower-level entry for callers holding constraints of their own.
    pub fn add_sentence(&mut self, sentence: Sentence) -> Result<bool> {
        for cell in sentence.cells() {
            self.check_bounds(*cell)?;
        }
        let mut pruned = sentence;
        for cell in &self.mines {
            pruned = pruned.without_mine(*cell)?;
        }
        for cell in &self.safes {
            pruned = pruned.without_safe(*cell)?;
        }
        Ok(self.sentences.insert(pruned))
    }

    /// Records that `cell` is a mine and strikes it from every sentence.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<()> {
        self.check_bounds(cell)?;
        if self.safes.contains(&cell) {
            return Err(Error::Contradiction { cell });
        }
        self.sentences = self
            .sentences
            .iter()
            .map(|sentence| sentence.without_mine(cell))
            .collect::<Result<_>>()?;
        self.mines.insert(cell);
        Ok(())
    }

    /// Records that `cell` is safe and strikes it from every sentence.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<()> {
        self.check_bounds(cell)?;
        if self.mines.contains(&cell) {
            return Err(Error::Contradiction { cell });
        }
        self.sentences = self
            .sentences
            .iter()
            .map(|sentence| sentence.without_safe(cell))
            .collect::<Result<_>>()?;
        self.safes.insert(cell);
        Ok(())
    }

    /// Called once for every revealed cell with the number of mines around it.
    ///
    /// Marks the cell as played and safe, then adds a sentence over its
    /// neighbors that are not yet known safe, with known mines already
    /// subtracted. Inference is left to [`closure`](Self::closure).
    pub fn add_observation(&mut self, cell: Cell, count: usize) -> Result<()> {
        self.check_bounds(cell)?;
        let neighbors: Vec<Cell> = cell.neighbors(self.height, self.width).collect();
        if count > neighbors.len() {
            return Err(Error::CountExceedsNeighbors {
                cell,
                count,
                neighbors: neighbors.len(),
            });
        }

        let (known_mines, unknown): (Vec<Cell>, Vec<Cell>) = neighbors
            .into_iter()
            .filter(|neighbor| !self.safes.contains(neighbor))
            .partition(|neighbor| self.mines.contains(neighbor));

        let Some(count) = count.checked_sub(known_mines.len()) else {
            let unknown: BTreeSet<Cell> = unknown.into_iter().collect();
            return Err(Error::inconsistent(
                &unknown,
                count as i64 - known_mines.len() as i64,
            ));
        };
        let sentence = Sentence::new(unknown, count)?;

        self.mark_safe(cell)?;
        self.moves_made.insert(cell);
        tracing::debug!(%cell, %sentence, "observation added");
        self.sentences.insert(sentence);
        Ok(())
    }

    /// Runs one inference pass and reports whether anything new was learned:
    /// a mine, a safe cell, or a sentence not already known.
    ///
    /// The pass runs on a copy and is only committed if it succeeds, so an
    /// error leaves the knowledge base as it was.
    ///
    /// Call repeatedly (or use [`settle`](Self::settle)) until it returns `false`.
    pub fn closure(&mut self) -> Result<bool> {
        let mut next = self.clone();
        let changed = next.inference_pass()?;
        *self = next;
        Ok(changed)
    }

    fn inference_pass(&mut self) -> Result<bool> {
        self.sentences.retain(|sentence| !sentence.is_empty());

        let mut derived = Vec::new();
        for (a, b) in self.sentences.iter().tuple_combinations() {
            if let Some(sentence) = a.resolve_against(b)? {
                derived.push(sentence);
            }
            if let Some(sentence) = b.resolve_against(a)? {
                derived.push(sentence);
            }
        }

        let mut added = 0;
        for sentence in derived {
            if self.sentences.insert(sentence) {
                added += 1;
            }
        }

        // Collect first, then mark: marking rewrites the sentence set.
        let mut new_mines = BTreeSet::new();
        let mut new_safes = BTreeSet::new();
        for sentence in &self.sentences {
            if sentence.all_mines() {
                new_mines.extend(sentence.cells().iter().copied());
            } else if sentence.all_safe() {
                new_safes.extend(sentence.cells().iter().copied());
            }
        }

        if let Some(cell) = new_mines.intersection(&new_safes).next() {
            return Err(Error::Contradiction { cell: *cell });
        }
        for cell in &new_mines {
            self.mark_mine(*cell)?;
        }
        for cell in &new_safes {
            self.mark_safe(*cell)?;
        }

        tracing::debug!(
            derived = added,
            mines = new_mines.len(),
            safes = new_safes.len(),
            sentences = self.sentences.len(),
            "closure pass"
        );

        Ok(added > 0 || !new_mines.is_empty() || !new_safes.is_empty())
    }

    fn check_bounds(&self, cell: Cell) -> Result<()> {
        if cell.in_bounds(self.height, self.width) {
            return Ok(());
        }
        Err(Error::OutOfBounds {
            cell,
            height: self.height,
            width: self.width,
        })
    }

    /// Runs [`closure`](Self::closure) to a fixed point and returns the number
    /// of passes that changed something.
    pub fn settle(&mut self) -> Result<usize> {
        let mut passes = 0;
        while self.closure()? {
            passes += 1;
        }
        Ok(passes)
    }
}
