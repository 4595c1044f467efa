use std::collections::{BTreeSet, HashSet, VecDeque};

use rand::Rng;

use crate::board::{Board, Minefield};
use crate::error::{Error, Result};
use crate::selector::{self, Move};
use crate::{Cell, KnowledgeBase, Sentence, all_cells};

/// What the player can see of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Tile {
    Hidden,
    Revealed(u8), // The u8 is the number of adjacent mines.
}

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// One game session: the hidden board, what has been revealed, and the
/// knowledge base the AI builds from those reveals.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Game<B = Minefield> {
    board: B,
    /// The visible state of the board, indexed `[row][col]`.
    tiles: Vec<Vec<Tile>>,
    flags: BTreeSet<Cell>,
    knowledge: KnowledgeBase,
    state: GameState,
}

impl Game<Minefield> {
    /// Starts a game on a freshly randomized minefield.
    pub fn random<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Ok(Game::new(Minefield::random(height, width, mines, rng)?))
    }

    /// Deserializes a game state from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the game state to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }
}

impl<B: Board> Game<B> {
    pub fn new(board: B) -> Self {
        let (height, width) = (board.height(), board.width());
        Game {
            tiles: vec![vec![Tile::Hidden; width]; height],
            flags: BTreeSet::new(),
            knowledge: KnowledgeBase::new(height, width),
            state: GameState::Playing,
            board,
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    pub fn tiles(&self) -> &[Vec<Tile>] {
        &self.tiles
    }

    /// The visible tile at `cell`, or `None` off the board.
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        self.tiles.get(cell.row)?.get(cell.col).copied()
    }

    /// Callers check bounds first.
    fn tile_at(&self, cell: Cell) -> Tile {
        self.tiles[cell.row][cell.col]
    }

    pub fn flags(&self) -> &BTreeSet<Cell> {
        &self.flags
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Reveals `cell` and feeds every newly visible count to the knowledge base.
    ///
    /// Revealing a zero floods outward through its neighbors. Returns the
    /// cells that were revealed, empty if `cell` was already visible. Hitting
    /// a mine ends the game and reveals nothing.
    ///
    /// If the knowledge base rejects one of the counts, the whole reveal is
    /// rolled back: tiles, flags and knowledge are left as they were.
    pub fn reveal(&mut self, cell: Cell) -> Result<Vec<Cell>> {
        if !self.board.contains(cell) {
            return Err(Error::OutOfBounds {
                cell,
                height: self.height(),
                width: self.width(),
            });
        }
        if self.state != GameState::Playing {
            return Err(Error::GameOver);
        }
        if !matches!(self.tile_at(cell), Tile::Hidden) {
            return Ok(Vec::new());
        }

        if self.board.is_mine(cell) {
            tracing::info!(%cell, "revealed a mine");
            self.state = GameState::Lost;
            return Ok(Vec::new());
        }

        let snapshot = (
            self.tiles.clone(),
            self.flags.clone(),
            self.knowledge.clone(),
        );
        let revealed = match self.flood_fill_reveal(cell) {
            Ok(revealed) => revealed,
            Err(e) => {
                (self.tiles, self.flags, self.knowledge) = snapshot;
                return Err(e);
            }
        };

        if self.check_win_condition() {
            tracing::info!("all safe cells revealed");
            self.state = GameState::Won;
        }
        Ok(revealed)
    }

    /// Reveals from `start`, reporting each cell to the knowledge base, and
    /// queues the hidden neighbors of every zero.
    fn flood_fill_reveal(&mut self, start: Cell) -> Result<Vec<Cell>> {
        let (height, width) = (self.height(), self.width());
        let mut revealed = Vec::new();
        let mut queue = VecDeque::from([start]);
        let mut visited = HashSet::from([start]);

        while let Some(cell) = queue.pop_front() {
            if !matches!(self.tile_at(cell), Tile::Hidden) {
                continue;
            }

            let count = self.board.nearby_mine_count(cell);
            self.knowledge.add_observation(cell, count)?;
            // At most 8 neighbors, so the count always fits.
            self.tiles[cell.row][cell.col] = Tile::Revealed(count as u8);
            self.flags.remove(&cell);
            revealed.push(cell);

            if count == 0 {
                for neighbor in cell.neighbors(height, width) {
                    if matches!(self.tile_at(neighbor), Tile::Hidden) && visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        tracing::debug!(from = %start, cells = revealed.len(), "revealed");
        Ok(revealed)
    }

    /// Checks if all non-mine cells have been revealed.
    pub fn check_win_condition(&self) -> bool {
        all_cells(self.height(), self.width())
            .filter(|&cell| !self.board.is_mine(cell))
            .all(|cell| matches!(self.tile_at(cell), Tile::Revealed(_)))
    }

    /// Flags or unflags a hidden cell. Returns whether the cell is now flagged.
    pub fn toggle_flag(&mut self, cell: Cell) -> Result<bool> {
        if !self.board.contains(cell) {
            return Err(Error::OutOfBounds {
                cell,
                height: self.height(),
                width: self.width(),
            });
        }
        if !matches!(self.tile_at(cell), Tile::Hidden) {
            return Ok(false);
        }
        if self.flags.remove(&cell) {
            return Ok(false);
        }
        self.flags.insert(cell);
        Ok(true)
    }

    /// Lets the AI choose and play one move.
    ///
    /// Flags are replaced by the mines the knowledge base has proven before
    /// the move is revealed. Returns `None` when no cell is left to play.
    pub fn ai_step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<Move>> {
        if self.state != GameState::Playing {
            return Err(Error::GameOver);
        }

        let choice = selector::next_move(&mut self.knowledge, rng)?;
        self.flags = self.knowledge.mines().iter().copied().collect();

        let Some(choice) = choice else {
            tracing::info!("no moves left");
            return Ok(None);
        };
        match choice {
            Move::Safe(cell) => tracing::info!(%cell, "playing known safe cell"),
            Move::Guess(guess) => {
                tracing::info!(cell = %guess.cell, safety = guess.safety, "guessing")
            }
        }

        self.reveal(choice.cell())?;
        Ok(Some(choice))
    }

    /// Translates the visible board into one raw sentence per revealed cell
    /// that still borders hidden cells.
    ///
    /// Unlike the knowledge base's sentences these carry no inferred facts,
    /// which makes them a reference input for [`crate::oracle::analyze`].
    pub fn build_constraints(&self) -> Result<Vec<Sentence>> {
        let (height, width) = (self.height(), self.width());
        let mut constraints = Vec::new();

        for cell in all_cells(height, width) {
            let Tile::Revealed(count) = self.tile_at(cell) else {
                continue;
            };
            let hidden: Vec<Cell> = cell
                .neighbors(height, width)
                .filter(|&n| matches!(self.tile_at(n), Tile::Hidden))
                .collect();
            if !hidden.is_empty() {
                constraints.push(Sentence::new(hidden, count as usize)?);
            }
        }
        Ok(constraints)
    }
}
