use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::shared::ArenaError;

/// Square grid of image pieces. `cells[pos]` is the piece sitting at `pos`;
/// the board is solved when every piece is at its own index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    size: usize,
    cells: Vec<usize>,
}

impl Board {
    pub fn solved(size: usize) -> Self {
        Self {
            size,
            cells: (0..size * size).collect(),
        }
    }

    pub fn from_cells(size: usize, cells: Vec<usize>) -> Result<Self, ArenaError> {
        if cells.len() != size * size {
            return Err(ArenaError::validation(format!(
                "a {}x{} board needs {} cells, got {}",
                size,
                size,
                size * size,
                cells.len()
            )));
        }
        let mut seen = vec![false; cells.len()];
        for &piece in &cells {
            if piece >= cells.len() || seen[piece] {
                return Err(ArenaError::validation("cells are not a permutation"));
            }
            seen[piece] = true;
        }
        Ok(Self { size, cells })
    }

    /// A shuffled board that is never already solved. Boards with fewer
    /// than two cells cannot be scrambled and come back solved.
    pub fn scrambled<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut board = Self::solved(size);
        if board.cells.len() < 2 {
            return board;
        }
        while board.is_solved() {
            board.cells.shuffle(rng);
        }
        board
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), ArenaError> {
        let len = self.cells.len();
        if a >= len || b >= len {
            return Err(ArenaError::validation(format!(
                "cell out of range for a board of {} cells",
                len
            )));
        }
        self.cells.swap(a, b);
        Ok(())
    }

    pub fn is_solved(&self) -> bool {
        self.cells.iter().enumerate().all(|(pos, &piece)| pos == piece)
    }

    /// Positions holding a piece that belongs elsewhere
    pub fn misplaced(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(pos, piece)| pos != *piece)
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn piece_at(&self, pos: usize) -> Option<usize> {
        self.cells.get(pos).copied()
    }
}
