//! Random tile spawns: what can appear after a move and how likely it is.

use rand::Rng;

use crate::engine::Board;

/// The tile a spawn writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawn {
    /// Exponent 1, the common case.
    Two,
    /// Exponent 2, the rare case.
    Four,
}

impl Spawn {
    #[inline]
    pub const fn exponent(self) -> u8 {
        match self {
            Spawn::Two => 1,
            Spawn::Four => 2,
        }
    }

    /// Probability of this tile given that a cell has been picked.
    #[inline]
    pub const fn weight(self) -> f32 {
        match self {
            Spawn::Two => 0.9,
            Spawn::Four => 0.1,
        }
    }

    /// Draw a tile with the 90/10 split.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Spawn {
        if rng.gen_range(0..10) < 9 { Spawn::Two } else { Spawn::Four }
    }
}

/// One possible spawn outcome for a board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chance {
    pub row: usize,
    pub col: usize,
    pub spawn: Spawn,
    /// `spawn.weight() / empty cell count`: cells are equally likely.
    pub relative_chance: f32,
}

impl Chance {
    /// The board with this spawn written in.
    #[inline]
    pub fn apply(&self, board: Board) -> Board {
        board.with_tile(self.row, self.col, self.spawn.exponent())
    }
}

/// Every spawn that can follow a move on `board`: a two and a four for each
/// empty cell, in row-major cell order. Yields nothing on a full board.
pub fn chances(board: Board) -> impl Iterator<Item = Chance> {
    let empty = board.count_empty().max(1) as f32;
    board.empty_cells().flat_map(move |idx| {
        [Spawn::Two, Spawn::Four].into_iter().map(move |spawn| Chance {
            row: idx >> 2,
            col: idx & 0b11,
            spawn,
            relative_chance: spawn.weight() / empty,
        })
    })
}

/// Write one spawned tile into a uniformly chosen empty cell. A full board is
/// returned unchanged.
pub fn spawn_random_tile<R: Rng + ?Sized>(board: Board, rng: &mut R) -> Board {
    let empty = board.count_empty() as usize;
    if empty == 0 {
        return board;
    }
    let pick = rng.gen_range(0..empty);
    match board.empty_cells().nth(pick) {
        Some(idx) => board.with_tile(idx >> 2, idx & 0b11, Spawn::sample(rng).exponent()),
        None => board,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn two_outcomes_per_empty_cell() {
        let board = Board::from_raw(0x1111_1111_1111_1100);
        let all: Vec<Chance> = chances(board).collect();
        assert_eq!(all.len(), 4);
        assert_eq!((all[0].row, all[0].col, all[0].spawn), (3, 2, Spawn::Two));
        assert_eq!((all[1].row, all[1].col, all[1].spawn), (3, 2, Spawn::Four));
        assert_eq!((all[3].row, all[3].col), (3, 3));
    }

    #[test]
    fn relative_chance_splits_over_cells() {
        let board = Board::from_raw(0x1111_1111_1111_1000);
        for chance in chances(board) {
            let expected = chance.spawn.weight() / 3.0;
            assert!((chance.relative_chance - expected).abs() < 1e-7);
        }
        let total: f32 = chances(board).map(|c| c.relative_chance).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn full_board_has_no_chances() {
        assert_eq!(chances(Board::from_raw(0x1212_2121_1212_2121)).count(), 0);
    }

    #[test]
    fn apply_writes_exponent() {
        let chance = Chance { row: 2, col: 3, spawn: Spawn::Four, relative_chance: 0.1 };
        let board = chance.apply(Board::EMPTY);
        assert_eq!(board.get(2, 3), 2);
        assert_eq!(board.count_empty(), 15);
    }

    #[test]
    fn random_spawn_fills_one_empty_cell() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut board = Board::EMPTY;
        for filled in 1..=16 {
            board = spawn_random_tile(board, &mut rng);
            assert_eq!(board.count_empty(), 16 - filled);
        }
        assert_eq!(spawn_random_tile(board, &mut rng), board);
        assert!((0..16).all(|idx| matches!(board.get(idx >> 2, idx & 3), 1 | 2)));
    }

    #[test]
    fn sample_is_mostly_twos() {
        let mut rng = StdRng::seed_from_u64(99);
        let fours = (0..10_000).filter(|_| Spawn::sample(&mut rng) == Spawn::Four).count();
        assert!((800..1200).contains(&fours), "{fours} fours out of 10000");
    }
}
