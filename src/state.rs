//! A game in progress: the board, the step counter and the RNG that feeds spawns.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::{Board, Move};
use crate::moveset::MoveSet;
use crate::stochastic::{spawn_random_tile, Spawn};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("move {0} does not change the board")]
    IllegalMove(Move),
}

/// A running game. Randomness only comes from `R`, so a seeded RNG replays
/// the same game.
///
/// ```
/// use expectimax_2048::state::GameState;
/// let mut game = GameState::from_seed(42);
/// assert_eq!(game.board().count_empty(), 14);
/// let dir = game.available_moves().first();
/// game.apply(dir).unwrap();
/// assert_eq!(game.step(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameState<R = StdRng> {
    board: Board,
    step: u64,
    rng: R,
}

impl GameState<StdRng> {
    /// A fresh game seeded from OS entropy.
    pub fn new() -> Self { Self::with_rng(StdRng::from_entropy()) }

    /// A fresh game whose spawns are fully determined by `seed`.
    pub fn from_seed(seed: u64) -> Self { Self::with_rng(StdRng::seed_from_u64(seed)) }
}

impl Default for GameState<StdRng> {
    fn default() -> Self { Self::new() }
}

impl<R: Rng> GameState<R> {
    /// Empty board with two starting tiles in two distinct random cells.
    pub fn with_rng(mut rng: R) -> Self {
        let first = rng.gen_range(0..16usize);
        let mut second = rng.gen_range(0..15usize);
        if second >= first {
            second += 1;
        }
        let mut board = Board::EMPTY;
        for idx in [first, second] {
            board.set(idx >> 2, idx & 0b11, Spawn::sample(&mut rng).exponent());
        }
        Self { board, step: 0, rng }
    }

    /// Resume from an arbitrary position, e.g. to replay a recorded board.
    pub fn from_board(board: Board, rng: R) -> Self { Self { board, step: 0, rng } }

    /// Apply a full turn: slide in `dir`, then spawn one tile into a random
    /// empty cell and advance the step counter.
    ///
    /// A move that leaves the board unchanged is rejected with
    /// [`StateError::IllegalMove`]; the board, step and RNG are untouched.
    pub fn apply(&mut self, dir: Move) -> Result<(), StateError> {
        let moved = self.board.shift(dir);
        if moved == self.board {
            return Err(StateError::IllegalMove(dir));
        }
        self.board = spawn_random_tile(moved, &mut self.rng);
        self.step += 1;
        Ok(())
    }

    #[inline]
    pub fn available_moves(&self) -> MoveSet { self.board.available_moves() }

    /// True once no direction changes the board.
    #[inline]
    pub fn is_terminal(&self) -> bool { self.available_moves().is_empty() }

    #[inline]
    pub fn board(&self) -> Board { self.board }

    /// Turns applied since the game started.
    #[inline]
    pub fn step(&self) -> u64 { self.step }

    #[inline]
    pub fn score(&self) -> u64 { self.board.score() }
}
