//! expectimax-2048: a bitboard 2048 engine + expectimax move picker
//!
//! This crate provides:
//! - A compact `Board` type: sixteen 4-bit exponents in a `u64`, with every
//!   slide, rotation and query done as bit operations (`engine` module)
//! - `MoveSet`, a one-byte set of legal directions (`moveset` module)
//! - Spawn enumeration and sampling with the 90/10 two/four split (`stochastic` module)
//! - `GameState`, a seedable running game (`state` module)
//! - An expectimax player with transposition caching, probability pruning and
//!   tunable weights (`expectimax` module)
//!
//! Quick start:
//! ```
//! use expectimax_2048::engine::{Board, Move};
//!
//! let b0 = Board::from_raw(0x1100_0000_0000_0000);
//! let b1 = b0.shift(Move::Left);
//! assert_eq!(b1.get(0, 0), 2);
//! assert_eq!(b1.score(), 4);
//! assert!(b0.available_moves().contains(Move::Down));
//! ```
//!
//! Full loop (simplest possible)
//! ```
//! use expectimax_2048::expectimax::{Expectimax, ExpectimaxConfig};
//! use expectimax_2048::state::GameState;
//!
//! // 1) Policy and a seeded game
//! let mut policy = Expectimax::with_config(ExpectimaxConfig { depth_limit: 2, ..Default::default() }).unwrap();
//! let mut game = GameState::from_seed(123);
//!
//! // 2) Play a few moves (keep doctests fast)
//! while !game.is_terminal() && game.step() < 4 {
//!     let dir = policy.choose_move(&game).unwrap();
//!     game.apply(dir).unwrap();
//! }
//!
//! // 3) Inspect final state
//! assert_eq!(game.step(), 4);
//! println!("{}score: {}", game.board(), game.score());
//! ```
//!
pub mod engine;
pub mod expectimax;
pub mod moveset;
pub mod state;
pub mod stochastic;
