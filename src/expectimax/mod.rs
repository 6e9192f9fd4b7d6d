//! Expectimax move selection for 2048.
//!
//! [`Expectimax`] alternates max nodes (the player picks the best direction)
//! and chance nodes (a 2 or 4 lands on a uniformly chosen empty cell) down to
//! a fixed number of move/spawn pairs, then scores the frontier with a
//! weighted static evaluation. Three things keep the tree small:
//!
//! - a transposition table keyed by the packed board, valid only for
//!   requests at the same or a shallower depth;
//! - probability pruning: spawns whose cumulative probability drops below
//!   `prob_cutoff` are scored statically instead of searched;
//! - bound pruning: a chance node stops enumerating once even a perfect
//!   `max_score` on every remaining spawn could not beat the best sibling.
//!
//! The search is deterministic; randomness only enters through
//! [`GameState::apply`](crate::state::GameState::apply).
//!
//! ```
//! use expectimax_2048::expectimax::{Expectimax, Weights};
//! use expectimax_2048::state::GameState;
//!
//! let mut game = GameState::from_seed(123);
//! let mut ai = Expectimax::new(2, &Weights::default().to_array()).unwrap();
//! for _ in 0..4 {
//!     let dir = ai.choose_move(&game).unwrap();
//!     game.apply(dir).unwrap();
//! }
//! assert_eq!(game.step(), 4);
//! ```

use serde::{Deserialize, Serialize};

mod heuristic;
mod search;

pub use heuristic::{mergeable, monotonic, snake, Weights, WEIGHT_COUNT};
pub use search::{Expectimax, MoveValue};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("expected {expected} weights, got {got}")]
    WeightCount { expected: usize, got: usize },
    #[error("weight #{index} is not a finite number")]
    NonFiniteWeight { index: usize },
    #[error("monotonic power must not be negative, got {0}")]
    MonotonicPower(f32),
    #[error("depth limit must be at least 1, got {0}")]
    DepthLimit(u32),
    #[error("probability cutoff must be in [0, 1), got {0}")]
    ProbabilityCutoff(f32),
    #[error("max score {max_score} must be above the loss score {loss_score}")]
    ScoreBounds { loss_score: f32, max_score: f32 },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("no legal move from this position")]
    NoLegalMoves,
    /// The weights produce evaluations above the bound used for pruning, so
    /// pruned results can no longer be trusted. Retune the weights or raise
    /// `max_score`.
    #[error("evaluation {value} exceeds the configured ceiling {ceiling}")]
    EvalCeiling { value: f32, ceiling: f32 },
}

/// Search knobs. Defaults match the tuned reference player.
///
/// - `depth_limit`: move/spawn pairs searched below the root.
/// - `prob_cutoff`: chance outcomes less likely than this are scored statically.
/// - `loss_score`: value of a position with no legal move.
/// - `max_score`: ceiling on static evaluations; also the optimistic bound for
///   chance-node pruning.
/// - `cache_enabled`: enable/disable the transposition table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectimaxConfig {
    pub depth_limit: u32,
    pub prob_cutoff: f32,
    pub loss_score: f32,
    pub max_score: f32,
    pub cache_enabled: bool,
    pub weights: Weights,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            depth_limit: 5,
            prob_cutoff: 1e-4,
            loss_score: -5_000.0,
            max_score: 100_000.0,
            cache_enabled: true,
            weights: Weights::default(),
        }
    }
}

impl ExpectimaxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth_limit == 0 {
            return Err(ConfigError::DepthLimit(self.depth_limit));
        }
        if !(0.0..1.0).contains(&self.prob_cutoff) {
            return Err(ConfigError::ProbabilityCutoff(self.prob_cutoff));
        }
        if !(self.max_score > self.loss_score) {
            return Err(ConfigError::ScoreBounds { loss_score: self.loss_score, max_score: self.max_score });
        }
        self.weights.validate()
    }
}

/// Counters from the last decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Max and chance nodes entered.
    pub nodes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Spawns scored statically because their probability was below the cutoff.
    pub probability_prunes: u64,
    /// Chance nodes abandoned early because they could not beat a sibling.
    pub bound_cutoffs: u64,
}

/// Bench-only: expose the raw heuristic terms for a board.
///
/// Enabled only with the `bench-internal` feature to keep the public API small.
#[cfg(feature = "bench-internal")]
#[inline]
pub fn heuristic_terms(board: crate::engine::Board) -> [f32; 3] {
    [snake(board), mergeable(board), monotonic(board, Weights::default().monotonic_power)]
}
