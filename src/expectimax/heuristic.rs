use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::engine::{self as GameEngine, Board};

use super::ConfigError;

/// Number of values a weight vector must carry.
pub const WEIGHT_COUNT: usize = 7;

const LINE_TABLE_SIZE: usize = 0x1_0000;

/// Positional bias toward the bottom-right corner along a boustrophedon path.
const SNAKE_MATRIX: [[f32; 4]; 4] = [
    [0.0, 1.0, 2.0, 3.0],
    [7.0, 6.0, 5.0, 4.0],
    [8.0, 9.0, 10.0, 11.0],
    [12.0, 13.0, 14.0, 15.0],
];

/// Multipliers for each heuristic term, in the order used by [`Weights::from_slice`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Sum of exponents.
    pub sum: f32,
    /// Empty cell count.
    pub open_spaces: f32,
    /// Snake-matrix corner bias.
    pub corner: f32,
    /// Adjacent equal pairs.
    pub mergeable: f32,
    /// Row monotonicity.
    pub monotonic: f32,
    /// Accumulated merge score.
    pub score: f32,
    /// Exponent applied to tiles inside the monotonicity term.
    pub monotonic_power: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            sum: 1.0,
            open_spaces: 1.0,
            corner: 1.0,
            mergeable: 1.0,
            monotonic: 1.0,
            score: 1.0,
            monotonic_power: 2.0,
        }
    }
}

impl Weights {
    /// Parse `[sum, open_spaces, corner, mergeable, monotonic, score, monotonic_power]`.
    ///
    /// Anything but exactly [`WEIGHT_COUNT`] finite values is rejected.
    ///
    /// ```
    /// use expectimax_2048::expectimax::{ConfigError, Weights};
    /// let w = Weights::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 2.0]).unwrap();
    /// assert_eq!(w.corner, 3.0);
    /// assert!(matches!(Weights::from_slice(&[1.0; 6]), Err(ConfigError::WeightCount { .. })));
    /// ```
    pub fn from_slice(values: &[f32]) -> Result<Self, ConfigError> {
        let arr: [f32; WEIGHT_COUNT] = values
            .try_into()
            .map_err(|_| ConfigError::WeightCount { expected: WEIGHT_COUNT, got: values.len() })?;
        let weights = Self::from(arr);
        weights.validate()?;
        Ok(weights)
    }

    pub fn to_array(&self) -> [f32; WEIGHT_COUNT] {
        [self.sum, self.open_spaces, self.corner, self.mergeable, self.monotonic, self.score, self.monotonic_power]
    }

    /// Every weight must be finite and the monotonic power non-negative;
    /// a negative power sends empty cells to infinity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(index) = self.to_array().iter().position(|w| !w.is_finite()) {
            return Err(ConfigError::NonFiniteWeight { index });
        }
        if self.monotonic_power < 0.0 {
            return Err(ConfigError::MonotonicPower(self.monotonic_power));
        }
        Ok(())
    }
}

impl From<[f32; WEIGHT_COUNT]> for Weights {
    fn from(w: [f32; WEIGHT_COUNT]) -> Self {
        Self {
            sum: w[0],
            open_spaces: w[1],
            corner: w[2],
            mergeable: w[3],
            monotonic: w[4],
            score: w[5],
            monotonic_power: w[6],
        }
    }
}

impl TryFrom<&[f32]> for Weights {
    type Error = ConfigError;

    fn try_from(values: &[f32]) -> Result<Self, Self::Error> { Self::from_slice(values) }
}

/// Weighted static evaluation with the monotonicity table prebuilt for the
/// configured power.
pub(crate) struct Evaluator {
    weights: Weights,
    monotonic_rows: Box<[f32]>,
}

impl Evaluator {
    pub(crate) fn new(weights: Weights) -> Self {
        let monotonic_rows = (0..LINE_TABLE_SIZE as u64)
            .map(|line| calc_monotonic(line, weights.monotonic_power))
            .collect();
        Self { weights, monotonic_rows }
    }

    #[inline]
    pub(crate) fn weights(&self) -> &Weights { &self.weights }

    pub(crate) fn eval(&self, board: Board) -> f32 {
        let w = &self.weights;
        let monotonic: f32 = (0..4)
            .map(|idx| self.monotonic_rows[GameEngine::extract_line(board.raw(), idx) as usize])
            .sum();
        board.sum() as f32 * w.sum
            + board.count_empty() as f32 * w.open_spaces
            + snake(board) * w.corner
            + mergeable(board) * w.mergeable
            + monotonic * w.monotonic
            + board.score() as f32 * w.score
    }
}

static MERGEABLE_LINES: OnceLock<Box<[f32]>> = OnceLock::new();

pub(crate) fn warm() {
    let _ = mergeable_lines();
}

fn mergeable_lines() -> &'static [f32] {
    MERGEABLE_LINES
        .get_or_init(|| (0..LINE_TABLE_SIZE as u64).map(calc_mergeable).collect())
        .as_ref()
}

/// Dot product of the snake matrix with the exponents.
pub fn snake(board: Board) -> f32 {
    let mut score = 0.0;
    for (row, weights) in SNAKE_MATRIX.iter().enumerate() {
        for (col, weight) in weights.iter().enumerate() {
            score += weight * board.get(row, col) as f32;
        }
    }
    score
}

/// Sum of exponents over every horizontally or vertically adjacent pair of
/// equal tiles.
pub fn mergeable(board: Board) -> f32 {
    let table = mergeable_lines();
    let transposed = GameEngine::transpose(board.raw());
    (0..4).fold(0.0, |score, idx| {
        let row = GameEngine::extract_line(board.raw(), idx) as usize;
        let col = GameEngine::extract_line(transposed, idx) as usize;
        score + table[row] + table[col]
    })
}

/// Sum over rows of `|a^power - b^power|` for every adjacent pair.
pub fn monotonic(board: Board, power: f32) -> f32 {
    (0..4).map(|idx| calc_monotonic(GameEngine::extract_line(board.raw(), idx), power)).sum()
}

fn calc_mergeable(line: u64) -> f32 {
    let tiles = GameEngine::line_to_vec(line);
    tiles
        .windows(2)
        .filter(|pair| pair[0] != 0 && pair[0] == pair[1])
        .map(|pair| pair[0] as f32)
        .sum()
}

fn calc_monotonic(line: u64, power: f32) -> f32 {
    let tiles = GameEngine::line_to_vec(line);
    tiles
        .windows(2)
        .map(|pair| ((pair[0] as f32).powf(power) - (pair[1] as f32).powf(power)).abs())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_uses_power() {
        let board = Board::from_raw(0x1234_0000_0000_0000);
        assert_eq!(monotonic(board, 2.0), 15.0);
        assert_eq!(monotonic(board, 1.0), 3.0);
    }

    #[test]
    fn snake_rewards_bottom_right() {
        assert_eq!(snake(Board::EMPTY.with_tile(3, 3, 1)), 15.0);
        assert_eq!(snake(Board::EMPTY.with_tile(0, 0, 5)), 0.0);
        assert_eq!(snake(Board::EMPTY.with_tile(1, 0, 2)), 14.0);
    }

    #[test]
    fn mergeable_counts_rows_and_columns() {
        let board = Board::from_raw(0x1100_1000_0000_0000);
        assert_eq!(mergeable(board), 2.0);
        let board = Board::from_raw(0x3330_0000_0000_0000);
        assert_eq!(mergeable(board), 6.0);
        assert_eq!(mergeable(Board::EMPTY), 0.0);
    }

    #[test]
    fn eval_is_weighted_sum() {
        let board = Board::from_raw(0x1234_0000_0000_0000).with_score(20);
        let evaluator = Evaluator::new(Weights::default());
        let expected = 10.0 + 12.0 + snake(board) + mergeable(board) + 15.0 + 20.0;
        assert!((evaluator.eval(board) - expected).abs() < 1e-4);

        let only_open = Weights::from([0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
        assert_eq!(Evaluator::new(only_open).eval(board), 24.0);
    }

    #[test]
    fn negative_monotonic_power_is_rejected() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0];
        assert_eq!(Weights::from_slice(&values), Err(ConfigError::MonotonicPower(-1.0)));
        assert!(Weights::from_slice(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]).is_ok());
    }

    #[test]
    fn weights_round_trip_through_array() {
        let w = Weights::from([0.5, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5]);
        assert_eq!(Weights::from_slice(&w.to_array()).unwrap(), w);
    }

    #[test]
    fn weights_reject_bad_input() {
        assert_eq!(
            Weights::from_slice(&[1.0; 8]),
            Err(ConfigError::WeightCount { expected: WEIGHT_COUNT, got: 8 })
        );
        let mut values = [1.0; WEIGHT_COUNT];
        values[4] = f32::NAN;
        assert_eq!(Weights::from_slice(&values), Err(ConfigError::NonFiniteWeight { index: 4 }));
    }

    #[test]
    fn weights_deserialize_with_defaults() {
        let w: Weights = serde_json::from_str(r#"{ "corner": 4.0 }"#).unwrap();
        assert_eq!(w.corner, 4.0);
        assert_eq!(w.monotonic_power, 2.0);
    }
}
