use ahash::AHashMap;

use crate::engine::{Board, Move};
use crate::state::GameState;
use crate::stochastic;

use super::heuristic::{self, Evaluator, Weights};
use super::{ConfigError, ExpectimaxConfig, SearchError, SearchStats};

#[derive(Clone, Copy)]
struct TranspositionEntry { score: f32, depth: u32 }

/// Root value of one direction, as returned by [`Expectimax::move_values`].
///
/// `value` is `None` when the move does not change the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveValue {
    pub dir: Move,
    pub value: Option<f32>,
}

/// Single-threaded expectimax player.
///
/// Depth is counted upward from the root in move/spawn pairs: the board
/// after each root move is a max node at depth 0, its spawns sit at depth 1
/// and max nodes at `depth_limit` are scored statically. The transposition table lives for one
/// decision and is cleared before and after it.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    evaluator: Evaluator,
    cache: AHashMap<u64, TranspositionEntry>,
    stats: SearchStats,
}

impl Expectimax {
    /// Player searching `depth_limit` move/spawn pairs with the given weight
    /// vector (see [`Weights::from_slice`] for the order). Other knobs keep
    /// their defaults.
    pub fn new(depth_limit: u32, weights: &[f32]) -> Result<Self, ConfigError> {
        let weights = Weights::from_slice(weights)?;
        Self::with_config(ExpectimaxConfig { depth_limit, weights, ..Default::default() })
    }

    pub fn with_config(cfg: ExpectimaxConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        heuristic::warm();
        let evaluator = Evaluator::new(cfg.weights);
        Ok(Self { cfg, evaluator, cache: AHashMap::with_capacity(1 << 16), stats: SearchStats::default() })
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    #[inline]
    pub fn weights(&self) -> &Weights { self.evaluator.weights() }

    /// Static evaluation of `board` under the configured weights. No ceiling
    /// check; the search applies that itself.
    ///
    /// ```
    /// use expectimax_2048::engine::Board;
    /// use expectimax_2048::expectimax::Expectimax;
    /// let ai = Expectimax::new(3, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 2.0]).unwrap();
    /// assert_eq!(ai.eval(&Board::EMPTY), 16.0);
    /// ```
    #[inline]
    pub fn eval(&self, board: &Board) -> f32 { self.evaluator.eval(*board) }

    /// Statistics collected during the last decision.
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Pick the move for the game's current board.
    ///
    /// Fails with [`SearchError::NoLegalMoves`] on a finished game and with
    /// [`SearchError::EvalCeiling`] when the weights push an evaluation past
    /// `max_score`.
    pub fn choose_move<R>(&mut self, game: &GameState<R>) -> Result<Move, SearchError>
    where
        R: rand::Rng,
    {
        self.best_move(game.board())
    }

    /// Pick the move for a bare board. Legal moves are tried in
    /// left, right, up, down order; a later move must be strictly better to
    /// replace an earlier one.
    pub fn best_move(&mut self, board: Board) -> Result<Move, SearchError> {
        self.begin_decision();
        let result = self.pick(board);
        self.end_decision();
        if let Ok(dir) = result {
            log::debug!(
                "board {:#018x}: {dir} after {} nodes ({} cache hits, {} pruned, {} cutoffs)",
                board.raw(),
                self.stats.nodes,
                self.stats.cache_hits,
                self.stats.probability_prunes,
                self.stats.bound_cutoffs,
            );
        }
        result
    }

    /// Exact root value of every direction, in left, right, up, down order.
    ///
    /// Unlike [`Expectimax::best_move`] no sibling bound is applied at the
    /// root, so every legal move gets its full value.
    pub fn move_values(&mut self, board: Board) -> Result<[MoveValue; 4], SearchError> {
        self.begin_decision();
        let mut out = Move::ALL.map(|dir| MoveValue { dir, value: None });
        let mut result = Ok(());
        for slot in out.iter_mut() {
            let moved = board.shift(slot.dir);
            if moved == board {
                continue;
            }
            match self.search(moved, 0, 1.0, f32::NEG_INFINITY) {
                Ok(value) => slot.value = Some(value),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.end_decision();
        result.map(|_| out)
    }

    fn pick(&mut self, board: Board) -> Result<Move, SearchError> {
        let mut moves = board.available_moves();
        if moves.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }
        let mut best_move = moves.first();
        let mut best_score = f32::NEG_INFINITY;
        while let Some(dir) = moves.pop() {
            let value = self.search(board.shift(dir), 0, 1.0, best_score)?;
            if value > best_score {
                best_score = value;
                best_move = dir;
            }
        }
        Ok(best_move)
    }

    fn begin_decision(&mut self) {
        self.stats = SearchStats::default();
        self.cache.clear();
    }

    fn end_decision(&mut self) {
        log::trace!("clearing {} transposition entries", self.cache.len());
        self.cache.clear();
    }

    /// Max node: the player picks the best direction. `alpha` is the best
    /// value already secured by an ancestor; chance children below it are
    /// cut off once they cannot exceed it.
    fn search(&mut self, board: Board, depth: u32, cum_prob: f32, alpha: f32) -> Result<f32, SearchError> {
        self.stats.nodes += 1;
        if let Some(score) = self.lookup(board, depth) {
            return Ok(score);
        }
        if depth >= self.cfg.depth_limit {
            let score = self.checked_eval(board)?;
            self.store(board, score, depth);
            return Ok(score);
        }
        let mut best = f32::NEG_INFINITY;
        for dir in Move::ALL {
            let moved = board.shift(dir);
            if moved != board {
                let score = self.expected_value(moved, depth + 1, cum_prob, alpha.max(best))?;
                best = best.max(score);
            }
        }
        if best == f32::NEG_INFINITY {
            best = self.checked_eval(board)?;
        }
        self.store(board, best, depth);
        Ok(best)
    }

    /// Chance node: average over every spawn. Returns an upper bound no
    /// greater than `alpha` as soon as the remaining spawns cannot lift the
    /// expectation above it.
    fn expected_value(&mut self, board: Board, depth: u32, cum_prob: f32, alpha: f32) -> Result<f32, SearchError> {
        self.stats.nodes += 1;
        if board.count_empty() == 0 {
            return if board.is_game_over() { Ok(self.cfg.loss_score) } else { self.checked_eval(board) };
        }
        let mut expected = 0.0;
        let mut remaining = 1.0;
        for chance in stochastic::chances(board) {
            let spawned = chance.apply(board);
            let prob = chance.relative_chance * cum_prob;
            let score = if prob < self.cfg.prob_cutoff {
                self.stats.probability_prunes += 1;
                self.checked_eval(spawned)?
            } else {
                self.search(spawned, depth, prob, alpha)?
            };
            expected += chance.relative_chance * score;
            remaining -= chance.relative_chance;
            let bound = expected + remaining * self.cfg.max_score;
            if bound <= alpha {
                self.stats.bound_cutoffs += 1;
                return Ok(bound);
            }
        }
        Ok(expected)
    }

    fn checked_eval(&self, board: Board) -> Result<f32, SearchError> {
        let value = self.evaluator.eval(board);
        if !(value <= self.cfg.max_score) {
            log::warn!("evaluation {value} of {board:?} is not within the ceiling {}", self.cfg.max_score);
            return Err(SearchError::EvalCeiling { value, ceiling: self.cfg.max_score });
        }
        Ok(value)
    }

    /// Cached value for `board` if it was computed at `depth` or shallower,
    /// i.e. with at least as much search below it.
    fn lookup(&mut self, board: Board, depth: u32) -> Option<f32> {
        if !self.cfg.cache_enabled {
            return None;
        }
        match self.cache.get(&board.raw()) {
            Some(entry) if entry.depth <= depth => {
                self.stats.cache_hits += 1;
                Some(entry.score)
            }
            _ => {
                self.stats.cache_misses += 1;
                None
            }
        }
    }

    fn store(&mut self, board: Board, score: f32, depth: u32) {
        if self.cfg.cache_enabled {
            self.cache.insert(board.raw(), TranspositionEntry { score, depth });
        }
    }
}
