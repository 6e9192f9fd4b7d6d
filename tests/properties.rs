use expectimax_2048::engine::{Board, Move};
use expectimax_2048::expectimax::{Expectimax, ExpectimaxConfig};
use expectimax_2048::stochastic;
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

fn arb_board() -> impl Strategy<Value = Board> {
    any::<u64>().prop_map(Board::from_raw)
}

fn arb_move() -> impl Strategy<Value = Move> {
    prop::sample::select(Move::ALL.to_vec())
}

/// Boards shaped like real play: a handful of small tiles, plenty of gaps.
fn arb_sparse_board() -> impl Strategy<Value = Board> {
    prop::collection::vec((0usize..16, 1u8..6), 0..10).prop_map(|tiles| {
        tiles.into_iter().fold(Board::EMPTY, |b, (idx, exp)| b.with_tile(idx >> 2, idx & 3, exp))
    })
}

/// Any layout without 32768 tiles, so no merge can overflow a nibble.
fn arb_capped_board() -> impl Strategy<Value = Board> {
    prop::array::uniform16(0u8..15).prop_map(|cells| {
        cells.iter().enumerate().fold(Board::EMPTY, |b, (idx, &exp)| b.with_tile(idx >> 2, idx & 3, exp))
    })
}

proptest! {
    #[test]
    fn available_moves_iff_board_changes(board in arb_board(), dir in arb_move()) {
        prop_assert_eq!(board.available_moves().contains(dir), board.shift(dir) != board);
    }

    #[test]
    fn rotation_round_trips(board in arb_board()) {
        prop_assert_eq!(board.rotate_clockwise().rotate_counter_clockwise(), board);
        prop_assert_eq!(board.rotate_counter_clockwise().rotate_clockwise(), board);
        prop_assert_eq!(board.invert().invert(), board);
        let four = board.rotate_clockwise().rotate_clockwise().rotate_clockwise().rotate_clockwise();
        prop_assert_eq!(four, board);
    }

    #[test]
    fn sliding_twice_without_merges_is_sliding_once(board in arb_capped_board(), dir in arb_move()) {
        let once = board.shift(dir);
        let twice = once.shift(dir);
        if twice.score() == once.score() {
            prop_assert_eq!(twice, once);
        }
        // compaction alone never leaves work for a second slide
        if once.score() == board.score() {
            prop_assert_eq!(twice, once);
        }
    }

    #[test]
    fn merges_only_add_score(board in arb_sparse_board(), dir in arb_move()) {
        let moved = board.shift(dir);
        prop_assert!(moved.score() >= board.score());
        prop_assert!(moved.count_empty() >= board.count_empty());
        if moved.score() > board.score() {
            prop_assert!(moved.count_empty() > board.count_empty());
        }
    }

    #[test]
    fn left_is_mirrored_right(board in arb_board()) {
        prop_assert_eq!(board.left(), board.invert().right().invert());
        prop_assert_eq!(board.up(), board.rotate_clockwise().right().rotate_counter_clockwise());
    }

    #[test]
    fn chance_probabilities_sum_to_one(board in arb_sparse_board()) {
        prop_assume!(board.count_empty() > 0);
        let total: f32 = stochastic::chances(board).map(|c| c.relative_chance).sum();
        prop_assert!((total - 1.0).abs() < 1e-5);
        prop_assert_eq!(stochastic::chances(board).count(), 2 * board.count_empty() as usize);
    }
}

#[test]
fn count_empty_matches_empty_cells_on_random_boards() {
    let mut rng = StdRng::seed_from_u64(2048);
    for _ in 0..10_000 {
        let board = Board::random(&mut rng);
        assert_eq!(board.count_empty() as usize, board.empty_cells().count(), "{board:?}");
    }
}

#[test]
fn merged_tiles_can_merge_again_on_the_next_slide() {
    let board = Board::EMPTY.with_tile(0, 0, 1).with_tile(0, 1, 1).with_tile(0, 2, 2);
    let once = board.shift(Move::Right);
    assert_eq!([once.get(0, 2), once.get(0, 3)], [2, 2]);
    let twice = once.shift(Move::Right);
    assert_eq!(twice.get(0, 3), 3);
    assert_eq!(twice.score(), 4 + 8);
}

#[test]
fn three_twos_slide_right_into_two_then_four() {
    let board = Board::EMPTY.with_tile(0, 0, 1).with_tile(0, 1, 1).with_tile(0, 2, 1);
    let moved = board.shift(Move::Right);
    assert_eq!([moved.get(0, 0), moved.get(0, 1), moved.get(0, 2), moved.get(0, 3)], [0, 0, 1, 2]);
    assert_eq!(moved.score(), 4);
}

#[test]
fn three_twos_slide_left_into_four_then_two() {
    let board = Board::EMPTY.with_tile(0, 0, 1).with_tile(0, 1, 1).with_tile(0, 2, 1);
    let moved = board.shift(Move::Left);
    assert_eq!([moved.get(0, 0), moved.get(0, 1), moved.get(0, 2), moved.get(0, 3)], [2, 1, 0, 0]);
    assert_eq!(moved.score(), 4);
}

#[test]
fn search_is_deterministic_across_players() {
    let cfg = ExpectimaxConfig { depth_limit: 2, ..Default::default() };
    let mut rng = StdRng::seed_from_u64(77);
    let boards: Vec<Board> = (0..8)
        .map(|_| {
            (0..6).fold(Board::EMPTY, |b, _| stochastic::spawn_random_tile(b, &mut rng))
        })
        .collect();
    let mut a = Expectimax::with_config(cfg.clone()).unwrap();
    let mut b = Expectimax::with_config(cfg).unwrap();
    for board in boards {
        assert_eq!(a.best_move(board), b.best_move(board));
        assert_eq!(a.best_move(board), a.best_move(board));
    }
}
