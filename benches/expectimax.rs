use criterion::{criterion_group, criterion_main, Criterion};
use expectimax_2048::engine::{Board, Move};
use expectimax_2048::expectimax::{Expectimax, ExpectimaxConfig};
use expectimax_2048::state::GameState;
use expectimax_2048::stochastic;
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(4242);
    let mut boards = Vec::new();
    let mut b = GameState::from_seed(4242).board();
    boards.push(b);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..32 {
        let dir = seq[i % seq.len()];
        let nb = b.shift(dir);
        if nb != b { b = stochastic::spawn_random_tile(nb, &mut rng); }
        boards.push(b);
    }
    boards
}

fn bench_decisions(c: &mut Criterion) {
    let boards = corpus();
    let cfg = ExpectimaxConfig { depth_limit: 3, ..Default::default() };
    let mut ex = Expectimax::with_config(cfg).expect("default config is valid");

    c.bench_function("expectimax/best_move", |bch| {
        bch.iter(|| {
            let mut acc = 0u8;
            for &bd in &boards {
                if let Ok(dir) = ex.best_move(bd) { acc ^= dir.flag(); }
            }
            black_box(acc)
        })
    });

    c.bench_function("expectimax/move_values", |bch| {
        bch.iter(|| {
            let mut acc = 0.0;
            for &bd in &boards {
                if let Ok(values) = ex.move_values(bd) {
                    acc += values.iter().filter_map(|mv| mv.value).sum::<f32>();
                }
            }
            black_box(acc)
        })
    });
}

fn bench_e2e(c: &mut Criterion) {
    let cfg = ExpectimaxConfig { depth_limit: 3, ..Default::default() };
    let mut ex = Expectimax::with_config(cfg).expect("default config is valid");
    c.bench_function("e2e/64_moves", |bch| {
        bch.iter(|| {
            let mut game = GameState::from_seed(7);
            while game.step() < 64 && !game.is_terminal() {
                match ex.choose_move(&game) {
                    Ok(dir) => { let _ = game.apply(dir); }
                    Err(_) => break,
                }
            }
            black_box((game.board().raw(), game.step()))
        })
    });
}

criterion_group!(expectimax, bench_decisions, bench_e2e);
criterion_main!(expectimax);
