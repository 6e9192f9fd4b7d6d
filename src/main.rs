use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use expectimax_2048::expectimax::{Expectimax, ExpectimaxConfig, Weights};
use expectimax_2048::state::GameState;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser, Debug)]
#[command(author, version, about = "Let an expectimax player loose on 2048", long_about = None)]
struct Args {
    /// Move/spawn pairs to search per decision (overrides the config file)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Seven heuristic weights: sum, open-spaces, corner, mergeable, monotonic, score, monotonic-power
    #[arg(long, num_args = 1.., allow_negative_numbers = true, value_name = "W")]
    weights: Option<Vec<f32>>,

    /// JSON file with an ExpectimaxConfig
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the tile spawns; game N uses seed + N
    #[arg(long)]
    seed: Option<u64>,

    /// Play one game and print only its final score
    #[arg(short, long)]
    raw: bool,

    /// Number of games to play; more than one shows a progress bar and a summary
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Stop a game after this many moves
    #[arg(long)]
    max_steps: Option<u64>,

    /// Don't print the board after every move
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy)]
struct GameSummary {
    score: u64,
    steps: u64,
    highest_tile: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let cfg = load_config(&args)?;
    log::info!("depth {} weights {:?}", cfg.depth_limit, cfg.weights.to_array());
    let mut player = Expectimax::with_config(cfg).context("invalid search configuration")?;

    if args.raw {
        let summary = play_game(&mut player, args.seed, args.max_steps, |_, _| {})?;
        println!("{}", summary.score);
        return Ok(());
    }
    if args.games > 1 {
        return play_many(&mut player, &args);
    }

    let quiet = args.quiet;
    let summary = play_game(&mut player, args.seed, args.max_steps, |game, dir| {
        if !quiet {
            println!("Step    : {}\nMove    : {dir}\nScore   : {}\n{}", game.step(), game.score(), game.board());
        }
    })?;
    println!("GAME OVER | moves: {} | score: {} | highest tile: {}", summary.steps, summary.score, summary.highest_tile);
    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level))
        .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
        .target(env_logger::Target::Stderr)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<ExpectimaxConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ExpectimaxConfig::default(),
    };
    if let Some(depth) = args.depth {
        cfg.depth_limit = depth;
    }
    if let Some(values) = &args.weights {
        cfg.weights = Weights::from_slice(values).context("invalid --weights")?;
    }
    if args.games == 0 {
        bail!("--games must be at least 1");
    }
    Ok(cfg)
}

/// Play until no move is left (or `max_steps`), calling `on_move` after every turn.
fn play_game<F>(player: &mut Expectimax, seed: Option<u64>, max_steps: Option<u64>, mut on_move: F) -> anyhow::Result<GameSummary>
where
    F: FnMut(&GameState, expectimax_2048::engine::Move),
{
    let mut game = match seed {
        Some(seed) => GameState::from_seed(seed),
        None => GameState::new(),
    };
    while !game.is_terminal() {
        if max_steps.is_some_and(|limit| game.step() >= limit) {
            break;
        }
        let dir = player.choose_move(&game).with_context(|| format!("searching from {:?}", game.board()))?;
        game.apply(dir)?;
        on_move(&game, dir);
    }
    Ok(GameSummary { score: game.score(), steps: game.step(), highest_tile: game.board().highest_tile() })
}

fn play_many(player: &mut Expectimax, args: &Args) -> anyhow::Result<()> {
    let start = Instant::now();
    let pb = ProgressBar::new(args.games as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:30}] {pos}/{len} | {msg}")
            .context("progress template")?
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut summaries = Vec::with_capacity(args.games as usize);
    for idx in 0..args.games {
        let seed = args.seed.map(|s| s.wrapping_add(idx as u64));
        let summary = play_game(player, seed, args.max_steps, |_, _| {})?;
        log::debug!("game {idx}: {summary:?}");
        summaries.push(summary);
        let best = summaries.iter().map(|s| s.score).max().unwrap_or(0);
        pb.set_message(format!("last: {} | best: {}", summary.score, best));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let total: u64 = summaries.iter().map(|s| s.score).sum();
    let moves: u64 = summaries.iter().map(|s| s.steps).sum();
    let best_tile = summaries.iter().map(|s| s.highest_tile).max().unwrap_or(0);
    let reached_2048 = summaries.iter().filter(|s| s.highest_tile >= 2048).count();
    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    println!(
        "Games: {} | mean score: {:.1} | best tile: {} | reached 2048: {}/{} | moves/sec: {:.1}",
        summaries.len(),
        total as f64 / summaries.len() as f64,
        best_tile,
        reached_2048,
        summaries.len(),
        moves as f64 / elapsed,
    );
    Ok(())
}
