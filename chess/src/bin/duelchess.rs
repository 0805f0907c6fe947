// Command-line application to play chess against a UCI engine

use anyhow::{Context, Result};
use clap::Parser;
use duelchess::{
    board::PrettyStyle, turn, Coord, Engine, EngineOptions, Game, Opponent, TurnError, TurnState,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);

/// Number of failed engine queries in a row after which the game is abandoned
const MAX_ENGINE_FAILURES: u32 = 3;

/// Play chess against a UCI engine in the terminal
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the engine executable
    #[arg(long, env = "DUELCHESS_ENGINE")]
    engine: PathBuf,

    /// Search depth requested from the engine
    #[arg(long, default_value_t = duelchess::engine::DEFAULT_DEPTH)]
    depth: u32,

    /// Duration of the move animation, in milliseconds
    #[arg(long, default_value_t = 500)]
    animation_ms: u64,

    /// Bound for a single wait for the engine, in seconds (0 waits forever)
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Draw the board with Unicode chess symbols
    #[arg(long)]
    utf8: bool,
}

impl Args {
    fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            depth: self.depth,
            timeout: match self.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            ..EngineOptions::new(&self.engine)
        }
    }

    fn style(&self) -> PrettyStyle {
        match self.utf8 {
            true => PrettyStyle::Utf8,
            false => PrettyStyle::Ascii,
        }
    }
}

fn parse_coord(s: &str) -> Option<Coord> {
    s.parse().ok()
}

/// Runs the frames until the player may move again or the game is over
///
/// A failed engine query is reported and asked again on the next frame, up to
/// [`MAX_ENGINE_FAILURES`] times in a row.
fn run_frames<O: Opponent>(game: &mut Game<O>, frame: Duration) -> Result<()> {
    let mut failures = 0;
    loop {
        let err = match game.tick(Instant::now()) {
            Ok(TurnState::MovingPlayer | TurnState::MovingOpponent) => {
                thread::sleep(frame);
                continue;
            }
            Ok(_) => return Ok(()),
            Err(e @ (TurnError::Opponent(_) | TurnError::IllegalReply { .. })) => e,
            Err(e) => return Err(e.into()),
        };
        failures += 1;
        if failures >= MAX_ENGINE_FAILURES {
            return Err(err).context(format!("engine failed {} times in a row", failures));
        }
        warn!(error = %err, failures, "engine query failed, retrying");
        println!("Engine failed ({}), retrying", err);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let engine = Engine::spawn(args.engine_options())
        .with_context(|| format!("cannot start engine {}", args.engine.display()))?;
    let mut game =
        Game::new(engine).with_animation(Duration::from_millis(args.animation_ms));

    let mut stdin = io::stdin().lock();
    loop {
        if let Some(outcome) = game.outcome() {
            println!("{}", game.session().board().pretty(args.style()));
            println!("Game finished: {}", outcome);
            println!("Moves: {}", game.session().history().uci_list().trim_end());
            break;
        }

        println!("{}", game.session().board().pretty(args.style()));
        print!("Your move (e.g. e2e4, or a square to list its moves): ");
        io::stdout().flush()?;
        let mut s = String::new();
        if stdin.read_line(&mut s)? == 0 {
            break;
        }
        let s = s.trim();
        if s == "quit" {
            break;
        }

        if s.len() == 2 {
            let Some(coord) = parse_coord(s) else {
                println!("Bad square: {}", s);
                println!();
                continue;
            };
            let dsts = game.select(coord)?;
            let dsts: Vec<_> = dsts.iter().map(ToString::to_string).collect();
            println!("Moves from {}: {}", coord, dsts.join(" "));
            println!();
            continue;
        }

        let src = s.get(0..2).and_then(parse_coord);
        let dst = s.get(2..).and_then(parse_coord);
        let (src, dst) = match (src, dst) {
            (Some(src), Some(dst)) => (src, dst),
            _ => {
                println!("Bad move: {}", s);
                println!();
                continue;
            }
        };
        if let Err(e) = game.play(src, dst, Instant::now()) {
            println!("Bad move: {}", e);
            println!();
            continue;
        }
        run_frames(&mut game, FRAME)?;
        if let Some(mv) = game.session().history().last() {
            if mv.color() != Some(turn::PLAYER) {
                println!("Engine plays {}", mv);
            }
        }
        println!();
    }
    Ok(())
}
