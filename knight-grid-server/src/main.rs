//! Knight Grid Server
//!
//! Serves the leaderboard API, or plays a seeded demo run in-process.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use knight_grid::{
    VERSION, LEADERBOARD_LIMIT,
    game::{Board, BoardConfig, Cell, Direction, GameSession, Position},
    leaderboard::{LeaderboardService, ScoreReporter},
    network::{GameServer, ServerConfig, StoreConfig},
};

#[derive(Parser, Debug)]
#[command(name = "knight-grid-server", version, about = "Knight Grid leaderboard server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Used when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the leaderboard HTTP API (default).
    Serve(ServeArgs),
    /// Play seeded runs in-process and print the resulting leaderboard.
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// HTTP listen address.
    #[arg(long, env = "KNIGHT_GRID_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Persist scores to this JSON-lines file instead of memory.
    #[arg(long, env = "KNIGHT_GRID_SCORES_FILE")]
    scores_file: Option<PathBuf>,

    /// Records returned by the leaderboard route.
    #[arg(long, default_value_t = LEADERBOARD_LIMIT)]
    limit: usize,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Board seed.
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Runs to play.
    #[arg(long, default_value_t = 3)]
    runs: u32,

    /// Cells per board side.
    #[arg(long, default_value_t = knight_grid::DEFAULT_SIDE_LENGTH)]
    side: usize,

    /// Treasures per board.
    #[arg(long, default_value_t = knight_grid::DEFAULT_COLLECTIBLES)]
    collectibles: u32,

    /// Dragons per board.
    #[arg(long, default_value_t = knight_grid::DEFAULT_HAZARDS)]
    hazards: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Knight Grid Server v{}", VERSION);

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Serve(args)) => serve(args).await,
        Some(Command::Demo(args)) => demo(args).await,
        None => serve(cli.serve).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let store = match args.scores_file {
        Some(path) => {
            info!("Scores file: {}", path.display());
            StoreConfig::File(path)
        }
        None => {
            warn!("No scores file configured, leaderboard is in-memory only");
            StoreConfig::Memory
        }
    };

    let config = ServerConfig {
        bind_addr: args.bind,
        leaderboard_limit: args.limit,
        store,
        ..ServerConfig::default()
    };

    let server = Arc::new(GameServer::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_server.shutdown();
        }
    });

    server.run().await.context("leaderboard server failed")?;
    info!("Server stopped");
    Ok(())
}

/// Play seeded runs with a simple pathfinding bot.
async fn demo(args: DemoArgs) -> Result<()> {
    info!("=== Starting Demo ===");
    info!("Seed: {}", args.seed);

    let config = BoardConfig {
        side_length: args.side,
        collectibles: args.collectibles,
        hazards: args.hazards,
    };
    let mut session = GameSession::with_seed(config, args.seed).context("invalid board config")?;

    let store = StoreConfig::Memory.build();
    let leaderboard = LeaderboardService::new(store.clone());

    // Each move pretends to take a quarter second.
    let step = chrono::Duration::milliseconds(250);

    for run in 0..args.runs {
        let player = format!("bot-{}", run + 1);
        let mut now = Utc::now();
        session.start(&player, now)?;
        info!("Run {} board:\n{}", run + 1, session.board());

        let finished = loop {
            let direction = next_move(session.board(), session.position());
            now += step;
            if let Some(outcome) = session.apply_move(direction, now) {
                if let Some(run) = outcome.finished {
                    break run;
                }
            }
        };

        for event in session.take_events() {
            info!("  [move {}] {:?}", event.moves, event.data);
        }
        info!(
            "{} {:?} with {} treasures in {:.3}s",
            finished.player, finished.outcome, finished.score, finished.elapsed_secs
        );

        leaderboard.report(finished.record());
        session.reset();
    }

    // Submissions are fire-and-forget; give them a moment to land.
    for _ in 0..50 {
        if store.len().await? >= args.runs as usize {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    info!("=== Leaderboard ===");
    let top = leaderboard.top_n_or_empty(LEADERBOARD_LIMIT).await;
    for (rank, score) in top.iter().enumerate() {
        info!("{}. {} - {:.3} s", rank + 1, score.player, score.time);
    }

    Ok(())
}

/// First step of a shortest dragon-free path to the nearest treasure.
///
/// When every remaining treasure is walled off, the bot heads for the
/// nearest dragon instead, so a run always terminates.
fn next_move(board: &Board, from: Position) -> Direction {
    let side = board.side();
    let mut first_step: Vec<Option<Direction>> = vec![None; side * side];
    let mut seen = vec![false; side * side];
    let mut hazard_step = None;
    let mut queue = VecDeque::new();

    seen[from.y * side + from.x] = true;
    queue.push_back(from);

    while let Some(pos) = queue.pop_front() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            let Some(next) = pos.offset(dx, dy).filter(|p| board.contains(*p)) else {
                continue;
            };
            let idx = next.y * side + next.x;
            if seen[idx] {
                continue;
            }
            seen[idx] = true;

            let step = first_step[pos.y * side + pos.x].unwrap_or(dir);
            match board.get(next) {
                Some(Cell::Collectible) => return step,
                Some(Cell::Hazard) => {
                    hazard_step.get_or_insert(step);
                }
                _ => {
                    first_step[idx] = Some(step);
                    queue.push_back(next);
                }
            }
        }
    }

    hazard_step.unwrap_or(Direction::Right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(text: &str) -> Board {
        text.parse().unwrap()
    }

    #[test]
    fn test_bare_invocation_reads_serve_env() {
        std::env::set_var("KNIGHT_GRID_BIND", "127.0.0.1:6001");

        let bare = Cli::parse_from(["knight-grid-server"]);
        assert!(bare.command.is_none());
        assert_eq!(bare.serve.bind, "127.0.0.1:6001".parse::<SocketAddr>().unwrap());
        assert_eq!(bare.serve.limit, LEADERBOARD_LIMIT);

        match Cli::parse_from(["knight-grid-server", "serve"]).command {
            Some(Command::Serve(args)) => assert_eq!(args.bind, bare.serve.bind),
            other => panic!("expected serve, got {:?}", other),
        }

        std::env::remove_var("KNIGHT_GRID_BIND");
    }

    #[test]
    fn test_bot_heads_for_treasure() {
        let b = board("K..\n.D.\n..$");
        let dir = next_move(&b, Position::ORIGIN);
        assert!(matches!(dir, Direction::Right | Direction::Down));
    }

    #[test]
    fn test_bot_avoids_dragon_on_path() {
        let b = board("KD$\n...\n...");
        assert_eq!(next_move(&b, Position::ORIGIN), Direction::Down);
    }

    #[test]
    fn test_bot_gives_up_when_walled_off() {
        let b = board("K.D\n.D.\nD.$");
        let dir = next_move(&b, Position::ORIGIN);
        assert!(matches!(dir, Direction::Right | Direction::Down));

        let mut session = GameSession::from_board(b, 1).unwrap();
        let now = Utc::now();
        session.start("bot", now).unwrap();
        let mut finished = None;
        for _ in 0..10 {
            let dir = next_move(session.board(), session.position());
            if let Some(run) = session.apply_move(dir, now).and_then(|o| o.finished) {
                finished = Some(run);
                break;
            }
        }
        assert_eq!(finished.map(|r| r.outcome), Some(knight_grid::RunOutcome::Lost));
    }
}
