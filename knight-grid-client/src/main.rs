//! Knight Grid - terminal client
//!
//! Move the knight around the grid, collect every treasure, dodge the
//! dragons. Finished runs are posted to the leaderboard server.

mod app;
mod network;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use knight_grid::game::{BoardConfig, GameSession};

use app::App;
use network::{HttpScoreReporter, LeaderboardClient};

#[derive(Parser, Debug)]
#[command(name = "knight-grid", version, about = "Play Knight Grid in the terminal")]
struct Cli {
    /// Leaderboard server base URL.
    #[arg(long, env = "KNIGHT_GRID_SERVER", default_value = "http://localhost:5000")]
    server: String,

    /// Start a run immediately under this name.
    #[arg(long)]
    name: Option<String>,

    /// Cells per board side.
    #[arg(long, default_value_t = knight_grid::DEFAULT_SIDE_LENGTH)]
    side: usize,

    /// Treasures per board.
    #[arg(long, default_value_t = knight_grid::DEFAULT_COLLECTIBLES)]
    collectibles: u32,

    /// Dragons per board.
    #[arg(long, default_value_t = knight_grid::DEFAULT_HAZARDS)]
    hazards: u32,

    /// Fixed board seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = BoardConfig {
        side_length: cli.side,
        collectibles: cli.collectibles,
        hazards: cli.hazards,
    };
    let session = match cli.seed {
        Some(seed) => GameSession::with_seed(config, seed),
        None => GameSession::new(config),
    }
    .context("invalid board settings")?;

    let client = LeaderboardClient::new(cli.server);
    info!("Leaderboard server: {}", client.base_url());

    let (incoming_tx, incoming_rx) = network::incoming_channel();
    let reporter = HttpScoreReporter::new(client, incoming_tx);

    app::run(App::new(session, reporter), incoming_rx, cli.name).await
}
