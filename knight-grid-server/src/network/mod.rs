//! Network Layer
//!
//! HTTP API for the leaderboard. Game logic never depends on this module.

pub mod protocol;
pub mod server;

pub use protocol::{ScoreSubmission, ErrorBody, HealthResponse};
pub use server::{GameServer, ServerConfig, StoreConfig, AppState, GameServerError, create_router};
