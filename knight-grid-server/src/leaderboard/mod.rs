//! Leaderboard
//!
//! Finished runs ranked by completion time, fastest first.
//!
//! - `record`: score records and the reporter trait
//! - `store`: append-only persistence (memory, JSON lines)
//! - `service`: validation and ranking

pub mod record;
pub mod store;
pub mod service;

pub use record::{ScoreRecord, StoredScore, ScoreReporter};
pub use store::{ScoreStore, StoreError, MemoryScoreStore, JsonlScoreStore};
pub use service::{LeaderboardService, LeaderboardError};
