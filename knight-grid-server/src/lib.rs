//! # Knight Grid
//!
//! Board logic and leaderboard service for a single-player grid game: move a
//! knight, collect every treasure, avoid the dragons.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      KNIGHT GRID                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │                                                              │
//! │  game/           - Game logic (pure, no clock or I/O)        │
//! │  ├── board.rs    - Cells, positions, board generation        │
//! │  ├── movement.rs - Move resolution                           │
//! │  ├── session.rs  - Run lifecycle state machine               │
//! │  └── events.rs   - Session events                            │
//! │                                                              │
//! │  leaderboard/    - Finished runs, fastest first              │
//! │  ├── record.rs   - Score records, reporter trait             │
//! │  ├── store.rs    - Append-only stores                        │
//! │  └── service.rs  - Validation and ranking                    │
//! │                                                              │
//! │  network/        - HTTP API                                  │
//! │  ├── protocol.rs - Request/response bodies                   │
//! │  └── server.rs   - Axum router and listener                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flow
//!
//! Input → [`game::resolve`] → [`GameSession`] updates score and phase → on a
//! terminal move the driver hands [`game::FinishedRun::record`] to a
//! [`ScoreReporter`], which submits it without blocking play.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod leaderboard;
pub mod network;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::game::board::{Board, BoardConfig, Cell, Position};
pub use crate::game::movement::{Direction, MoveEvent};
pub use crate::game::session::{GameSession, SessionPhase, RunOutcome};
pub use crate::leaderboard::{LeaderboardService, ScoreRecord, ScoreReporter, StoredScore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default cells per board side
pub const DEFAULT_SIDE_LENGTH: usize = 20;

/// Default treasures per board
pub const DEFAULT_COLLECTIBLES: u32 = 10;

/// Default dragons per board
pub const DEFAULT_HAZARDS: u32 = 10;

/// Records returned by the leaderboard endpoint
pub const LEADERBOARD_LIMIT: usize = 10;
