//! Game Logic Module
//!
//! Board generation, move resolution and the single-run state machine.
//! Nothing here reads the clock or touches the network.
//!
//! ## Module Structure
//!
//! - `board`: Cells, positions, board generation
//! - `movement`: Directions and move resolution
//! - `session`: Run lifecycle (start, move, finish, reset)
//! - `events`: Session events for drivers

pub mod board;
pub mod movement;
pub mod session;
pub mod events;

// Re-export key types
pub use board::{Board, BoardConfig, BoardError, Cell, Position, generate};
pub use movement::{Direction, MoveEvent, MoveResult, resolve};
pub use session::{GameSession, SessionPhase, SessionError, RunOutcome, FinishedRun, MoveOutcome};
pub use events::{GameEvent, GameEventData};
