//! Game Events
//!
//! Emitted by the session on every transition and drained by whoever drives
//! it (terminal client, demo runner).

use serde::{Serialize, Deserialize};

use crate::game::board::Position;
use crate::game::session::RunOutcome;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A run began
    RunStarted {
        player: String,
    },

    /// Knight picked up a treasure
    ItemCollected {
        position: Position,
        score: u32,
        remaining: u32,
    },

    /// Knight walked into a dragon
    HazardHit {
        position: Position,
    },

    /// Run reached a terminal state
    RunFinished {
        outcome: RunOutcome,
        score: u32,
        elapsed_secs: f64,
    },

    /// Session returned to the start screen with a fresh board
    SessionReset,
}

/// A game event stamped with the number of accepted moves so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Moves taken in the current run when the event fired
    pub moves: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(moves: u32, data: GameEventData) -> Self {
        Self { moves, data }
    }

    /// Create run started event.
    pub fn run_started(player: impl Into<String>) -> Self {
        Self::new(0, GameEventData::RunStarted { player: player.into() })
    }

    /// Create item collected event.
    pub fn item_collected(moves: u32, position: Position, score: u32, remaining: u32) -> Self {
        Self::new(moves, GameEventData::ItemCollected { position, score, remaining })
    }

    /// Create hazard hit event.
    pub fn hazard_hit(moves: u32, position: Position) -> Self {
        Self::new(moves, GameEventData::HazardHit { position })
    }

    /// Create run finished event.
    pub fn run_finished(moves: u32, outcome: RunOutcome, score: u32, elapsed_secs: f64) -> Self {
        Self::new(moves, GameEventData::RunFinished { outcome, score, elapsed_secs })
    }

    /// Check if this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::RunFinished { .. })
    }
}
