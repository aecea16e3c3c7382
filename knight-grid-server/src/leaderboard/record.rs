//! Score Records
//!
//! A finished run is reduced to a (player, time) pair; the store stamps it
//! with an identifier and timestamps when it is persisted.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// One finished run, as handed to the leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Player name
    pub player: String,
    /// Seconds from start to the terminal move
    pub time: f64,
}

impl ScoreRecord {
    /// Create a record.
    pub fn new(player: impl Into<String>, time: f64) -> Self {
        Self {
            player: player.into(),
            time,
        }
    }
}

/// A persisted score, as returned by the HTTP API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScore {
    /// Server-assigned identifier
    pub id: Uuid,
    /// Player name
    pub player: String,
    /// Completion time in seconds
    pub time: f64,
    /// When the record was stored
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at`; records are never modified
    pub updated_at: DateTime<Utc>,
}

impl StoredScore {
    /// Stamp a record for storage.
    pub fn stamp(record: ScoreRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            player: record.player,
            time: record.time,
            created_at: now,
            updated_at: now,
        }
    }

    /// The (player, time) pair.
    pub fn record(&self) -> ScoreRecord {
        ScoreRecord::new(self.player.clone(), self.time)
    }
}

/// Fire-and-forget sink for finished runs.
///
/// Implementations must not block the caller; failures are logged, never
/// returned, and never retried.
pub trait ScoreReporter: Send + Sync {
    /// Hand off a finished run.
    fn report(&self, record: ScoreRecord);
}
