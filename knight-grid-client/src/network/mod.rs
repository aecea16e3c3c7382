//! Network module - talks to the leaderboard server
//!
//! Requests run on blocking worker threads and report back through an
//! [`IncomingMessages`] channel the app drains between keystrokes.

mod client;

pub use client::{HttpScoreReporter, LeaderboardClient};

use knight_grid::StoredScore;
use tokio::sync::mpsc;

/// Results of background leaderboard requests.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    /// Fresh leaderboard contents, fastest first
    LeaderboardUpdated(Vec<StoredScore>),
    /// A finished run was accepted by the server
    ScoreSaved(StoredScore),
    /// A request failed; the message is for display
    RequestFailed(String),
}

/// Sending half of the incoming message queue.
pub type IncomingSender = mpsc::UnboundedSender<NetworkEvent>;

/// Receiving half, owned by the app loop.
pub type IncomingMessages = mpsc::UnboundedReceiver<NetworkEvent>;

/// Create the queue background requests report into.
pub fn incoming_channel() -> (IncomingSender, IncomingMessages) {
    mpsc::unbounded_channel()
}
