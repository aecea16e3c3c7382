//! Protocol Messages
//!
//! JSON bodies exchanged over the HTTP API. Responses for stored scores use
//! [`StoredScore`](crate::leaderboard::StoredScore) directly.

use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

/// Body of `POST /api/scores`.
///
/// `time` accepts a JSON number or a numeric string; anything else is a
/// decode error. A missing `player` decodes as empty and is rejected by the
/// leaderboard instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    /// Player name.
    #[serde(default)]
    pub player: String,
    /// Completion time in seconds.
    #[serde(deserialize_with = "coerce_seconds")]
    pub time: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn coerce_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("time is not a number: {:?}", text))),
    }
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

/// Error body returned with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl ErrorBody {
    /// Create an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Server version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_coercion() {
        let numeric: ScoreSubmission = serde_json::from_str(r#"{"player":"Ann","time":12.5}"#).unwrap();
        assert_eq!(numeric.time, 12.5);

        let text: ScoreSubmission = serde_json::from_str(r#"{"player":"Ann","time":" 9 "}"#).unwrap();
        assert_eq!(text.time, 9.0);

        assert!(serde_json::from_str::<ScoreSubmission>(r#"{"player":"Ann","time":"soon"}"#).is_err());
        assert!(serde_json::from_str::<ScoreSubmission>(r#"{"player":"Ann"}"#).is_err());
    }

    #[test]
    fn test_missing_player_decodes_empty() {
        let body: ScoreSubmission = serde_json::from_str(r#"{"time":3}"#).unwrap();
        assert_eq!(body.player, "");
    }
}
