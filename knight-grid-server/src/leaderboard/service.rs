//! Leaderboard Service
//!
//! Validates submissions and ranks finished runs on top of a [`ScoreStore`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::leaderboard::record::{ScoreRecord, ScoreReporter, StoredScore};
use crate::leaderboard::store::{ScoreStore, StoreError};

/// Leaderboard errors.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    /// Player name missing or blank.
    #[error("player name is required")]
    InvalidPlayer,

    /// Time is negative, NaN or infinite.
    #[error("time must be a non-negative number of seconds, got {0}")]
    InvalidTime(f64),

    /// Store failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl LeaderboardError {
    /// Check if the caller sent bad input (as opposed to a store failure).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidPlayer | Self::InvalidTime(_))
    }
}

/// Leaderboard over a shared score store.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn ScoreStore>,
}

impl LeaderboardService {
    /// Create a service over `store`.
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Append a finished run.
    pub async fn submit(&self, player: &str, time: f64) -> Result<StoredScore, LeaderboardError> {
        if player.trim().is_empty() {
            return Err(LeaderboardError::InvalidPlayer);
        }
        if !time.is_finite() || time < 0.0 {
            return Err(LeaderboardError::InvalidTime(time));
        }

        let stored = self.store.append(ScoreRecord::new(player, time)).await?;
        info!(player = %stored.player, time = stored.time, id = %stored.id, "Score recorded");
        Ok(stored)
    }

    /// Up to `n` records, fastest first, ties in submission order.
    pub async fn top_n(&self, n: usize) -> Result<Vec<StoredScore>, LeaderboardError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        Ok(self.store.fastest(n).await?)
    }

    /// Like [`top_n`](Self::top_n), but degrades to an empty list on failure.
    pub async fn top_n_or_empty(&self, n: usize) -> Vec<StoredScore> {
        match self.top_n(n).await {
            Ok(scores) => scores,
            Err(e) => {
                warn!("Leaderboard unavailable: {}", e);
                Vec::new()
            }
        }
    }
}

impl ScoreReporter for LeaderboardService {
    /// Submit on a background task. Requires a running tokio runtime.
    fn report(&self, record: ScoreRecord) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.submit(&record.player, record.time).await {
                warn!(player = %record.player, "Error saving score: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::store::MemoryScoreStore;
    use async_trait::async_trait;
    use proptest::prelude::*;

    struct UnreachableStore;

    #[async_trait]
    impl ScoreStore for UnreachableStore {
        async fn append(&self, _record: ScoreRecord) -> Result<StoredScore, StoreError> {
            Err(StoreError::Unavailable { reason: "connection refused".into() })
        }

        async fn fastest(&self, _limit: usize) -> Result<Vec<StoredScore>, StoreError> {
            Err(StoreError::Unavailable { reason: "connection refused".into() })
        }

        async fn len(&self) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable { reason: "connection refused".into() })
        }
    }

    fn memory_service() -> LeaderboardService {
        LeaderboardService::new(Arc::new(MemoryScoreStore::new()))
    }

    #[tokio::test]
    async fn test_fastest_first() {
        let service = memory_service();
        service.submit("Ann", 12.5).await.unwrap();
        service.submit("Bo", 9.0).await.unwrap();

        let top = service.top_n(2).await.unwrap();
        let entries: Vec<(&str, f64)> = top.iter().map(|s| (s.player.as_str(), s.time)).collect();
        assert_eq!(entries, [("Bo", 9.0), ("Ann", 12.5)]);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let service = memory_service();
        assert!(matches!(service.submit("  ", 3.0).await, Err(LeaderboardError::InvalidPlayer)));
        assert!(matches!(service.submit("Ann", -1.0).await, Err(LeaderboardError::InvalidTime(_))));
        assert!(matches!(service.submit("Ann", f64::NAN).await, Err(LeaderboardError::InvalidTime(_))));
        assert!(service.submit("Ann", 0.0).await.is_ok());
        assert!(service.top_n(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_errors_surface() {
        let service = LeaderboardService::new(Arc::new(UnreachableStore));

        let err = service.submit("Ann", 1.0).await.unwrap_err();
        assert!(!err.is_validation());
        assert!(err.to_string().starts_with("persistence error"));

        assert!(matches!(service.top_n(10).await, Err(LeaderboardError::Persistence(_))));
        assert!(service.top_n_or_empty(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_report_submits_in_background() {
        let store = Arc::new(MemoryScoreStore::new());
        let service = LeaderboardService::new(store.clone());

        service.report(ScoreRecord::new("Ann", 4.2));

        for _ in 0..100 {
            if store.len().await.unwrap() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        let top = service.top_n(10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].record(), ScoreRecord::new("Ann", 4.2));
    }

    #[tokio::test]
    async fn test_report_failure_is_swallowed() {
        let service = LeaderboardService::new(Arc::new(UnreachableStore));
        service.report(ScoreRecord::new("Ann", 4.2));
        tokio::task::yield_now().await;
    }

    proptest! {
        #[test]
        fn prop_top_n_sorted_and_bounded(
            times in prop::collection::vec(0.0f64..1000.0, 0..40),
            k in 0usize..15,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (top, submitted) = rt.block_on(async {
                let service = memory_service();
                for (i, t) in times.iter().enumerate() {
                    service.submit(&format!("p{}", i), *t).await.unwrap();
                }
                (service.top_n(k).await.unwrap(), times.len())
            });

            prop_assert!(top.len() <= k);
            prop_assert_eq!(top.len(), k.min(submitted));
            prop_assert!(top.windows(2).all(|w| w[0].time <= w[1].time));

            // Every submitted time that ranks shows up unchanged.
            let mut sorted = times.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let expected: Vec<f64> = sorted.into_iter().take(k).collect();
            let got: Vec<f64> = top.iter().map(|s| s.time).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
