//! Score Storage
//!
//! Append-only persistence for finished runs. Stores only need to append
//! and to hand back the fastest entries; ranking is shared.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::leaderboard::record::{ScoreRecord, StoredScore};

/// Errors raised by a score store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backing file could not be read or written.
    #[error("score store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("score store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Store cannot be reached at all.
    #[error("score store unavailable: {reason}")]
    Unavailable {
        /// What went wrong
        reason: String,
    },
}

/// Append-only score persistence.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Persist a record and return its stored form.
    async fn append(&self, record: ScoreRecord) -> Result<StoredScore, StoreError>;

    /// Up to `limit` records, fastest first, ties in insertion order.
    async fn fastest(&self, limit: usize) -> Result<Vec<StoredScore>, StoreError>;

    /// Number of stored records.
    async fn len(&self) -> Result<usize, StoreError>;
}

/// Rank records held in insertion order.
///
/// `sort_by` is stable, so equal times keep their insertion order.
pub fn rank_fastest(mut scores: Vec<StoredScore>, limit: usize) -> Vec<StoredScore> {
    scores.sort_by(|a, b| a.time.total_cmp(&b.time));
    scores.truncate(limit);
    scores
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory score store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    scores: RwLock<Vec<StoredScore>>,
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn append(&self, record: ScoreRecord) -> Result<StoredScore, StoreError> {
        let stored = StoredScore::stamp(record, Utc::now());
        self.scores.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn fastest(&self, limit: usize) -> Result<Vec<StoredScore>, StoreError> {
        let scores = self.scores.read().await.clone();
        Ok(rank_fastest(scores, limit))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.scores.read().await.len())
    }
}

// =============================================================================
// JSON LINES STORE
// =============================================================================

/// Score store backed by a JSON-lines file, one record per line.
///
/// Appends are serialized through a mutex so concurrent submissions never
/// interleave within a line. A missing file reads as an empty leaderboard.
#[derive(Debug)]
pub struct JsonlScoreStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlScoreStore {
    /// Open (lazily) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<StoredScore>, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }
}

#[async_trait]
impl ScoreStore for JsonlScoreStore {
    async fn append(&self, record: ScoreRecord) -> Result<StoredScore, StoreError> {
        let stored = StoredScore::stamp(record, Utc::now());
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), id = %stored.id, "Score appended");
        Ok(stored)
    }

    async fn fastest(&self, limit: usize) -> Result<Vec<StoredScore>, StoreError> {
        Ok(rank_fastest(self.load().await?, limit))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.load().await?.len())
    }
}
