//! HTTP Leaderboard Server
//!
//! Axum router over the leaderboard service, plus the listener lifecycle.
//!
//! | Route                  | Success | Failure                 |
//! |------------------------|---------|-------------------------|
//! | `POST /api/scores`     | 201     | 400 bad input, 500 store |
//! | `GET /api/leaderboard` | 200     | 500 store               |
//! | `GET /health`          | 200     |                         |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn};

use crate::leaderboard::{
    JsonlScoreStore, LeaderboardError, LeaderboardService, MemoryScoreStore, ScoreStore,
    StoredScore,
};
use crate::network::protocol::{ErrorBody, HealthResponse, ScoreSubmission};
use crate::LEADERBOARD_LIMIT;

/// Where scores are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// In process memory; lost on restart.
    Memory,
    /// Append-only JSON-lines file.
    File(PathBuf),
}

impl StoreConfig {
    /// Build the configured store.
    pub fn build(&self) -> Arc<dyn ScoreStore> {
        match self {
            StoreConfig::Memory => Arc::new(MemoryScoreStore::new()),
            StoreConfig::File(path) => Arc::new(JsonlScoreStore::new(path.clone())),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Records returned by `GET /api/leaderboard`.
    pub leaderboard_limit: usize,
    /// Score store backend.
    pub store: StoreConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            leaderboard_limit: LEADERBOARD_LIMIT,
            store: StoreConfig::Memory,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[source] std::io::Error),

    /// Listener stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared handler state.
pub struct AppState {
    /// Leaderboard service.
    pub leaderboard: LeaderboardService,
    /// Records returned by the leaderboard route.
    pub leaderboard_limit: usize,
    /// Server version string.
    pub version: String,
}

impl AppState {
    /// Build state from configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            leaderboard: LeaderboardService::new(config.store.build()),
            leaderboard_limit: config.leaderboard_limit,
            version: config.version.clone(),
        }
    }
}

/// Create the HTTP router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/scores", post(submit_score))
        .route("/api/leaderboard", get(get_leaderboard))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
    })
}

/// Store a finished run.
async fn submit_score(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScoreSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<StoredScore>), ApiError> {
    let Json(submission) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let stored = state
        .leaderboard
        .submit(&submission.player, submission.time)
        .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Fastest runs, ascending by time.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredScore>>, ApiError> {
    let scores = state.leaderboard.top_n(state.leaderboard_limit).await?;
    Ok(Json(scores))
}

/// Error type for handlers; always rendered as `{ "error": message }`.
#[derive(Debug)]
pub enum ApiError {
    /// Body could not be decoded.
    BadRequest(String),
    /// Leaderboard refused or failed.
    Leaderboard(LeaderboardError),
}

impl From<LeaderboardError> for ApiError {
    fn from(err: LeaderboardError) -> Self {
        Self::Leaderboard(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Leaderboard(err) if err.is_validation() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Leaderboard(err) => {
                error!("Leaderboard request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// The leaderboard HTTP server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Handler state.
    state: Arc<AppState>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new server.
    pub fn new(config: ServerConfig) -> Self {
        let state = Arc::new(AppState::from_config(&config));
        Self::with_state(config, state)
    }

    /// Create a server around existing state.
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Handler state (shared with the router).
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Ask a running server to stop accepting connections.
    pub fn shutdown(&self) {
        if self.shutdown_tx.send(()).is_err() {
            warn!("Shutdown requested but server is not running");
        }
    }

    /// Bind and serve until shutdown.
    #[instrument(skip(self), fields(addr = %self.config.bind_addr))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(GameServerError::BindFailed)?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!("Leaderboard server listening on {}", addr);
        }

        let app = create_router(self.state.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Shutdown signal received");
            })
            .await
            .map_err(GameServerError::Serve)
    }
}
