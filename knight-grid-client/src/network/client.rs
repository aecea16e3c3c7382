//! Leaderboard HTTP client
//!
//! Blocking `ureq` calls, pushed onto tokio's blocking pool so the input
//! loop never waits on the network.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use knight_grid::leaderboard::{ScoreRecord, ScoreReporter, StoredScore};
use knight_grid::network::{ErrorBody, ScoreSubmission};

use super::{IncomingSender, NetworkEvent};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin wrapper over the two leaderboard routes.
#[derive(Clone)]
pub struct LeaderboardClient {
    agent: ureq::Agent,
    base_url: String,
}

impl LeaderboardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/scores`
    pub fn submit(&self, record: &ScoreRecord) -> Result<StoredScore> {
        let body = ScoreSubmission {
            player: record.player.clone(),
            time: record.time,
        };
        let url = format!("{}/api/scores", self.base_url);
        debug!("POST {}", url);

        match self.agent.post(&url).send_json(&body) {
            Ok(response) => response.into_json().context("malformed score response"),
            Err(ureq::Error::Status(code, response)) => {
                let message = response
                    .into_json::<ErrorBody>()
                    .map(|body| body.error)
                    .unwrap_or_else(|_| "no error message".to_string());
                bail!("server rejected score ({}): {}", code, message)
            }
            Err(e) => Err(e).context("score submission failed"),
        }
    }

    /// `GET /api/leaderboard`
    pub fn leaderboard(&self) -> Result<Vec<StoredScore>> {
        let url = format!("{}/api/leaderboard", self.base_url);
        debug!("GET {}", url);

        let response = self
            .agent
            .get(&url)
            .call()
            .context("leaderboard request failed")?;
        response.into_json().context("malformed leaderboard response")
    }
}

/// Submits finished runs in the background and refreshes the leaderboard
/// once each submission completes.
pub struct HttpScoreReporter {
    client: LeaderboardClient,
    incoming: IncomingSender,
    runtime: Handle,
}

impl HttpScoreReporter {
    /// Must be called from inside a tokio runtime.
    pub fn new(client: LeaderboardClient, incoming: IncomingSender) -> Self {
        Self {
            client,
            incoming,
            runtime: Handle::current(),
        }
    }

    /// Fetch the leaderboard in the background.
    pub fn refresh(&self) {
        let client = self.client.clone();
        let incoming = self.incoming.clone();
        self.runtime.spawn_blocking(move || fetch_leaderboard(&client, &incoming));
    }
}

impl ScoreReporter for HttpScoreReporter {
    fn report(&self, record: ScoreRecord) {
        let client = self.client.clone();
        let incoming = self.incoming.clone();

        self.runtime.spawn_blocking(move || {
            match client.submit(&record) {
                Ok(stored) => {
                    info!("Score saved: {} {:.3}s", stored.player, stored.time);
                    let _ = incoming.send(NetworkEvent::ScoreSaved(stored));
                }
                Err(e) => {
                    warn!("Error saving score: {:#}", e);
                    let _ = incoming.send(NetworkEvent::RequestFailed(format!("{:#}", e)));
                }
            }
            fetch_leaderboard(&client, &incoming);
        });
    }
}

/// A failed fetch shows an empty leaderboard rather than stale rows.
fn fetch_leaderboard(client: &LeaderboardClient, incoming: &IncomingSender) {
    let scores = match client.leaderboard() {
        Ok(scores) => scores,
        Err(e) => {
            warn!("Error fetching leaderboard: {:#}", e);
            Vec::new()
        }
    };
    // The app may already have quit.
    let _ = incoming.send(NetworkEvent::LeaderboardUpdated(scores));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use knight_grid::network::{GameServer, ServerConfig};
    use tokio::net::TcpListener;

    use crate::network::incoming_channel;

    async fn spawn_server() -> (Arc<GameServer>, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(GameServer::new(ServerConfig::default()));
        let running = server.clone();
        tokio::spawn(async move { running.serve(listener).await });
        (server, format!("http://{}", addr))
    }

    async fn next_event(rx: &mut crate::network::IncomingMessages) -> NetworkEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for network event")
            .expect("channel closed")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_submit_then_leaderboard() {
        let (server, url) = spawn_server().await;
        let client = LeaderboardClient::new(format!("{}/", url));
        assert_eq!(client.base_url(), url);

        let scores = tokio::task::spawn_blocking(move || {
            client.submit(&ScoreRecord::new("Ann", 12.5)).unwrap();
            client.submit(&ScoreRecord::new("Bo", 9.0)).unwrap();
            client.leaderboard().unwrap()
        })
        .await
        .unwrap();

        let ranked: Vec<_> = scores.iter().map(|s| (s.player.as_str(), s.time)).collect();
        assert_eq!(ranked, vec![("Bo", 9.0), ("Ann", 12.5)]);
        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rejected_submission_carries_server_message() {
        let (server, url) = spawn_server().await;
        let client = LeaderboardClient::new(url);

        let err = tokio::task::spawn_blocking(move || client.submit(&ScoreRecord::new("  ", 3.0)))
            .await
            .unwrap()
            .unwrap_err();

        assert!(err.to_string().contains("400"), "{}", err);
        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reporter_saves_then_refreshes() {
        let (server, url) = spawn_server().await;
        let (tx, mut rx) = incoming_channel();
        let reporter = HttpScoreReporter::new(LeaderboardClient::new(url), tx);

        reporter.report(ScoreRecord::new("Cy", 4.25));

        match next_event(&mut rx).await {
            NetworkEvent::ScoreSaved(stored) => assert_eq!(stored.player, "Cy"),
            other => panic!("unexpected event {:?}", other),
        }
        match next_event(&mut rx).await {
            NetworkEvent::LeaderboardUpdated(scores) => assert_eq!(scores.len(), 1),
            other => panic!("unexpected event {:?}", other),
        }
        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_server_degrades_to_empty() {
        // Bind then drop to get a port nothing listens on.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let (tx, mut rx) = incoming_channel();
        let reporter = HttpScoreReporter::new(LeaderboardClient::new(format!("http://{}", addr)), tx);

        reporter.refresh();

        assert_eq!(next_event(&mut rx).await, NetworkEvent::LeaderboardUpdated(Vec::new()));
    }
}
