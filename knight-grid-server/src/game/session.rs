//! Game Session
//!
//! Owns the live board and drives a single run through its lifecycle:
//!
//! ```text
//! NotStarted --start(name)--> Active --move--> Active
//!                              |
//!                              +--hazard--------> Finished(Lost)
//!                              +--last treasure-> Finished(Won)
//! Finished --reset--> NotStarted
//! ```
//!
//! Time is passed in by the caller so the state machine stays free of
//! clock reads.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::rng::DeterministicRng;
use crate::game::board::{generate, Board, BoardConfig, BoardError, Position};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::movement::{resolve, Direction, MoveEvent};
use crate::leaderboard::record::ScoreRecord;

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every treasure collected
    Won,
    /// Walked into a dragon
    Lost,
}

/// Session phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting for a player name.
    NotStarted,
    /// Run in progress.
    Active,
    /// Run over, waiting for reset.
    Finished(RunOutcome),
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Start requested without a usable name.
    #[error("Please enter a player name to start the game.")]
    BlankPlayerName,

    /// Operation not allowed in the current phase.
    #[error("Invalid session state: {0:?}")]
    InvalidState(SessionPhase),
}

/// A run that reached a terminal state.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedRun {
    /// Player name
    pub player: String,
    /// Win or loss
    pub outcome: RunOutcome,
    /// Treasures collected
    pub score: u32,
    /// Seconds from start to the terminal move
    pub elapsed_secs: f64,
}

impl FinishedRun {
    /// The leaderboard entry for this run.
    pub fn record(&self) -> ScoreRecord {
        ScoreRecord::new(self.player.clone(), self.elapsed_secs)
    }
}

/// Result of an accepted move.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveOutcome {
    /// What the resolver reported
    pub event: MoveEvent,
    /// Score after the move
    pub score: u32,
    /// Set when this move ended the run
    pub finished: Option<FinishedRun>,
}

/// A single-player game session.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: BoardConfig,
    rng: DeterministicRng,
    board: Board,
    position: Position,
    phase: SessionPhase,
    player: String,
    score: u32,
    moves: u32,
    started_at: Option<DateTime<Utc>>,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Create a session with a randomly seeded board.
    pub fn new(config: BoardConfig) -> Result<Self, BoardError> {
        let session_id = uuid::Uuid::new_v4().into_bytes();
        debug!(session = %hex::encode(session_id), "Seeding session board");
        Self::with_rng(config, DeterministicRng::for_session(&session_id))
    }

    /// Create a session whose boards follow from `seed`.
    pub fn with_seed(config: BoardConfig, seed: u64) -> Result<Self, BoardError> {
        Self::with_rng(config, DeterministicRng::new(seed))
    }

    fn with_rng(config: BoardConfig, mut rng: DeterministicRng) -> Result<Self, BoardError> {
        let board = generate(&config, &mut rng)?;
        Ok(Self::assemble(config, rng, board))
    }

    /// Create a session around a prepared board.
    ///
    /// The knight's current cell becomes the start position. Boards generated
    /// after a reset use the same dimensions and item counts, so a board
    /// without treasures is refused.
    pub fn from_board(board: Board, seed: u64) -> Result<Self, BoardError> {
        let config = BoardConfig {
            side_length: board.side(),
            collectibles: board.collectible_total(),
            hazards: board.hazard_total(),
        };
        config.validate()?;
        Ok(Self::assemble(config, DeterministicRng::new(seed), board))
    }

    fn assemble(config: BoardConfig, rng: DeterministicRng, board: Board) -> Self {
        let position = board.player_position().unwrap_or(Position::ORIGIN);
        Self {
            config,
            rng,
            board,
            position,
            phase: SessionPhase::NotStarted,
            player: String::new(),
            score: 0,
            moves: 0,
            started_at: None,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Begin a run.
    ///
    /// A blank name leaves the session in `NotStarted`.
    pub fn start(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::InvalidState(self.phase));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::BlankPlayerName);
        }

        self.player = name.to_string();
        self.started_at = Some(now);
        self.phase = SessionPhase::Active;
        self.events.push(GameEvent::run_started(name));
        info!(player = %self.player, "Run started");

        Ok(())
    }

    /// Apply one move. Returns `None` unless a run is active.
    pub fn apply_move(&mut self, direction: Direction, now: DateTime<Utc>) -> Option<MoveOutcome> {
        if self.phase != SessionPhase::Active {
            return None;
        }

        let result = resolve(&self.board, self.position, direction);
        let event = result.event;

        if event == MoveEvent::Rejected {
            return Some(self.outcome(event, None));
        }

        self.moves += 1;

        if event == MoveEvent::HazardHit {
            let (dx, dy) = direction.delta();
            if let Some(pos) = self.position.offset(dx, dy) {
                self.events.push(GameEvent::hazard_hit(self.moves, pos));
            }
            let run = self.finish(RunOutcome::Lost, now);
            return Some(self.outcome(event, Some(run)));
        }

        self.board = result.board;
        self.position = result.position;
        debug!(position = %self.position, ?event, "Knight moved");

        if event == MoveEvent::Collected {
            self.score += 1;
            let remaining = self.board.collectible_total().saturating_sub(self.score);
            self.events.push(GameEvent::item_collected(self.moves, self.position, self.score, remaining));

            if self.score >= self.board.collectible_total() {
                let run = self.finish(RunOutcome::Won, now);
                return Some(self.outcome(event, Some(run)));
            }
        }

        Some(self.outcome(event, None))
    }

    /// Return a finished session to `NotStarted` with a fresh board.
    ///
    /// Returns `false` (and does nothing) unless the run has finished.
    pub fn reset(&mut self) -> bool {
        if !matches!(self.phase, SessionPhase::Finished(_)) {
            return false;
        }

        // Config was validated when the session was built.
        match generate(&self.config, &mut self.rng) {
            Ok(board) => self.board = board,
            Err(e) => warn!("Board regeneration failed, keeping previous board: {}", e),
        }
        self.position = self.board.player_position().unwrap_or(Position::ORIGIN);
        self.phase = SessionPhase::NotStarted;
        self.player.clear();
        self.score = 0;
        self.moves = 0;
        self.started_at = None;
        self.events.push(GameEvent::new(0, GameEventData::SessionReset));

        true
    }

    fn finish(&mut self, outcome: RunOutcome, now: DateTime<Utc>) -> FinishedRun {
        let elapsed_secs = self.elapsed_secs(now);
        self.phase = SessionPhase::Finished(outcome);
        self.events.push(GameEvent::run_finished(self.moves, outcome, self.score, elapsed_secs));
        info!(
            player = %self.player,
            ?outcome,
            score = self.score,
            elapsed_secs,
            "Run finished"
        );

        FinishedRun {
            player: self.player.clone(),
            outcome,
            score: self.score,
            elapsed_secs,
        }
    }

    fn outcome(&self, event: MoveEvent, finished: Option<FinishedRun>) -> MoveOutcome {
        MoveOutcome {
            event,
            score: self.score,
            finished,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Seconds since the run started, rounded to the millisecond.
    ///
    /// Zero before a run starts or if `now` precedes the start.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        match self.started_at {
            Some(start) => round_millis(now - start),
            None => 0.0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Check if a run is in progress.
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Treasures collected in this run.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Treasures needed to win.
    pub fn target_score(&self) -> u32 {
        self.board.collectible_total()
    }

    /// Accepted moves in this run.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Player name (empty before start).
    pub fn player(&self) -> &str {
        &self.player
    }

    /// The live board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Knight position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Board parameters used on reset.
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

fn round_millis(elapsed: chrono::Duration) -> f64 {
    let micros = elapsed.num_microseconds().unwrap_or(i64::MAX).max(0);
    (micros as f64 / 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Cell;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn session(text: &str) -> GameSession {
        GameSession::from_board(text.parse().unwrap(), 1).unwrap()
    }

    #[test]
    fn test_blank_name_refused() {
        let mut s = session("K$\n..");
        assert_eq!(s.start("   ", t0()), Err(SessionError::BlankPlayerName));
        assert_eq!(s.phase(), SessionPhase::NotStarted);
        assert!(s.take_events().is_empty());
    }

    #[test]
    fn test_from_board_requires_treasure() {
        let unwinnable: Board = "K.\n.D".parse().unwrap();
        assert_eq!(
            GameSession::from_board(unwinnable, 1).err(),
            Some(BoardError::NoCollectibles)
        );

        let full: Board = "K$\n$D".parse().unwrap();
        let s = GameSession::from_board(full, 1).unwrap();
        assert_eq!(s.target_score(), 2);
    }

    #[test]
    fn test_start_trims_name() {
        let mut s = session("K$\n..");
        s.start("  Ann ", t0()).unwrap();
        assert_eq!(s.player(), "Ann");
        assert!(s.is_active());
        assert_eq!(
            s.start("Ann", t0()),
            Err(SessionError::InvalidState(SessionPhase::Active))
        );
    }

    #[test]
    fn test_move_before_start_is_noop() {
        let mut s = session("K$\n..");
        let before = s.board().clone();
        assert!(s.apply_move(Direction::Right, t0()).is_none());
        assert_eq!(s.board(), &before);
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_rejected_move_does_not_count() {
        let mut s = session("K$\n..");
        s.start("Ann", t0()).unwrap();
        let outcome = s.apply_move(Direction::Up, t0()).unwrap();
        assert_eq!(outcome.event, MoveEvent::Rejected);
        assert_eq!(s.moves(), 0);
        assert_eq!(s.position(), Position::ORIGIN);
    }

    #[test]
    fn test_hazard_ends_run_without_score() {
        // 20x20, 10 treasures, 10 dragons, dragon at (1, 0).
        let mut rows = vec![String::from("KD$$$$$$$$$$DDDDDDDD"), String::from("D...................")];
        rows.extend((2..20).map(|_| ".".repeat(20)));
        let board: Board = rows.join("\n").parse().unwrap();
        assert_eq!(board.collectible_total(), 10);
        assert_eq!(board.hazard_total(), 10);

        let mut s = GameSession::from_board(board, 1).unwrap();
        s.start("Ann", t0()).unwrap();
        s.take_events();

        let outcome = s.apply_move(Direction::Right, t0() + Duration::milliseconds(4250)).unwrap();
        assert_eq!(outcome.event, MoveEvent::HazardHit);
        assert_eq!(outcome.score, 0);

        let run = outcome.finished.unwrap();
        assert_eq!(run.outcome, RunOutcome::Lost);
        assert_eq!(run.score, 0);
        assert_eq!(run.elapsed_secs, 4.25);
        assert_eq!(run.record(), ScoreRecord::new("Ann", 4.25));

        assert_eq!(s.phase(), SessionPhase::Finished(RunOutcome::Lost));
        assert_eq!(s.position(), Position::ORIGIN);
        assert_eq!(s.board().get(Position::new(1, 0)), Some(Cell::Hazard));

        let events = s.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, GameEventData::HazardHit { position: Position::new(1, 0) });
        assert!(events[1].is_terminal());
    }

    #[test]
    fn test_win_fires_once_on_last_treasure() {
        let mut s = session("K$$\n...\n...");
        s.start("Bo", t0()).unwrap();

        let first = s.apply_move(Direction::Right, t0() + Duration::seconds(1)).unwrap();
        assert_eq!(first.event, MoveEvent::Collected);
        assert_eq!(first.score, 1);
        assert!(first.finished.is_none());

        let second = s.apply_move(Direction::Right, t0() + Duration::seconds(2)).unwrap();
        let run = second.finished.unwrap();
        assert_eq!(run.outcome, RunOutcome::Won);
        assert_eq!(run.score, 2);
        assert_eq!(run.elapsed_secs, 2.0);
        assert_eq!(s.phase(), SessionPhase::Finished(RunOutcome::Won));

        // Further input is ignored, so no second record.
        assert!(s.apply_move(Direction::Left, t0() + Duration::seconds(3)).is_none());
        let terminal = s.take_events().iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminal, 1);
    }

    #[test]
    fn test_reset_only_after_finish() {
        let mut s = session("KD.\n$..\n...");
        assert!(!s.reset());

        s.start("Ann", t0()).unwrap();
        assert!(!s.reset());

        s.apply_move(Direction::Right, t0()).unwrap();
        assert_eq!(s.phase(), SessionPhase::Finished(RunOutcome::Lost));

        assert!(s.reset());
        assert_eq!(s.phase(), SessionPhase::NotStarted);
        assert_eq!(s.score(), 0);
        assert_eq!(s.moves(), 0);
        assert_eq!(s.player(), "");
        assert_eq!(s.position(), Position::ORIGIN);
        assert_eq!(s.elapsed_secs(t0()), 0.0);

        // Fresh board with the same shape
        assert_eq!(s.board().side(), 3);
        assert_eq!(s.board().count(Cell::Player), 1);
        assert_eq!(s.board().count(Cell::Collectible), 1);
        assert_eq!(s.board().count(Cell::Hazard), 1);
        assert_eq!(s.take_events().last().map(|e| &e.data), Some(&GameEventData::SessionReset));

        // And it can be played again
        s.start("Bo", t0()).unwrap();
        assert!(s.is_active());
    }

    #[test]
    fn test_elapsed_rounding() {
        let mut s = session("K$\n..");
        s.start("Ann", t0()).unwrap();
        assert_eq!(s.elapsed_secs(t0() + Duration::microseconds(12_345_678)), 12.346);
        assert_eq!(s.elapsed_secs(t0() - Duration::seconds(5)), 0.0);
    }
}
