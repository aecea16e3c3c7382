//! UI module - plain-text board, HUD and leaderboard
//!
//! Everything here returns strings; the app decides where they go.

use chrono::{DateTime, Utc};

use knight_grid::game::{GameSession, SessionPhase};
use knight_grid::{RunOutcome, StoredScore};

pub const HELP: &str = "\
Commands:
  start <name>          begin a run
  w/a/s/d, up/down/...  move the knight
  board                 redraw the board
  scores                refresh the leaderboard
  quit                  leave";

/// Board followed by the HUD line.
pub fn render_game(session: &GameSession, now: DateTime<Utc>) -> String {
    format!("{}\n{}", session.board(), render_hud(session, now))
}

/// Player name, score and running time.
pub fn render_hud(session: &GameSession, now: DateTime<Utc>) -> String {
    match session.phase() {
        SessionPhase::NotStarted => "Enter `start <name>` to play.".to_string(),
        _ => format!(
            "Player: {} | Score: {}/{} | Time: {} s",
            session.player(),
            session.score(),
            session.target_score(),
            session.elapsed_secs(now).floor()
        ),
    }
}

/// End-of-run message.
pub fn render_outcome(outcome: RunOutcome, elapsed_secs: f64) -> String {
    match outcome {
        RunOutcome::Won => format!(
            "Congratulations! You collected all treasures in {:.3} seconds.",
            elapsed_secs
        ),
        RunOutcome::Lost => "Game Over! You hit a dragon.".to_string(),
    }
}

pub fn render_leaderboard(scores: &[StoredScore]) -> String {
    let mut out = String::from("Leaderboard");
    if scores.is_empty() {
        out.push_str("\n  (no scores yet)");
    }
    for (rank, score) in scores.iter().enumerate() {
        out.push_str(&format!("\n{}. {} - {} s", rank + 1, score.player, score.time));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use knight_grid::leaderboard::ScoreRecord;

    fn session() -> GameSession {
        GameSession::from_board("K$\n.D".parse().unwrap(), 7).unwrap()
    }

    #[test]
    fn test_hud_before_and_during_run() {
        let mut session = session();
        let t0 = Utc::now();
        assert!(render_hud(&session, t0).contains("start <name>"));

        session.start("Ann", t0).unwrap();
        let hud = render_hud(&session, t0 + Duration::milliseconds(2_900));
        assert_eq!(hud, "Player: Ann | Score: 0/1 | Time: 2 s");
    }

    #[test]
    fn test_game_includes_board() {
        let session = session();
        let text = render_game(&session, Utc::now());
        assert!(text.starts_with("K$\n.D"));
    }

    #[test]
    fn test_outcome_messages() {
        assert!(render_outcome(RunOutcome::Won, 4.25).contains("4.250 seconds"));
        assert!(render_outcome(RunOutcome::Lost, 1.0).starts_with("Game Over"));
    }

    #[test]
    fn test_leaderboard_lines() {
        let now = Utc::now();
        let scores = vec![
            StoredScore::stamp(ScoreRecord::new("Bo", 9.0), now),
            StoredScore::stamp(ScoreRecord::new("Ann", 12.5), now),
        ];
        assert_eq!(render_leaderboard(&scores), "Leaderboard\n1. Bo - 9 s\n2. Ann - 12.5 s");
        assert!(render_leaderboard(&[]).contains("no scores"));
    }
}
