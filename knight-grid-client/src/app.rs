//! App - input loop driving one game session
//!
//! Keystrokes and leaderboard results are both funnelled through
//! [`run`]; the session itself never touches the network.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use knight_grid::game::{Direction, GameSession, MoveEvent, SessionError};
use knight_grid::leaderboard::{ScoreReporter, StoredScore};

use crate::network::{HttpScoreReporter, IncomingMessages, NetworkEvent};
use crate::ui;

/// Where finished runs go, and how fresh leaderboards are requested.
pub trait LeaderboardLink: ScoreReporter {
    /// Request the leaderboard; the answer arrives as a [`NetworkEvent`].
    fn refresh(&self);
}

impl LeaderboardLink for HttpScoreReporter {
    fn refresh(&self) {
        HttpScoreReporter::refresh(self)
    }
}

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(String),
    Move(Direction),
    Board,
    Scores,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Command::Empty,
            "start" | "play" => Command::Start(rest.to_string()),
            "board" | "b" => Command::Board,
            "scores" | "leaderboard" => Command::Scores,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => match word.parse::<Direction>() {
                Ok(dir) if rest.is_empty() => Command::Move(dir),
                _ => Command::Unknown(line.to_string()),
            },
        }
    }
}

pub struct App<L> {
    session: GameSession,
    link: L,
    leaderboard: Vec<StoredScore>,
}

impl<L: LeaderboardLink> App<L> {
    pub fn new(session: GameSession, link: L) -> Self {
        Self {
            session,
            link,
            leaderboard: Vec::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn leaderboard(&self) -> &[StoredScore] {
        &self.leaderboard
    }

    /// Greeting shown once; also kicks off the first leaderboard fetch.
    pub fn launch(&mut self, now: DateTime<Utc>) -> Vec<String> {
        self.link.refresh();
        vec![ui::render_game(&self.session, now), ui::HELP.to_string()]
    }

    /// Apply one command. `Quit` is handled by the caller.
    pub fn execute(&mut self, command: Command, now: DateTime<Utc>) -> Vec<String> {
        let lines = match command {
            Command::Start(name) => self.start(&name, now),
            Command::Move(dir) => self.step(dir, now),
            Command::Board => vec![ui::render_game(&self.session, now)],
            Command::Scores => {
                self.link.refresh();
                vec!["Fetching leaderboard...".to_string()]
            }
            Command::Help => vec![ui::HELP.to_string()],
            Command::Quit | Command::Empty => Vec::new(),
            Command::Unknown(text) => vec![format!("Unknown command {:?}; type `help`.", text)],
        };

        for event in self.session.take_events() {
            debug!(moves = event.moves, data = ?event.data, "Game event");
        }
        lines
    }

    pub fn handle_network(&mut self, event: NetworkEvent) -> Vec<String> {
        match event {
            NetworkEvent::LeaderboardUpdated(scores) => {
                self.leaderboard = scores;
                vec![ui::render_leaderboard(&self.leaderboard)]
            }
            NetworkEvent::ScoreSaved(score) => {
                vec![format!("Saved {} - {} s to the leaderboard.", score.player, score.time)]
            }
            NetworkEvent::RequestFailed(reason) => {
                vec![format!("Leaderboard unavailable: {}", reason)]
            }
        }
    }

    fn start(&mut self, name: &str, now: DateTime<Utc>) -> Vec<String> {
        match self.session.start(name, now) {
            Ok(()) => {
                self.link.refresh();
                vec![ui::render_game(&self.session, now)]
            }
            Err(SessionError::InvalidState(_)) => vec!["A run is already in progress.".to_string()],
            Err(e) => vec![e.to_string()],
        }
    }

    fn step(&mut self, direction: Direction, now: DateTime<Utc>) -> Vec<String> {
        let Some(outcome) = self.session.apply_move(direction, now) else {
            return vec!["No run in progress; type `start <name>`.".to_string()];
        };

        let Some(run) = outcome.finished else {
            return match outcome.event {
                MoveEvent::Rejected => vec!["The knight cannot leave the board.".to_string()],
                _ => vec![ui::render_game(&self.session, now)],
            };
        };

        info!(player = %run.player, outcome = ?run.outcome, time = run.elapsed_secs, "Run finished");
        self.link.report(run.record());

        let mut lines = vec![
            self.session.board().to_string(),
            ui::render_outcome(run.outcome, run.elapsed_secs),
        ];
        self.session.reset();
        lines.push(format!("New board ready.\n{}", ui::render_game(&self.session, now)));
        lines
    }
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run<L: LeaderboardLink>(
    mut app: App<L>,
    mut incoming: IncomingMessages,
    player: Option<String>,
) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    write_lines(&mut stdout, app.launch(Utc::now())).await?;
    if let Some(name) = player {
        write_lines(&mut stdout, app.execute(Command::Start(name), Utc::now())).await?;
    }

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = Command::parse(&line);
                if command == Command::Quit {
                    break;
                }
                let lines = app.execute(command, Utc::now());
                write_lines(&mut stdout, lines).await?;
            }
            Some(event) = incoming.recv() => {
                let lines = app.handle_network(event);
                write_lines(&mut stdout, lines).await?;
            }
        }
    }

    info!("Goodbye");
    Ok(())
}

async fn write_lines(stdout: &mut tokio::io::Stdout, lines: Vec<String>) -> Result<()> {
    for line in lines {
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;
    Ok(())
}
