//! Move Resolution
//!
//! Pure transition from (board, position, direction) to the next board,
//! position and the event the move triggered.

use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::game::board::{Board, Cell, Position};

/// One step on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// y - 1
    Up,
    /// y + 1
    Down,
    /// x - 1
    Left,
    /// x + 1
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit delta as (dx, dy).
    #[inline]
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Unrecognised direction token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction '{0}'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    /// Accepts `w/a/s/d`, `up/down/left/right` and the `ArrowUp` style key
    /// names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "up" | "arrowup" => Ok(Direction::Up),
            "s" | "down" | "arrowdown" => Ok(Direction::Down),
            "a" | "left" | "arrowleft" => Ok(Direction::Left),
            "d" | "right" | "arrowright" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// What a move did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveEvent {
    /// Target was off the grid; nothing changed
    Rejected,
    /// Stepped onto an empty cell
    Moved,
    /// Stepped onto a treasure and picked it up
    Collected,
    /// Target holds a dragon; nothing moved, the run is over
    HazardHit,
}

/// Output of [`resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveResult {
    /// Board after the move
    pub board: Board,
    /// Knight position after the move
    pub position: Position,
    /// Triggered event
    pub event: MoveEvent,
}

/// Resolve a single move.
///
/// Off-grid and hazard targets leave board and position untouched. Every
/// other target relocates the knight: the old cell and the target are
/// cleared before the knight is written, so the board never holds two
/// knights.
pub fn resolve(board: &Board, position: Position, direction: Direction) -> MoveResult {
    let (dx, dy) = direction.delta();
    let target = position.offset(dx, dy).filter(|p| board.contains(*p));

    let Some(target) = target else {
        return unchanged(board, position, MoveEvent::Rejected);
    };

    let event = match board.get(target) {
        Some(Cell::Hazard) => return unchanged(board, position, MoveEvent::HazardHit),
        Some(Cell::Collectible) => MoveEvent::Collected,
        _ => MoveEvent::Moved,
    };

    let mut next = board.clone();
    next.set(position, Cell::Empty);
    next.set(target, Cell::Player);

    MoveResult {
        board: next,
        position: target,
        event,
    }
}

fn unchanged(board: &Board, position: Position, event: MoveEvent) -> MoveResult {
    MoveResult {
        board: board.clone(),
        position,
        event,
    }
}
