//! Board Definitions and Generation
//!
//! A square grid of cells holding exactly one knight, a fixed number of
//! treasures and a fixed number of dragons.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::{DEFAULT_COLLECTIBLES, DEFAULT_HAZARDS, DEFAULT_SIDE_LENGTH};

// =============================================================================
// CELL & POSITION
// =============================================================================

/// Contents of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Cell {
    /// Nothing here
    #[default]
    Empty,
    /// The knight
    Player,
    /// Treasure, worth one point
    Collectible,
    /// Dragon, ends the run
    Hazard,
}

impl Cell {
    /// Glyph used by the text form of a board.
    pub const fn glyph(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Player => 'K',
            Cell::Collectible => '$',
            Cell::Hazard => 'D',
        }
    }

    /// Parse a glyph back into a cell.
    pub fn from_glyph(c: char) -> Option<Cell> {
        match c {
            '.' => Some(Cell::Empty),
            'K' => Some(Cell::Player),
            '$' => Some(Cell::Collectible),
            'D' => Some(Cell::Hazard),
            _ => None,
        }
    }
}

/// Grid coordinate. `x` is the column, `y` the row; (0, 0) is top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
}

impl Position {
    /// The knight's starting cell.
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    /// Create a position.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Offset by a signed delta, `None` if either axis would go negative.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Position> {
        Some(Position {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Board generation parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Cells per side
    pub side_length: usize,
    /// Treasures to place
    pub collectibles: u32,
    /// Dragons to place
    pub hazards: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            side_length: DEFAULT_SIDE_LENGTH,
            collectibles: DEFAULT_COLLECTIBLES,
            hazards: DEFAULT_HAZARDS,
        }
    }
}

impl BoardConfig {
    /// Check that a board with these parameters can be generated.
    ///
    /// The knight takes one cell, so items must fit in the remaining
    /// `side² - 1`.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.side_length == 0 {
            return Err(BoardError::EmptyGrid);
        }
        if self.collectibles == 0 {
            return Err(BoardError::NoCollectibles);
        }

        let cells = self.side_length.saturating_mul(self.side_length);
        let items = self.collectibles as usize + self.hazards as usize;
        if items >= cells {
            return Err(BoardError::TooManyItems {
                requested: items,
                available: cells - 1,
            });
        }

        Ok(())
    }
}

/// Board errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// Side length of zero.
    #[error("board side length must be at least 1")]
    EmptyGrid,

    /// A run needs something to collect.
    #[error("board needs at least one collectible")]
    NoCollectibles,

    /// Items do not fit next to the knight.
    #[error("{requested} items requested but only {available} free cells")]
    TooManyItems {
        /// Collectibles plus hazards
        requested: usize,
        /// Cells left after placing the knight
        available: usize,
    },
}

// =============================================================================
// BOARD
// =============================================================================

/// Square grid of cells, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    side: usize,
    cells: Vec<Cell>,
    collectibles: u32,
    hazards: u32,
}

impl Board {
    /// Create an empty board.
    pub fn empty(side: usize) -> Self {
        Self {
            side,
            cells: vec![Cell::Empty; side * side],
            collectibles: 0,
            hazards: 0,
        }
    }

    /// Cells per side.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Treasures placed at generation time.
    pub fn collectible_total(&self) -> u32 {
        self.collectibles
    }

    /// Dragons placed at generation time.
    pub fn hazard_total(&self) -> u32 {
        self.hazards
    }

    /// Check whether a position lies on the grid.
    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.side && pos.y < self.side
    }

    /// Cell at a position, `None` when off the grid.
    #[inline]
    pub fn get(&self, pos: Position) -> Option<Cell> {
        if self.contains(pos) {
            Some(self.cells[pos.y * self.side + pos.x])
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn set(&mut self, pos: Position, cell: Cell) {
        debug_assert!(self.contains(pos));
        self.cells[pos.y * self.side + pos.x] = cell;
    }

    /// Number of cells currently holding `cell`.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    /// Position of the knight, if any.
    pub fn player_position(&self) -> Option<Position> {
        self.cells
            .iter()
            .position(|c| *c == Cell::Player)
            .map(|i| Position::new(i % self.side, i / self.side))
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.side.max(1))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
        }
        Ok(())
    }
}

/// Errors from the text form of a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardParseError {
    /// No rows at all.
    #[error("board text is empty")]
    Empty,

    /// Row length differs from the row count.
    #[error("row {row} has {len} cells, expected {expected}")]
    NotSquare {
        /// Offending row
        row: usize,
        /// Its length
        len: usize,
        /// Number of rows
        expected: usize,
    },

    /// Unknown glyph.
    #[error("unknown cell '{glyph}' at ({x}, {y})")]
    UnknownGlyph {
        /// The character
        glyph: char,
        /// Column
        x: usize,
        /// Row
        y: usize,
    },

    /// Zero or several knights.
    #[error("expected exactly one knight, found {0}")]
    PlayerCount(usize),
}

impl FromStr for Board {
    type Err = BoardParseError;

    /// Parse rows of `.`, `K`, `$` and `D`. Surrounding whitespace is
    /// ignored; item totals are taken from what is on the grid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(BoardParseError::Empty);
        }

        let side = rows.len();
        let mut board = Board::empty(side);

        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != side {
                return Err(BoardParseError::NotSquare { row: y, len, expected: side });
            }
            for (x, glyph) in row.chars().enumerate() {
                let cell = Cell::from_glyph(glyph)
                    .ok_or(BoardParseError::UnknownGlyph { glyph, x, y })?;
                board.set(Position::new(x, y), cell);
            }
        }

        let players = board.count(Cell::Player);
        if players != 1 {
            return Err(BoardParseError::PlayerCount(players));
        }

        board.collectibles = board.count(Cell::Collectible) as u32;
        board.hazards = board.count(Cell::Hazard) as u32;
        Ok(board)
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Generate a fresh board.
///
/// The knight starts at (0, 0). Treasures, then dragons, are dropped on
/// uniformly random cells; occupied draws are retried. The config is
/// validated first, so the retry loop always has free cells to find.
pub fn generate(config: &BoardConfig, rng: &mut DeterministicRng) -> Result<Board, BoardError> {
    config.validate()?;

    let mut board = Board::empty(config.side_length);
    board.set(Position::ORIGIN, Cell::Player);

    place_randomly(&mut board, Cell::Collectible, config.collectibles, rng);
    place_randomly(&mut board, Cell::Hazard, config.hazards, rng);

    board.collectibles = config.collectibles;
    board.hazards = config.hazards;
    Ok(board)
}

fn place_randomly(board: &mut Board, item: Cell, count: u32, rng: &mut DeterministicRng) {
    let mut placed = 0;
    while placed < count {
        let pos = Position::new(rng.next_index(board.side), rng.next_index(board.side));
        if board.get(pos) == Some(Cell::Empty) {
            board.set(pos, item);
            placed += 1;
        }
    }
}
