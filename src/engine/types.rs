use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Row direction a pawn of this color advances in.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Row holding this color's king and rooks at the start.
    #[inline]
    pub const fn home_row(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 8,
        }
    }

    /// Row this color's pawns start on.
    #[inline]
    pub const fn pawn_row(self) -> u8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    /// Row on which this color's pawns promote.
    #[inline]
    pub const fn promotion_row(self) -> u8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }

    /// Parse "white" / "black" (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "white" | "w" => Some(Color::White),
            "black" | "b" => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceType {
    /// Pieces a pawn may promote to, in the order moves are generated.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Single uppercase letter for white, lowercase for black.
    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a piece character; the case carries the color.
    pub fn from_char(c: char) -> Option<(Color, PieceType)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some((color, piece))
    }

    /// Parse a piece name such as "queen" or a single letter such as "q".
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "king" | "k" => Some(PieceType::King),
            "queen" | "q" => Some(PieceType::Queen),
            "rook" | "r" => Some(PieceType::Rook),
            "bishop" | "b" => Some(PieceType::Bishop),
            "knight" | "n" => Some(PieceType::Knight),
            "pawn" | "p" => Some(PieceType::Pawn),
            _ => None,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A square on the board: `row` and `col` both in 1..=8.
///
/// Row 1 is White's back rank, column 1 is the a-file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    pub const NUM: usize = 64;

    #[inline]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(
            (1..=8).contains(&row) && (1..=8).contains(&col),
            "square out of range: ({row}, {col})"
        );
        Square { row, col }
    }

    /// Checked constructor for untrusted coordinates.
    pub fn try_new(row: i8, col: i8) -> Option<Self> {
        if (1..=8).contains(&row) && (1..=8).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    #[inline]
    pub fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub fn col(self) -> u8 {
        self.col
    }

    /// Dense index 0..64 (a1 = 0, h1 = 7, a8 = 56).
    #[inline]
    pub fn index(self) -> usize {
        (self.row as usize - 1) * 8 + (self.col as usize - 1)
    }

    /// The square `(dr, dc)` away, or `None` when that leaves the board.
    #[inline]
    pub fn offset(self, dr: i8, dc: i8) -> Option<Self> {
        Square::try_new(self.row as i8 + dr, self.col as i8 + dc)
    }

    /// All 64 squares, row 1 first.
    pub fn all() -> impl Iterator<Item = Square> {
        (1..=8u8).flat_map(|row| (1..=8u8).map(move |col| Square { row, col }))
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let col = bytes[0].wrapping_sub(b'a');
        let row = bytes[1].wrapping_sub(b'1');
        if col < 8 && row < 8 {
            Some(Square::new(row + 1, col + 1))
        } else {
            None
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.col - 1) as char;
        let rank = (b'0' + self.row) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// A move from one square to another, with an optional promotion.
///
/// `is_en_passant` is metadata set by the generator: two moves are equal
/// when start, end and promotion agree, whatever the flag says.
#[derive(Clone, Copy, Debug)]
pub struct Move {
    pub start: Square,
    pub end: Square,
    pub promotion: Option<PieceType>,
    pub is_en_passant: bool,
}

impl Move {
    pub fn new(start: Square, end: Square) -> Self {
        Move {
            start,
            end,
            promotion: None,
            is_en_passant: false,
        }
    }

    pub fn with_promotion(start: Square, end: Square, promotion: PieceType) -> Self {
        Move {
            start,
            end,
            promotion: Some(promotion),
            is_en_passant: false,
        }
    }

    pub fn en_passant(start: Square, end: Square) -> Self {
        Move {
            start,
            end,
            promotion: None,
            is_en_passant: true,
        }
    }

    /// Convenience for tests and callers holding algebraic strings.
    pub fn from_algebraic(start: &str, end: &str) -> Option<Self> {
        Some(Move::new(
            Square::from_algebraic(start)?,
            Square::from_algebraic(end)?,
        ))
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.promotion == other.promotion
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.end.hash(state);
        self.promotion.hash(state);
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start, self.end)?;
        if let Some(promo) = self.promotion {
            write!(f, "={}", promo.to_char(Color::Black))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// State of the game from the point of view of the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
    Stalemate,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Stalemate)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a move was rejected. A rejected move never changes the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no piece on {0}")]
    NoPieceAtStart(Square),

    #[error("it is {turn}'s turn")]
    WrongTurn { turn: Color },

    #[error("{0} is occupied by your own piece")]
    OccupiedByOwnPiece(Square),

    #[error("illegal move: {0}")]
    IllegalMove(Move),

    /// Reported as [`MoveError::IllegalMove`] by [`crate::engine::Game`],
    /// which filters self-check out before commit.
    #[error("move {0} would leave the king in check")]
    SelfCheck(Move),
}

/// Errors from loading a board placement string.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("invalid placement: {0}")]
    InvalidPlacement(String),
}

/// Errors from rebuilding a game out of a stored record.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("more than one piece on {0}")]
    DuplicateSquare(String),

    #[error("{color} king recorded on {recorded:?} but found on {found:?}")]
    KingMismatch {
        color: Color,
        recorded: Option<String>,
        found: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
