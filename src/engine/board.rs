//! 8×8 board storage.
//!
//! `Board` is a plain grid of optional pieces with no notion of legality.
//! Speculative moves go through [`Board::apply`], which returns a [`Patch`]
//! holding the exact previous contents of every touched square, and are
//! undone with [`Board::revert`].

use std::fmt;

use crate::engine::piece::Piece;
use crate::engine::types::{BoardError, Color, PieceType, Square};

/// Placement of the standard starting position, rank 8 first.
pub const STANDARD_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// What a set of edits overwrote, in the order the edits were applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use = "a patch must be reverted or deliberately dropped"]
pub struct Patch {
    previous: Vec<(Square, Option<Piece>)>,
}

impl Patch {
    /// Squares touched by the patch.
    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        self.previous.iter().map(|(sq, _)| *sq)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// 64 cells, each holding at most one piece.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Piece>; Square::NUM],
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Self {
        Board {
            cells: [None; Square::NUM],
        }
    }

    /// A board in the standard starting position.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        board.reset_to_standard_setup();
        board
    }

    /// Clear the board and place the 32 starting pieces.
    pub fn reset_to_standard_setup(&mut self) {
        self.cells = [None; Square::NUM];
        for (i, &kind) in BACK_RANK.iter().enumerate() {
            let col = i as u8 + 1;
            for color in [Color::White, Color::Black] {
                self.set(Square::new(color.home_row(), col), Some(Piece::new(color, kind)));
                self.set(
                    Square::new(color.pawn_row(), col),
                    Some(Piece::new(color, PieceType::Pawn)),
                );
            }
        }
    }

    #[inline]
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.index()]
    }

    #[inline]
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.index()] = piece;
    }

    /// Occupied squares with their pieces, row 1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.get(sq).map(|p| (sq, p)))
    }

    /// Square of `color`'s king, found by scanning.
    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceType::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    // -----------------------------------------------------------------------
    // Apply / revert
    // -----------------------------------------------------------------------

    /// Write every edit and return what was there before.
    pub fn apply(&mut self, edits: &[(Square, Option<Piece>)]) -> Patch {
        let mut previous = Vec::with_capacity(edits.len());
        for &(square, piece) in edits {
            previous.push((square, self.get(square)));
            self.set(square, piece);
        }
        Patch { previous }
    }

    /// Write every edit for good; nothing is kept to undo them.
    pub fn commit(&mut self, edits: &[(Square, Option<Piece>)]) {
        for &(square, piece) in edits {
            self.set(square, piece);
        }
    }

    /// Restore the contents recorded by `patch`, newest edit first.
    pub fn revert(&mut self, patch: Patch) {
        for (square, piece) in patch.previous.into_iter().rev() {
            self.set(square, piece);
        }
    }

    // -----------------------------------------------------------------------
    // Placement strings
    // -----------------------------------------------------------------------

    /// Load the piece-placement field of a FEN string.
    ///
    /// Every piece starts with `has_moved` and `just_double_moved` cleared.
    pub fn from_placement(placement: &str) -> Result<Self, BoardError> {
        let ranks: Vec<&str> = placement.trim().split('/').collect();
        if ranks.len() != 8 {
            return Err(BoardError::InvalidPlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut board = Board::empty();
        for (i, rank_str) in ranks.iter().enumerate() {
            let row = 8 - i as u8;
            let mut col: u8 = 1;
            for ch in rank_str.chars() {
                if col > 8 {
                    return Err(BoardError::InvalidPlacement(format!(
                        "too many squares in rank {row}"
                    )));
                }
                if let Some(digit) = ch.to_digit(10) {
                    if !(1..=8).contains(&digit) {
                        return Err(BoardError::InvalidPlacement(format!(
                            "invalid empty count '{ch}' in rank {row}"
                        )));
                    }
                    col += digit as u8;
                } else if let Some((color, kind)) = PieceType::from_char(ch) {
                    board.set(Square::new(row, col), Some(Piece::new(color, kind)));
                    col += 1;
                } else {
                    return Err(BoardError::InvalidPlacement(format!(
                        "invalid character '{ch}'"
                    )));
                }
            }
            if col != 9 {
                return Err(BoardError::InvalidPlacement(format!(
                    "rank {row} has {} squares instead of 8",
                    col - 1
                )));
            }
        }
        Ok(board)
    }

    /// Render the piece-placement field of a FEN string.
    pub fn to_placement(&self) -> String {
        let mut s = String::with_capacity(72);
        for row in (1..=8u8).rev() {
            let mut empty = 0u8;
            for col in 1..=8u8 {
                match self.get(Square::new(row, col)) {
                    Some(p) => {
                        if empty > 0 {
                            s.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        s.push(p.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                s.push((b'0' + empty) as char);
            }
            if row > 1 {
                s.push('/');
            }
        }
        s
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::standard()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (1..=8u8).rev() {
            write!(f, "{row} ")?;
            for col in 1..=8u8 {
                let ch = self.get(Square::new(row, col)).map_or('.', Piece::to_char);
                write!(f, "{ch}")?;
                if col < 8 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board({})", self.to_placement())?;
        write!(f, "{self}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
