//! Pieces and pseudo-legal move generation.
//!
//! `candidate_moves` obeys each piece's geometry and stops on its own
//! pieces, but never asks whether the mover's king ends up attacked. That
//! filter lives in [`crate::engine::game`].

use crate::engine::board::Board;
use crate::engine::types::{Color, Move, PieceType, Square};

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];
const KING_OFFSETS: [(i8, i8); 8] = QUEEN_DIRECTIONS;

/// Column the king starts on.
pub const KING_HOME_COL: u8 = 5;

// =========================================================================
// Piece
// =========================================================================

/// A piece on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
    /// Set once the piece has moved; kings and rooks lose castling with it.
    pub has_moved: bool,
    /// Set only on a pawn that advanced two rows on the last half-move.
    pub just_double_moved: bool,
}

impl Piece {
    pub fn new(color: Color, kind: PieceType) -> Self {
        Piece {
            color,
            kind,
            has_moved: false,
            just_double_moved: false,
        }
    }

    /// Letter used in placement strings: uppercase for white.
    pub fn to_char(self) -> char {
        self.kind.to_char(self.color)
    }

    /// Pseudo-legal moves for this piece standing on `position`.
    pub fn candidate_moves(&self, board: &Board, position: Square) -> Vec<Move> {
        let mut moves = Vec::with_capacity(16);
        match self.kind {
            PieceType::Bishop => self.slide(board, position, &BISHOP_DIRECTIONS, &mut moves),
            PieceType::Rook => self.slide(board, position, &ROOK_DIRECTIONS, &mut moves),
            PieceType::Queen => self.slide(board, position, &QUEEN_DIRECTIONS, &mut moves),
            PieceType::Knight => self.leap(board, position, &KNIGHT_OFFSETS, &mut moves),
            PieceType::King => {
                self.leap(board, position, &KING_OFFSETS, &mut moves);
                self.castling(board, position, &mut moves);
            }
            PieceType::Pawn => self.pawn(board, position, &mut moves),
        }
        moves
    }

    /// A square is a legal landing spot if it is empty or holds an enemy.
    #[inline]
    fn can_land_on(&self, board: &Board, square: Square) -> bool {
        board.get(square).is_none_or(|p| p.color != self.color)
    }

    #[inline]
    fn is_enemy_at(&self, board: &Board, square: Square) -> bool {
        board.get(square).is_some_and(|p| p.color != self.color)
    }

    // ---------------------------------------------------------------------
    // Sliders (bishop, rook, queen)
    // ---------------------------------------------------------------------

    fn slide(&self, board: &Board, from: Square, directions: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(dr, dc) in directions {
            let mut current = from;
            while let Some(to) = current.offset(dr, dc) {
                match board.get(to) {
                    None => moves.push(Move::new(from, to)),
                    Some(other) => {
                        if other.color != self.color {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                }
                current = to;
            }
        }
    }

    // ---------------------------------------------------------------------
    // Leapers (knight, king)
    // ---------------------------------------------------------------------

    fn leap(&self, board: &Board, from: Square, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(dr, dc) in offsets {
            if let Some(to) = from.offset(dr, dc)
                && self.can_land_on(board, to)
            {
                moves.push(Move::new(from, to));
            }
        }
    }

    // ---------------------------------------------------------------------
    // Castling (geometry only; path safety is checked by Game)
    // ---------------------------------------------------------------------

    fn castling(&self, board: &Board, from: Square, moves: &mut Vec<Move>) {
        let row = self.color.home_row();
        if self.has_moved || from != Square::new(row, KING_HOME_COL) {
            return;
        }

        // Kingside rook on column 8, queenside rook on column 1.
        for (rook_col, step) in [(8u8, 1i8), (1u8, -1i8)] {
            let rook_sq = Square::new(row, rook_col);
            let rook_ready = board.get(rook_sq).is_some_and(|p| {
                p.kind == PieceType::Rook && p.color == self.color && !p.has_moved
            });
            if !rook_ready {
                continue;
            }

            let (lo, hi) = if step > 0 {
                (KING_HOME_COL + 1, rook_col - 1)
            } else {
                (rook_col + 1, KING_HOME_COL - 1)
            };
            let path_clear = (lo..=hi).all(|col| board.get(Square::new(row, col)).is_none());
            if !path_clear {
                continue;
            }

            if let Some(to) = from.offset(0, 2 * step) {
                moves.push(Move::new(from, to));
            }
        }
    }

    // ---------------------------------------------------------------------
    // Pawn
    // ---------------------------------------------------------------------

    fn pawn(&self, board: &Board, from: Square, moves: &mut Vec<Move>) {
        let dir = self.color.forward();
        let promotes = |to: Square| to.row() == self.color.promotion_row();

        // Forward pushes.
        if let Some(one) = from.offset(dir, 0)
            && board.get(one).is_none()
        {
            push_pawn_move(from, one, promotes(one), moves);

            if from.row() == self.color.pawn_row()
                && let Some(two) = from.offset(2 * dir, 0)
                && board.get(two).is_none()
            {
                moves.push(Move::new(from, two));
            }
        }

        // Diagonal captures and en passant.
        for dc in [-1, 1] {
            let Some(to) = from.offset(dir, dc) else {
                continue;
            };
            if self.is_enemy_at(board, to) {
                push_pawn_move(from, to, promotes(to), moves);
            } else if board.get(to).is_none() {
                let beside = Square::new(from.row(), to.col());
                let capturable = board.get(beside).is_some_and(|p| {
                    p.kind == PieceType::Pawn && p.color != self.color && p.just_double_moved
                });
                if capturable {
                    moves.push(Move::en_passant(from, to));
                }
            }
        }
    }
}

/// Push a pawn move, expanding to all four promotions on the last row.
fn push_pawn_move(from: Square, to: Square, promotes: bool, moves: &mut Vec<Move>) {
    if promotes {
        for promo in PieceType::PROMOTIONS {
            moves.push(Move::with_promotion(from, to, promo));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

// =========================================================================
// Tests
// =========================================================================
