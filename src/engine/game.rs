//! Turn order, legality filtering and end-of-game detection.
//!
//! Every candidate move is checked by the same protocol: build the edit list
//! the move would commit, apply it to a scratch board as a [`Patch`], ask
//! whether the mover's king is attacked, revert. A committed move applies
//! that same edit list to the live board, so simulation and commit cannot
//! disagree about what a move does.

use tracing::{debug, trace};

use crate::engine::board::{Board, Patch};
use crate::engine::piece::Piece;
use crate::engine::types::{Color, GameStatus, Move, MoveError, PieceType, Square};

// =========================================================================
// Attack test
// =========================================================================

/// Is `square` attacked by any piece of color `by`?
///
/// Scans all 64 squares, skipping only empty ones. `square` must hold a
/// piece of the defending color (a king, real or simulated): pawn pushes,
/// en passant and castling only ever land on empty squares, so on an
/// occupied square every candidate target is a genuine attack.
pub fn is_square_attacked(board: &Board, square: Square, by: Color) -> bool {
    board
        .pieces()
        .filter(|(_, p)| p.color == by)
        .any(|(from, p)| {
            p.candidate_moves(board, from)
                .iter()
                .any(|mv| mv.end == square)
        })
}

/// A king move of two files is a castle.
#[inline]
fn is_castle(piece: Piece, mv: &Move) -> bool {
    piece.kind == PieceType::King && mv.start.col().abs_diff(mv.end.col()) == 2
}

/// Rook start and end squares for a castling king move.
fn castling_rook_squares(mv: &Move) -> (Square, Square) {
    let row = mv.start.row();
    if mv.end.col() > mv.start.col() {
        (Square::new(row, 8), Square::new(row, mv.end.col() - 1))
    } else {
        (Square::new(row, 1), Square::new(row, mv.end.col() + 1))
    }
}

/// The board writes that playing `mv` with `piece` performs.
///
/// The landing piece is marked moved, and `just_double_moved` is set on it
/// exactly when it is a pawn advancing two rows.
fn move_edits(piece: Piece, mv: &Move) -> Vec<(Square, Option<Piece>)> {
    let mut landed = Piece {
        has_moved: true,
        just_double_moved: piece.kind == PieceType::Pawn
            && mv.start.row().abs_diff(mv.end.row()) == 2,
        ..piece
    };
    if let Some(promo) = mv.promotion {
        landed.kind = promo;
    }

    let mut edits = vec![(mv.start, None), (mv.end, Some(landed))];

    if mv.is_en_passant {
        edits.push((Square::new(mv.start.row(), mv.end.col()), None));
    }

    if is_castle(piece, mv) {
        let (rook_from, rook_to) = castling_rook_squares(mv);
        let rook = Piece {
            has_moved: true,
            ..Piece::new(piece.color, PieceType::Rook)
        };
        edits.push((rook_from, None));
        edits.push((rook_to, Some(rook)));
    }

    edits
}

// =========================================================================
// Game
// =========================================================================

/// One match worth of engine state: the board, whose turn it is, and the
/// king squares derived from the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    board: Board,
    turn: Color,
    king_squares: [Option<Square>; 2],
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game in the standard starting position, White to move.
    pub fn new() -> Self {
        Self::from_board(Board::standard(), Color::White)
    }

    /// A game over an arbitrary board.
    pub fn from_board(board: Board, turn: Color) -> Self {
        let mut game = Game {
            board,
            turn,
            king_squares: [None; 2],
        };
        game.refresh_king_squares();
        game
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Replace the board, e.g. when reloading stored state.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.refresh_king_squares();
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn set_turn(&mut self, color: Color) {
        self.turn = color;
    }

    /// Cached king square for `color`.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.king_squares[color.index()]
    }

    fn refresh_king_squares(&mut self) {
        for color in [Color::White, Color::Black] {
            self.king_squares[color.index()] = self.board.find_king(color);
        }
    }

    // -----------------------------------------------------------------
    // Legal moves
    // -----------------------------------------------------------------

    /// Legal moves for the piece on `square`, or `None` if it is empty.
    ///
    /// Works for either color regardless of whose turn it is; safety is
    /// always judged against the moving piece's own king.
    pub fn valid_moves(&self, square: Square) -> Option<Vec<Move>> {
        let piece = self.board.get(square)?;
        let in_check = piece.kind == PieceType::King && self.is_in_check(piece.color);
        let mut scratch = self.board.clone();

        let moves = piece
            .candidate_moves(&self.board, square)
            .into_iter()
            .filter(|mv| {
                if is_castle(piece, mv) && (in_check || !self.transit_is_safe(&mut scratch, piece, mv))
                {
                    return false;
                }
                self.leaves_king_safe(&mut scratch, piece, mv)
            })
            .collect();
        Some(moves)
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.board
            .pieces()
            .filter(|(_, p)| p.color == self.turn)
            .filter_map(|(sq, _)| self.valid_moves(sq))
            .flatten()
            .collect()
    }

    /// Simulate `mv` on `scratch` and report whether the mover's king is safe.
    fn leaves_king_safe(&self, scratch: &mut Board, piece: Piece, mv: &Move) -> bool {
        let king = if piece.kind == PieceType::King {
            Some(mv.end)
        } else {
            self.king_square(piece.color)
        };

        let patch: Patch = scratch.apply(&move_edits(piece, mv));
        let safe = king.is_none_or(|k| !is_square_attacked(scratch, k, !piece.color));
        scratch.revert(patch);
        safe
    }

    /// The square a castling king crosses must not be attacked.
    fn transit_is_safe(&self, scratch: &mut Board, king: Piece, mv: &Move) -> bool {
        let step: i8 = if mv.end.col() > mv.start.col() { 1 } else { -1 };
        let Some(transit) = mv.start.offset(0, step) else {
            return false;
        };
        let patch = scratch.apply(&[(mv.start, None), (transit, Some(king))]);
        let safe = !is_square_attacked(scratch, transit, !king.color);
        scratch.revert(patch);
        safe
    }

    // -----------------------------------------------------------------
    // Make move
    // -----------------------------------------------------------------

    /// Play a move for the side to move.
    ///
    /// On error the game is left exactly as it was.
    pub fn make_move(&mut self, mv: Move) -> Result<(), MoveError> {
        let result = self.try_make_move(mv);
        match &result {
            Ok(()) => trace!(%mv, turn = %self.turn, "move committed"),
            Err(err) => debug!(%mv, %err, "move rejected"),
        }
        result
    }

    fn try_make_move(&mut self, mv: Move) -> Result<(), MoveError> {
        let piece = self
            .board
            .get(mv.start)
            .ok_or(MoveError::NoPieceAtStart(mv.start))?;

        if piece.color != self.turn {
            return Err(MoveError::WrongTurn { turn: self.turn });
        }

        if self.board.get(mv.end).is_some_and(|p| p.color == piece.color) {
            return Err(MoveError::OccupiedByOwnPiece(mv.end));
        }

        // Commit the generated move so the en-passant flag is authoritative.
        let generated = self
            .valid_moves(mv.start)
            .unwrap_or_default()
            .into_iter()
            .find(|m| *m == mv)
            .ok_or(MoveError::IllegalMove(mv))?;

        for sq in Square::all() {
            if let Some(mut p) = self.board.get(sq)
                && p.just_double_moved
            {
                p.just_double_moved = false;
                self.board.set(sq, Some(p));
            }
        }
        self.board.commit(&move_edits(piece, &generated));

        self.turn = !self.turn;
        self.refresh_king_squares();
        Ok(())
    }

    // -----------------------------------------------------------------
    // Status queries
    // -----------------------------------------------------------------

    /// Is `color`'s king attacked? False when `color` has no king.
    pub fn is_in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|k| is_square_attacked(&self.board, k, !color))
    }

    /// Does any piece of `color` have a legal move?
    pub fn has_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .any(|(sq, _)| self.valid_moves(sq).is_some_and(|m| !m.is_empty()))
    }

    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_legal_move(color)
    }

    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_legal_move(color)
    }

    /// Status for the side to move.
    pub fn status(&self) -> GameStatus {
        let in_check = self.is_in_check(self.turn);
        match (in_check, self.has_legal_move(self.turn)) {
            (true, false) => GameStatus::Checkmate,
            (false, false) => GameStatus::Stalemate,
            (true, true) => GameStatus::Check,
            (false, true) => GameStatus::Active,
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
