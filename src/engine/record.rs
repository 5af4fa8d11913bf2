//! Serializable snapshot of a [`Game`].

use serde::{Deserialize, Serialize};

use crate::engine::board::Board;
use crate::engine::game::Game;
use crate::engine::piece::Piece;
use crate::engine::types::{Color, PieceType, RecordError, Square};

/// One occupied square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceRecord {
    pub square: String,
    pub color: Color,
    pub kind: PieceType,
    pub has_moved: bool,
    pub just_double_moved: bool,
}

/// Everything needed to rebuild a game: side to move, king squares and
/// every piece with its flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub turn: Color,
    pub white_king: Option<String>,
    pub black_king: Option<String>,
    pub pieces: Vec<PieceRecord>,
}

impl Game {
    pub fn to_record(&self) -> GameRecord {
        let pieces = self
            .board()
            .pieces()
            .map(|(sq, p)| PieceRecord {
                square: sq.to_algebraic(),
                color: p.color,
                kind: p.kind,
                has_moved: p.has_moved,
                just_double_moved: p.just_double_moved,
            })
            .collect();

        GameRecord {
            turn: self.turn(),
            white_king: self.king_square(Color::White).map(Square::to_algebraic),
            black_king: self.king_square(Color::Black).map(Square::to_algebraic),
            pieces,
        }
    }

    /// Rebuild a game, checking the recorded king squares against the pieces.
    pub fn from_record(record: &GameRecord) -> Result<Game, RecordError> {
        let mut board = Board::empty();
        for pr in &record.pieces {
            let square = Square::from_algebraic(&pr.square)
                .ok_or_else(|| RecordError::InvalidSquare(pr.square.clone()))?;
            if board.get(square).is_some() {
                return Err(RecordError::DuplicateSquare(pr.square.clone()));
            }
            board.set(
                square,
                Some(Piece {
                    color: pr.color,
                    kind: pr.kind,
                    has_moved: pr.has_moved,
                    just_double_moved: pr.just_double_moved,
                }),
            );
        }

        let game = Game::from_board(board, record.turn);
        for (color, recorded) in [
            (Color::White, &record.white_king),
            (Color::Black, &record.black_king),
        ] {
            let found = game.king_square(color).map(Square::to_algebraic);
            if found != *recorded {
                return Err(RecordError::KingMismatch {
                    color,
                    recorded: recorded.clone(),
                    found,
                });
            }
        }
        Ok(game)
    }
}
