pub mod board;
pub mod game;
pub mod piece;
pub mod record;
pub mod types;

pub use board::{Board, Patch};
pub use game::{Game, is_square_attacked};
pub use piece::Piece;
pub use record::{GameRecord, PieceRecord};
pub use types::*;
