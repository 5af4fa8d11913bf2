//! Perft (PERFormance Test): exhaustive move-generation correctness suite.
//!
//! Counts leaf nodes at a given depth and compares against published values.
//! A wrong count at any depth means a bug in candidate generation, special
//! move side effects, or the legality filter.
//!
//! Reference: <https://www.chessprogramming.org/Perft_Results>

use live_chess::engine::{Board, Color, Game};

/// Recursive perft: count leaf nodes at `depth`.
fn perft(game: &Game, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = game.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0u64;
    for mv in moves {
        let mut child = game.clone();
        child
            .make_move(mv)
            .unwrap_or_else(|e| panic!("generated move {mv} rejected: {e}"));
        nodes += perft(&child, depth - 1);
    }
    nodes
}

/// Kings and rooks on their home squares count as unmoved, so castling
/// rights follow from the placement alone.
fn position(placement: &str, turn: Color) -> Game {
    Game::from_board(Board::from_placement(placement).unwrap(), turn)
}

// =====================================================================
// Position 1: starting position
// =====================================================================

#[test]
fn perft_start_depth_1() {
    assert_eq!(perft(&Game::new(), 1), 20);
}

#[test]
fn perft_start_depth_2() {
    assert_eq!(perft(&Game::new(), 2), 400);
}

#[test]
fn perft_start_depth_3() {
    assert_eq!(perft(&Game::new(), 3), 8_902);
}

// =====================================================================
// Position 2: "Kiwipete" (castling, en passant, pins, promotions)
// =====================================================================

fn kiwipete() -> Game {
    position(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R",
        Color::White,
    )
}

#[test]
fn perft_kiwipete_depth_1() {
    assert_eq!(perft(&kiwipete(), 1), 48);
}

#[test]
fn perft_kiwipete_depth_2() {
    assert_eq!(perft(&kiwipete(), 2), 2_039);
}

// =====================================================================
// Position 3: en passant discovered checks along the fifth rank
// =====================================================================

fn position_3() -> Game {
    position("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8", Color::White)
}

#[test]
fn perft_pos3_depth_1() {
    assert_eq!(perft(&position_3(), 1), 14);
}

#[test]
fn perft_pos3_depth_2() {
    assert_eq!(perft(&position_3(), 2), 191);
}

#[test]
fn perft_pos3_depth_3() {
    assert_eq!(perft(&position_3(), 3), 2_812);
}

// =====================================================================
// Position 4: promotions under check
// =====================================================================

fn position_4() -> Game {
    position(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1",
        Color::White,
    )
}

#[test]
fn perft_pos4_depth_1() {
    assert_eq!(perft(&position_4(), 1), 6);
}

#[test]
fn perft_pos4_depth_2() {
    assert_eq!(perft(&position_4(), 2), 264);
}

// =====================================================================
// Position 5
// =====================================================================

fn position_5() -> Game {
    position(
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R",
        Color::White,
    )
}

#[test]
fn perft_pos5_depth_1() {
    assert_eq!(perft(&position_5(), 1), 44);
}

#[test]
fn perft_pos5_depth_2() {
    assert_eq!(perft(&position_5(), 2), 1_486);
}
