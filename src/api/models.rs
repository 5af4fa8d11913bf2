use serde::{Deserialize, Serialize};

use crate::engine::{Board, Color, GameRecord, Move, PieceType, Square};
use crate::matches::{Match, Role};

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub player: String,
    /// "white" or "black"; absent to observe.
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub player: String,
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResignRequest {
    pub player: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesQuery {
    pub from: Option<String>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub matches: usize,
    pub connections: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Players {
    pub white: Option<String>,
    pub black: Option<String>,
}

/// Everything a client needs to draw a match.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Color>,
    pub turn: Color,
    pub check: bool,
    pub players: Players,
    /// Row 0 is rank 8. Uppercase letters are white pieces.
    pub board: Vec<Vec<Option<String>>>,
    pub placement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<String>,
    pub move_count: usize,
    /// Increases with every change to the match; a snapshot with a lower
    /// revision than one already seen is stale.
    pub revision: u64,
    pub record: GameRecord,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMatchesResponse {
    pub matches: Vec<MatchResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    /// "white", "black" or "observer".
    pub role: String,
    #[serde(rename = "match")]
    pub snapshot: MatchResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMoveEntry {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
    pub en_passant: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesResponse {
    pub moves: Vec<LegalMoveEntry>,
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub fn parse_color(s: &str) -> Result<Color, String> {
    Color::from_str_loose(s).ok_or_else(|| format!("invalid color: {s}"))
}

pub fn parse_square(s: &str) -> Result<Square, String> {
    Square::from_algebraic(s).ok_or_else(|| format!("invalid square: {s}"))
}

/// Promotion piece from a name like "queen" or a letter like "q".
pub fn parse_promotion(s: &str) -> Result<PieceType, String> {
    PieceType::from_str_loose(s)
        .filter(|pt| PieceType::PROMOTIONS.contains(pt))
        .ok_or_else(|| format!("invalid promotion: {s}"))
}

/// Build an engine move from request strings.
pub fn parse_move(from: &str, to: &str, promotion: Option<&str>) -> Result<Move, String> {
    let start = parse_square(from)?;
    let end = parse_square(to)?;
    Ok(match promotion {
        Some(p) => Move::with_promotion(start, end, parse_promotion(p)?),
        None => Move::new(start, end),
    })
}

pub fn role_name(role: Role) -> String {
    match role {
        Role::Player(color) => color.to_string(),
        Role::Observer => "observer".to_string(),
    }
}

pub fn board_to_api(board: &Board) -> Vec<Vec<Option<String>>> {
    (1..=8u8)
        .rev()
        .map(|row| {
            (1..=8u8)
                .map(|col| {
                    board
                        .get(Square::new(row, col))
                        .map(|p| p.to_char().to_string())
                })
                .collect()
        })
        .collect()
}

pub fn legal_move_entry(mv: &Move) -> LegalMoveEntry {
    LegalMoveEntry {
        from: mv.start.to_algebraic(),
        to: mv.end.to_algebraic(),
        promotion: mv.promotion,
        en_passant: mv.is_en_passant,
    }
}

pub fn match_to_response(m: &Match) -> MatchResponse {
    let game = m.game();
    let status = m.status();
    MatchResponse {
        id: m.id.clone(),
        name: m.name.clone(),
        status: status.as_str().to_string(),
        winner: status.winner(),
        turn: game.turn(),
        check: game.is_in_check(game.turn()),
        players: Players {
            white: m.white.clone(),
            black: m.black.clone(),
        },
        board: board_to_api(game.board()),
        placement: game.board().to_placement(),
        last_move: m.history().last().map(Move::to_string),
        move_count: m.history().len(),
        revision: m.revision(),
        record: game.to_record(),
        created_at: m.created_at.to_rfc3339(),
    }
}
