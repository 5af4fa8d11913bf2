//! A hosted match: one [`Game`], two seats and any number of observers.
//!
//! `Match` enforces who may move; [`Game`] enforces how pieces move. Once
//! the status leaves [`MatchStatus::Active`] no further moves are accepted.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::engine::{Color, Game, GameStatus, Move, MoveError};

// =========================================================================
// Status / roles
// =========================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    Active,
    Checkmate { winner: Color },
    Stalemate,
    Resigned { loser: Color },
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Active => "active",
            MatchStatus::Checkmate { .. } => "checkmate",
            MatchStatus::Stalemate => "stalemate",
            MatchStatus::Resigned { .. } => "resigned",
        }
    }

    pub fn is_over(&self) -> bool {
        !matches!(self, MatchStatus::Active)
    }

    /// Winning color, if the match ended with one.
    pub fn winner(&self) -> Option<Color> {
        match *self {
            MatchStatus::Checkmate { winner } => Some(winner),
            MatchStatus::Resigned { loser } => Some(!loser),
            _ => None,
        }
    }
}

/// How a connected user relates to a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Player(Color),
    Observer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Player(color) => write!(f, "{color}"),
            Role::Observer => write!(f, "an observer"),
        }
    }
}

/// Result of a committed move, used to build notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub mover: Color,
    pub mv: Move,
    pub status: MatchStatus,
    pub opponent_in_check: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("the match is already over")]
    MatchOver,

    #[error("{0} is not playing in this match")]
    NotAPlayer(String),

    #[error("it is not {0}'s turn")]
    NotYourTurn(String),

    #[error("the {0} seat is already taken")]
    SeatTaken(Color),

    #[error("{player} already plays {color} in this match")]
    AlreadySeated { player: String, color: Color },

    #[error(transparent)]
    Move(#[from] MoveError),
}

// =========================================================================
// Match
// =========================================================================

#[derive(Clone, Debug)]
pub struct Match {
    pub id: String,
    pub name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub created_at: DateTime<Utc>,
    status: MatchStatus,
    game: Game,
    history: Vec<Move>,
    revision: u64,
}

impl Match {
    pub fn new(name: impl Into<String>) -> Self {
        Match {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            white: None,
            black: None,
            created_at: Utc::now(),
            status: MatchStatus::Active,
            game: Game::new(),
            history: Vec::new(),
            revision: 0,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Moves committed so far, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Bumped by every change to seats, board or status. Snapshots carry
    /// it so a client can drop one that arrives after a newer one.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn seat(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => self.white.as_deref(),
            Color::Black => self.black.as_deref(),
        }
    }

    fn seat_mut(&mut self, color: Color) -> &mut Option<String> {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn role_of(&self, player: &str) -> Role {
        if self.white.as_deref() == Some(player) {
            Role::Player(Color::White)
        } else if self.black.as_deref() == Some(player) {
            Role::Player(Color::Black)
        } else {
            Role::Observer
        }
    }

    // -----------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------

    /// Take a seat, or observe when `color` is `None`.
    ///
    /// Re-joining a seat already held under the same name is allowed; one
    /// name never holds both seats.
    pub fn join(&mut self, player: &str, color: Option<Color>) -> Result<Role, MatchError> {
        let Some(color) = color else {
            return Ok(Role::Observer);
        };
        if self.seat(color).is_some_and(|holder| holder != player) {
            return Err(MatchError::SeatTaken(color));
        }
        if self.seat(!color) == Some(player) {
            return Err(MatchError::AlreadySeated {
                player: player.to_string(),
                color: !color,
            });
        }
        if self.seat(color).is_none() {
            *self.seat_mut(color) = Some(player.to_string());
            self.revision += 1;
        }
        info!(match_id = %self.id, player, %color, "player seated");
        Ok(Role::Player(color))
    }

    pub fn play(&mut self, player: &str, mv: Move) -> Result<MoveOutcome, MatchError> {
        if self.status.is_over() {
            return Err(MatchError::MatchOver);
        }
        let Role::Player(mover) = self.role_of(player) else {
            return Err(MatchError::NotAPlayer(player.to_string()));
        };
        if mover != self.game.turn() {
            return Err(MatchError::NotYourTurn(player.to_string()));
        }

        self.game.make_move(mv)?;
        self.history.push(mv);
        self.revision += 1;

        let opponent = !mover;
        let opponent_in_check = self.game.is_in_check(opponent);
        self.status = match self.game.status() {
            GameStatus::Checkmate => MatchStatus::Checkmate { winner: mover },
            GameStatus::Stalemate => MatchStatus::Stalemate,
            GameStatus::Active | GameStatus::Check => MatchStatus::Active,
        };
        if self.status.is_over() {
            info!(match_id = %self.id, status = self.status.as_str(), "match finished");
        }

        Ok(MoveOutcome {
            mover,
            mv,
            status: self.status,
            opponent_in_check,
        })
    }

    pub fn resign(&mut self, player: &str) -> Result<Color, MatchError> {
        if self.status.is_over() {
            return Err(MatchError::MatchOver);
        }
        let Role::Player(loser) = self.role_of(player) else {
            return Err(MatchError::NotAPlayer(player.to_string()));
        };
        self.status = MatchStatus::Resigned { loser };
        self.revision += 1;
        info!(match_id = %self.id, player, %loser, "player resigned");
        Ok(loser)
    }

    /// Give up a seat. Returns the freed color; observers free nothing.
    pub fn leave(&mut self, player: &str) -> Option<Color> {
        let Role::Player(color) = self.role_of(player) else {
            return None;
        };
        *self.seat_mut(color) = None;
        self.revision += 1;
        Some(color)
    }
}

// =========================================================================
// Tests
// =========================================================================
