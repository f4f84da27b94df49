//! Error types shared across the engines, the chess service client and configuration loading.

use thiserror::Error;

/// Rejection of a move. Returned without mutating the game state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("coordinates ({row}, {col}) are off the board")]
    OutOfBounds { row: i64, col: i64 },

    #[error("the game is already over")]
    GameOver,

    #[error("move not allowed during the {0} phase")]
    WrongPhase(&'static str),

    #[error("move does not belong to the current game")]
    MismatchedGameType,

    #[error("nothing to undo")]
    NothingToUndo,
}

/// Failure talking to the remote chess move service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service answered with status {0}")]
    Status(u16),

    #[error("service did not answer within {0} ms")]
    Timeout(u64),

    #[error("service answer rejected: {0}")]
    Rejected(String),

    #[error("service is not configured")]
    Unavailable,
}

/// Malformed Forsyth-Edwards Notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    MissingFields(usize),

    #[error("bad piece placement: {0}")]
    Placement(String),

    #[error("bad side to move: {0}")]
    SideToMove(String),

    #[error("bad castling field: {0}")]
    Castling(String),

    #[error("bad en passant square: {0}")]
    EnPassant(String),

    #[error("bad move counter: {0}")]
    Counter(String),
}

/// Failure loading an arena configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
