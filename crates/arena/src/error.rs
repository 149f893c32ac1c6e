//! Arena error types

use chess_core::Side;
use thiserror::Error;
use uci_engine::EngineError;

/// Failures reported by the game and agent stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Game is not active: {0}")]
    GameNotActive(String),

    #[error("Store error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Model call timed out")]
    Timeout,

    #[error("Model provider error: {0}")]
    Provider(String),
}

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Settlement failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(&'static str),
}

/// Errors that end one match run. The persisted game is left untouched.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("No agent assigned to {0}")]
    AgentNotAssigned(Side),

    #[error("Turn mismatch: expected {expected} to move, store says {actual}")]
    WrongTurn { expected: Side, actual: Side },

    #[error("Engine returned no candidates for {position}")]
    NoCandidates { position: String },

    #[error("Store rejected engine move {mv}: {reason}")]
    MoveRejected { mv: String, reason: String },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
