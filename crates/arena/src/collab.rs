//! Interfaces of the external collaborators the match loop drives.

use std::time::Duration;

use async_trait::async_trait;
use chess_core::{AgentProfile, GameStatus, Outcome, Side};
use serde::{Deserialize, Serialize};

use crate::error::{CompletionError, SettlementError, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    pub uci: String,
    pub san: String,
}

/// A game as the store currently sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameView {
    pub id: String,
    /// FEN of the current position
    pub position: String,
    pub status: GameStatus,
    pub side_to_move: Side,
    /// PGN of the game so far
    pub notation: String,
    pub white_agent: Option<String>,
    pub black_agent: Option<String>,
    pub last_move: Option<PlayedMove>,
    /// Present when the game's outcome must be settled externally
    pub settlement_token: Option<String>,
}

impl GameView {
    pub fn agent_for(&self, side: Side) -> Option<&str> {
        match side {
            Side::White => self.white_agent.as_deref(),
            Side::Black => self.black_agent.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSpec {
    /// UCI notation
    pub mv: String,
    pub agent_id: String,
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn get_game(&self, id: &str) -> Result<GameView, StoreError>;

    /// Validate and apply a move. Fails with `InvalidMove`, `NotFound` or
    /// `GameNotActive` without changing the game.
    async fn apply_move(&self, id: &str, mv: MoveSpec) -> Result<GameView, StoreError>;
}

#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn get_agent(&self, id: &str) -> Result<AgentProfile, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

/// Opaque text-completion model: prompt in, text out.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle(pub String);

#[async_trait]
pub trait SettlementConnector: Send + Sync {
    async fn settle(&self, match_token: &str, outcome: Outcome) -> Result<TxHandle, SettlementError>;
}
