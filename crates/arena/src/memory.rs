//! In-memory game and agent stores backed by shakmaty.
//!
//! Used by the match runner and by tests. Games hold their full move history
//! and are adjudicated after every move.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chess_core::notation::{describe_move, parse_position, to_fen, STARTPOS};
use chess_core::pgn::{movetext, render_pgn, PgnHeader};
use chess_core::{AgentProfile, GameStatus, Outcome, Side};
use shakmaty::{Chess, Position};
use tracing::{debug, info};

use crate::collab::{AgentStore, GameStore, GameView, MoveSpec, PlayedMove};
use crate::error::StoreError;

/// Parameters for a new game.
#[derive(Debug, Clone, Default)]
pub struct NewGame {
    pub white_agent: Option<String>,
    pub black_agent: Option<String>,
    /// FEN or `startpos`; standard start when absent
    pub start_position: Option<String>,
    pub settlement_token: Option<String>,
}

struct GameRecord {
    id: String,
    start_fen: String,
    start_side: Side,
    start_fullmove: u32,
    position: Chess,
    sans: Vec<String>,
    white_agent: Option<String>,
    black_agent: Option<String>,
    status: GameStatus,
    last_move: Option<PlayedMove>,
    settlement_token: Option<String>,
}

impl GameRecord {
    fn view(&self) -> GameView {
        GameView {
            id: self.id.clone(),
            position: to_fen(&self.position),
            status: self.status,
            side_to_move: Side::from(self.position.turn()),
            notation: movetext(&self.sans, self.start_side, self.start_fullmove),
            white_agent: self.white_agent.clone(),
            black_agent: self.black_agent.clone(),
            last_move: self.last_move.clone(),
            settlement_token: self.settlement_token.clone(),
        }
    }

    fn agent_for(&self, side: Side) -> Option<&str> {
        match side {
            Side::White => self.white_agent.as_deref(),
            Side::Black => self.black_agent.as_deref(),
        }
    }
}

/// Game status after a move has been played in `pos`.
pub fn adjudicate(pos: &Chess) -> GameStatus {
    let outcome = if pos.is_checkmate() {
        Some(Outcome::Checkmate {
            winner: Side::from(pos.turn()).opposite(),
        })
    } else if pos.is_stalemate() {
        Some(Outcome::Stalemate)
    } else if pos.is_insufficient_material() || pos.halfmoves() >= 100 {
        Some(Outcome::Draw)
    } else {
        None
    };

    match outcome {
        Some(outcome) => GameStatus::Finished { outcome },
        None => GameStatus::Active,
    }
}

#[derive(Default)]
pub struct InMemoryGameStore {
    games: Mutex<HashMap<String, GameRecord>>,
    next_id: AtomicU64,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_game(&self, game: NewGame) -> Result<String, StoreError> {
        let start = game.start_position.as_deref().unwrap_or(STARTPOS);
        let position =
            parse_position(start).map_err(|e| StoreError::Backend(e.to_string()))?;

        let id = format!("game-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let record = GameRecord {
            id: id.clone(),
            start_fen: to_fen(&position),
            start_side: Side::from(position.turn()),
            start_fullmove: u32::from(position.fullmoves()),
            status: adjudicate(&position),
            position,
            sans: Vec::new(),
            white_agent: game.white_agent,
            black_agent: game.black_agent,
            last_move: None,
            settlement_token: game.settlement_token,
        };

        info!(game_id = %id, fen = %record.start_fen, "Game created");
        self.lock()?.insert(id.clone(), record);
        Ok(id)
    }

    /// End an active game by resignation of `side`.
    pub fn resign(&self, id: &str, side: Side) -> Result<GameView, StoreError> {
        let mut games = self.lock()?;
        let record = games
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !record.status.is_active() {
            return Err(StoreError::GameNotActive(id.to_string()));
        }

        record.status = GameStatus::Finished {
            outcome: Outcome::Resignation {
                winner: side.opposite(),
            },
        };
        info!(game_id = %id, %side, "Side resigned");
        Ok(record.view())
    }

    /// Full PGN document for a game.
    pub fn pgn(&self, id: &str, white: &str, black: &str) -> Result<String, StoreError> {
        let games = self.lock()?;
        let record = games
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let header = PgnHeader {
            event: "Agent Arena".to_string(),
            white: white.to_string(),
            black: black.to_string(),
            fen: Some(record.start_fen.clone()),
        };
        Ok(render_pgn(
            &header,
            &record.sans,
            record.start_side,
            record.start_fullmove,
            record.status.outcome(),
        ))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, GameRecord>>, StoreError> {
        self.games
            .lock()
            .map_err(|_| StoreError::Backend("game table lock poisoned".into()))
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn get_game(&self, id: &str) -> Result<GameView, StoreError> {
        let games = self.lock()?;
        games
            .get(id)
            .map(GameRecord::view)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn apply_move(&self, id: &str, mv: MoveSpec) -> Result<GameView, StoreError> {
        let mut games = self.lock()?;
        let record = games
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !record.status.is_active() {
            return Err(StoreError::GameNotActive(id.to_string()));
        }

        let side = Side::from(record.position.turn());
        if record.agent_for(side) != Some(mv.agent_id.as_str()) {
            return Err(StoreError::InvalidMove(format!(
                "agent {} is not playing {side}",
                mv.agent_id
            )));
        }

        let (desc, after) = describe_move(&record.position, &mv.mv)
            .map_err(|e| StoreError::InvalidMove(e.to_string()))?;

        debug!(game_id = %id, uci = %desc.uci, san = %desc.san, "Move applied");
        record.position = after;
        record.sans.push(desc.san.clone());
        record.last_move = Some(PlayedMove {
            uci: desc.uci,
            san: desc.san,
        });
        record.status = adjudicate(&record.position);
        if let Some(outcome) = record.status.outcome() {
            info!(game_id = %id, %outcome, "Game over");
        }

        Ok(record.view())
    }
}

#[derive(Default)]
pub struct InMemoryAgentStore {
    agents: RwLock<HashMap<String, AgentProfile>>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, agent: AgentProfile) -> Result<(), StoreError> {
        let mut agents = self
            .agents
            .write()
            .map_err(|_| StoreError::Backend("agent table lock poisoned".into()))?;
        agents.insert(agent.id.clone(), agent);
        Ok(())
    }
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn get_agent(&self, id: &str) -> Result<AgentProfile, StoreError> {
        let agents = self
            .agents
            .read()
            .map_err(|_| StoreError::Backend("agent table lock poisoned".into()))?;
        agents
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
