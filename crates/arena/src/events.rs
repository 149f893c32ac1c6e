//! Records published to match observers.

use chess_core::{Evaluation, Outcome, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::match_loop::Phase;
use crate::selector::SelectionPath;

/// One applied move, as observers see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEvent {
    /// 1-based half-move index within this match run
    pub sequence: u32,
    /// FEN after the move
    pub position: String,
    /// Movetext after the move
    pub notation: String,
    pub move_uci: String,
    pub move_san: String,
    pub side_to_move: Side,
    pub phase: Phase,
    /// From White's point of view
    pub evaluation: Option<Evaluation>,
    pub agent_id: String,
    pub agent_name: String,
    pub path: SelectionPath,
    pub fallback_used: bool,
    pub emitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    Move(MoveEvent),
    Finished { outcome: Outcome },
    Failed { message: String },
}
