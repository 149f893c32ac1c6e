//! Shared chess domain for the arena: engine-facing types, strength mapping,
//! and notation helpers built on shakmaty.

pub mod agent;
pub mod notation;
pub mod pgn;
pub mod strength;
pub mod types;

pub use agent::{AgentProfile, Playstyle};
pub use strength::{map_strength, EngineStrength, StrengthSpec};
pub use types::{AnalysisResult, Candidate, Evaluation, GameStatus, Outcome, Side};
