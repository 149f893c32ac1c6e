//! Agent-vs-agent match orchestration: move selection over engine candidates,
//! the per-match turn loop, and event fan-out to observers.

pub mod broadcast;
pub mod collab;
pub mod config;
pub mod error;
pub mod events;
pub mod llm;
pub mod match_loop;
pub mod memory;
pub mod prompt;
pub mod selector;
pub mod settlement;

pub use broadcast::{MatchHub, MatchPublisher, MatchSubscription};
pub use error::{MatchError, StoreError};
pub use events::{MatchEvent, MoveEvent};
pub use match_loop::{MatchLoop, MatchOptions, MatchState, Phase};
pub use selector::{select_move, SelectionOutcome, SelectionPath, SelectorConfig};
