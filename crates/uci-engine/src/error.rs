//! Engine error types

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn engine '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine did not finish the UCI handshake within {0:?}")]
    StartupTimeout(Duration),

    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Errors that a fresh engine process on the next call can recover from.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::StartupTimeout(_) | EngineError::Unavailable(_))
    }
}
