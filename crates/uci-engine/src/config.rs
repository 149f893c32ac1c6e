//! Engine configuration from environment variables

use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub path: String,

    /// Extra command-line arguments for the engine
    pub args: Vec<String>,

    /// Bound on the `uci`/`isready` handshake
    pub startup_timeout: Duration,

    /// Bound on each `isready` round-trip after configuration
    pub ready_timeout: Duration,

    /// Request timeout used for fixed-depth searches
    pub depth_timeout_ceiling: Duration,

    /// Added on top of every request timeout
    pub timeout_buffer: Duration,

    /// How long to wait for `bestmove` after sending `stop`
    pub stop_grace: Duration,

    pub threads: u32,
    pub hash_mb: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "/usr/local/bin/stockfish".to_string(),
            args: Vec::new(),
            startup_timeout: Duration::from_secs(10),
            ready_timeout: Duration::from_secs(5),
            depth_timeout_ceiling: Duration::from_secs(30),
            timeout_buffer: Duration::from_secs(2),
            stop_grace: Duration::from_millis(500),
            threads: 1,
            hash_mb: 64,
        }
    }
}

impl EngineConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            path: env::var("STOCKFISH_PATH").unwrap_or(defaults.path),
            args: env::var("ENGINE_ARGS")
                .map(|v| v.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            startup_timeout: env_millis("ENGINE_STARTUP_TIMEOUT_MS")
                .unwrap_or(defaults.startup_timeout),
            ready_timeout: env_millis("ENGINE_READY_TIMEOUT_MS").unwrap_or(defaults.ready_timeout),
            depth_timeout_ceiling: env_millis("ENGINE_DEPTH_CEILING_MS")
                .unwrap_or(defaults.depth_timeout_ceiling),
            timeout_buffer: env_millis("ENGINE_TIMEOUT_BUFFER_MS")
                .unwrap_or(defaults.timeout_buffer),
            stop_grace: env_millis("ENGINE_STOP_GRACE_MS").unwrap_or(defaults.stop_grace),
            threads: env::var("ENGINE_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.threads),
            hash_mb: env::var("ENGINE_HASH_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.hash_mb),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}
