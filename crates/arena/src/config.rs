//! Match runner configuration from environment variables

use std::env;
use std::time::Duration;

use chess_core::{AgentProfile, Playstyle};
use uci_engine::EngineConfig;

use crate::error::ConfigError;
use crate::match_loop::MatchOptions;
use crate::selector::SelectorConfig;

#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// API base URL, e.g. `https://api.openai.com/v1`
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct ArenaConfig {
    pub engine: EngineConfig,

    /// Per-move search time, used when no depth is set
    pub move_time: Duration,

    /// Fixed search depth
    pub depth: Option<u32>,

    /// MultiPV lines offered to the agents
    pub lines: u32,

    pub llm: Option<LlmConfig>,

    /// Webhook for settling finished matches
    pub settlement_url: Option<String>,

    pub settlement_token: Option<String>,

    /// Delay between moves
    pub pacing: Option<Duration>,

    pub white: AgentProfile,
    pub black: AgentProfile,

    /// FEN to start from, standard start when unset
    pub start_fen: Option<String>,
}

impl ArenaConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.engine = EngineConfig::from_env();
        Ok(config)
    }

    /// Build from any key lookup. Engine settings keep their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let parse_u64 = |key: &str| get(key).and_then(|v| v.trim().parse::<u64>().ok());

        let llm = match get("LLM_API_URL").filter(|v| !v.trim().is_empty()) {
            Some(api_url) => Some(LlmConfig {
                api_url,
                api_key: get("LLM_API_KEY").filter(|v| !v.is_empty()),
                model: get("LLM_MODEL").ok_or(ConfigError::Invalid(
                    "LLM_MODEL must be set when LLM_API_URL is",
                ))?,
                timeout: parse_u64("LLM_TIMEOUT_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(SelectorConfig::default().model_timeout),
            }),
            None => None,
        };

        let lines = match parse_u64("ANALYSIS_LINES") {
            Some(0) => return Err(ConfigError::Invalid("ANALYSIS_LINES must be at least 1")),
            Some(n) => u32::try_from(n).map_err(|_| ConfigError::Invalid("ANALYSIS_LINES too large"))?,
            None => 3,
        };

        let white = agent_from(&get, "WHITE_AGENT", "white", "White")?;
        let black = agent_from(&get, "BLACK_AGENT", "black", "Black")?;
        if white.id == black.id {
            return Err(ConfigError::Invalid("WHITE_AGENT_ID and BLACK_AGENT_ID must differ"));
        }

        Ok(Self {
            engine: EngineConfig::default(),
            move_time: parse_u64("MOVE_TIME_MS")
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(1000)),
            depth: parse_u64("SEARCH_DEPTH").and_then(|d| u32::try_from(d).ok()),
            lines,
            llm,
            settlement_url: get("SETTLEMENT_WEBHOOK_URL").filter(|v| !v.is_empty()),
            settlement_token: get("SETTLEMENT_TOKEN").filter(|v| !v.is_empty()),
            pacing: parse_u64("MOVE_PACING_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            white,
            black,
            start_fen: get("START_FEN").filter(|v| !v.trim().is_empty()),
        })
    }

    pub fn match_options(&self) -> MatchOptions {
        let mut selector = SelectorConfig::default();
        if let Some(llm) = &self.llm {
            selector.model_timeout = llm.timeout;
        }
        MatchOptions {
            lines: self.lines,
            time_budget: Some(self.move_time),
            depth: self.depth,
            pacing: self.pacing,
            selector,
            ..MatchOptions::default()
        }
    }
}

/// Agent from `<PREFIX>_ID`, `_NAME`, `_RATING`, `_SKILL`, `_STYLE`, `_OPENING`.
fn agent_from(
    get: &impl Fn(&str) -> Option<String>,
    prefix: &str,
    default_id: &str,
    default_name: &str,
) -> Result<AgentProfile, ConfigError> {
    let var = |suffix: &str| get(&format!("{prefix}_{suffix}")).filter(|v| !v.trim().is_empty());
    let number = |suffix: &str| -> Result<Option<i32>, ConfigError> {
        match var(suffix) {
            Some(v) => v
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::Invalid("agent rating and skill must be integers")),
            None => Ok(None),
        }
    };

    Ok(AgentProfile {
        id: var("ID").unwrap_or_else(|| default_id.to_string()),
        display_name: var("NAME").unwrap_or_else(|| default_name.to_string()),
        rating: number("RATING")?,
        skill_level: number("SKILL")?,
        playstyle: var("STYLE")
            .map(|s| Playstyle::from_tag(&s))
            .unwrap_or_default(),
        preferred_opening: var("OPENING"),
    })
}
