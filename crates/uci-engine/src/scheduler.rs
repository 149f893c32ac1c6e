//! Serializes analysis requests onto the single engine session.

use std::time::Duration;

use async_trait::async_trait;
use chess_core::{map_strength, AnalysisResult, StrengthSpec};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::session::{EngineSettings, SearchLimit, UciSession};

/// Most MultiPV lines a request may ask for.
pub const MAX_LINES: u32 = 10;

/// Search time used when a request names neither a depth nor a time budget.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub lines: u32,
    pub time_budget: Option<Duration>,
    /// Fixed search depth, wins over `time_budget`
    pub depth: Option<u32>,
    pub strength: StrengthSpec,
}

impl AnalysisRequest {
    pub fn clamped_lines(&self) -> u32 {
        self.lines.clamp(1, MAX_LINES)
    }

    pub fn search_limit(&self) -> SearchLimit {
        match self.depth {
            Some(depth) => SearchLimit::Depth(depth.max(1)),
            None => SearchLimit::MoveTime(self.time_budget.unwrap_or(DEFAULT_TIME_BUDGET)),
        }
    }

    /// Wall-clock bound for the search, measured from `go`.
    pub fn timeout(&self, config: &EngineConfig) -> Duration {
        let base = match self.search_limit() {
            SearchLimit::Depth(_) => config.depth_timeout_ceiling,
            SearchLimit::MoveTime(time) => time,
        };
        base + config.timeout_buffer
    }
}

/// Anything that can produce engine candidates for a position.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        position: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, EngineError>;
}

/// Owner of the one engine process.
///
/// Requests queue on a FIFO-fair `tokio::sync::Mutex`, so at most one search
/// is in flight and waiters are served in arrival order. A session that
/// failed is dropped and the next request starts a fresh process.
pub struct AnalysisScheduler {
    config: EngineConfig,
    session: Mutex<Option<UciSession>>,
}

impl AnalysisScheduler {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start the engine ahead of the first request. Concurrent callers share
    /// one attempt.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut slot = self.session.lock().await;
        ensure_started(&mut slot, &self.config).await?;
        Ok(())
    }

    pub async fn get_candidates(
        &self,
        position: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, EngineError> {
        let lines = request.clamped_lines();
        let settings = EngineSettings {
            lines,
            strength: map_strength(request.strength),
        };
        let limit = request.search_limit();
        let timeout = request.timeout(&self.config);

        let mut slot = self.session.lock().await;
        let session = ensure_started(&mut slot, &self.config).await?;

        let result = match session.configure(&settings).await {
            Ok(()) => {
                let deadline = Instant::now() + timeout;
                session.analyze(position, limit, lines, deadline).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(candidates) => {
                if !session.is_healthy() {
                    // Partial result from a search that would not stop
                    discard(&mut slot).await;
                }
                Ok(AnalysisResult {
                    position: position.to_string(),
                    candidates,
                })
            }
            Err(e) => {
                warn!(error = %e, "Analysis failed, engine will restart on next request");
                discard(&mut slot).await;
                Err(e)
            }
        }
    }

    pub async fn shutdown(&self) {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.take() {
            info!("Shutting down engine");
            session.shutdown().await;
        }
    }
}

#[async_trait]
impl Analyzer for AnalysisScheduler {
    async fn analyze(
        &self,
        position: &str,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, EngineError> {
        self.get_candidates(position, request).await
    }
}

async fn ensure_started<'a>(
    slot: &'a mut Option<UciSession>,
    config: &EngineConfig,
) -> Result<&'a mut UciSession, EngineError> {
    if slot.as_mut().is_some_and(|s| !s.is_healthy()) {
        warn!("Engine session is dead, restarting");
        discard(slot).await;
    }

    if slot.is_none() {
        info!(path = %config.path, "Starting engine");
        *slot = Some(UciSession::start(config).await?);
    }
    slot.as_mut()
        .ok_or_else(|| EngineError::Unavailable("engine session missing".into()))
}

async fn discard(slot: &mut Option<UciSession>) {
    if let Some(session) = slot.take() {
        session.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig {
            depth_timeout_ceiling: Duration::from_secs(30),
            timeout_buffer: Duration::from_secs(2),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_depth_wins_over_time_budget() {
        let request = AnalysisRequest {
            lines: 3,
            time_budget: Some(Duration::from_millis(300)),
            depth: Some(12),
            strength: StrengthSpec::Full,
        };
        assert_eq!(request.search_limit(), SearchLimit::Depth(12));
        assert_eq!(request.search_limit().go_command(), "go depth 12");
        assert_eq!(request.timeout(&config()), Duration::from_secs(32));
    }

    #[test]
    fn test_time_budget_timeout() {
        let request = AnalysisRequest {
            lines: 1,
            time_budget: Some(Duration::from_millis(750)),
            ..Default::default()
        };
        assert_eq!(
            request.search_limit(),
            SearchLimit::MoveTime(Duration::from_millis(750))
        );
        assert_eq!(request.timeout(&config()), Duration::from_millis(2750));
    }

    #[test]
    fn test_default_time_budget() {
        let request = AnalysisRequest::default();
        assert_eq!(request.search_limit(), SearchLimit::MoveTime(DEFAULT_TIME_BUDGET));
    }

    #[test]
    fn test_line_count_clamped() {
        let mut request = AnalysisRequest::default();
        assert_eq!(request.clamped_lines(), 1);
        request.lines = 50;
        assert_eq!(request.clamped_lines(), MAX_LINES);
        request.lines = 4;
        assert_eq!(request.clamped_lines(), 4);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_to_spawn() {
        let scheduler = AnalysisScheduler::new(EngineConfig::new("/nonexistent/engine-binary"));
        let err = scheduler
            .get_candidates("startpos", &AnalysisRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
        assert!(!err.is_transient());
    }
}
