//! UCI protocol session over one engine process.

use std::collections::BTreeMap;
use std::time::Duration;

use chess_core::notation::STARTPOS;
use chess_core::{Candidate, EngineStrength};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::info::{parse_bestmove, parse_info, InfoLine};
use crate::transport::EngineTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Depth(u32),
    MoveTime(Duration),
}

impl SearchLimit {
    pub fn go_command(&self) -> String {
        match self {
            SearchLimit::Depth(depth) => format!("go depth {depth}"),
            SearchLimit::MoveTime(time) => format!("go movetime {}", time.as_millis()),
        }
    }
}

/// Options written before each search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub lines: u32,
    pub strength: EngineStrength,
}

/// Collects the streamed `info` lines of one search, keyed by line index.
#[derive(Debug)]
pub struct LineAccumulator {
    requested: u32,
    lines: BTreeMap<u32, Candidate>,
}

impl LineAccumulator {
    pub fn new(requested: u32) -> Self {
        Self {
            requested,
            lines: BTreeMap::new(),
        }
    }

    /// Later lines for the same index replace earlier ones.
    pub fn record(&mut self, info: InfoLine) {
        if info.multipv == 0 || info.multipv > self.requested {
            return;
        }
        self.lines.insert(
            info.multipv,
            Candidate {
                mv: info.first_move,
                line_index: info.multipv,
                depth: info.depth,
                evaluation: info.score,
            },
        );
    }

    /// Candidates ordered by line index, cut at the first missing index.
    pub fn finish(self) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(self.lines.len());
        for (expected, (index, candidate)) in (1..).zip(self.lines) {
            if index != expected {
                break;
            }
            candidates.push(candidate);
        }
        candidates
    }
}

pub struct UciSession {
    transport: EngineTransport,
    config: EngineConfig,
    engine_name: Option<String>,
    healthy: bool,
}

impl UciSession {
    /// Spawn the engine and run the `uci` / `isready` handshake.
    pub async fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        let transport = EngineTransport::spawn(config)?;
        let mut session = Self {
            transport,
            config: config.clone(),
            engine_name: None,
            healthy: true,
        };

        match timeout(config.startup_timeout, session.handshake()).await {
            Ok(Ok(())) => {
                info!(
                    engine = session.engine_name.as_deref().unwrap_or("unknown"),
                    "Engine ready"
                );
                Ok(session)
            }
            Ok(Err(e)) => {
                session.shutdown().await;
                Err(e)
            }
            Err(_) => {
                warn!(timeout = ?config.startup_timeout, "Engine handshake timed out");
                session.shutdown().await;
                Err(EngineError::StartupTimeout(config.startup_timeout))
            }
        }
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci").await?;
        loop {
            let line = self.read().await?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.engine_name = Some(name.trim().to_string());
            } else if line == "uciok" {
                break;
            }
        }

        self.send(&format!("setoption name Threads value {}", self.config.threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", self.config.hash_mb))
            .await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// False once an I/O failure or a stuck search has been seen, or the
    /// process has exited. Also false while an exchange is in flight, so a
    /// caller that gave up mid-search leaves a session that gets replaced.
    pub fn is_healthy(&mut self) -> bool {
        self.healthy && self.transport.is_alive()
    }

    /// Write the per-search options, then wait for the engine to settle.
    pub async fn configure(&mut self, settings: &EngineSettings) -> Result<(), EngineError> {
        let strength = settings.strength;
        self.healthy = false;
        self.send("ucinewgame").await?;
        self.send(&format!("setoption name MultiPV value {}", settings.lines))
            .await?;
        self.send(&format!("setoption name Skill Level value {}", strength.skill_level))
            .await?;
        match strength.target_rating.filter(|_| strength.limit_strength) {
            Some(rating) => {
                self.send("setoption name UCI_LimitStrength value true").await?;
                self.send(&format!("setoption name UCI_Elo value {rating}")).await?;
            }
            None => {
                self.send("setoption name UCI_LimitStrength value false").await?;
            }
        }

        self.send("isready").await?;
        let ready_timeout = self.config.ready_timeout;
        match timeout(ready_timeout, self.wait_for("readyok")).await {
            Ok(result) => {
                self.healthy = result.is_ok();
                result
            }
            Err(_) => Err(EngineError::Unavailable(format!(
                "no readyok within {ready_timeout:?}"
            ))),
        }
    }

    /// Run one search and collect its lines.
    ///
    /// Returns at `bestmove` or at `deadline`, whichever comes first; a
    /// deadline yields whatever lines arrived so far.
    pub async fn analyze(
        &mut self,
        position: &str,
        limit: SearchLimit,
        lines: u32,
        deadline: Instant,
    ) -> Result<Vec<Candidate>, EngineError> {
        let position_cmd = if position.trim() == STARTPOS {
            "position startpos".to_string()
        } else {
            format!("position fen {}", position.trim())
        };
        self.healthy = false;
        self.send(&position_cmd).await?;
        self.send(&limit.go_command()).await?;

        let mut acc = LineAccumulator::new(lines);
        loop {
            match timeout_at(deadline, self.read()).await {
                Ok(Ok(line)) => {
                    if let Some(info) = parse_info(&line) {
                        acc.record(info);
                    } else if let Some(best) = parse_bestmove(&line) {
                        debug!(bestmove = ?best, "Search finished");
                        self.healthy = true;
                        return Ok(acc.finish());
                    }
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    warn!(position, "Analysis deadline reached, returning partial lines");
                    self.stop_search(&mut acc).await;
                    return Ok(acc.finish());
                }
            }
        }
    }

    /// Send `stop` and drain to `bestmove` so the next search starts clean.
    async fn stop_search(&mut self, acc: &mut LineAccumulator) {
        if self.send("stop").await.is_err() {
            return;
        }

        let grace = self.config.stop_grace;
        let drain = async {
            loop {
                let line = self.read().await?;
                if let Some(info) = parse_info(&line) {
                    acc.record(info);
                } else if parse_bestmove(&line).is_some() {
                    return Ok::<(), EngineError>(());
                }
            }
        };

        match timeout(grace, drain).await {
            Ok(Ok(())) => {
                debug!("Engine acknowledged stop");
                self.healthy = true;
            }
            Ok(Err(e)) => warn!(error = %e, "Engine failed while stopping"),
            Err(_) => {
                warn!("Engine ignored stop, marking session dead");
            }
        }
    }

    pub async fn shutdown(self) {
        self.transport.shutdown().await;
    }

    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        let result = self.transport.write_line(cmd).await;
        if result.is_err() {
            self.healthy = false;
        }
        result
    }

    async fn read(&mut self) -> Result<String, EngineError> {
        let result = self.transport.read_line().await;
        if result.is_err() {
            self.healthy = false;
        }
        result
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        loop {
            if self.read().await? == expected {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Evaluation;

    fn info(multipv: u32, depth: u32, cp: i32, mv: &str) -> InfoLine {
        InfoLine {
            multipv,
            depth,
            score: Some(Evaluation::Centipawns(cp)),
            first_move: mv.to_string(),
        }
    }

    #[test]
    fn test_go_command() {
        assert_eq!(SearchLimit::Depth(12).go_command(), "go depth 12");
        assert_eq!(
            SearchLimit::MoveTime(Duration::from_millis(1500)).go_command(),
            "go movetime 1500"
        );
    }

    #[test]
    fn test_last_write_wins_per_line() {
        let mut acc = LineAccumulator::new(3);
        acc.record(info(1, 8, 20, "e2e4"));
        acc.record(info(2, 8, 10, "d2d4"));
        acc.record(info(1, 9, 31, "g1f3"));

        let candidates = acc.finish();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].mv, "g1f3");
        assert_eq!(candidates[0].depth, 9);
        assert_eq!(candidates[0].evaluation, Some(Evaluation::Centipawns(31)));
        assert_eq!(candidates[1].mv, "d2d4");
    }

    #[test]
    fn test_lines_are_dense_from_one() {
        let mut acc = LineAccumulator::new(4);
        acc.record(info(3, 5, 0, "c2c4"));
        acc.record(info(1, 5, 0, "e2e4"));
        acc.record(info(4, 5, 0, "b1c3"));

        let candidates = acc.finish();
        let indices: Vec<u32> = candidates.iter().map(|c| c.line_index).collect();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn test_unrequested_lines_dropped() {
        let mut acc = LineAccumulator::new(1);
        acc.record(info(1, 5, 0, "e2e4"));
        acc.record(info(2, 5, 0, "d2d4"));
        acc.record(info(0, 5, 0, "a2a3"));

        let candidates = acc.finish();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].line_index, 1);
    }

    #[test]
    fn test_empty_search() {
        assert!(LineAccumulator::new(3).finish().is_empty());
    }
}
