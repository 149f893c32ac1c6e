//! Turn loop for one game: analyse, select, apply, publish, repeat.

use std::sync::Arc;
use std::time::Duration;

use chess_core::{AgentProfile, AnalysisResult, Outcome, Side};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uci_engine::{AnalysisRequest, Analyzer};

use crate::broadcast::{MatchHub, MatchPublisher};
use crate::collab::{
    AgentStore, GameStore, GameView, MoveSpec, SettlementConnector, TextCompletion,
};
use crate::error::{MatchError, StoreError};
use crate::events::{MatchEvent, MoveEvent};
use crate::selector::{select_move, SelectionError, SelectionOutcome, SelectorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Active,
    Terminal { outcome: Outcome },
}

/// The loop's own view of the match, mutated only by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchState {
    pub phase: Phase,
    pub side_to_move: Side,
    pub half_moves: u32,
    synced: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            phase: Phase::Active,
            side_to_move: Side::White,
            half_moves: 0,
            synced: false,
        }
    }
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the side to move from the first read, then hold the store to it.
    fn check_turn(&mut self, store_side: Side) -> Result<(), MatchError> {
        if !self.synced {
            self.side_to_move = store_side;
            self.synced = true;
            return Ok(());
        }
        if store_side != self.side_to_move {
            return Err(MatchError::WrongTurn {
                expected: self.side_to_move,
                actual: store_side,
            });
        }
        Ok(())
    }

    fn record_move(&mut self, view: &GameView) {
        self.half_moves += 1;
        self.side_to_move = self.side_to_move.opposite();
        if let Some(outcome) = view.status.outcome() {
            self.phase = Phase::Terminal { outcome };
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Terminal { outcome };
    }
}

#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// MultiPV lines to request per move
    pub lines: u32,
    pub time_budget: Option<Duration>,
    pub depth: Option<u32>,
    /// Tries per move before a transient engine failure ends the match
    pub analysis_attempts: u32,
    /// Delay between moves
    pub pacing: Option<Duration>,
    pub selector: SelectorConfig,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            lines: 3,
            time_budget: None,
            depth: None,
            analysis_attempts: 3,
            pacing: None,
            selector: SelectorConfig::default(),
        }
    }
}

pub struct MatchLoop {
    games: Arc<dyn GameStore>,
    agents: Arc<dyn AgentStore>,
    analyzer: Arc<dyn Analyzer>,
    model: Option<Arc<dyn TextCompletion>>,
    settlement: Option<Arc<dyn SettlementConnector>>,
    hub: MatchHub,
    options: MatchOptions,
}

impl MatchLoop {
    pub fn new(
        games: Arc<dyn GameStore>,
        agents: Arc<dyn AgentStore>,
        analyzer: Arc<dyn Analyzer>,
        hub: MatchHub,
    ) -> Self {
        Self {
            games,
            agents,
            analyzer,
            model: None,
            settlement: None,
            hub,
            options: MatchOptions::default(),
        }
    }

    pub fn with_model(mut self, model: Arc<dyn TextCompletion>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_settlement(mut self, settlement: Arc<dyn SettlementConnector>) -> Self {
        self.settlement = Some(settlement);
        self
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn hub(&self) -> &MatchHub {
        &self.hub
    }

    /// Play a game until it ends or a fatal error occurs.
    ///
    /// Either way the last record on the match channel says which, and the
    /// channel is closed when this returns.
    pub async fn run(&self, game_id: &str) -> Result<Outcome, MatchError> {
        let publisher = self.hub.open(game_id);
        let mut state = MatchState::new();

        let result = self.drive(game_id, &mut state, &publisher).await;
        match &result {
            Ok(outcome) => {
                info!(game_id, %outcome, moves = state.half_moves, "Match finished");
                publisher.publish(MatchEvent::Finished { outcome: *outcome });
            }
            Err(e) => {
                error!(game_id, error = %e, moves = state.half_moves, "Match aborted");
                publisher.publish(MatchEvent::Failed {
                    message: e.to_string(),
                });
            }
        }

        self.hub.close(game_id);
        result
    }

    /// Run on a background task. The match channel is open before this
    /// returns, so callers can subscribe without missing events.
    pub fn spawn(self: &Arc<Self>, game_id: String) -> JoinHandle<Result<Outcome, MatchError>> {
        let publisher = self.hub.open(&game_id);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let result = this.run(&game_id).await;
            drop(publisher);
            result
        })
    }

    async fn drive(
        &self,
        game_id: &str,
        state: &mut MatchState,
        publisher: &MatchPublisher,
    ) -> Result<Outcome, MatchError> {
        loop {
            let view = self.games.get_game(game_id).await?;
            if let Some(outcome) = view.status.outcome() {
                info!(game_id, %outcome, "Game no longer active");
                state.finish(outcome);
                return Ok(outcome);
            }

            state.check_turn(view.side_to_move)?;
            let side = view.side_to_move;
            let agent_id = view
                .agent_for(side)
                .ok_or(MatchError::AgentNotAssigned(side))?
                .to_string();
            let agent = self.agents.get_agent(&agent_id).await?;

            let analysis = self.analyze(&view.position, &agent).await?;
            if analysis.is_empty() {
                return Err(MatchError::NoCandidates {
                    position: view.position,
                });
            }

            let selection = select_move(
                analysis,
                &agent,
                self.model.as_deref(),
                &self.options.selector,
            )
            .await
            .map_err(|e| match e {
                SelectionError::NoCandidates => MatchError::NoCandidates {
                    position: view.position.clone(),
                },
            })?;

            let mv = selection.chosen.mv.clone();
            let applied = self
                .games
                .apply_move(
                    game_id,
                    MoveSpec {
                        mv: mv.clone(),
                        agent_id: agent_id.clone(),
                    },
                )
                .await;
            let updated = match applied {
                Ok(view) => view,
                Err(StoreError::InvalidMove(reason)) => {
                    return Err(MatchError::MoveRejected { mv, reason });
                }
                Err(StoreError::GameNotActive(id)) => {
                    // Ended while this turn was being computed, e.g. a resignation
                    let view = self.games.get_game(game_id).await?;
                    let Some(outcome) = view.status.outcome() else {
                        return Err(MatchError::Store(StoreError::GameNotActive(id)));
                    };
                    info!(game_id, %outcome, "Game ended mid-turn, move discarded");
                    state.finish(outcome);
                    return Ok(outcome);
                }
                Err(other) => return Err(MatchError::Store(other)),
            };

            state.record_move(&updated);
            let event = move_event(state, &updated, side, &agent, &selection);
            info!(
                game_id,
                sequence = event.sequence,
                agent = %agent.display_name,
                mv = %event.move_san,
                path = ?selection.path,
                "Move played"
            );
            publisher.publish(MatchEvent::Move(event));

            if let Phase::Terminal { outcome } = state.phase {
                self.settle(game_id, &updated, outcome).await;
                return Ok(outcome);
            }

            if let Some(pacing) = self.options.pacing {
                tokio::time::sleep(pacing).await;
            }
        }
    }

    /// Analyse with retries on transient engine failures. The scheduler
    /// restarts a dead engine on the next call.
    async fn analyze(
        &self,
        position: &str,
        agent: &AgentProfile,
    ) -> Result<AnalysisResult, MatchError> {
        let request = AnalysisRequest {
            lines: self.options.lines,
            time_budget: self.options.time_budget,
            depth: self.options.depth,
            strength: agent.strength(),
        };
        let attempts = self.options.analysis_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.analyzer.analyze(position, &request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < attempts => {
                    warn!(attempt, error = %e, "Analysis failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(MatchError::Engine(e)),
            }
        }
    }

    async fn settle(&self, game_id: &str, view: &GameView, outcome: Outcome) {
        let (Some(connector), Some(token)) = (&self.settlement, view.settlement_token.as_deref())
        else {
            return;
        };
        match connector.settle(token, outcome).await {
            Ok(tx) => info!(game_id, tx = %tx.0, "Match settled"),
            Err(e) => warn!(game_id, error = %e, "Settlement failed"),
        }
    }
}

fn move_event(
    state: &MatchState,
    view: &GameView,
    mover: Side,
    agent: &AgentProfile,
    selection: &SelectionOutcome,
) -> MoveEvent {
    let (move_uci, move_san) = match &view.last_move {
        Some(played) => (played.uci.clone(), played.san.clone()),
        None => (selection.chosen.mv.clone(), selection.chosen.mv.clone()),
    };

    MoveEvent {
        sequence: state.half_moves,
        position: view.position.clone(),
        notation: view.notation.clone(),
        move_uci,
        move_san,
        side_to_move: view.side_to_move,
        phase: state.phase,
        evaluation: selection
            .chosen
            .evaluation
            .map(|eval| eval.to_white_perspective(mover)),
        agent_id: agent.id.clone(),
        agent_name: agent.display_name.clone(),
        path: selection.path,
        fallback_used: selection.fallback_used(),
        emitted_at: Utc::now(),
    }
}
