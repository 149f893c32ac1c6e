//! Picks one move from the engine candidates for an agent.
//!
//! Three paths are tried in order: the agent's opening hint, a model pick,
//! and the engine's best line. Whatever path wins, the chosen move is always
//! one of the candidates.

use std::time::Duration;

use chess_core::notation::is_well_formed_uci;
use chess_core::{AgentProfile, AnalysisResult, Candidate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::collab::{CompletionOptions, TextCompletion};
use crate::prompt::{build_prompt, parse_pick, resolve_pick};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    pub model_timeout: Duration,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(8),
            max_output_tokens: 16,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPath {
    OpeningMatch,
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub chosen: Candidate,
    pub path: SelectionPath,
    pub analysis: AnalysisResult,
}

impl SelectionOutcome {
    pub fn fallback_used(&self) -> bool {
        self.path == SelectionPath::Fallback
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No candidates to choose from")]
    NoCandidates,
}

pub async fn select_move(
    analysis: AnalysisResult,
    agent: &AgentProfile,
    model: Option<&dyn TextCompletion>,
    config: &SelectorConfig,
) -> Result<SelectionOutcome, SelectionError> {
    if analysis.is_empty() {
        return Err(SelectionError::NoCandidates);
    }

    if let Some(chosen) = opening_match(&analysis, agent) {
        debug!(agent_id = %agent.id, mv = %chosen.mv, "Opening hint matched a candidate");
        return Ok(SelectionOutcome {
            chosen,
            path: SelectionPath::OpeningMatch,
            analysis,
        });
    }

    if let Some(model) = model {
        if let Some(chosen) = model_pick(&analysis, agent, model, config).await {
            return Ok(SelectionOutcome {
                chosen,
                path: SelectionPath::Model,
                analysis,
            });
        }
    }

    let chosen = analysis
        .best()
        .or_else(|| analysis.candidates.first())
        .cloned()
        .ok_or(SelectionError::NoCandidates)?;
    Ok(SelectionOutcome {
        chosen,
        path: SelectionPath::Fallback,
        analysis,
    })
}

fn opening_match(analysis: &AnalysisResult, agent: &AgentProfile) -> Option<Candidate> {
    let hint = agent.preferred_opening.as_deref()?.trim();
    if !is_well_formed_uci(hint) {
        return None;
    }
    analysis.find(hint).cloned()
}

async fn model_pick(
    analysis: &AnalysisResult,
    agent: &AgentProfile,
    model: &dyn TextCompletion,
    config: &SelectorConfig,
) -> Option<Candidate> {
    let prompt = build_prompt(analysis, agent);
    let options = CompletionOptions {
        max_output_tokens: config.max_output_tokens,
        temperature: config.temperature,
        timeout: config.model_timeout,
    };

    let reply = match timeout(config.model_timeout, model.complete(&prompt, &options)).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            warn!(agent_id = %agent.id, error = %e, "Model call failed, using engine move");
            return None;
        }
        Err(_) => {
            warn!(agent_id = %agent.id, timeout = ?config.model_timeout, "Model call timed out, using engine move");
            return None;
        }
    };

    let Some(pick) = parse_pick(&reply) else {
        warn!(agent_id = %agent.id, reply = %reply, "Model reply has no pick");
        return None;
    };

    match resolve_pick(&analysis.candidates, pick) {
        Some(candidate) if is_well_formed_uci(&candidate.mv) => Some(candidate.clone()),
        _ => {
            warn!(agent_id = %agent.id, pick, "Model pick out of range");
            None
        }
    }
}
