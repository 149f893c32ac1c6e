//! Prompt construction for model-picked moves and parsing of the reply.

use std::sync::LazyLock;

use chess_core::notation::{describe_move, parse_position};
use chess_core::{AgentProfile, AnalysisResult, Candidate, Playstyle};
use regex::Regex;
use serde_json::Value;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("valid object regex"));

static PICK_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""pick"\s*:\s*(\d+)"#).expect("valid pick regex"));

pub fn playstyle_instruction(style: Playstyle) -> &'static str {
    match style {
        Playstyle::Aggressive => {
            "You play aggressively: prefer attacks on the king, open lines and initiative, even at some risk."
        }
        Playstyle::Defensive => {
            "You play defensively: prefer safe moves that keep the king covered and avoid weaknesses."
        }
        Playstyle::Positional => {
            "You play positionally: prefer quiet moves that improve pieces, pawn structure and space."
        }
        Playstyle::Tactical => {
            "You play tactically: prefer forcing moves such as checks, captures and threats."
        }
        Playstyle::Balanced => {
            "You play a balanced game: weigh safety and activity evenly and trust sound evaluations."
        }
    }
}

/// One numbered line per candidate, e.g. `2. Nxe5 (f3e5) capture eval +0.35`.
///
/// SAN and move flags are only shown when the position parses.
pub fn candidate_lines(analysis: &AnalysisResult) -> Vec<String> {
    let pos = parse_position(&analysis.position).ok();

    analysis
        .candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let mut line = format!("{}. ", i + 1);
            match pos.as_ref().and_then(|p| describe_move(p, &candidate.mv).ok()) {
                Some((desc, _)) => {
                    line.push_str(&format!("{} ({})", desc.san, candidate.mv));
                    if desc.is_capture {
                        line.push_str(" capture");
                    }
                    if desc.gives_check {
                        line.push_str(" check");
                    }
                }
                None => line.push_str(&candidate.mv),
            }
            if let Some(eval) = candidate.evaluation {
                line.push_str(&format!(" eval {eval}"));
            }
            line
        })
        .collect()
}

pub fn build_prompt(analysis: &AnalysisResult, agent: &AgentProfile) -> String {
    let mut prompt = format!(
        "You are {}, a chess player. {}\n\n",
        agent.display_name,
        playstyle_instruction(agent.playstyle)
    );
    prompt.push_str(&format!("Position (FEN): {}\n", analysis.position));
    prompt.push_str("Candidate moves from the engine, best first (evaluations from the side to move):\n");
    for line in candidate_lines(analysis) {
        prompt.push_str(&line);
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "\nChoose exactly one candidate. Reply with JSON only: {{\"pick\": <number from 1 to {}>}}",
        analysis.candidates.len()
    ));
    prompt
}

/// Extract the 1-based pick from a model reply.
pub fn parse_pick(reply: &str) -> Option<usize> {
    for object in JSON_OBJECT.find_iter(reply) {
        if let Ok(value) = serde_json::from_str::<Value>(object.as_str()) {
            if let Some(pick) = value.get("pick").and_then(pick_number) {
                return Some(pick);
            }
        }
    }

    PICK_FIELD
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn pick_number(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Map a 1-based pick onto the candidate list.
pub fn resolve_pick(candidates: &[Candidate], pick: usize) -> Option<&Candidate> {
    pick.checked_sub(1).and_then(|i| candidates.get(i))
}
