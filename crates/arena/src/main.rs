//! Match Runner
//!
//! Plays one agent-vs-agent game against a local UCI engine and prints every
//! match event as a JSON line on stdout.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use arena::collab::GameStore;
use arena::config::ArenaConfig;
use arena::llm::OpenAiCompletion;
use arena::memory::{InMemoryAgentStore, InMemoryGameStore, NewGame};
use arena::settlement::WebhookSettlement;
use arena::{MatchEvent, MatchHub, MatchLoop};
use uci_engine::AnalysisScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout carries events
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let config = ArenaConfig::from_env()?;
    info!(
        engine = %config.engine.path,
        white = %config.white.display_name,
        black = %config.black.display_name,
        model = config.llm.as_ref().map(|l| l.model.as_str()).unwrap_or("none"),
        "Arena config loaded"
    );

    let scheduler = Arc::new(AnalysisScheduler::new(config.engine.clone()));
    scheduler.start().await.context("Failed to start engine")?;

    let agents = Arc::new(InMemoryAgentStore::new());
    agents.insert(config.white.clone())?;
    agents.insert(config.black.clone())?;

    let games = Arc::new(InMemoryGameStore::new());
    let game_id = games.create_game(NewGame {
        white_agent: Some(config.white.id.clone()),
        black_agent: Some(config.black.id.clone()),
        start_position: config.start_fen.clone(),
        settlement_token: config.settlement_token.clone(),
    })?;

    let hub = MatchHub::default();
    let mut match_loop = MatchLoop::new(games.clone(), agents, scheduler.clone(), hub.clone())
        .with_options(config.match_options());
    if let Some(llm) = &config.llm {
        let client = OpenAiCompletion::new(&llm.api_url, llm.api_key.clone(), llm.model.clone())?;
        match_loop = match_loop.with_model(Arc::new(client));
    }
    if let Some(url) = &config.settlement_url {
        match_loop = match_loop.with_settlement(Arc::new(WebhookSettlement::new(url.clone())?));
    }
    let match_loop = Arc::new(match_loop);

    let handle = match_loop.spawn(game_id.clone());
    let mut events = hub
        .subscribe(&game_id)
        .context("Match channel closed before subscribing")?;

    // Ctrl-C resigns for the side to move; the loop finishes on the resignation
    let resign_games = games.clone();
    let resign_id = game_id.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            match resign_games.get_game(&resign_id).await {
                Ok(view) => {
                    info!(side = %view.side_to_move, "Interrupted, resigning");
                    if let Err(e) = resign_games.resign(&resign_id, view.side_to_move) {
                        warn!(error = %e, "Resignation failed");
                    }
                }
                Err(e) => warn!(error = %e, "Could not read game to resign"),
            }
        }
    });

    while let Some(event) = events.next().await {
        println!("{}", serde_json::to_string(&event)?);
        if let MatchEvent::Failed { message } = &event {
            warn!(message = %message, "Match failed");
        }
    }

    let result = handle.await.context("Match task panicked")?;
    scheduler.shutdown().await;
    let outcome = result?;

    let pgn = games.pgn(&game_id, &config.white.display_name, &config.black.display_name)?;
    info!(%outcome, "Game over");
    eprintln!("{pgn}");
    Ok(())
}
