//! Analysis scheduler against a real engine subprocess.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chess_core::{Evaluation, StrengthSpec};
use common::*;
use uci_engine::{AnalysisRequest, AnalysisScheduler, EngineError};

fn request(lines: u32) -> AnalysisRequest {
    AnalysisRequest {
        lines,
        time_budget: Some(Duration::from_millis(50)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_candidates_ordered_from_line_one() {
    let scheduler = AnalysisScheduler::new(mock_config(&[]));
    let result = scheduler
        .get_candidates("startpos", &request(3))
        .await
        .unwrap();

    assert_eq!(result.position, "startpos");
    let indices: Vec<u32> = result.candidates.iter().map(|c| c.line_index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert!(result.candidates.iter().all(|c| c.evaluation.is_some()));
    assert_eq!(result.best().unwrap().evaluation, Some(Evaluation::Centipawns(40)));
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_fixed_depth_search() {
    let log = temp_path("depth-log");
    let scheduler = AnalysisScheduler::new(mock_config(&["--log", log.to_str().unwrap()]));
    let request = AnalysisRequest {
        lines: 2,
        time_budget: Some(Duration::from_millis(50)),
        depth: Some(12),
        strength: StrengthSpec::Full,
    };

    let result = scheduler.get_candidates("startpos", &request).await.unwrap();
    assert!(result.candidates.iter().all(|c| c.depth == 12));

    let commands = logged_commands(&log);
    assert!(commands.iter().any(|c| c == "go depth 12"));
    assert!(!commands.iter().any(|c| c.starts_with("go movetime")));
    scheduler.shutdown().await;
    let _ = std::fs::remove_file(log);
}

#[tokio::test]
async fn test_strength_options_written_before_search() {
    let log = temp_path("strength-log");
    let scheduler = AnalysisScheduler::new(mock_config(&["--log", log.to_str().unwrap()]));
    let request = AnalysisRequest {
        strength: StrengthSpec::Rating(1500),
        ..request(2)
    };
    scheduler.get_candidates("startpos", &request).await.unwrap();
    scheduler.shutdown().await;

    let commands = logged_commands(&log);
    let start = commands.iter().position(|c| c == "ucinewgame").unwrap();
    assert_eq!(
        &commands[start..start + 6],
        &[
            "ucinewgame",
            "setoption name MultiPV value 2",
            "setoption name Skill Level value 20",
            "setoption name UCI_LimitStrength value true",
            "setoption name UCI_Elo value 1500",
            "isready",
        ]
    );
    let _ = std::fs::remove_file(log);
}

#[tokio::test]
async fn test_fen_position_and_mate_score() {
    let scheduler = AnalysisScheduler::new(mock_config(&[]));
    let result = scheduler
        .get_candidates(WHITE_MATES_IN_ONE, &request(2))
        .await
        .unwrap();

    let best = result.best().unwrap();
    assert_eq!(best.mv, "a1a8");
    assert_eq!(best.evaluation, Some(Evaluation::Mate(1)));
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_stalled_search_returns_partial_lines() {
    let scheduler = AnalysisScheduler::new(mock_config(&["--stall"]));

    let result = scheduler.get_candidates("startpos", &request(2)).await.unwrap();
    assert_eq!(result.candidates.len(), 2);

    // The engine answered `stop`, so the same process serves the next search
    let again = scheduler.get_candidates("startpos", &request(1)).await.unwrap();
    assert_eq!(again.candidates.len(), 1);
    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_abandoned_search_replaces_engine() {
    let log = temp_path("abandon-log");
    let scheduler = AnalysisScheduler::new(mock_config(&["--stall", "--log", log.to_str().unwrap()]));
    let slow = AnalysisRequest {
        time_budget: Some(Duration::from_secs(30)),
        ..request(2)
    };

    // Caller gives up while the engine is still searching
    let abandoned =
        tokio::time::timeout(Duration::from_millis(300), scheduler.get_candidates("startpos", &slow)).await;
    assert!(abandoned.is_err());

    let result = scheduler
        .get_candidates(WHITE_MATES_IN_ONE, &request(1))
        .await
        .unwrap();
    assert_eq!(result.best().unwrap().mv, "a1a8");
    scheduler.shutdown().await;

    let handshakes = logged_commands(&log).iter().filter(|c| *c == "uci").count();
    assert_eq!(handshakes, 2);
    let _ = std::fs::remove_file(log);
}

#[tokio::test]
async fn test_crashed_engine_restarts_on_next_request() {
    let marker = temp_path("crash-marker");
    let log = temp_path("crash-log");
    let scheduler = AnalysisScheduler::new(mock_config(&[
        "--crash-marker",
        marker.to_str().unwrap(),
        "--log",
        log.to_str().unwrap(),
    ]));

    assert!(scheduler.get_candidates("startpos", &request(1)).await.is_ok());

    std::fs::write(&marker, b"crash").unwrap();
    let err = scheduler
        .get_candidates("startpos", &request(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(err.is_transient());

    let result = scheduler.get_candidates("startpos", &request(1)).await.unwrap();
    assert!(!result.is_empty());

    let handshakes = logged_commands(&log).iter().filter(|c| *c == "uci").count();
    assert_eq!(handshakes, 2);
    scheduler.shutdown().await;
    let _ = std::fs::remove_file(log);
}

#[tokio::test]
async fn test_startup_timeout_is_transient() {
    let config = uci_engine::EngineConfig {
        startup_timeout: Duration::from_millis(200),
        ..mock_config(&["--hang-startup"])
    };
    let scheduler = AnalysisScheduler::new(config);

    let err = scheduler.start().await.unwrap_err();
    assert!(matches!(err, EngineError::StartupTimeout(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_concurrent_requests_are_serialized() {
    let log = temp_path("concurrent-log");
    let scheduler = Arc::new(AnalysisScheduler::new(mock_config(&[
        "--delay-ms",
        "30",
        "--log",
        log.to_str().unwrap(),
    ])));
    scheduler.start().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let scheduler = Arc::clone(&scheduler);
        handles.push(tokio::spawn(async move {
            scheduler.get_candidates("startpos", &request(2)).await
        }));
    }
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.candidates.len(), 2);
    }
    scheduler.shutdown().await;

    let commands = logged_commands(&log);
    assert_eq!(commands.iter().filter(|c| *c == "uci").count(), 1);
    let searches: Vec<usize> = commands
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with("go "))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(searches.len(), 4);
    // Each search is preceded by its own position command
    for i in searches {
        assert_eq!(commands[i - 1], "position startpos");
    }
    let _ = std::fs::remove_file(log);
}
