#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use uci_engine::EngineConfig;

/// Path of the scripted engine built alongside these tests.
pub const MOCK_ENGINE: &str = env!("CARGO_BIN_EXE_mock-engine");

/// White to move, Ra8 mates.
pub const WHITE_MATES_IN_ONE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";

/// Black to move, Ra1 mates.
pub const BLACK_MATES_IN_ONE: &str = "r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1";

/// Generate a unique suffix based on timestamp + process id to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", std::process::id(), ts % 1_000_000_000)
}

/// A fresh, not yet existing file path under the system temp dir.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("arena-{name}-{}", unique_suffix()))
}

/// Engine config for the mock engine with short timeouts.
pub fn mock_config(args: &[&str]) -> EngineConfig {
    EngineConfig {
        args: args.iter().map(|a| a.to_string()).collect(),
        startup_timeout: Duration::from_secs(5),
        ready_timeout: Duration::from_secs(2),
        depth_timeout_ceiling: Duration::from_secs(5),
        timeout_buffer: Duration::from_millis(500),
        stop_grace: Duration::from_millis(500),
        ..EngineConfig::new(MOCK_ENGINE)
    }
}

/// Commands the mock engine logged, one per line.
pub fn logged_commands(path: &PathBuf) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}
