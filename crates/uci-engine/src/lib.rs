//! UCI engine plumbing: one long-lived engine subprocess, the line protocol
//! spoken over it, and a scheduler that serializes analysis requests.

pub mod config;
pub mod error;
pub mod info;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use config::EngineConfig;
pub use error::EngineError;
pub use scheduler::{AnalysisRequest, AnalysisScheduler, Analyzer};
pub use session::SearchLimit;
