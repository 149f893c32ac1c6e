//! Owns the engine subprocess and its stdin/stdout line streams.

use std::io::ErrorKind;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;

pub struct EngineTransport {
    process: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl EngineTransport {
    /// Spawn the engine binary with piped stdio.
    pub fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut process = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: config.path.clone(),
                source,
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdout not captured".into()))?;

        forward_stderr(process.stderr.take());
        debug!(path = %config.path, pid = ?process.id(), "Engine process spawned");

        Ok(Self {
            process,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Write one command line and flush it.
    pub async fn write_line(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "engine <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| io_unavailable("write to engine", e))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| io_unavailable("flush engine stdin", e))?;
        Ok(())
    }

    /// Next output line with trailing whitespace removed. Cancel safe.
    pub async fn read_line(&mut self) -> Result<String, EngineError> {
        match self.stdout.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim_end().to_string();
                debug!(line = %line, "engine >");
                Ok(line)
            }
            Ok(None) => Err(EngineError::Unavailable("engine closed its output".into())),
            Err(e) => Err(io_unavailable("read from engine", e)),
        }
    }

    pub fn is_alive(&mut self) -> bool {
        match self.process.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!(%status, "Engine process has exited");
                false
            }
            Err(e) => {
                warn!(error = %e, "Could not query engine process status");
                false
            }
        }
    }

    /// Best-effort `quit`, then kill and reap.
    pub async fn shutdown(mut self) {
        let _ = self.write_line("quit").await;
        let _ = self.process.start_kill();
        let _ = self.process.wait().await;
    }
}

fn io_unavailable(action: &str, e: std::io::Error) -> EngineError {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
            EngineError::Unavailable(format!("broken pipe during {action}"))
        }
        _ => EngineError::Unavailable(format!("failed to {action}: {e}")),
    }
}

fn forward_stderr(stderr: Option<ChildStderr>) {
    if let Some(stderr) = stderr {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(line = %line, "engine stderr");
            }
        });
    }
}
