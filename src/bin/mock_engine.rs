//! Scripted UCI engine for integration tests.
//!
//! Plays legal moves only: mating moves first, then the rest in UCI order.
//! Flags change its behaviour:
//!
//! - `--log <path>`: append every command received to `path`
//! - `--crash-marker <path>`: on `go`, if `path` exists, delete it and exit
//! - `--stall`: stream `info` lines but hold `bestmove` until `stop`
//! - `--hang-startup`: never answer `uci`
//! - `--delay-ms <n>`: sleep before `bestmove`

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chess_core::notation::{legal_move, parse_position};
use shakmaty::{CastlingMode, Chess, Position};

#[derive(Default)]
struct Flags {
    log: Option<PathBuf>,
    crash_marker: Option<PathBuf>,
    stall: bool,
    hang_startup: bool,
    delay: Option<Duration>,
}

impl Flags {
    fn parse() -> Self {
        let mut flags = Flags::default();
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--log" => flags.log = args.next().map(PathBuf::from),
                "--crash-marker" => flags.crash_marker = args.next().map(PathBuf::from),
                "--stall" => flags.stall = true,
                "--hang-startup" => flags.hang_startup = true,
                "--delay-ms" => {
                    flags.delay = args
                        .next()
                        .and_then(|v| v.parse().ok())
                        .map(Duration::from_millis)
                }
                _ => {}
            }
        }
        flags
    }
}

struct Engine {
    flags: Flags,
    position: Chess,
    multipv: usize,
    pending_best: Option<String>,
}

impl Engine {
    fn handle(&mut self, cmd: &str, out: &mut impl Write) -> io::Result<bool> {
        self.log(cmd)?;
        let mut tokens = cmd.split_whitespace();
        match tokens.next() {
            Some("uci") if !self.flags.hang_startup => {
                writeln!(out, "id name MockEngine 1.0")?;
                writeln!(out, "id author arena")?;
                writeln!(out, "option name MultiPV type spin default 1 min 1 max 500")?;
                writeln!(out, "uciok")?;
            }
            Some("isready") => writeln!(out, "readyok")?,
            Some("setoption") => {
                let rest: Vec<&str> = tokens.collect();
                if let ["name", "MultiPV", "value", n] = rest.as_slice() {
                    self.multipv = n.parse::<usize>().unwrap_or(1).max(1);
                }
            }
            Some("ucinewgame") => self.position = Chess::default(),
            Some("position") => {
                let rest: Vec<&str> = tokens.collect();
                if let Some(pos) = parse_position_command(&rest) {
                    self.position = pos;
                }
            }
            Some("go") => {
                if let Some(marker) = &self.flags.crash_marker {
                    if marker.exists() {
                        let _ = fs::remove_file(marker);
                        std::process::exit(3);
                    }
                }
                let rest: Vec<&str> = tokens.collect();
                let depth = match rest.as_slice() {
                    ["depth", d, ..] => d.parse::<u32>().unwrap_or(1),
                    _ => 1,
                };
                self.search(depth, out)?;
            }
            Some("stop") => {
                if let Some(best) = self.pending_best.take() {
                    writeln!(out, "bestmove {best}")?;
                }
            }
            Some("quit") => return Ok(false),
            _ => {}
        }
        out.flush()?;
        Ok(true)
    }

    fn search(&mut self, depth: u32, out: &mut impl Write) -> io::Result<()> {
        let moves = ranked_moves(&self.position);
        writeln!(out, "info string mock search over {} moves", moves.len())?;
        if let Some((first, _)) = moves.first() {
            writeln!(out, "info depth 1 currmove {first} currmovenumber 1")?;
        }

        let lines = moves.len().min(self.multipv);
        for d in 1..=depth.max(1) {
            for (i, (mv, mates)) in moves.iter().take(lines).enumerate() {
                let score = if *mates {
                    "mate 1".to_string()
                } else {
                    format!("cp {}", 40 - 15 * i as i32)
                };
                writeln!(
                    out,
                    "info depth {d} seldepth {d} multipv {} score {score} nodes {} pv {mv}",
                    i + 1,
                    d * 1000
                )?;
            }
        }

        let best = moves
            .first()
            .map(|(mv, _)| mv.clone())
            .unwrap_or_else(|| "(none)".to_string());
        if self.flags.stall {
            self.pending_best = Some(best);
            return Ok(());
        }
        if let Some(delay) = self.flags.delay {
            out.flush()?;
            thread::sleep(delay);
        }
        writeln!(out, "bestmove {best}")
    }

    fn log(&self, cmd: &str) -> io::Result<()> {
        if let Some(path) = &self.flags.log {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{cmd}")?;
        }
        Ok(())
    }
}

/// `startpos [moves ...]` or `fen <fields> [moves ...]`
fn parse_position_command(rest: &[&str]) -> Option<Chess> {
    let moves_at = rest.iter().position(|t| *t == "moves");
    let (setup, moves) = match moves_at {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, &[][..]),
    };

    let mut pos = match setup {
        ["startpos"] => Chess::default(),
        ["fen", fields @ ..] => parse_position(&fields.join(" ")).ok()?,
        _ => return None,
    };
    for uci in moves {
        let mv = legal_move(&pos, uci).ok()?;
        pos.play_unchecked(mv);
    }
    Some(pos)
}

/// Legal moves in UCI notation, mating moves first.
fn ranked_moves(pos: &Chess) -> Vec<(String, bool)> {
    let mut moves: Vec<(String, bool)> = pos
        .legal_moves()
        .iter()
        .map(|mv| {
            let mut after = pos.clone();
            after.play_unchecked(mv.clone());
            (
                mv.to_uci(CastlingMode::Standard).to_string(),
                after.is_checkmate(),
            )
        })
        .collect();
    moves.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    moves
}

fn main() -> io::Result<()> {
    let mut engine = Engine {
        flags: Flags::parse(),
        position: Chess::default(),
        multipv: 1,
        pending_best: None,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }
        if !engine.handle(cmd, &mut out)? {
            break;
        }
    }
    Ok(())
}
