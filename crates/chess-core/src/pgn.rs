//! PGN rendering for games played in the arena.

use crate::notation::STANDARD_START_FEN;
use crate::types::{Outcome, Side};

/// Header fields written for every arena game.
#[derive(Debug, Clone, Default)]
pub struct PgnHeader {
    pub event: String,
    pub white: String,
    pub black: String,
    /// Starting FEN, omitted from the output for the standard start
    pub fen: Option<String>,
}

/// Numbered movetext, e.g. "1. e4 e5 2. Nf3".
/// A game starting with Black to move opens with "N...".
pub fn movetext(sans: &[String], first_side: Side, first_fullmove: u32) -> String {
    let mut out = String::new();
    let mut fullmove = first_fullmove.max(1);
    let mut side = first_side;

    for (i, san) in sans.iter().enumerate() {
        match side {
            Side::White => {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&format!("{fullmove}. {san}"));
            }
            Side::Black => {
                if i == 0 {
                    out.push_str(&format!("{fullmove}... {san}"));
                } else {
                    out.push_str(&format!(" {san}"));
                }
                fullmove += 1;
            }
        }
        side = side.opposite();
    }

    out
}

/// Full PGN document: header tags, movetext, and the result token.
pub fn render_pgn(
    header: &PgnHeader,
    sans: &[String],
    first_side: Side,
    first_fullmove: u32,
    outcome: Option<Outcome>,
) -> String {
    let result = outcome.map(|o| o.result_token()).unwrap_or("*");
    let mut out = String::new();

    out.push_str(&format!("[Event \"{}\"]\n", header.event));
    out.push_str(&format!("[White \"{}\"]\n", header.white));
    out.push_str(&format!("[Black \"{}\"]\n", header.black));
    out.push_str(&format!("[Result \"{result}\"]\n"));
    if let Some(fen) = header.fen.as_deref().filter(|f| *f != STANDARD_START_FEN) {
        out.push_str("[SetUp \"1\"]\n");
        out.push_str(&format!("[FEN \"{fen}\"]\n"));
    }
    out.push('\n');

    let text = movetext(sans, first_side, first_fullmove);
    if text.is_empty() {
        out.push_str(result);
    } else {
        out.push_str(&format!("{text} {result}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sans(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_movetext_from_start() {
        let text = movetext(&sans(&["e4", "e5", "Nf3"]), Side::White, 1);
        assert_eq!(text, "1. e4 e5 2. Nf3");
    }

    #[test]
    fn test_movetext_black_first() {
        let text = movetext(&sans(&["Nf6", "c4", "e6"]), Side::Black, 12);
        assert_eq!(text, "12... Nf6 13. c4 e6");
    }

    #[test]
    fn test_render_pgn_with_result() {
        let header = PgnHeader {
            event: "Arena".into(),
            white: "Magpie".into(),
            black: "Heron".into(),
            fen: Some(STANDARD_START_FEN.into()),
        };
        let pgn = render_pgn(
            &header,
            &sans(&["f3", "e5", "g4", "Qh4#"]),
            Side::White,
            1,
            Some(Outcome::Checkmate { winner: Side::Black }),
        );
        assert!(pgn.contains("[White \"Magpie\"]"));
        assert!(pgn.contains("[Result \"0-1\"]"));
        assert!(!pgn.contains("[FEN"));
        assert!(pgn.ends_with("1. f3 e5 2. g4 Qh4# 0-1"));
    }

    #[test]
    fn test_render_pgn_custom_start() {
        let header = PgnHeader {
            fen: Some("8/8/8/8/8/8/8/K6k w - - 0 1".into()),
            ..Default::default()
        };
        let pgn = render_pgn(&header, &[], Side::White, 1, None);
        assert!(pgn.contains("[SetUp \"1\"]"));
        assert!(pgn.ends_with("\n*"));
    }
}
