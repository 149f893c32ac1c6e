//! Parsing of `info` and `bestmove` lines.

use chess_core::Evaluation;

/// The fields of one `info` line that matter for move selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoLine {
    pub multipv: u32,
    pub depth: u32,
    pub score: Option<Evaluation>,
    /// First move of the principal variation
    pub first_move: String,
}

/// Parse an `info` line carrying a principal variation.
///
/// Lines without a `pv` (search progress, `currmove`, `string`) yield `None`.
/// `multipv` defaults to 1 for single-line engines.
pub fn parse_info(line: &str) -> Option<InfoLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "info" {
        return None;
    }

    let mut multipv = 1;
    let mut depth = 0;
    let mut score = None;

    while let Some(token) = tokens.next() {
        match token {
            // Free text runs to end of line
            "string" => return None,
            "multipv" => multipv = tokens.next()?.parse().ok()?,
            "depth" => depth = tokens.next()?.parse().ok()?,
            "score" => {
                // `lowerbound` / `upperbound` qualifiers follow the value and are skipped
                score = match tokens.next()? {
                    "cp" => Some(Evaluation::Centipawns(tokens.next()?.parse().ok()?)),
                    "mate" => Some(Evaluation::Mate(tokens.next()?.parse().ok()?)),
                    _ => score,
                };
            }
            "pv" => {
                let first_move = tokens.next()?.to_string();
                return Some(InfoLine {
                    multipv,
                    depth,
                    score,
                    first_move,
                });
            }
            _ => {}
        }
    }

    None
}

/// Parse a `bestmove` line. `Some(None)` means the engine had no move.
pub fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "bestmove" {
        return None;
    }
    match tokens.next() {
        Some("(none)") | Some("0000") | None => Some(None),
        Some(mv) => Some(Some(mv.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4 e7e5";
        let info = parse_info(line).unwrap();
        assert_eq!(info.multipv, 1);
        assert_eq!(info.depth, 20);
        assert_eq!(info.score, Some(Evaluation::Centipawns(35)));
        assert_eq!(info.first_move, "e2e4");
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 multipv 3 score mate -3 nodes 100000 pv g8f6";
        let info = parse_info(line).unwrap();
        assert_eq!(info.multipv, 3);
        assert_eq!(info.score, Some(Evaluation::Mate(-3)));
    }

    #[test]
    fn test_bound_qualifier_ignored() {
        let line = "info depth 14 multipv 2 score cp -12 upperbound nodes 5000 pv d2d4";
        let info = parse_info(line).unwrap();
        assert_eq!(info.score, Some(Evaluation::Centipawns(-12)));
        assert_eq!(info.first_move, "d2d4");
    }

    #[test]
    fn test_multipv_defaults_to_one() {
        let info = parse_info("info depth 5 score cp 10 pv g1f3").unwrap();
        assert_eq!(info.multipv, 1);
    }

    #[test]
    fn test_line_without_score() {
        let info = parse_info("info depth 1 multipv 1 pv e2e4").unwrap();
        assert_eq!(info.score, None);
    }

    #[test]
    fn test_lines_without_pv_ignored() {
        assert!(parse_info("info depth 12 currmove e2e4 currmovenumber 1").is_none());
        assert!(parse_info("info string NNUE evaluation using nn.nnue pv").is_none());
        assert!(parse_info("bestmove e2e4").is_none());
        assert!(parse_info("info depth 3 pv").is_none());
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(parse_bestmove("bestmove e2e4 ponder e7e5"), Some(Some("e2e4".into())));
        assert_eq!(parse_bestmove("bestmove (none)"), Some(None));
        assert_eq!(parse_bestmove("info depth 1 pv e2e4"), None);
    }
}
