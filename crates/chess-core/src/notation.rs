//! Move notation helpers on top of shakmaty.

use shakmaty::{
    fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, EnPassantMode, Move, Position,
};

/// Literal accepted in place of a FEN for the standard starting position.
pub const STARTPOS: &str = "startpos";

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, thiserror::Error)]
pub enum NotationError {
    #[error("Invalid position '{fen}': {reason}")]
    Position { fen: String, reason: String },

    #[error("Malformed move '{0}'")]
    Malformed(String),

    #[error("Illegal move '{0}'")]
    Illegal(String),
}

/// A legal move together with everything a reader of the game wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDescription {
    pub uci: String,
    /// SAN including the `+` / `#` suffix
    pub san: String,
    pub is_capture: bool,
    pub gives_check: bool,
    pub is_checkmate: bool,
}

pub fn parse_position(position: &str) -> Result<Chess, NotationError> {
    let position = position.trim();
    if position == STARTPOS {
        return Ok(Chess::default());
    }
    let fen = position
        .parse::<Fen>()
        .map_err(|e| NotationError::Position {
            fen: position.to_string(),
            reason: e.to_string(),
        })?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| NotationError::Position {
            fen: position.to_string(),
            reason: e.to_string(),
        })
}

pub fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Syntactic check only: a from/to square pair with optional promotion.
pub fn is_well_formed_uci(mv: &str) -> bool {
    matches!(mv.parse::<UciMove>(), Ok(UciMove::Normal { .. }))
}

/// Resolve a UCI move against a position, rejecting illegal moves.
pub fn legal_move(pos: &Chess, uci: &str) -> Result<Move, NotationError> {
    let parsed: UciMove = uci
        .parse()
        .map_err(|_| NotationError::Malformed(uci.to_string()))?;
    if !matches!(parsed, UciMove::Normal { .. }) {
        return Err(NotationError::Malformed(uci.to_string()));
    }
    parsed
        .to_move(pos)
        .map_err(|_| NotationError::Illegal(uci.to_string()))
}

/// Describe a move and return the position after it.
pub fn describe_move(pos: &Chess, uci: &str) -> Result<(MoveDescription, Chess), NotationError> {
    let mv = legal_move(pos, uci)?;
    let san = San::from_move(pos, mv.clone()).to_string();
    let is_capture = mv.is_capture();

    let mut after = pos.clone();
    after.play_unchecked(mv);

    let is_checkmate = after.is_checkmate();
    let gives_check = after.is_check();
    let suffix = if is_checkmate {
        "#"
    } else if gives_check {
        "+"
    } else {
        ""
    };

    let description = MoveDescription {
        uci: uci.to_string(),
        san: format!("{san}{suffix}"),
        is_capture,
        gives_check,
        is_checkmate,
    };
    Ok((description, after))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_literal() {
        let pos = parse_position(STARTPOS).unwrap();
        assert_eq!(to_fen(&pos), STANDARD_START_FEN);
    }

    #[test]
    fn test_fen_after_double_push() {
        let (desc, after) = describe_move(&Chess::default(), "e2e4").unwrap();
        assert_eq!(desc.san, "e4");
        // No black pawn can capture, so no en passant square is written
        assert_eq!(
            to_fen(&after),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_invalid_fen_rejected() {
        assert!(parse_position("not a fen").is_err());
    }

    #[test]
    fn test_well_formed_uci() {
        assert!(is_well_formed_uci("e2e4"));
        assert!(is_well_formed_uci("e7e8q"));
        assert!(!is_well_formed_uci("0000"));
        assert!(!is_well_formed_uci("Nf3"));
        assert!(!is_well_formed_uci(""));
    }

    #[test]
    fn test_describe_capture_with_check() {
        let pos = parse_position("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2")
            .unwrap();
        let (desc, _) = describe_move(&pos, "e4d5").unwrap();
        assert_eq!(desc.san, "exd5");
        assert!(desc.is_capture);
        assert!(!desc.gives_check);

        let (desc, _) = describe_move(&pos, "f1b5").unwrap();
        assert_eq!(desc.san, "Bb5+");
        assert!(desc.gives_check);
        assert!(!desc.is_capture);
    }

    #[test]
    fn test_describe_checkmate() {
        // Fool's mate: 1. f3 e5 2. g4 Qh4#
        let pos = parse_position("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2")
            .unwrap();
        let (desc, after) = describe_move(&pos, "d8h4").unwrap();
        assert_eq!(desc.san, "Qh4#");
        assert!(desc.is_checkmate);
        assert!(after.is_checkmate());
    }

    #[test]
    fn test_illegal_move() {
        let pos = Chess::default();
        assert!(matches!(legal_move(&pos, "e2e5"), Err(NotationError::Illegal(_))));
        assert!(matches!(legal_move(&pos, "zz"), Err(NotationError::Malformed(_))));
    }

    #[test]
    fn test_castling_king_step_notation() {
        let pos = parse_position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let (desc, _) = describe_move(&pos, "e1g1").unwrap();
        assert_eq!(desc.san, "O-O");
    }
}
