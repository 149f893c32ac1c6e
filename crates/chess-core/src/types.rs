use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl From<shakmaty::Color> for Side {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => Side::White,
            shakmaty::Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine score for one line.
///
/// UCI engines report scores from the point of view of the side to move in
/// the analysed position. Use [`Evaluation::for_side`] to move a score into a
/// fixed perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Evaluation {
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated)
    Mate(i32),
}

impl Evaluation {
    pub fn negate(self) -> Self {
        match self {
            Evaluation::Centipawns(cp) => Evaluation::Centipawns(-cp),
            Evaluation::Mate(n) => Evaluation::Mate(-n),
        }
    }

    /// Re-express a score reported for `mover` from `reference`'s point of view.
    pub fn for_side(self, mover: Side, reference: Side) -> Self {
        if mover == reference {
            self
        } else {
            self.negate()
        }
    }

    pub fn to_white_perspective(self, mover: Side) -> Self {
        self.for_side(mover, Side::White)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Evaluation::Centipawns(cp) => write!(f, "{:+.2}", cp as f64 / 100.0),
            Evaluation::Mate(n) if n < 0 => write!(f, "-M{}", -n),
            Evaluation::Mate(n) => write!(f, "M{n}"),
        }
    }
}

/// One engine line: the first move of a principal variation plus its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Move in UCI notation
    #[serde(rename = "move")]
    pub mv: String,
    /// 1-based MultiPV index, 1 = engine's best line
    pub line_index: u32,
    pub depth: u32,
    /// Absent while a line is still converging
    pub evaluation: Option<Evaluation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub position: String,
    /// Ordered by `line_index`, dense from 1
    pub candidates: Vec<Candidate>,
}

impl AnalysisResult {
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.line_index == 1)
    }

    pub fn find(&self, mv: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.mv == mv)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Checkmate { winner: Side },
    Stalemate,
    Draw,
    Resignation { winner: Side },
}

impl Outcome {
    pub fn winner(&self) -> Option<Side> {
        match self {
            Outcome::Checkmate { winner } | Outcome::Resignation { winner } => Some(*winner),
            Outcome::Stalemate | Outcome::Draw => None,
        }
    }

    /// PGN result token
    pub fn result_token(&self) -> &'static str {
        match self.winner() {
            Some(Side::White) => "1-0",
            Some(Side::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner } => write!(f, "checkmate ({winner} wins)"),
            Outcome::Stalemate => f.write_str("stalemate"),
            Outcome::Draw => f.write_str("draw"),
            Outcome::Resignation { winner } => write!(f, "resignation ({winner} wins)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameStatus {
    Active,
    Finished { outcome: Outcome },
}

impl GameStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, GameStatus::Active)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            GameStatus::Active => None,
            GameStatus::Finished { outcome } => Some(*outcome),
        }
    }
}
