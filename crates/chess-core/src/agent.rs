use serde::{Deserialize, Serialize};

use crate::strength::StrengthSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Playstyle {
    Aggressive,
    Defensive,
    Positional,
    Tactical,
    #[default]
    Balanced,
}

impl Playstyle {
    /// Lenient tag lookup; unknown tags play balanced.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "aggressive" | "attacking" => Playstyle::Aggressive,
            "defensive" | "solid" => Playstyle::Defensive,
            "positional" => Playstyle::Positional,
            "tactical" => Playstyle::Tactical,
            _ => Playstyle::Balanced,
        }
    }
}

/// Agent as stored by the external agent store. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub display_name: String,
    /// Target playing strength as a rating
    pub rating: Option<i32>,
    /// Raw engine skill level, wins over `rating` when both are set
    pub skill_level: Option<i32>,
    pub playstyle: Playstyle,
    /// Opening hint, e.g. "e2e4". Free text that does not parse as a move is ignored.
    pub preferred_opening: Option<String>,
}

impl AgentProfile {
    pub fn strength(&self) -> StrengthSpec {
        StrengthSpec::from_parts(self.skill_level, self.rating)
    }
}
