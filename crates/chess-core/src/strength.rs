//! Rating / skill level → engine strength options.

/// Highest `Skill Level` accepted by Stockfish-style engines.
pub const MAX_SKILL_LEVEL: i32 = 20;

/// Ratings the arena accepts for agents.
pub const MIN_DOMAIN_RATING: i32 = 100;
pub const MAX_DOMAIN_RATING: i32 = 3000;

/// `UCI_Elo` range the engine supports.
pub const ENGINE_MIN_ELO: i32 = 1320;
pub const ENGINE_MAX_ELO: i32 = 3190;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrengthSpec {
    Skill(i32),
    Rating(i32),
    #[default]
    Full,
}

impl StrengthSpec {
    /// Skill wins over rating when both are supplied.
    pub fn from_parts(skill: Option<i32>, rating: Option<i32>) -> Self {
        match (skill, rating) {
            (Some(skill), _) => StrengthSpec::Skill(skill),
            (None, Some(rating)) => StrengthSpec::Rating(rating),
            (None, None) => StrengthSpec::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStrength {
    pub skill_level: i32,
    pub limit_strength: bool,
    pub target_rating: Option<i32>,
}

pub fn map_strength(spec: StrengthSpec) -> EngineStrength {
    match spec {
        StrengthSpec::Skill(skill) => EngineStrength {
            skill_level: skill.clamp(0, MAX_SKILL_LEVEL),
            limit_strength: false,
            target_rating: None,
        },
        StrengthSpec::Rating(rating) => {
            let rating = rating
                .clamp(MIN_DOMAIN_RATING, MAX_DOMAIN_RATING)
                .clamp(ENGINE_MIN_ELO, ENGINE_MAX_ELO);
            EngineStrength {
                skill_level: MAX_SKILL_LEVEL,
                limit_strength: true,
                target_rating: Some(rating),
            }
        }
        StrengthSpec::Full => EngineStrength {
            skill_level: MAX_SKILL_LEVEL,
            limit_strength: false,
            target_rating: None,
        },
    }
}
