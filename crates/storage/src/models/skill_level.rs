use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Self-reported team strength, strongest first.
///
/// The serialized names are the labels stored in the `teams` table, so rows
/// written by older clients deserialize without a migration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum SkillLevel {
    #[serde(rename = "최상")]
    Best,
    #[serde(rename = "상")]
    Upper,
    #[default]
    #[serde(rename = "중")]
    Middle,
    #[serde(rename = "하")]
    Lower,
    #[serde(rename = "하하")]
    Lower2,
    #[serde(rename = "하하하")]
    Lower3,
    #[serde(rename = "하하하하")]
    Lower4,
    #[serde(rename = "하하하하하")]
    Lower5,
}

/// Number of tiers still selectable once a team declares professional players.
const PRO_ELIGIBLE_TIERS: usize = 4;

impl SkillLevel {
    pub const ALL: [SkillLevel; 8] = [
        SkillLevel::Best,
        SkillLevel::Upper,
        SkillLevel::Middle,
        SkillLevel::Lower,
        SkillLevel::Lower2,
        SkillLevel::Lower3,
        SkillLevel::Lower4,
        SkillLevel::Lower5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Best => "최상",
            Self::Upper => "상",
            Self::Middle => "중",
            Self::Lower => "하",
            Self::Lower2 => "하하",
            Self::Lower3 => "하하하",
            Self::Lower4 => "하하하하",
            Self::Lower5 => "하하하하하",
        }
    }

    /// Tiers a registration form may offer for the given professional player count.
    pub fn available_for(pro_players: i32) -> &'static [SkillLevel] {
        if pro_players > 0 {
            &Self::ALL[..PRO_ELIGIBLE_TIERS]
        } else {
            &Self::ALL
        }
    }

    pub fn allows_pro_players(&self) -> bool {
        Self::ALL[..PRO_ELIGIBLE_TIERS].contains(self)
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
