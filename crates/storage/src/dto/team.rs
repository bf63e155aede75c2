use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{MatchType, NO_ADDRESS, Region, SkillLevel, Team, TeamFields};

/// How far back a founding year may go.
const FOUNDING_YEAR_SPAN: i32 = 50;

/// Public view of a team
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub match_type: String,
    pub region: String,
    pub city: Option<String>,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub skill_level: Option<String>,
    pub pro_players: i32,
    pub has_field: bool,
    pub address: String,
    pub intro: String,
    pub contact: Option<String>,
    pub foundation_year: Option<i32>,
    pub photo_url: Option<String>,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            skill_level: team.skill_label().map(String::from),
            photo_url: team.display_photo().map(String::from),
            id: team.id,
            name: team.name,
            match_type: team.match_type,
            region: team.region,
            city: team.city,
            district: team.district,
            neighborhood: team.dong,
            pro_players: team.pro_players,
            has_field: team.has_field,
            address: team.address,
            intro: team.intro,
            contact: team.contact,
            foundation_year: team.foundation_year,
            owner_id: team.user_id,
            created_at: team.created_at,
        }
    }
}

/// Registration and edit form. Edits replace every field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_team_rules"))]
pub struct TeamRequest {
    #[validate(length(min = 1, max = 100, message = "Team name is required"))]
    pub name: String,

    #[serde(default)]
    pub match_type: MatchType,

    #[validate(length(max = 50))]
    pub city: Option<String>,

    #[validate(length(max = 50))]
    pub district: Option<String>,

    #[validate(length(max = 50))]
    pub neighborhood: Option<String>,

    #[validate(length(max = 255))]
    pub address: Option<String>,

    #[validate(range(min = 0, max = 100, message = "Professional player count must be 0 or more"))]
    #[serde(default)]
    pub pro_players: i32,

    #[serde(default)]
    pub skill_level: SkillLevel,

    #[serde(default)]
    pub has_field: bool,

    #[validate(length(max = 2000))]
    #[serde(default)]
    pub intro: String,

    #[validate(custom(function = "validate_phone"))]
    pub contact: String,

    pub foundation_year: i32,
}

impl TeamRequest {
    pub fn into_fields(self) -> TeamFields {
        let address = self
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| NO_ADDRESS.to_string());

        TeamFields {
            region: Region::new(
                self.city.as_deref(),
                self.district.as_deref(),
                self.neighborhood.as_deref(),
            ),
            name: self.name.trim().to_string(),
            match_type: self.match_type,
            skill_level: self.skill_level,
            pro_players: self.pro_players,
            has_field: self.has_field,
            address,
            intro: self.intro,
            contact: self.contact.trim().to_string(),
            foundation_year: self.foundation_year,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SkillLevelQuery {
    #[serde(default)]
    pub pro_players: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SkillLevelOptions {
    pub pro_players: i32,
    pub levels: Vec<SkillLevel>,
    pub default: SkillLevel,
}

impl SkillLevelOptions {
    pub fn for_pro_players(pro_players: i32) -> Self {
        let levels = SkillLevel::available_for(pro_players).to_vec();
        let default = if levels.contains(&SkillLevel::default()) {
            SkillLevel::default()
        } else {
            SkillLevel::Lower
        };

        Self {
            pro_players,
            levels,
            default,
        }
    }
}

fn validate_phone(contact: &str) -> Result<(), ValidationError> {
    let digits = contact.chars().filter(char::is_ascii_digit).count();
    let well_formed = contact
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-');

    if well_formed && (9..=12).contains(&digits) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone")
            .with_message("Contact must be a phone number such as 010-1234-5678".into()))
    }
}

fn validate_team_rules(req: &TeamRequest) -> Result<(), ValidationError> {
    if req.pro_players > 0 && !req.skill_level.allows_pro_players() {
        return Err(ValidationError::new("skill_level_too_low").with_message(
            "Teams with professional players must pick one of the top four skill levels".into(),
        ));
    }

    let current_year = Utc::now().year();
    if !(current_year - FOUNDING_YEAR_SPAN..=current_year).contains(&req.foundation_year) {
        return Err(ValidationError::new("foundation_year_out_of_range")
            .with_message("Founding year must be within the last 50 years".into()));
    }

    Ok(())
}
