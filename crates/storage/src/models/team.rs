use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{MatchType, Region, SkillLevel};

/// Address stored when a team registers without one.
pub const NO_ADDRESS: &str = "-";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub match_type: String,
    /// Denormalized "city district neighborhood" label.
    pub region: String,
    pub city: Option<String>,
    pub district: Option<String>,
    pub dong: Option<String>,
    pub skill_level: Option<String>,
    /// Column used by early registrations before `skill_level` existed.
    pub skill: Option<String>,
    pub pro_players: i32,
    pub has_field: bool,
    pub address: String,
    pub intro: String,
    pub contact: Option<String>,
    pub foundation_year: Option<i32>,
    pub photo_url: Option<String>,
    pub profile_image: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Structured region, if the row was written with city/district/neighborhood columns.
    pub fn structured_region(&self) -> Option<Region> {
        let region = Region::new(
            self.city.as_deref(),
            self.district.as_deref(),
            self.dong.as_deref(),
        );
        (!region.is_empty()).then_some(region)
    }

    pub fn skill_label(&self) -> Option<&str> {
        self.skill_level.as_deref().or(self.skill.as_deref())
    }

    pub fn has_skill(&self, label: &str) -> bool {
        self.skill_level.as_deref() == Some(label) || self.skill.as_deref() == Some(label)
    }

    pub fn contact_number(&self) -> Option<&str> {
        self.contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Photo to show for the team; object URLs left over from browser previews are ignored.
    pub fn display_photo(&self) -> Option<&str> {
        [self.photo_url.as_deref(), self.profile_image.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.is_empty() && !url.starts_with("blob:"))
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Mutable attributes of a team, written whole on registration and on every edit.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamFields {
    pub name: String,
    pub match_type: MatchType,
    pub region: Region,
    pub skill_level: SkillLevel,
    pub pro_players: i32,
    pub has_field: bool,
    pub address: String,
    pub intro: String,
    pub contact: String,
    pub foundation_year: i32,
}
