use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a match request. `Accepted` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Answer of the target team's owner. There is no decision that leads back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyResolved(pub MatchStatus);

impl fmt::Display for AlreadyResolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match request already {}", self.0)
    }
}

impl std::error::Error for AlreadyResolved {}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn transition(self, decision: Decision) -> Result<MatchStatus, AlreadyResolved> {
        match self {
            Self::Pending => Ok(decision.outcome()),
            resolved => Err(AlreadyResolved(resolved)),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MatchStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("unknown match request status: {value}")),
        }
    }
}

impl Decision {
    pub fn outcome(self) -> MatchStatus {
        match self {
            Self::Accept => MatchStatus::Accepted,
            Self::Reject => MatchStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MatchRequest {
    pub id: Uuid,
    pub from_team_id: Option<Uuid>,
    pub from_team_name: String,
    pub from_team_contact: Option<String>,
    pub from_team_region: Option<String>,
    pub to_team_id: Uuid,
    pub to_team_name: String,
    #[sqlx(try_from = "String")]
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of both teams taken when a request is filed. New requests are always pending.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatchRequest {
    /// Chosen by the caller so notifications can be keyed on it before the insert.
    pub id: Uuid,
    pub from_team_id: Option<Uuid>,
    pub from_team_name: String,
    pub from_team_contact: Option<String>,
    pub from_team_region: Option<String>,
    pub to_team_id: Uuid,
    pub to_team_name: String,
}
