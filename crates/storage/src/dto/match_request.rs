use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{MatchRequest, MatchStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MatchRequestResponse {
    pub id: Uuid,
    pub from_team_id: Option<Uuid>,
    pub from_team_name: String,
    pub from_team_contact: Option<String>,
    pub from_team_region: Option<String>,
    pub to_team_id: Uuid,
    pub to_team_name: String,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

impl From<MatchRequest> for MatchRequestResponse {
    fn from(request: MatchRequest) -> Self {
        Self {
            id: request.id,
            from_team_id: request.from_team_id,
            from_team_name: request.from_team_name,
            from_team_contact: request.from_team_contact,
            from_team_region: request.from_team_region,
            to_team_id: request.to_team_id,
            to_team_name: request.to_team_name,
            status: request.status,
            created_at: request.created_at,
        }
    }
}

/// Who is asking for the match.
///
/// With `from_team_id` the requester's details are copied from that team;
/// otherwise the free-form fields are used as given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMatchRequest {
    pub from_team_id: Option<Uuid>,

    #[validate(length(max = 100))]
    pub from_team_name: Option<String>,

    #[validate(length(max = 20))]
    pub from_team_contact: Option<String>,

    #[validate(length(max = 150))]
    pub from_team_region: Option<String>,
}

/// How the target team was told about a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    /// The target team has no contact number on file.
    NoContact,
    /// Sending failed; the message stays queued for retry.
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateMatchRequestResponse {
    /// `None` when the request could not be stored.
    pub request: Option<MatchRequestResponse>,
    pub notification: NotificationOutcome,
    /// Contact to reach the target team directly when the text did not go out.
    pub manual_contact: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolveMatchRequestResponse {
    pub request: MatchRequestResponse,
    pub notifications_sent: usize,
    /// Notifications that failed now and will be retried in the background.
    pub notifications_queued: usize,
}
