use async_trait::async_trait;
use chrono::TimeDelta;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Decision, FailureDisposition, MatchRequest, NewMatchRequest, NewNotification, OutboxEntry,
    Team, TeamFields,
};

#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Every team, newest first.
    async fn list(&self) -> Result<Vec<Team>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Team>;

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Team>>;

    async fn create(&self, fields: &TeamFields, owner: Option<Uuid>) -> Result<Team>;

    /// Overwrites every mutable attribute and recomputes the region label.
    async fn update(&self, id: Uuid, fields: &TeamFields) -> Result<Team>;

    async fn set_photo_url(&self, id: Uuid, url: &str) -> Result<Team>;

    /// Removes the team only; match requests that reference it are kept.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait MatchRequestStore: Send + Sync {
    /// Inserts a pending request together with its notification, atomically.
    async fn create(
        &self,
        request: &NewMatchRequest,
        notification: Option<&NewNotification>,
    ) -> Result<(MatchRequest, Option<OutboxEntry>)>;

    async fn find_by_id(&self, id: Uuid) -> Result<MatchRequest>;

    /// Pending requests addressed to any of `team_ids`, newest first.
    async fn list_pending_for_teams(&self, team_ids: &[Uuid]) -> Result<Vec<MatchRequest>>;

    /// Moves a pending request to its final status and enqueues `notifications`
    /// in the same transaction. Fails with `Conflict` if it is no longer pending.
    async fn resolve(
        &self,
        id: Uuid,
        decision: Decision,
        notifications: &[NewNotification],
    ) -> Result<(MatchRequest, Vec<OutboxEntry>)>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Leases one pending entry for sending. `None` if it is sent, failed, or leased elsewhere.
    async fn claim(&self, id: Uuid, lease: TimeDelta) -> Result<Option<OutboxEntry>>;

    /// Leases up to `limit` pending entries whose retry time has come.
    async fn claim_due(&self, limit: i64, lease: TimeDelta) -> Result<Vec<OutboxEntry>>;

    async fn mark_sent(&self, id: Uuid) -> Result<()>;

    async fn mark_failed(&self, id: Uuid, error: &str, disposition: FailureDisposition)
    -> Result<()>;
}
