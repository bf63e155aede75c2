use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::outbox::enqueue;
use crate::error::{Result, StorageError};
use crate::models::{
    Decision, MatchRequest, MatchStatus, NewMatchRequest, NewNotification, OutboxEntry,
};
use crate::store::MatchRequestStore;

const MATCH_REQUEST_COLUMNS: &str = r#"
    id, from_team_id, from_team_name, from_team_contact, from_team_region,
    to_team_id, to_team_name, status, created_at
"#;

#[derive(Clone)]
pub struct MatchRequestRepository {
    pool: PgPool,
}

impl MatchRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchRequestStore for MatchRequestRepository {
    async fn create(
        &self,
        request: &NewMatchRequest,
        notification: Option<&NewNotification>,
    ) -> Result<(MatchRequest, Option<OutboxEntry>)> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, MatchRequest>(&format!(
            r#"
            INSERT INTO match_requests (id, from_team_id, from_team_name, from_team_contact,
                                        from_team_region, to_team_id, to_team_name, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MATCH_REQUEST_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.from_team_id)
        .bind(&request.from_team_name)
        .bind(&request.from_team_contact)
        .bind(&request.from_team_region)
        .bind(request.to_team_id)
        .bind(&request.to_team_name)
        .bind(MatchStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            StorageError::from(e)
                .or_duplicate(|| format!("match request {} already exists", request.id))
        })?;

        let entry = match notification {
            Some(notification) => enqueue(&mut *tx, created.id, notification).await?,
            None => None,
        };

        tx.commit().await?;

        Ok((created, entry))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<MatchRequest> {
        sqlx::query_as::<_, MatchRequest>(&format!(
            "SELECT {MATCH_REQUEST_COLUMNS} FROM match_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    async fn list_pending_for_teams(&self, team_ids: &[Uuid]) -> Result<Vec<MatchRequest>> {
        if team_ids.is_empty() {
            return Ok(Vec::new());
        }

        let requests = sqlx::query_as::<_, MatchRequest>(&format!(
            r#"
            SELECT {MATCH_REQUEST_COLUMNS}
            FROM match_requests
            WHERE to_team_id = ANY($1) AND status = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(team_ids)
        .bind(MatchStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn resolve(
        &self,
        id: Uuid,
        decision: Decision,
        notifications: &[NewNotification],
    ) -> Result<(MatchRequest, Vec<OutboxEntry>)> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-set: only a pending row can move, so a concurrent resolution loses.
        let resolved = sqlx::query_as::<_, MatchRequest>(&format!(
            r#"
            UPDATE match_requests
            SET status = $2
            WHERE id = $1 AND status = $3
            RETURNING {MATCH_REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.outcome().as_str())
        .bind(MatchStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(resolved) = resolved else {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM match_requests WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;

            return match current {
                Some(status) => Err(StorageError::Conflict(format!(
                    "match request already {status}"
                ))),
                None => Err(StorageError::NotFound),
            };
        };

        let mut entries = Vec::with_capacity(notifications.len());
        for notification in notifications {
            if let Some(entry) = enqueue(&mut *tx, resolved.id, notification).await? {
                entries.push(entry);
            }
        }

        tx.commit().await?;

        Ok((resolved, entries))
    }
}
