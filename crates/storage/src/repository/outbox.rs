use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{DeliveryStatus, FailureDisposition, NewNotification, OutboxEntry};
use crate::store::OutboxStore;

const OUTBOX_COLUMNS: &str = r#"
    id, dedup_key, match_request_id, recipient, body, status, attempts,
    last_error, next_attempt_at, locked_until, created_at, sent_at
"#;

/// Inserts a notification inside the caller's transaction.
///
/// Returns `None` when an entry with the same dedup key already exists.
pub(crate) async fn enqueue(
    conn: &mut PgConnection,
    match_request_id: Uuid,
    notification: &NewNotification,
) -> Result<Option<OutboxEntry>> {
    let entry = sqlx::query_as::<_, OutboxEntry>(&format!(
        r#"
        INSERT INTO notification_outbox (dedup_key, match_request_id, recipient, body)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (dedup_key) DO NOTHING
        RETURNING {OUTBOX_COLUMNS}
        "#
    ))
    .bind(&notification.dedup_key)
    .bind(match_request_id)
    .bind(&notification.recipient)
    .bind(&notification.body)
    .fetch_optional(conn)
    .await?;

    if entry.is_none() {
        tracing::debug!(dedup_key = %notification.dedup_key, "Notification already queued");
    }

    Ok(entry)
}

#[derive(Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for OutboxRepository {
    async fn claim(&self, id: Uuid, lease: TimeDelta) -> Result<Option<OutboxEntry>> {
        let entry = sqlx::query_as::<_, OutboxEntry>(&format!(
            r#"
            UPDATE notification_outbox
            SET attempts = attempts + 1,
                locked_until = $2
            WHERE id = $1
              AND status = 'pending'
              AND (locked_until IS NULL OR locked_until < now())
            RETURNING {OUTBOX_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Utc::now() + lease)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn claim_due(&self, limit: i64, lease: TimeDelta) -> Result<Vec<OutboxEntry>> {
        let entries = sqlx::query_as::<_, OutboxEntry>(&format!(
            r#"
            UPDATE notification_outbox
            SET attempts = attempts + 1,
                locked_until = $2
            WHERE id IN (
                SELECT id FROM notification_outbox
                WHERE status = 'pending'
                  AND next_attempt_at <= now()
                  AND (locked_until IS NULL OR locked_until < now())
                ORDER BY next_attempt_at
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {OUTBOX_COLUMNS}
            "#
        ))
        .bind(limit)
        .bind(Utc::now() + lease)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn mark_sent(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = $2, sent_at = now(), locked_until = NULL, last_error = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(DeliveryStatus::Sent.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        disposition: FailureDisposition,
    ) -> Result<()> {
        let (status, next_attempt_at) = match disposition {
            FailureDisposition::RetryAt(at) => (DeliveryStatus::Pending, Some(at)),
            FailureDisposition::GiveUp => (DeliveryStatus::Failed, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = $2,
                last_error = $3,
                next_attempt_at = COALESCE($4, next_attempt_at),
                locked_until = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(error)
        .bind(next_attempt_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
