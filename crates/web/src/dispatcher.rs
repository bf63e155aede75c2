//! Delivery of queued notifications.
//!
//! Entries are first dispatched inline right after the transaction that queued
//! them; whatever fails is picked up again by a periodic sweep with exponential
//! backoff until it is sent or runs out of attempts. Delivery is at-least-once.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use gateway::Notifier;
use storage::models::{FailureDisposition, OutboxEntry};
use storage::{OutboxStore, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

const SWEEP_BATCH: i64 = 50;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: i32,
    pub base_delay: TimeDelta,
    pub max_delay: TimeDelta,
    /// How long a claimed entry stays invisible to other dispatchers.
    pub lease: TimeDelta,
}

impl RetryPolicy {
    pub fn new(max_attempts: i32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Delay before the next try after `attempts` failed ones.
    pub fn backoff(&self, attempts: i32) -> TimeDelta {
        let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
        let delay = self.base_delay * 2i32.pow(exponent);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: TimeDelta::seconds(30),
            max_delay: TimeDelta::hours(1),
            lease: TimeDelta::seconds(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Failed now, scheduled for another attempt.
    Retrying(String),
    /// Failed for the last time.
    GaveUp(String),
    /// Already delivered, given up, or leased by another dispatcher.
    Skipped,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

#[derive(Clone)]
pub struct OutboxDispatcher {
    outbox: Arc<dyn OutboxStore>,
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
}

impl OutboxDispatcher {
    pub fn new(
        outbox: Arc<dyn OutboxStore>,
        notifier: Arc<dyn Notifier>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            outbox,
            notifier,
            policy,
        }
    }

    pub async fn dispatch(&self, id: Uuid) -> Result<Delivery> {
        match self.outbox.claim(id, self.policy.lease).await? {
            Some(entry) => self.deliver(entry).await,
            None => Ok(Delivery::Skipped),
        }
    }

    /// Sends every due entry once. Returns how many went out.
    pub async fn run_due(&self) -> Result<usize> {
        let entries = self.outbox.claim_due(SWEEP_BATCH, self.policy.lease).await?;
        let mut sent = 0;

        for entry in entries {
            if self.deliver(entry).await?.is_sent() {
                sent += 1;
            }
        }

        Ok(sent)
    }

    async fn deliver(&self, entry: OutboxEntry) -> Result<Delivery> {
        match self.notifier.send(&entry.recipient, &entry.body).await {
            Ok(()) => {
                self.outbox.mark_sent(entry.id).await?;
                tracing::info!(
                    entry_id = %entry.id,
                    dedup_key = %entry.dedup_key,
                    attempts = entry.attempts,
                    "Notification delivered"
                );
                Ok(Delivery::Sent)
            }
            Err(e) => {
                let error = e.to_string();

                if entry.attempts >= self.policy.max_attempts {
                    self.outbox
                        .mark_failed(entry.id, &error, FailureDisposition::GiveUp)
                        .await?;
                    tracing::error!(
                        entry_id = %entry.id,
                        dedup_key = %entry.dedup_key,
                        attempts = entry.attempts,
                        "Giving up on notification: {}",
                        error
                    );
                    return Ok(Delivery::GaveUp(error));
                }

                let retry_at = Utc::now() + self.policy.backoff(entry.attempts);
                self.outbox
                    .mark_failed(entry.id, &error, FailureDisposition::RetryAt(retry_at))
                    .await?;
                tracing::warn!(
                    entry_id = %entry.id,
                    dedup_key = %entry.dedup_key,
                    attempts = entry.attempts,
                    %retry_at,
                    "Notification failed, will retry: {}",
                    error
                );
                Ok(Delivery::Retrying(error))
            }
        }
    }

    /// Sweeps due entries every `interval` until `shutdown` flips to `true`.
    pub fn spawn(self, interval: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.run_due().await {
                            Ok(0) => {}
                            Ok(sent) => tracing::info!(sent, "Outbox sweep delivered notifications"),
                            Err(e) => tracing::error!("Outbox sweep failed: {}", e),
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            tracing::info!("Outbox dispatcher stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gateway::GatewayError;
    use std::sync::Mutex;
    use storage::MemoryStore;
    use storage::MatchRequestStore;
    use storage::models::{DeliveryStatus, NewMatchRequest, NewNotification};

    #[derive(Default)]
    struct FlakyNotifier {
        failures_left: Mutex<u32>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl FlakyNotifier {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: Mutex::new(times),
                sent: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send(&self, to: &str, text: &str) -> gateway::Result<()> {
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(GatewayError::Rejected {
                    service: "SMS gateway",
                    status: 500,
                    message: "unavailable".to_string(),
                });
            }
            self.sent.lock().unwrap().push((to.to_string(), text.to_string()));
            Ok(())
        }
    }

    async fn queued_entry(store: &MemoryStore) -> OutboxEntry {
        let request = NewMatchRequest {
            id: Uuid::new_v4(),
            from_team_id: None,
            from_team_name: "Y".to_string(),
            from_team_contact: None,
            from_team_region: None,
            to_team_id: Uuid::new_v4(),
            to_team_name: "X".to_string(),
        };
        let notification = NewNotification {
            dedup_key: format!("match-request:{}:created:target", request.id),
            recipient: "010-1111-2222".to_string(),
            body: "hello".to_string(),
        };
        let (_, entry) = store.create(&request, Some(&notification)).await.unwrap();
        entry.unwrap()
    }

    fn policy(max_attempts: i32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: TimeDelta::zero(),
            max_delay: TimeDelta::zero(),
            lease: TimeDelta::seconds(60),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), TimeDelta::seconds(30));
        assert_eq!(policy.backoff(2), TimeDelta::seconds(60));
        assert_eq!(policy.backoff(3), TimeDelta::seconds(120));
        assert_eq!(policy.backoff(20), TimeDelta::hours(1));
    }

    #[tokio::test]
    async fn test_dispatch_marks_entry_sent_once() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(FlakyNotifier::default());
        let dispatcher = OutboxDispatcher::new(store.clone(), notifier.clone(), policy(3));
        let entry = queued_entry(&store).await;

        assert_eq!(dispatcher.dispatch(entry.id).await.unwrap(), Delivery::Sent);
        assert_eq!(dispatcher.dispatch(entry.id).await.unwrap(), Delivery::Skipped);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        assert_eq!(store.outbox_entries().await[0].status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn test_failed_entry_is_retried_by_sweep() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(FlakyNotifier::failing(1));
        let dispatcher = OutboxDispatcher::new(store.clone(), notifier.clone(), policy(3));
        let entry = queued_entry(&store).await;

        let first = dispatcher.dispatch(entry.id).await.unwrap();
        assert!(matches!(first, Delivery::Retrying(_)));

        assert_eq!(dispatcher.run_due().await.unwrap(), 1);
        let stored = &store.outbox_entries().await[0];
        assert_eq!(stored.status, DeliveryStatus::Sent);
        assert_eq!(stored.attempts, 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(FlakyNotifier::failing(10));
        let dispatcher = OutboxDispatcher::new(store.clone(), notifier, policy(2));
        let entry = queued_entry(&store).await;

        assert!(matches!(
            dispatcher.dispatch(entry.id).await.unwrap(),
            Delivery::Retrying(_)
        ));
        dispatcher.run_due().await.unwrap();

        let stored = &store.outbox_entries().await[0];
        assert_eq!(stored.status, DeliveryStatus::Failed);
        assert_eq!(stored.last_error.as_deref().map(|e| e.contains("unavailable")), Some(true));
        assert_eq!(dispatcher.run_due().await.unwrap(), 0);
    }
}
