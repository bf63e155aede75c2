//! Process-local implementation of the store traits.
//!
//! Mirrors the PostgreSQL repositories closely enough to drive the services and
//! HTTP handlers in tests without a database.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{
    Decision, DeliveryStatus, FailureDisposition, MatchRequest, MatchStatus, NewMatchRequest,
    NewNotification, OutboxEntry, Team, TeamFields,
};
use crate::store::{MatchRequestStore, OutboxStore, TeamStore};

#[derive(Default)]
struct State {
    // Insertion order; listings walk these backwards to get newest first.
    teams: Vec<Team>,
    match_requests: Vec<MatchRequest>,
    outbox: Vec<OutboxEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a team row as-is, bypassing every input rule. Replaces a row with the same id.
    pub async fn insert_team(&self, team: Team) {
        let mut state = self.state.write().await;
        match state.teams.iter_mut().find(|t| t.id == team.id) {
            Some(existing) => *existing = team,
            None => state.teams.push(team),
        }
    }

    pub async fn outbox_entries(&self) -> Vec<OutboxEntry> {
        self.state.read().await.outbox.clone()
    }

    pub async fn match_requests(&self) -> Vec<MatchRequest> {
        self.state.read().await.match_requests.clone()
    }
}

fn apply_fields(team: &mut Team, fields: &TeamFields) {
    team.name = fields.name.clone();
    team.match_type = fields.match_type.as_str().to_string();
    team.region = fields.region.label();
    team.city = fields.region.city.clone();
    team.district = fields.region.district.clone();
    team.dong = fields.region.neighborhood.clone();
    team.skill_level = Some(fields.skill_level.as_str().to_string());
    team.pro_players = fields.pro_players;
    team.has_field = fields.has_field;
    team.address = fields.address.clone();
    team.intro = fields.intro.clone();
    team.contact = Some(fields.contact.clone());
    team.foundation_year = Some(fields.foundation_year);
}

fn enqueue(
    outbox: &mut Vec<OutboxEntry>,
    match_request_id: Uuid,
    notification: &NewNotification,
) -> Option<OutboxEntry> {
    if outbox.iter().any(|e| e.dedup_key == notification.dedup_key) {
        return None;
    }

    let now = Utc::now();
    let entry = OutboxEntry {
        id: Uuid::new_v4(),
        dedup_key: notification.dedup_key.clone(),
        match_request_id: Some(match_request_id),
        recipient: notification.recipient.clone(),
        body: notification.body.clone(),
        status: DeliveryStatus::Pending,
        attempts: 0,
        last_error: None,
        next_attempt_at: now,
        locked_until: None,
        created_at: now,
        sent_at: None,
    };
    outbox.push(entry.clone());
    Some(entry)
}

fn is_claimable(entry: &OutboxEntry) -> bool {
    entry.status == DeliveryStatus::Pending
        && entry.locked_until.is_none_or(|until| until < Utc::now())
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Team>> {
        Ok(self.state.read().await.teams.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Team> {
        self.state
            .read()
            .await
            .teams
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Team>> {
        Ok(self
            .state
            .read()
            .await
            .teams
            .iter()
            .rev()
            .filter(|t| t.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn create(&self, fields: &TeamFields, owner: Option<Uuid>) -> Result<Team> {
        let mut team = Team {
            id: Uuid::new_v4(),
            name: String::new(),
            match_type: String::new(),
            region: String::new(),
            city: None,
            district: None,
            dong: None,
            skill_level: None,
            skill: None,
            pro_players: 0,
            has_field: false,
            address: String::new(),
            intro: String::new(),
            contact: None,
            foundation_year: None,
            photo_url: None,
            profile_image: None,
            user_id: owner,
            created_at: Utc::now(),
        };
        apply_fields(&mut team, fields);

        self.state.write().await.teams.push(team.clone());
        Ok(team)
    }

    async fn update(&self, id: Uuid, fields: &TeamFields) -> Result<Team> {
        let mut state = self.state.write().await;
        let team = state
            .teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::NotFound)?;
        apply_fields(team, fields);
        Ok(team.clone())
    }

    async fn set_photo_url(&self, id: Uuid, url: &str) -> Result<Team> {
        let mut state = self.state.write().await;
        let team = state
            .teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::NotFound)?;
        team.photo_url = Some(url.to_string());
        Ok(team.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.teams.len();
        state.teams.retain(|t| t.id != id);

        if state.teams.len() == before {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl MatchRequestStore for MemoryStore {
    async fn create(
        &self,
        request: &NewMatchRequest,
        notification: Option<&NewNotification>,
    ) -> Result<(MatchRequest, Option<OutboxEntry>)> {
        let created = MatchRequest {
            id: request.id,
            from_team_id: request.from_team_id,
            from_team_name: request.from_team_name.clone(),
            from_team_contact: request.from_team_contact.clone(),
            from_team_region: request.from_team_region.clone(),
            to_team_id: request.to_team_id,
            to_team_name: request.to_team_name.clone(),
            status: MatchStatus::Pending,
            created_at: Utc::now(),
        };

        let mut state = self.state.write().await;
        if state.match_requests.iter().any(|r| r.id == created.id) {
            return Err(StorageError::ConstraintViolation(format!(
                "match request {} already exists",
                created.id
            )));
        }
        state.match_requests.push(created.clone());
        let entry = notification.and_then(|n| enqueue(&mut state.outbox, created.id, n));

        Ok((created, entry))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<MatchRequest> {
        self.state
            .read()
            .await
            .match_requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_pending_for_teams(&self, team_ids: &[Uuid]) -> Result<Vec<MatchRequest>> {
        Ok(self
            .state
            .read()
            .await
            .match_requests
            .iter()
            .rev()
            .filter(|r| r.status == MatchStatus::Pending && team_ids.contains(&r.to_team_id))
            .cloned()
            .collect())
    }

    async fn resolve(
        &self,
        id: Uuid,
        decision: Decision,
        notifications: &[NewNotification],
    ) -> Result<(MatchRequest, Vec<OutboxEntry>)> {
        let mut state = self.state.write().await;
        let request = state
            .match_requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StorageError::NotFound)?;

        request.status = request
            .status
            .transition(decision)
            .map_err(|e| StorageError::Conflict(e.to_string()))?;
        let resolved = request.clone();

        let entries = notifications
            .iter()
            .filter_map(|n| enqueue(&mut state.outbox, resolved.id, n))
            .collect();

        Ok((resolved, entries))
    }
}

#[async_trait]
impl OutboxStore for MemoryStore {
    async fn claim(&self, id: Uuid, lease: TimeDelta) -> Result<Option<OutboxEntry>> {
        let mut state = self.state.write().await;
        let Some(entry) = state
            .outbox
            .iter_mut()
            .find(|e| e.id == id && is_claimable(e))
        else {
            return Ok(None);
        };

        entry.attempts += 1;
        entry.locked_until = Some(Utc::now() + lease);
        Ok(Some(entry.clone()))
    }

    async fn claim_due(&self, limit: i64, lease: TimeDelta) -> Result<Vec<OutboxEntry>> {
        let now = Utc::now();
        let mut state = self.state.write().await;

        let mut due: Vec<&mut OutboxEntry> = state
            .outbox
            .iter_mut()
            .filter(|e| is_claimable(e) && e.next_attempt_at <= now)
            .collect();
        due.sort_by_key(|e| e.next_attempt_at);

        Ok(due
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|entry| {
                entry.attempts += 1;
                entry.locked_until = Some(now + lease);
                entry.clone()
            })
            .collect())
    }

    async fn mark_sent(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .outbox
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StorageError::NotFound)?;

        entry.status = DeliveryStatus::Sent;
        entry.sent_at = Some(Utc::now());
        entry.locked_until = None;
        entry.last_error = None;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        disposition: FailureDisposition,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = state
            .outbox
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StorageError::NotFound)?;

        entry.last_error = Some(error.to_string());
        entry.locked_until = None;
        match disposition {
            FailureDisposition::RetryAt(at) => entry.next_attempt_at = at,
            FailureDisposition::GiveUp => entry.status = DeliveryStatus::Failed,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchType, Region, SkillLevel};

    fn fields(name: &str) -> TeamFields {
        TeamFields {
            name: name.to_string(),
            match_type: MatchType::Soccer,
            region: Region::new(Some("서울특별시"), Some("강남구"), Some("역삼동")),
            skill_level: SkillLevel::Middle,
            pro_players: 0,
            has_field: true,
            address: "-".to_string(),
            intro: "Friendly games".to_string(),
            contact: "010-1111-2222".to_string(),
            foundation_year: 2020,
        }
    }

    fn new_request(to: &Team) -> NewMatchRequest {
        NewMatchRequest {
            id: Uuid::new_v4(),
            from_team_id: None,
            from_team_name: "Team Y".to_string(),
            from_team_contact: Some("010-3333-4444".to_string()),
            from_team_region: None,
            to_team_id: to.id,
            to_team_name: to.name.clone(),
        }
    }

    fn notification(key: &str) -> NewNotification {
        NewNotification {
            dedup_key: key.to_string(),
            recipient: "01011112222".to_string(),
            body: "hello".to_string(),
        }
    }

    #[tokio::test]
    async fn test_teams_listed_newest_first() {
        let store = MemoryStore::new();
        TeamStore::create(&store, &fields("First"), None).await.unwrap();
        TeamStore::create(&store, &fields("Second"), None).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_update_recomputes_region_label() {
        let store = MemoryStore::new();
        let team = TeamStore::create(&store, &fields("X"), None).await.unwrap();

        let mut changed = fields("X");
        changed.region = Region::new(Some("부산광역시"), Some("해운대구"), None);
        let updated = store.update(team.id, &changed).await.unwrap();

        assert_eq!(updated.region, "부산광역시 해운대구");
        assert_eq!(updated.dong, None);
    }

    #[tokio::test]
    async fn test_delete_keeps_match_requests() {
        let store = MemoryStore::new();
        let team = TeamStore::create(&store, &fields("X"), None).await.unwrap();
        MatchRequestStore::create(&store, &new_request(&team), None)
            .await
            .unwrap();

        TeamStore::delete(&store, team.id).await.unwrap();

        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.match_requests().await.len(), 1);
        assert!(matches!(
            TeamStore::delete(&store, team.id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_resolve_is_compare_and_set() {
        let store = MemoryStore::new();
        let team = TeamStore::create(&store, &fields("X"), None).await.unwrap();
        let (request, _) = MatchRequestStore::create(&store, &new_request(&team), None)
            .await
            .unwrap();

        let (accepted, _) = store
            .resolve(request.id, Decision::Accept, &[])
            .await
            .unwrap();
        assert_eq!(accepted.status, MatchStatus::Accepted);

        let second = store.resolve(request.id, Decision::Reject, &[]).await;
        assert!(matches!(second, Err(StorageError::Conflict(_))));
        let current = MatchRequestStore::find_by_id(&store, request.id).await.unwrap();
        assert_eq!(current.status, MatchStatus::Accepted);
    }

    #[tokio::test]
    async fn test_enqueue_ignores_duplicate_dedup_keys() {
        let store = MemoryStore::new();
        let team = TeamStore::create(&store, &fields("X"), None).await.unwrap();
        let (request, first) =
            MatchRequestStore::create(&store, &new_request(&team), Some(&notification("k1")))
                .await
                .unwrap();
        assert!(first.is_some());

        let (_, entries) = store
            .resolve(
                request.id,
                Decision::Reject,
                &[notification("k1"), notification("k2")],
            )
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].dedup_key, "k2");
        assert_eq!(store.outbox_entries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_claimed_entry_is_leased() {
        let store = MemoryStore::new();
        let team = TeamStore::create(&store, &fields("X"), None).await.unwrap();
        let (_, entry) =
            MatchRequestStore::create(&store, &new_request(&team), Some(&notification("k")))
                .await
                .unwrap();
        let entry = entry.unwrap();

        let claimed = store.claim(entry.id, TimeDelta::seconds(60)).await.unwrap();
        assert_eq!(claimed.unwrap().attempts, 1);
        assert!(store.claim(entry.id, TimeDelta::seconds(60)).await.unwrap().is_none());
        assert!(store.claim_due(10, TimeDelta::seconds(60)).await.unwrap().is_empty());

        store.mark_sent(entry.id).await.unwrap();
        let stored = &store.outbox_entries().await[0];
        assert_eq!(stored.status, DeliveryStatus::Sent);
        assert!(stored.sent_at.is_some());
    }
}
