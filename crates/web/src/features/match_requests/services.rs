//! Match request lifecycle: filing a request, answering it, and telling both teams.
//!
//! State changes and the text messages they trigger are written to the store in
//! one transaction, then handed to the outbox dispatcher. A failed send never
//! undoes the state change; it stays queued for the background sweep.

use gateway::Identity;
use storage::{
    StorageError,
    dto::match_request::{
        CreateMatchRequest, CreateMatchRequestResponse, MatchRequestResponse, NotificationOutcome,
        ResolveMatchRequestResponse,
    },
    models::{Decision, MatchRequest, NewMatchRequest, NewNotification, Team},
};
use uuid::Uuid;

use super::messages;
use crate::dispatcher::Delivery;
use crate::error::{WebError, WebResult};
use crate::features::teams::services::ensure_can_manage;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

/// Name used when the requester does not say who they are.
pub const PLACEHOLDER_TEAM_NAME: &str = "Our team";

fn dedup_key(request_id: Uuid, event: &str, recipient: &str) -> String {
    format!("match-request:{request_id}:{event}:{recipient}")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

struct Requester {
    team_id: Option<Uuid>,
    name: String,
    contact: Option<String>,
    region: Option<String>,
}

async fn resolve_requester(
    state: &AppState,
    caller: Option<&CurrentUser>,
    body: CreateMatchRequest,
) -> WebResult<Requester> {
    let Some(team_id) = body.from_team_id else {
        return Ok(Requester {
            team_id: None,
            name: non_blank(body.from_team_name)
                .unwrap_or_else(|| PLACEHOLDER_TEAM_NAME.to_string()),
            contact: non_blank(body.from_team_contact),
            region: non_blank(body.from_team_region),
        });
    };

    // Speaking for a registered team requires managing it.
    let caller = caller.ok_or(WebError::Unauthorized)?;
    let team = state.teams.find_by_id(team_id).await.map_err(|e| match e {
        StorageError::NotFound => WebError::BadRequest("Requesting team does not exist".to_string()),
        other => other.into(),
    })?;
    ensure_can_manage(caller, &team)?;

    Ok(Requester {
        team_id: Some(team.id),
        contact: team.contact_number().map(String::from),
        region: Some(team.region.clone()).filter(|r| !r.is_empty()),
        name: team.name,
    })
}

/// Files a pending request against `target_id` and texts the target team.
///
/// Never fails because of the text message: the outcome is reported instead,
/// together with the target's number when it did not go out.
pub async fn create_match_request(
    state: &AppState,
    caller: Option<&CurrentUser>,
    target_id: Uuid,
    body: CreateMatchRequest,
) -> WebResult<CreateMatchRequestResponse> {
    let target = state.teams.find_by_id(target_id).await?;
    let requester = resolve_requester(state, caller, body).await?;

    let new_request = NewMatchRequest {
        id: Uuid::new_v4(),
        from_team_id: requester.team_id,
        from_team_name: requester.name,
        from_team_contact: requester.contact,
        from_team_region: requester.region,
        to_team_id: target.id,
        to_team_name: target.name.clone(),
    };

    let contact = target.contact_number().map(String::from);
    let notification = contact.as_ref().map(|contact| NewNotification {
        dedup_key: dedup_key(new_request.id, "created", "target"),
        recipient: contact.clone(),
        body: messages::request_received(
            &target.name,
            &new_request.from_team_name,
            new_request.from_team_region.as_deref(),
            &state.app_url,
        ),
    });

    match state
        .match_requests
        .create(&new_request, notification.as_ref())
        .await
    {
        Ok((request, entry)) => {
            tracing::info!(
                request_id = %request.id,
                to_team_id = %target.id,
                "Match request recorded"
            );

            let outcome = match entry {
                Some(entry) => outcome_of(state.dispatcher.dispatch(entry.id).await, entry.id),
                None => NotificationOutcome::NoContact,
            };

            Ok(created_response(Some(request), outcome, &target, contact))
        }
        Err(e) => {
            // Recording is best effort: the target still hears about the request.
            tracing::error!(to_team_id = %target.id, "Failed to record match request: {}", e);

            let outcome = match &notification {
                Some(notification) => match state
                    .notifier
                    .send(&notification.recipient, &notification.body)
                    .await
                {
                    Ok(()) => NotificationOutcome::Sent,
                    Err(e) => {
                        tracing::error!(to_team_id = %target.id, "Direct notification failed: {}", e);
                        NotificationOutcome::Failed
                    }
                },
                None => NotificationOutcome::NoContact,
            };

            Ok(created_response(None, outcome, &target, contact))
        }
    }
}

fn outcome_of(result: storage::Result<Delivery>, entry_id: Uuid) -> NotificationOutcome {
    match result {
        Ok(Delivery::Sent) => NotificationOutcome::Sent,
        // Leased by the background sweep in the meantime; whether it went out is unknown.
        Ok(Delivery::Skipped) | Ok(Delivery::Retrying(_)) | Ok(Delivery::GaveUp(_)) => {
            NotificationOutcome::Failed
        }
        Err(e) => {
            tracing::error!(%entry_id, "Dispatch bookkeeping failed: {}", e);
            NotificationOutcome::Failed
        }
    }
}

fn created_response(
    request: Option<MatchRequest>,
    notification: NotificationOutcome,
    target: &Team,
    contact: Option<String>,
) -> CreateMatchRequestResponse {
    let recorded = request.is_some();
    let message = match (recorded, notification) {
        (true, NotificationOutcome::Sent) => {
            format!("Request sent. The {} manager has been notified by text.", target.name)
        }
        (true, NotificationOutcome::NoContact) => format!(
            "Request received. {} has no contact number on file, so no text was sent.",
            target.name
        ),
        (true, NotificationOutcome::Failed) => format!(
            "Request received, but the text could not be sent. Contact them directly: {}",
            contact.as_deref().unwrap_or("no contact")
        ),
        (false, NotificationOutcome::Sent) => format!(
            "The {} manager was notified by text, but the request could not be saved.",
            target.name
        ),
        (false, _) => format!(
            "The request could not be saved or sent. Contact them directly: {}",
            contact.as_deref().unwrap_or("no contact")
        ),
    };

    let manual_contact = match notification {
        NotificationOutcome::Failed => contact,
        _ => None,
    };

    CreateMatchRequestResponse {
        request: request.map(MatchRequestResponse::from),
        notification,
        manual_contact,
        message,
    }
}

/// Pending requests addressed to any team the caller owns, newest first.
pub async fn incoming_requests(
    state: &AppState,
    caller: &CurrentUser,
) -> WebResult<Vec<MatchRequest>> {
    let team_ids: Vec<Uuid> = state
        .teams
        .list_by_owner(caller.id())
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();

    Ok(state.match_requests.list_pending_for_teams(&team_ids).await?)
}

fn authorize_resolution(caller: &Identity, target: Option<&Team>) -> WebResult<()> {
    let allowed = caller.is_admin() || target.is_some_and(|team| team.is_owned_by(caller.id));
    if allowed {
        Ok(())
    } else {
        Err(WebError::Forbidden)
    }
}

fn resolution_notifications(
    request: &MatchRequest,
    decision: Decision,
    target: Option<&Team>,
    app_url: &str,
) -> Vec<NewNotification> {
    let requester_contact = request
        .from_team_contact
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let target_contact = target.and_then(Team::contact_number);

    let mut notifications = Vec::with_capacity(2);
    match decision {
        Decision::Accept => {
            if let Some(to) = requester_contact {
                notifications.push(NewNotification {
                    dedup_key: dedup_key(request.id, "accepted", "requester"),
                    recipient: to.to_string(),
                    body: messages::accepted_for_requester(request, target_contact),
                });
            }
            if let Some(to) = target_contact {
                notifications.push(NewNotification {
                    dedup_key: dedup_key(request.id, "accepted", "target"),
                    recipient: to.to_string(),
                    body: messages::accepted_for_target(request),
                });
            }
        }
        Decision::Reject => {
            if let Some(to) = requester_contact {
                notifications.push(NewNotification {
                    dedup_key: dedup_key(request.id, "rejected", "requester"),
                    recipient: to.to_string(),
                    body: messages::rejected_for_requester(request, app_url),
                });
            }
        }
    }

    notifications
}

/// Accepts or rejects a pending request on behalf of the target team's owner.
pub async fn resolve_match_request(
    state: &AppState,
    caller: &CurrentUser,
    id: Uuid,
    decision: Decision,
) -> WebResult<ResolveMatchRequestResponse> {
    let request = state.match_requests.find_by_id(id).await?;

    let target = match state.teams.find_by_id(request.to_team_id).await {
        Ok(team) => Some(team),
        Err(StorageError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };
    authorize_resolution(&caller.identity, target.as_ref())?;

    request
        .status
        .transition(decision)
        .map_err(|e| WebError::Storage(StorageError::Conflict(e.to_string())))?;

    let notifications =
        resolution_notifications(&request, decision, target.as_ref(), &state.app_url);
    let (resolved, entries) = state
        .match_requests
        .resolve(id, decision, &notifications)
        .await?;

    tracing::info!(
        request_id = %resolved.id,
        status = %resolved.status,
        by_admin = caller.is_admin(),
        "Match request resolved"
    );

    let mut sent = 0;
    for entry in &entries {
        match state.dispatcher.dispatch(entry.id).await {
            Ok(delivery) if delivery.is_sent() => sent += 1,
            Ok(_) => {}
            Err(e) => tracing::error!(entry_id = %entry.id, "Dispatch bookkeeping failed: {}", e),
        }
    }

    Ok(ResolveMatchRequestResponse {
        request: resolved.into(),
        notifications_sent: sent,
        notifications_queued: entries.len() - sent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gateway::Role;
    use storage::models::MatchStatus;

    fn request(contact: Option<&str>) -> MatchRequest {
        MatchRequest {
            id: Uuid::new_v4(),
            from_team_id: None,
            from_team_name: "Team Y".to_string(),
            from_team_contact: contact.map(String::from),
            from_team_region: None,
            to_team_id: Uuid::new_v4(),
            to_team_name: "Team X".to_string(),
            status: MatchStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn team(owner: Option<Uuid>, contact: Option<&str>) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: "Team X".to_string(),
            match_type: "soccer".to_string(),
            region: String::new(),
            city: None,
            district: None,
            dong: None,
            skill_level: Some("중".to_string()),
            skill: None,
            pro_players: 0,
            has_field: false,
            address: "-".to_string(),
            intro: String::new(),
            contact: contact.map(String::from),
            foundation_year: None,
            photo_url: None,
            profile_image: None,
            user_id: owner,
            created_at: Utc::now(),
        }
    }

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: None,
            role,
        }
    }

    #[test]
    fn test_only_a_confirmed_send_counts_as_sent() {
        let id = Uuid::new_v4();
        assert_eq!(outcome_of(Ok(Delivery::Sent), id), NotificationOutcome::Sent);
        assert_eq!(outcome_of(Ok(Delivery::Skipped), id), NotificationOutcome::Failed);
        assert_eq!(
            outcome_of(Ok(Delivery::Retrying("timeout".to_string())), id),
            NotificationOutcome::Failed
        );
        assert_eq!(
            outcome_of(Err(StorageError::NotFound), id),
            NotificationOutcome::Failed
        );
    }

    #[test]
    fn test_accept_notifies_both_sides() {
        let request = request(Some("010-3333-4444"));
        let target = team(None, Some("010-1111-2222"));
        let notifications =
            resolution_notifications(&request, Decision::Accept, Some(&target), "https://app");

        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].recipient, "010-3333-4444");
        assert!(notifications[0].body.contains("010-1111-2222"));
        assert_eq!(notifications[1].recipient, "010-1111-2222");
        assert!(notifications[1].body.contains("010-3333-4444"));
        assert_ne!(notifications[0].dedup_key, notifications[1].dedup_key);
    }

    #[test]
    fn test_reject_notifies_requester_only() {
        let request = request(Some("010-3333-4444"));
        let target = team(None, Some("010-1111-2222"));
        let notifications =
            resolution_notifications(&request, Decision::Reject, Some(&target), "https://app");

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipient, "010-3333-4444");
    }

    #[test]
    fn test_missing_requester_contact_skips_their_message() {
        let request = request(Some("  "));
        let notifications = resolution_notifications(&request, Decision::Reject, None, "https://app");
        assert!(notifications.is_empty());
    }

    #[test]
    fn test_only_owner_or_admin_may_resolve() {
        let owner = identity(Role::Member);
        let stranger = identity(Role::Member);
        let admin = identity(Role::Admin);
        let target = team(Some(owner.id), None);

        assert!(authorize_resolution(&owner, Some(&target)).is_ok());
        assert!(matches!(
            authorize_resolution(&stranger, Some(&target)),
            Err(WebError::Forbidden)
        ));
        assert!(authorize_resolution(&admin, Some(&target)).is_ok());
        assert!(authorize_resolution(&admin, None).is_ok());
        assert!(authorize_resolution(&owner, None).is_err());
    }

    #[test]
    fn test_dedup_key_layout() {
        let id = Uuid::nil();
        assert_eq!(
            dedup_key(id, "accepted", "target"),
            "match-request:00000000-0000-0000-0000-000000000000:accepted:target"
        );
    }
}
