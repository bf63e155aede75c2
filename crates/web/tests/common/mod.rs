//! Router wired to the in-memory store and recording fakes of the external services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use gateway::{
    ContactMessage, ContactRelay, GatewayError, Identity, IdentityProvider, Notifier,
    PhotoStorage, Role, Session, SignUp,
};
use serde_json::Value;
use storage::models::{
    Decision, MatchRequest, NewMatchRequest, NewNotification, OutboxEntry,
};
use storage::{MatchRequestStore, MemoryStore, StorageError};
use tower::ServiceExt;
use uuid::Uuid;
use web::AppState;
use web::dispatcher::{OutboxDispatcher, RetryPolicy};

pub const OWNER_X: &str = "token-owner-x";
pub const OWNER_Y: &str = "token-owner-y";
pub const STRANGER: &str = "token-stranger";
pub const ADMIN: &str = "token-admin";
pub const PASSWORD: &str = "correct-horse";

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    pub failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn messages_to(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == recipient)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, text: &str) -> gateway::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                service: "SMS gateway",
                status: 500,
                message: "gateway down".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}

/// Accepts fixed bearer tokens and a single password for every address.
pub struct FakeIdentityProvider {
    tokens: HashMap<String, Identity>,
    pub signed_out: Mutex<Vec<String>>,
    pub reset_fails: AtomicBool,
}

impl FakeIdentityProvider {
    fn new() -> Self {
        let mut tokens = HashMap::new();
        for (token, role) in [
            (OWNER_X, Role::Member),
            (OWNER_Y, Role::Member),
            (STRANGER, Role::Member),
            (ADMIN, Role::Admin),
        ] {
            tokens.insert(
                token.to_string(),
                Identity {
                    id: Uuid::new_v4(),
                    email: Some(format!("{token}@example.com")),
                    role,
                },
            );
        }

        Self {
            tokens,
            signed_out: Mutex::default(),
            reset_fails: AtomicBool::new(false),
        }
    }

    pub fn user_id(&self, token: &str) -> Uuid {
        self.tokens[token].id
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_up(&self, email: &str, _password: &str) -> gateway::Result<SignUp> {
        if email == "taken@example.com" {
            return Err(GatewayError::Rejected {
                service: "auth",
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        Ok(SignUp {
            identity: Identity {
                id: Uuid::new_v4(),
                email: Some(email.to_string()),
                role: Role::Member,
            },
            session: None,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> gateway::Result<Session> {
        if password != PASSWORD {
            return Err(GatewayError::Rejected {
                service: "auth",
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        Ok(Session {
            access_token: OWNER_X.to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_in: Some(3600),
            identity: Identity {
                email: Some(email.to_string()),
                ..self.tokens[OWNER_X].clone()
            },
        })
    }

    async fn sign_out(&self, access_token: &str) -> gateway::Result<()> {
        self.signed_out
            .lock()
            .unwrap()
            .push(access_token.to_string());
        Ok(())
    }

    async fn request_password_reset(&self, _email: &str) -> gateway::Result<()> {
        if self.reset_fails.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                service: "auth",
                status: 429,
                message: "rate limited".to_string(),
            });
        }
        Ok(())
    }

    async fn identity_for_token(&self, access_token: &str) -> gateway::Result<Identity> {
        self.tokens
            .get(access_token)
            .cloned()
            .ok_or(GatewayError::Unauthorized)
    }
}

#[derive(Default)]
pub struct RecordingPhotoStorage {
    pub uploads: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl PhotoStorage for RecordingPhotoStorage {
    async fn upload(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> gateway::Result<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_string(), content_type.to_string(), bytes.len()));
        Ok(format!("https://cdn.example.com/{path}"))
    }
}

#[derive(Default)]
pub struct RecordingContactRelay {
    pub submitted: Mutex<Vec<ContactMessage>>,
    pub failing: AtomicBool,
}

#[async_trait]
impl ContactRelay for RecordingContactRelay {
    async fn submit(&self, message: &ContactMessage) -> gateway::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                service: "contact form",
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.submitted.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Match request store whose writes fail; reads go to the wrapped store.
pub struct UnwritableRequests(pub Arc<MemoryStore>);

#[async_trait]
impl MatchRequestStore for UnwritableRequests {
    async fn create(
        &self,
        _request: &NewMatchRequest,
        _notification: Option<&NewNotification>,
    ) -> storage::Result<(MatchRequest, Option<OutboxEntry>)> {
        Err(StorageError::ConstraintViolation(
            "match_requests is read-only".to_string(),
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> storage::Result<MatchRequest> {
        MatchRequestStore::find_by_id(self.0.as_ref(), id).await
    }

    async fn list_pending_for_teams(&self, team_ids: &[Uuid]) -> storage::Result<Vec<MatchRequest>> {
        self.0.list_pending_for_teams(team_ids).await
    }

    async fn resolve(
        &self,
        _id: Uuid,
        _decision: Decision,
        _notifications: &[NewNotification],
    ) -> storage::Result<(MatchRequest, Vec<OutboxEntry>)> {
        Err(StorageError::ConstraintViolation(
            "match_requests is read-only".to_string(),
        ))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub identity: Arc<FakeIdentityProvider>,
    pub photos: Arc<RecordingPhotoStorage>,
    pub contact: Arc<RecordingContactRelay>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(|store| store as Arc<dyn MatchRequestStore>)
    }

    /// App whose match request writes fail while teams stay writable.
    pub fn with_unwritable_requests() -> Self {
        Self::build(|store| Arc::new(UnwritableRequests(store)) as Arc<dyn MatchRequestStore>)
    }

    fn build(requests: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn MatchRequestStore>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let identity = Arc::new(FakeIdentityProvider::new());
        let photos = Arc::new(RecordingPhotoStorage::default());
        let contact = Arc::new(RecordingContactRelay::default());

        let dispatcher =
            OutboxDispatcher::new(store.clone(), notifier.clone(), RetryPolicy::default());

        let state = AppState {
            teams: store.clone(),
            match_requests: requests(store.clone()),
            dispatcher,
            notifier: notifier.clone(),
            identity: identity.clone(),
            photos: photos.clone(),
            contact: contact.clone(),
            app_url: "https://matchvibe.test".to_string(),
        };

        Self {
            router: web::build_router(state),
            store,
            notifier,
            identity,
            photos,
            contact,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };

        (status, value)
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Registers a team and returns its id.
    pub async fn register_team(&self, token: Option<&str>, body: Value) -> Uuid {
        let (status, team) = self.call("POST", "/api/teams", token, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "registration failed: {team}");
        team["id"].as_str().unwrap().parse().unwrap()
    }
}

pub fn team_body(name: &str, contact: &str, city: &str, district: &str) -> Value {
    serde_json::json!({
        "name": name,
        "match_type": "soccer",
        "city": city,
        "district": district,
        "neighborhood": null,
        "pro_players": 0,
        "skill_level": "중",
        "has_field": false,
        "intro": "Sunday morning games",
        "contact": contact,
        "foundation_year": 2015
    })
}

/// `/api/teams` with a percent-encoded query string.
pub fn teams_uri(pairs: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    if query.is_empty() {
        "/api/teams".to_string()
    } else {
        format!("/api/teams?{query}")
    }
}

pub fn team_names(teams: &Value) -> Vec<String> {
    teams
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect()
}
