//! Email and password accounts on the hosted auth service (GoTrue REST API).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::error::{GatewayError, Result};

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

/// The signed-in user as seen by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub identity: Identity,
}

/// Result of a sign-up. `session` is absent while the address still needs confirming.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub identity: Identity,
    pub session: Option<Session>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;

    async fn request_password_reset(&self, email: &str) -> Result<()>;

    /// Resolves a bearer token. `Unauthorized` when the token is invalid or expired.
    async fn identity_for_token(&self, access_token: &str) -> Result<Identity>;
}

#[derive(Debug, Clone)]
pub struct SupabaseAuthConfig {
    pub project_url: Url,
    pub anon_key: String,
    /// Where the password reset email should send the user.
    pub reset_redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AppMetadata {
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

impl From<UserBody> for Identity {
    fn from(user: UserBody) -> Self {
        let role = match user.app_metadata.role.as_deref() {
            Some(ADMIN_ROLE) => Role::Admin,
            _ => Role::Member,
        };

        Self {
            id: user.id,
            email: user.email,
            role,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    user: UserBody,
}

impl From<SessionBody> for Session {
    fn from(body: SessionBody) -> Self {
        Self {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
            identity: body.user.into(),
        }
    }
}

// Sign-up answers with a session when confirmation is off and a bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(SessionBody),
    User(UserBody),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

pub struct SupabaseAuthClient {
    client: Client,
    config: SupabaseAuthConfig,
}

impl SupabaseAuthClient {
    pub fn new(config: SupabaseAuthConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.config.project_url.join(&format!("auth/v1/{path}"))?)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.config.anon_key)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(GatewayError::Unauthorized);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body
        .msg
        .or(body.error_description)
        .or(body.message)
        .unwrap_or_else(|| status.to_string());

    Err(GatewayError::Rejected {
        service: "auth service",
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp> {
        let response = self
            .with_key(self.client.post(self.endpoint("signup")?))
            .json(&Credentials { email, password })
            .send()
            .await?;

        let body: SignUpBody = check(response).await?.json().await?;
        let sign_up = match body {
            SignUpBody::Session(session) => {
                let session = Session::from(session);
                SignUp {
                    identity: session.identity.clone(),
                    session: Some(session),
                }
            }
            SignUpBody::User(user) => SignUp {
                identity: user.into(),
                session: None,
            },
        };

        Ok(sign_up)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .with_key(self.client.post(url))
            .json(&Credentials { email, password })
            .send()
            .await?;

        let body: SessionBody = check(response).await?.json().await?;
        Ok(body.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .with_key(self.client.post(self.endpoint("logout")?))
            .bearer_auth(access_token)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<()> {
        let mut url = self.endpoint("recover")?;
        if let Some(redirect) = &self.config.reset_redirect {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }

        let response = self
            .with_key(self.client.post(url))
            .json(&RecoverRequest { email })
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn identity_for_token(&self, access_token: &str) -> Result<Identity> {
        let response = self
            .with_key(self.client.get(self.endpoint("user")?))
            .bearer_auth(access_token)
            .send()
            .await?;

        let user: UserBody = check(response).await?.json().await?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role_comes_from_app_metadata() {
        let user: UserBody = serde_json::from_str(
            r#"{"id":"6f1c0d4e-8b8a-4a43-9a53-0d2b8d7f2f11","email":"a@b.c","app_metadata":{"role":"admin"}}"#,
        )
        .unwrap();
        assert!(Identity::from(user).is_admin());
    }

    #[test]
    fn test_missing_metadata_is_member() {
        let user: UserBody = serde_json::from_str(
            r#"{"id":"6f1c0d4e-8b8a-4a43-9a53-0d2b8d7f2f11","email":"admin@matchvibe.com"}"#,
        )
        .unwrap();
        let identity = Identity::from(user);
        assert_eq!(identity.role, Role::Member);
    }

    #[test]
    fn test_sign_up_body_variants() {
        let user = r#"{"id":"6f1c0d4e-8b8a-4a43-9a53-0d2b8d7f2f11","email":"a@b.c"}"#;
        assert!(matches!(
            serde_json::from_str::<SignUpBody>(user).unwrap(),
            SignUpBody::User(_)
        ));

        let session = format!(
            r#"{{"access_token":"t","refresh_token":"r","expires_in":3600,"user":{user}}}"#
        );
        assert!(matches!(
            serde_json::from_str::<SignUpBody>(&session).unwrap(),
            SignUpBody::Session(_)
        ));
    }

    #[test]
    fn test_endpoints_are_under_auth_prefix() {
        let client = SupabaseAuthClient::new(SupabaseAuthConfig {
            project_url: Url::parse("https://project.supabase.co/").unwrap(),
            anon_key: "anon".to_string(),
            reset_redirect: None,
        })
        .unwrap();
        assert_eq!(
            client.endpoint("token").unwrap().as_str(),
            "https://project.supabase.co/auth/v1/token"
        );
    }
}
