use gateway::{Identity, Session};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CredentialsRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl CredentialsRequest {
    /// Drops surrounding whitespace from the email; run before `validate`.
    pub fn trimmed(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

impl PasswordResetRequest {
    pub fn trimmed(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            is_admin: identity.is_admin(),
            id: identity.id,
            email: identity.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user: UserResponse,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            user: session.identity.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignUpResponse {
    pub user: UserResponse,
    /// Absent until the email address is confirmed.
    pub session: Option<SessionResponse>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
