use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use gateway::ContactMessage;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::WebError;
use crate::features::account::dto::MessageResponse;
use crate::state::AppState;

pub const SEND_FAILED: &str = "Could not send your message. Please try again later.";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Message is required"))]
    pub message: String,
}

impl ContactRequest {
    /// Drops surrounding whitespace from the single-line fields; run before `validate`.
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message,
        }
    }
}

impl From<ContactRequest> for ContactMessage {
    fn from(req: ContactRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            subject: req.subject,
            message: req.message,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Inquiry forwarded", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 502, description = "Form relay unavailable")
    ),
    tag = "contact"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<Response, WebError> {
    let req = req.trimmed();
    req.validate()?;

    let message = ContactMessage::from(req);
    if let Err(e) = state.contact.submit(&message).await {
        tracing::error!("Contact form relay failed: {}", e);
        return Err(WebError::Upstream(SEND_FAILED.to_string()));
    }

    tracing::info!("Contact inquiry forwarded");
    Ok(Json(MessageResponse {
        message: "Thanks for reaching out. We will get back to you soon.".to_string(),
    })
    .into_response())
}
