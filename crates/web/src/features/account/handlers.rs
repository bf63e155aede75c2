use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

use super::dto::{
    CredentialsRequest, MessageResponse, PasswordResetRequest, SessionResponse, SignUpResponse,
    UserResponse,
};
use super::services;

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = SignUpResponse),
        (status = 400, description = "Validation error or address already registered")
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Response, WebError> {
    let req = req.trimmed();
    req.validate()?;

    let sign_up = services::sign_up(&state, &req.email, &req.password).await?;

    let message = if sign_up.session.is_some() {
        "Welcome to MatchVibe!"
    } else {
        "Check your inbox to confirm your email address."
    };

    let response = SignUpResponse {
        user: sign_up.identity.into(),
        session: sign_up.session.map(SessionResponse::from),
        message: message.to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Email or password is incorrect")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Response, WebError> {
    let req = req.trimmed();
    req.validate()?;

    let session = services::sign_in(&state, &req.email, &req.password).await?;

    Ok(Json(SessionResponse::from(session)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth"
)]
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    services::sign_out(&state, &user).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 502, description = "Reset email could not be sent")
    ),
    tag = "auth"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Response, WebError> {
    let req = req.trimmed();
    req.validate()?;

    services::request_password_reset(&state, &req.email).await?;

    Ok(Json(MessageResponse {
        message: "A password reset link has been sent to your email.".to_string(),
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "The signed-in user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth"
)]
pub async fn me(Extension(user): Extension<CurrentUser>) -> Result<Response, WebError> {
    Ok(Json(UserResponse::from(user.identity)).into_response())
}
