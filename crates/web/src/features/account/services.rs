use gateway::{GatewayError, Session, SignUp};

use crate::error::{WebError, WebResult};
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

pub const SIGN_IN_FAILED: &str = "Email or password is incorrect.";
pub const RESET_FAILED: &str = "Could not send the reset email. Check the address and try again.";

pub async fn sign_up(state: &AppState, email: &str, password: &str) -> WebResult<SignUp> {
    let sign_up = state
        .identity
        .sign_up(email, password)
        .await
        .map_err(|e| match e {
            GatewayError::Rejected { status, message, .. } if status < 500 => {
                WebError::BadRequest(message)
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %sign_up.identity.id, confirmed = sign_up.session.is_some(), "Account created");
    Ok(sign_up)
}

/// Every rejection collapses into one message so callers cannot probe which part was wrong.
pub async fn sign_in(state: &AppState, email: &str, password: &str) -> WebResult<Session> {
    state
        .identity
        .sign_in(email, password)
        .await
        .map_err(|e| match e {
            GatewayError::Unauthorized => WebError::AuthFailed(SIGN_IN_FAILED),
            GatewayError::Rejected { status, .. } if status < 500 => {
                WebError::AuthFailed(SIGN_IN_FAILED)
            }
            other => other.into(),
        })
}

pub async fn sign_out(state: &AppState, user: &CurrentUser) -> WebResult<()> {
    state.identity.sign_out(&user.access_token).await?;

    tracing::info!(user_id = %user.id(), "Signed out");
    Ok(())
}

pub async fn request_password_reset(state: &AppState, email: &str) -> WebResult<()> {
    state
        .identity
        .request_password_reset(email)
        .await
        .map_err(|e| {
            tracing::warn!("Password reset request failed: {}", e);
            WebError::Upstream(RESET_FAILED.to_string())
        })
}
