use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use gateway::{GatewayError, Identity};
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

/// Authenticated caller, placed in request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: Identity,
    pub access_token: String,
}

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.identity.id
    }

    pub fn is_admin(&self) -> bool {
        self.identity.is_admin()
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(state: &AppState, token: &str) -> Result<CurrentUser, WebError> {
    match state.identity.identity_for_token(token).await {
        Ok(identity) => Ok(CurrentUser {
            identity,
            access_token: token.to_string(),
        }),
        Err(GatewayError::Unauthorized) => {
            tracing::warn!("Rejected invalid or expired access token");
            Err(WebError::Unauthorized)
        }
        Err(e) => Err(e.into()),
    }
}

/// Rejects requests without a valid bearer token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = bearer_token(request.headers()).ok_or(WebError::Unauthorized)?;
    let user = authenticate(&state, token).await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Attaches the caller when a token is present. A present but invalid token is still rejected.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    if let Some(token) = bearer_token(request.headers()) {
        let user = authenticate(&state, token).await?;
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
