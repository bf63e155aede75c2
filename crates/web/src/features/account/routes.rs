use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{me, request_password_reset, sign_in, sign_out, sign_up};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Mounted under `/api/auth`.
pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/signout", post(sign_out))
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/password-reset", post(request_password_reset))
        .merge(protected)
}
