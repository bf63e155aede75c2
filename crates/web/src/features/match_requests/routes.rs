use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{accept_match_request, list_incoming, reject_match_request};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Mounted under `/api/match-requests`.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:id/accept", post(accept_match_request))
        .route("/:id/reject", post(reject_match_request))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Caller-scoped routes, mounted under `/api/me`.
pub fn owner_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/match-requests", get(list_incoming))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
