use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};

use super::handlers::{
    create_team, delete_team, get_team, list_my_teams, list_teams, update_team, upload_photo,
};
use crate::features::match_requests::handlers::create_match_request;
use crate::middleware::auth::{optional_auth, require_auth};
use crate::state::AppState;

const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Mounted under `/api/teams`.
pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/:id", put(update_team).delete(delete_team))
        .route(
            "/:id/photo",
            put(upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(list_teams).post(create_team))
        .route("/:id", get(get_team))
        .route("/:id/match-requests", post(create_match_request))
        .route_layer(middleware::from_fn_with_state(state, optional_auth))
        .merge(protected)
}

/// Caller-scoped routes, mounted under `/api/me`.
pub fn owner_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/teams", get(list_my_teams))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
