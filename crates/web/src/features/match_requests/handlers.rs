use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::match_request::{
        CreateMatchRequest, CreateMatchRequestResponse, MatchRequestResponse,
        ResolveMatchRequestResponse,
    },
    models::Decision,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/teams/{id}/match-requests",
    params(
        ("id" = Uuid, Path, description = "Team being challenged")
    ),
    request_body = CreateMatchRequest,
    security(
        (),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Request recorded; see `notification` for the text message outcome", body = CreateMatchRequestResponse),
        (status = 202, description = "Request could not be recorded but the target team was contacted", body = CreateMatchRequestResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller does not manage the requesting team"),
        (status = 404, description = "Team not found")
    ),
    tag = "match-requests"
)]
pub async fn create_match_request(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(team_id): Path<Uuid>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let caller = user.as_ref().map(|Extension(user)| user);
    let response = services::create_match_request(&state, caller, team_id, req).await?;

    let status = if response.request.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };

    Ok((status, Json(response)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/me/match-requests",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Pending requests addressed to the caller's teams", body = Vec<MatchRequestResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "match-requests"
)]
pub async fn list_incoming(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    let requests = services::incoming_requests(&state, &user).await?;

    let response: Vec<MatchRequestResponse> =
        requests.into_iter().map(MatchRequestResponse::from).collect();

    Ok(Json(response).into_response())
}

async fn resolve(
    state: AppState,
    user: CurrentUser,
    id: Uuid,
    decision: Decision,
) -> Result<Response, WebError> {
    let response = services::resolve_match_request(&state, &user, id, decision).await?;

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/match-requests/{id}/accept",
    params(
        ("id" = Uuid, Path, description = "Match request ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Request accepted", body = ResolveMatchRequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not own the target team"),
        (status = 404, description = "Match request not found"),
        (status = 409, description = "Request already accepted or rejected")
    ),
    tag = "match-requests"
)]
pub async fn accept_match_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    resolve(state, user, id, Decision::Accept).await
}

#[utoipa::path(
    post,
    path = "/api/match-requests/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Match request ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Request rejected", body = ResolveMatchRequestResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not own the target team"),
        (status = 404, description = "Match request not found"),
        (status = 409, description = "Request already accepted or rejected")
    ),
    tag = "match-requests"
)]
pub async fn reject_match_request(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    resolve(state, user, id, Decision::Reject).await
}
