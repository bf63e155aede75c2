use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use storage::{
    dto::team::{SkillLevelOptions, SkillLevelQuery, TeamRequest, TeamResponse},
    services::TeamFilter,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/teams",
    params(TeamFilter),
    responses(
        (status = 200, description = "Teams matching the filter, newest first", body = Vec<TeamResponse>)
    ),
    tag = "teams"
)]
pub async fn list_teams(
    State(state): State<AppState>,
    Query(filter): Query<TeamFilter>,
) -> Result<Response, WebError> {
    let teams = services::list_teams(&state, &filter).await?;

    let response: Vec<TeamResponse> = teams.into_iter().map(TeamResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/teams/{id}",
    params(
        ("id" = Uuid, Path, description = "Team ID")
    ),
    responses(
        (status = 200, description = "Team found", body = TeamResponse),
        (status = 404, description = "Team not found")
    ),
    tag = "teams"
)]
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let team = services::get_team(&state, id).await?;

    Ok(Json(TeamResponse::from(team)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/teams",
    request_body = TeamRequest,
    security(
        (),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Team registered; owned by the caller when signed in", body = TeamResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "teams"
)]
pub async fn create_team(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Json(req): Json<TeamRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let owner = user.as_ref().map(|Extension(user)| user);
    let team = services::register_team(&state, owner, req).await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/teams/{id}",
    params(
        ("id" = Uuid, Path, description = "Team ID")
    ),
    request_body = TeamRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not manage this team"),
        (status = 404, description = "Team not found")
    ),
    tag = "teams"
)]
pub async fn update_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<TeamRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let team = services::update_team(&state, &user, id, req).await?;

    Ok(Json(TeamResponse::from(team)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    params(
        ("id" = Uuid, Path, description = "Team ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not manage this team"),
        (status = 404, description = "Team not found")
    ),
    tag = "teams"
)]
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::delete_team(&state, &user, id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[utoipa::path(
    put,
    path = "/api/teams/{id}/photo",
    params(
        ("id" = Uuid, Path, description = "Team ID")
    ),
    request_body(content = Vec<u8>, description = "Raw image bytes", content_type = "image/*"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Photo stored and linked to the team", body = TeamResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not manage this team"),
        (status = 404, description = "Team not found"),
        (status = 415, description = "Not a supported image type"),
        (status = 502, description = "Photo storage unavailable")
    ),
    tag = "teams"
)]
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let team = services::attach_photo(&state, &user, id, content_type, body.to_vec()).await?;

    Ok(Json(TeamResponse::from(team)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/me/teams",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Teams owned by the caller, newest first", body = Vec<TeamResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "teams"
)]
pub async fn list_my_teams(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, WebError> {
    let teams = services::list_owned_teams(&state, &user).await?;

    let response: Vec<TeamResponse> = teams.into_iter().map(TeamResponse::from).collect();

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/skill-levels",
    params(SkillLevelQuery),
    responses(
        (status = 200, description = "Skill levels selectable for the given professional player count", body = SkillLevelOptions)
    ),
    tag = "teams"
)]
pub async fn skill_levels(Query(query): Query<SkillLevelQuery>) -> Result<Response, WebError> {
    Ok(Json(SkillLevelOptions::for_pro_players(query.pro_players)).into_response())
}
