use gateway::photos::{extension_for, photo_path};
use storage::{
    dto::team::TeamRequest,
    models::Team,
    services::TeamFilter,
};
use uuid::Uuid;

use crate::error::{WebError, WebResult};
use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

/// Owners manage their own teams; admins manage every team.
pub fn ensure_can_manage(user: &CurrentUser, team: &Team) -> WebResult<()> {
    if user.is_admin() || team.is_owned_by(user.id()) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id(), team_id = %team.id, "Team change refused");
        Err(WebError::Forbidden)
    }
}

/// Full directory, newest first, filtered in memory.
pub async fn list_teams(state: &AppState, filter: &TeamFilter) -> WebResult<Vec<Team>> {
    let teams = state.teams.list().await?;
    Ok(filter.apply(&teams))
}

pub async fn get_team(state: &AppState, id: Uuid) -> WebResult<Team> {
    Ok(state.teams.find_by_id(id).await?)
}

pub async fn list_owned_teams(state: &AppState, user: &CurrentUser) -> WebResult<Vec<Team>> {
    Ok(state.teams.list_by_owner(user.id()).await?)
}

pub async fn register_team(
    state: &AppState,
    owner: Option<&CurrentUser>,
    request: TeamRequest,
) -> WebResult<Team> {
    let team = state
        .teams
        .create(&request.into_fields(), owner.map(CurrentUser::id))
        .await?;

    tracing::info!(team_id = %team.id, owned = team.user_id.is_some(), "Team registered");
    Ok(team)
}

pub async fn update_team(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    request: TeamRequest,
) -> WebResult<Team> {
    let existing = state.teams.find_by_id(id).await?;
    ensure_can_manage(user, &existing)?;

    Ok(state.teams.update(id, &request.into_fields()).await?)
}

/// Deletes the team right away; match requests naming it are left in place.
pub async fn delete_team(state: &AppState, user: &CurrentUser, id: Uuid) -> WebResult<()> {
    let existing = state.teams.find_by_id(id).await?;
    ensure_can_manage(user, &existing)?;

    state.teams.delete(id).await?;
    tracing::info!(team_id = %id, by_admin = user.is_admin(), "Team deleted");
    Ok(())
}

pub async fn attach_photo(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    content_type: &str,
    bytes: Vec<u8>,
) -> WebResult<Team> {
    let extension = extension_for(content_type).ok_or_else(|| {
        WebError::UnsupportedMediaType("Upload a JPEG, PNG, WebP or GIF image".to_string())
    })?;
    if bytes.is_empty() {
        return Err(WebError::BadRequest("Image is empty".to_string()));
    }

    let existing = state.teams.find_by_id(id).await?;
    ensure_can_manage(user, &existing)?;

    let path = photo_path(id, extension);
    let url = state.photos.upload(&path, content_type, bytes).await?;

    // Upload and record update are separate calls; a failure here orphans the object.
    match state.teams.set_photo_url(id, &url).await {
        Ok(team) => Ok(team),
        Err(e) => {
            tracing::error!(team_id = %id, path = %path, "Photo stored but team not updated: {}", e);
            Err(e.into())
        }
    }
}
