//! HTTP API for matching amateur soccer and futsal teams.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod features;
pub mod middleware;
pub mod state;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

use features::{account, contact, match_requests, teams};

#[derive(OpenApi)]
#[openapi(
    paths(
        teams::handlers::list_teams,
        teams::handlers::get_team,
        teams::handlers::create_team,
        teams::handlers::update_team,
        teams::handlers::delete_team,
        teams::handlers::upload_photo,
        teams::handlers::list_my_teams,
        teams::handlers::skill_levels,
        match_requests::handlers::create_match_request,
        match_requests::handlers::list_incoming,
        match_requests::handlers::accept_match_request,
        match_requests::handlers::reject_match_request,
        account::handlers::sign_up,
        account::handlers::sign_in,
        account::handlers::sign_out,
        account::handlers::request_password_reset,
        account::handlers::me,
        contact::handlers::submit_contact,
    ),
    components(
        schemas(
            storage::dto::team::TeamRequest,
            storage::dto::team::TeamResponse,
            storage::dto::team::SkillLevelOptions,
            storage::dto::match_request::CreateMatchRequest,
            storage::dto::match_request::CreateMatchRequestResponse,
            storage::dto::match_request::MatchRequestResponse,
            storage::dto::match_request::NotificationOutcome,
            storage::dto::match_request::ResolveMatchRequestResponse,
            storage::models::MatchStatus,
            storage::models::MatchType,
            storage::models::SkillLevel,
            account::dto::CredentialsRequest,
            account::dto::PasswordResetRequest,
            account::dto::UserResponse,
            account::dto::SessionResponse,
            account::dto::SignUpResponse,
            account::dto::MessageResponse,
            contact::handlers::ContactRequest,
        )
    ),
    tags(
        (name = "teams", description = "Team directory and team management"),
        (name = "match-requests", description = "Match requests between teams"),
        (name = "auth", description = "Email and password accounts"),
        (name = "contact", description = "Contact form"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// The complete API, without the Swagger UI.
pub fn api_router(state: AppState) -> Router {
    let me = teams::routes::owner_routes(state.clone())
        .merge(match_requests::routes::owner_routes(state.clone()));

    Router::new()
        .nest("/api/teams", teams::routes::routes(state.clone()))
        .nest(
            "/api/match-requests",
            match_requests::routes::routes(state.clone()),
        )
        .nest("/api/me", me)
        .nest("/api/auth", account::routes::routes(state.clone()))
        .nest("/api/contact", contact::routes::routes())
        .route("/api/skill-levels", get(teams::handlers::skill_levels))
        .with_state(state)
}

pub fn build_router(state: AppState) -> Router {
    api_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
