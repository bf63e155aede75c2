use axum::{Router, routing::post};

use super::handlers::submit_contact;
use crate::state::AppState;

/// Mounted under `/api/contact`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(submit_contact))
}
