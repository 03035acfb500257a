use axum::{routing::get, Router};

use crate::app_state::AppState;
use crate::db::queries::catalog::*;

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/templates", get(list_templates))
        .route("/status-badges", get(status_badges))
        .route("/status-badges/{kind}/{status}", get(badge_for_status))
}
