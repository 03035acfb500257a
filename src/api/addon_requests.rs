use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::addon_requests::*;

/// Submission works with or without a session.
pub fn addon_submission_routes() -> Router<AppState> {
    Router::new()
        .route("/addon-requests", post(create_addon_request))
}

pub fn addon_request_routes() -> Router<AppState> {
    Router::new()
        .route("/addon-requests/me", get(list_my_addon_requests))
        .route("/addon-requests/{id}", get(get_addon_request))
}

pub fn admin_addon_request_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/addon-requests", get(admin_list_addon_requests))
        .route("/admin/addon-requests/{id}", get(admin_get_addon_request).patch(transition_addon_request))
}
