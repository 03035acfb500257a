use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::website_requests::*;

/// Submission works with or without a session.
pub fn website_submission_routes() -> Router<AppState> {
    Router::new()
        .route("/website-requests", post(create_website_request))
}

pub fn website_request_routes() -> Router<AppState> {
    Router::new()
        .route("/website-requests/me", get(list_my_website_requests))
        .route("/website-requests/{id}", get(get_website_request))
}

pub fn admin_website_request_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/website-requests", get(admin_list_website_requests))
        .route("/admin/website-requests/{id}", get(admin_get_website_request).patch(transition_website_request))
}
