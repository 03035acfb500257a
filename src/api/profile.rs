use axum::{
    routing::get,
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::profile::*;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/me", get(get_my_profile).put(update_my_profile))
}

pub fn admin_profile_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_profiles))
        .route("/admin/users/{id}", get(get_profile))
}
