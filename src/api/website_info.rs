use axum::{
    routing::{get, put},
    Router,
};

use crate::app_state::AppState;
use crate::db::queries::website_info::*;

pub fn website_info_routes() -> Router<AppState> {
    Router::new()
        .route("/website-info", put(upsert_website_info))
        .route("/website-info/me", get(get_my_website_info))
}

pub fn admin_website_info_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/website-info/{user_id}", get(admin_get_website_info))
}
