use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::middleware::auth::{create_admin_cache, AdminCache};
use crate::utils::pending::PendingDrafts;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: PgPool,
    pub drafts: PendingDrafts,
    pub admin_cache: AdminCache,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        Self {
            pool,
            drafts: PendingDrafts::new(config.pending_draft_ttl),
            admin_cache: create_admin_cache(config.admin_cache_ttl),
        }
    }
}
