use std::net::SocketAddr;

use anyhow::Context;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use dotenvy::dotenv;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod app_state;
mod config;
mod db;
mod middleware;
mod utils;

use crate::api::auth::AuthDoc;
use crate::app_state::AppState;
use crate::config::Config;
use crate::db::queries::addon_requests::AddonRequestDoc;
use crate::db::queries::catalog::CatalogDoc;
use crate::db::queries::profile::ProfileDoc;
use crate::db::queries::website_info::WebsiteInfoDoc;
use crate::db::queries::website_requests::WebsiteRequestDoc;
use crate::middleware::auth::{admin_middleware, jwt_middleware, optional_jwt_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    Config::init();
    let config = Config::get();

    let _log_guard = init_tracing(&config)?;

    let pool = db::pool::get_db_pool(&config)
        .await
        .context("Failed to connect to the database")?;
    db::pool::migrate(&pool)
        .await
        .context("Failed to run database migrations")?;

    let state = AppState::new(pool.clone(), &config);
    let app = build_router(state, &config);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid BIND_ADDR {:?}", config.bind_addr))?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(pool))
        .await
        .context("Server encountered an error")?;

    info!("Shutdown complete.");
    Ok(())
}

/// Logs to stdout and to a daily rolling file under `LOG_DIR`. The returned
/// guard must live until shutdown so buffered lines get flushed.
fn init_tracing(config: &Config) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", config.log_dir))?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "sitecraft.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stdout.and(non_blocking))
        .init();

    Ok(guard)
}

fn api_doc() -> utoipa::openapi::OpenApi {
    AuthDoc::openapi()
        .merge_from(ProfileDoc::openapi())
        .merge_from(WebsiteInfoDoc::openapi())
        .merge_from(WebsiteRequestDoc::openapi())
        .merge_from(AddonRequestDoc::openapi())
        .merge_from(CatalogDoc::openapi())
}

fn build_router(state: AppState, config: &Config) -> Router {
    let doc = api_doc();

    // Public routes
    let public_routes = Router::new()
        .merge(api::auth::auth_routes())
        .merge(api::catalog::catalog_routes());

    // Submissions park the form when there is no session
    let submission_routes = Router::new()
        .merge(api::website_requests::website_submission_routes())
        .merge(api::addon_requests::addon_submission_routes())
        .route_layer(from_fn(optional_jwt_middleware));

    // Private routes
    let private_routes = Router::new()
        .merge(api::auth::secure_auth_routes())
        .merge(api::profile::profile_routes())
        .merge(api::website_info::website_info_routes())
        .merge(api::website_requests::website_request_routes())
        .merge(api::addon_requests::addon_request_routes())
        .route_layer(from_fn(jwt_middleware));

    // Admin routes
    let admin_routes = Router::new()
        .merge(api::profile::admin_profile_routes())
        .merge(api::website_info::admin_website_info_routes())
        .merge(api::website_requests::admin_website_request_routes())
        .merge(api::addon_requests::admin_addon_request_routes())
        .route_layer(from_fn_with_state(state.clone(), admin_middleware))
        .route_layer(from_fn(jwt_middleware));

    Router::new()
        .merge(api::health::health_routes())
        .merge(public_routes)
        .merge(submission_routes)
        .merge(private_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", doc.clone()))
        .merge(RapiDoc::with_openapi("/api-docs/rapidoc.json", doc).path("/rapidoc"))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal(pool: PgPool) {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
    }
    info!("Received Ctrl+C, shutting down...");
    info!("🛠️ Closing database pool...");
    pool.close().await;
    info!("✅ Database pool closed.");
}
