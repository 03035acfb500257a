use axum::{extract::State, routing::get, Json, Router};
use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use crate::app_state::AppState;

/// Defines health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check))  // ✅ Liveness check
        .route("/health/ready", get(readiness_check)) // ✅ Readiness check
}

/// **Liveness Check (Basic Check)**  
/// - ✅ Verifies that the API is running  
/// - ❌ Does NOT check the database  
async fn liveness_check() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "API is live" }))
}

/// **Readiness Check (Database Connectivity Check)**  
/// - ✅ Ensures every table the workflow reads is reachable  
/// - ❌ Returns `503` if the database is down  
async fn readiness_check(State(pool): State<PgPool>) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    for table in ["profiles", "website_info", "website_requests", "addon_requests"] {
        sqlx::query(&format!("SELECT 1 FROM {table} LIMIT 1"))
            .fetch_optional(&pool)
            .await
            .map_err(|e| {
                tracing::warn!("Readiness check failed on {table}: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "success": false, "error": format!("{table} unavailable"), "details": e.to_string() })),
                )
            })?;
    }

    Ok(Json(json!({ "success": true, "message": "API is ready" })))
}
