use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::Claims;
use crate::db::models::website_info::{SiteType, UpsertWebsiteInfo, WebsiteInfo};
use crate::utils::api_response::ApiResponse;

const COLUMNS: &str = "id, user_id, site_type, details, created_at, updated_at";

pub async fn find_for_user(pool: &PgPool, user_id: Uuid) -> Result<Option<WebsiteInfo>, sqlx::Error> {
    sqlx::query_as::<_, WebsiteInfo>(&format!("SELECT {COLUMNS} FROM website_info WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

#[utoipa::path(
    put,
    path = "/website-info",
    request_body = UpsertWebsiteInfo,
    responses(
        (status = 200, description = "Onboarding intake saved", body = WebsiteInfo),
        (status = 400, description = "Missing required intake fields"),
        (status = 500, description = "Failed to save intake")
    ),
    tag = "Website Info",
    security(("bearerAuth" = []))
)]
pub async fn upsert_website_info(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<UpsertWebsiteInfo>,
) -> Result<ApiResponse<WebsiteInfo>, ApiResponse<()>> {
    let user_id = claims.user_id()?;
    form.validate()?;

    let info = sqlx::query_as::<_, WebsiteInfo>(&format!(
        "INSERT INTO website_info (id, user_id, site_type, details)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id) DO UPDATE
            SET site_type = EXCLUDED.site_type, details = EXCLUDED.details, updated_at = NOW()
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(form.site_type)
    .bind(&form.details)
    .fetch_one(&pool)
    .await
    .map_err(|e| ApiResponse::internal("Failed to save website info", e))?;

    info!("Saved {:?} intake for {}", form.site_type, user_id);
    Ok(ApiResponse::success(StatusCode::OK, "Website info saved", info))
}

#[utoipa::path(
    get,
    path = "/website-info/me",
    responses(
        (status = 200, description = "Caller's onboarding intake", body = WebsiteInfo),
        (status = 404, description = "No intake yet")
    ),
    tag = "Website Info",
    security(("bearerAuth" = []))
)]
pub async fn get_my_website_info(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<WebsiteInfo>, ApiResponse<()>> {
    let user_id = claims.user_id()?;
    let info = find_for_user(&pool, user_id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve website info", e))?
        .ok_or_else(|| ApiResponse::not_found("Website info not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Website info retrieved", info))
}

#[utoipa::path(
    get,
    path = "/admin/website-info/{user_id}",
    params(("user_id" = Uuid, Path, description = "Owner profile ID")),
    responses(
        (status = 200, description = "Onboarding intake for the user", body = WebsiteInfo),
        (status = 404, description = "No intake for this user")
    ),
    tag = "Website Info",
    security(("bearerAuth" = []))
)]
pub async fn admin_get_website_info(
    State(pool): State<PgPool>,
    Path(user_id): Path<Uuid>,
) -> Result<ApiResponse<WebsiteInfo>, ApiResponse<()>> {
    let info = find_for_user(&pool, user_id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve website info", e))?
        .ok_or_else(|| ApiResponse::not_found("Website info not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Website info retrieved", info))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(upsert_website_info, get_my_website_info, admin_get_website_info),
    components(schemas(WebsiteInfo, UpsertWebsiteInfo, SiteType)),
    tags(
        (name = "Website Info", description = "Onboarding intake per site type")
    )
)]
pub struct WebsiteInfoDoc;
