use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::api::auth::Claims;
use crate::db::models::profile::{Profile, UpdateProfile};
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::is_blank;

const PROFILE_COLUMNS: &str =
    "id, name, email, phone, plan, website_url, is_admin, password_hash, created_at, updated_at";

pub struct NewProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

pub async fn insert_profile(pool: &PgPool, new: &NewProfile) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        "INSERT INTO profiles (id, name, email, phone, password_hash)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.phone)
    .bind(&new.password_hash)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = $1"))
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[utoipa::path(
    get,
    path = "/profile/me",
    responses(
        (status = 200, description = "Profile of the signed-in user", body = Profile),
        (status = 404, description = "Profile not found")
    ),
    tag = "Profiles",
    security(("bearerAuth" = []))
)]
pub async fn get_my_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Profile>, ApiResponse<()>> {
    let user_id = claims.user_id()?;
    let profile = find_by_id(&pool, user_id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve profile", e))?
        .ok_or_else(|| ApiResponse::not_found("Profile not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Profile retrieved successfully", profile))
}

#[utoipa::path(
    put,
    path = "/profile/me",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 400, description = "No fields provided for update"),
        (status = 500, description = "Failed to update profile")
    ),
    tag = "Profiles",
    security(("bearerAuth" = []))
)]
pub async fn update_my_profile(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(update): Json<UpdateProfile>,
) -> Result<ApiResponse<Profile>, ApiResponse<()>> {
    let user_id = claims.user_id()?;

    if update.is_empty() {
        return Err(ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "No fields provided for update",
            None,
        ));
    }
    if update.name.as_deref().is_some_and(is_blank) {
        return Err(ApiResponse::<()>::error(StatusCode::BAD_REQUEST, "Name cannot be empty", None));
    }

    let mut query_builder = QueryBuilder::new("UPDATE profiles SET ");
    {
        let mut fields = query_builder.separated(", ");
        for (column, value) in update.assignments() {
            fields.push(format!("{column} = ")).push_bind_unseparated(value);
        }
        // Always update timestamp
        fields.push("updated_at = NOW()");
    }
    query_builder.push(" WHERE id = ").push_bind(user_id);
    query_builder.push(format!(" RETURNING {PROFILE_COLUMNS}"));

    let profile = query_builder
        .build_query_as::<Profile>()
        .fetch_optional(&pool)
        .await
        .map_err(|e| ApiResponse::internal("Failed to update profile", e))?
        .ok_or_else(|| ApiResponse::not_found("Profile not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Profile updated successfully", profile))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All profiles, newest first", body = [Profile]),
        (status = 403, description = "Administrator access required")
    ),
    tag = "Profiles",
    security(("bearerAuth" = []))
)]
pub async fn list_profiles(
    State(pool): State<PgPool>,
) -> Result<ApiResponse<Vec<Profile>>, ApiResponse<()>> {
    let profiles = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::internal("Failed to retrieve profiles", e))?;

    Ok(ApiResponse::success(StatusCode::OK, "Profiles retrieved successfully", profiles))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Single profile", body = Profile),
        (status = 404, description = "Profile not found")
    ),
    tag = "Profiles",
    security(("bearerAuth" = []))
)]
pub async fn get_profile(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Profile>, ApiResponse<()>> {
    let profile = find_by_id(&pool, id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve profile", e))?
        .ok_or_else(|| ApiResponse::not_found("Profile not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Profile retrieved successfully", profile))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(get_my_profile, update_my_profile, list_profiles, get_profile),
    components(schemas(Profile, UpdateProfile)),
    tags(
        (name = "Profiles", description = "User profiles")
    )
)]
pub struct ProfileDoc;
