use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::Claims;
use crate::db::models::addon_request::{
    AddonRequest, AddonRequestFilter, AddonRequestStatus, AddonRequestTransition,
    AddonRequestUpdate, AddonRequestView, AddonRequestWithOwner, AdminAddonRequestView,
    NewAddonRequest,
};
use crate::middleware::auth::MaybeSession;
use crate::utils::api_response::ApiResponse;
use crate::utils::pending::{self, DraftParked, PendingDrafts, PendingSubmission};

const COLUMNS: &str =
    "id, user_id, addon_type, request_details, status, admin_notes, created_at, updated_at";

const JOINED_COLUMNS: &str = "ar.id, ar.user_id, ar.addon_type, ar.request_details, ar.status, \
    ar.admin_notes, ar.created_at, ar.updated_at, \
    p.name AS owner_name, p.email AS owner_email, p.phone AS owner_phone";

pub async fn insert_addon_request(
    pool: &PgPool,
    owner: Uuid,
    form: &NewAddonRequest,
) -> Result<AddonRequest, sqlx::Error> {
    sqlx::query_as::<_, AddonRequest>(&format!(
        "INSERT INTO addon_requests (id, user_id, addon_type, request_details, status)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(owner)
    .bind(form.addon_type.trim())
    .bind(form.request_details.trim())
    .bind(AddonRequestStatus::Pending)
    .fetch_one(pool)
    .await
}

pub async fn find_addon_request(pool: &PgPool, id: Uuid) -> Result<Option<AddonRequest>, sqlx::Error> {
    sqlx::query_as::<_, AddonRequest>(&format!("SELECT {COLUMNS} FROM addon_requests WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_addon_request_with_owner(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<AddonRequestWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, AddonRequestWithOwner>(&format!(
        "SELECT {JOINED_COLUMNS}
         FROM addon_requests ar
         JOIN profiles p ON p.id = ar.user_id
         WHERE ar.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn apply_addon_update(
    pool: &PgPool,
    id: Uuid,
    update: &AddonRequestUpdate,
) -> Result<Option<AddonRequest>, sqlx::Error> {
    sqlx::query_as::<_, AddonRequest>(&format!(
        "UPDATE addon_requests
         SET status = $1, admin_notes = COALESCE($2, admin_notes), updated_at = NOW()
         WHERE id = $3 AND status = $4
         RETURNING {COLUMNS}"
    ))
    .bind(update.status)
    .bind(&update.admin_notes)
    .bind(id)
    .bind(update.expected)
    .fetch_optional(pool)
    .await
}

#[utoipa::path(
    post,
    path = "/addon-requests",
    request_body = NewAddonRequest,
    params(("x-draft-token" = Option<String>, Header, description = "Draft token from an earlier parked submission")),
    responses(
        (status = 201, description = "Add-on request submitted", body = AddonRequestView),
        (status = 202, description = "No session: form parked, sign up to submit", body = DraftParked),
        (status = 400, description = "Missing required fields"),
        (status = 500, description = "Failed to submit request")
    ),
    tag = "Add-on Requests"
)]
pub async fn create_addon_request(
    State(pool): State<PgPool>,
    State(drafts): State<PendingDrafts>,
    MaybeSession(session): MaybeSession,
    headers: HeaderMap,
    Json(form): Json<NewAddonRequest>,
) -> Result<Response, ApiResponse<()>> {
    form.validate()?;

    let Some(claims) = session else {
        return Ok(pending::park(&drafts, &headers, PendingSubmission::Addon(form))?.into_response());
    };
    let owner = claims.user_id()?;

    let request = insert_addon_request(&pool, owner, &form)
        .await
        .map_err(|e| ApiResponse::internal("Failed to submit request", e))?;

    info!("Add-on request {} ({}) submitted by {}", request.id, request.addon_type, owner);
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Add-on request submitted",
        AddonRequestView::from(request),
    )
    .into_response())
}

#[utoipa::path(
    get,
    path = "/addon-requests/me",
    responses(
        (status = 200, description = "Caller's add-on requests, newest first", body = [AddonRequestView]),
        (status = 500, description = "Failed to retrieve requests")
    ),
    tag = "Add-on Requests",
    security(("bearerAuth" = []))
)]
pub async fn list_my_addon_requests(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Vec<AddonRequestView>>, ApiResponse<()>> {
    let owner = claims.user_id()?;
    let requests = sqlx::query_as::<_, AddonRequest>(&format!(
        "SELECT {COLUMNS} FROM addon_requests WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(owner)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::internal("Failed to retrieve requests", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Add-on requests",
        requests.into_iter().map(AddonRequestView::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/addon-requests/{id}",
    params(("id" = Uuid, Path, description = "Add-on request ID")),
    responses(
        (status = 200, description = "Request retrieved", body = AddonRequestView),
        (status = 404, description = "Request not found")
    ),
    tag = "Add-on Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_addon_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AddonRequestView>, ApiResponse<()>> {
    let caller = claims.user_id()?;
    let request = find_addon_request(&pool, id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve request", e))?
        // Other users' requests look the same as missing ones.
        .filter(|r| r.is_owned_by(caller))
        .ok_or_else(|| ApiResponse::not_found("Add-on request not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Add-on request retrieved", request.into()))
}

#[utoipa::path(
    get,
    path = "/admin/addon-requests",
    params(AddonRequestFilter),
    responses(
        (status = 200, description = "Add-on requests in the selected tab, newest first", body = [AdminAddonRequestView]),
        (status = 403, description = "Administrator access required"),
        (status = 500, description = "Failed to retrieve requests")
    ),
    tag = "Add-on Requests",
    security(("bearerAuth" = []))
)]
pub async fn admin_list_addon_requests(
    State(pool): State<PgPool>,
    Query(filter): Query<AddonRequestFilter>,
) -> Result<ApiResponse<Vec<AdminAddonRequestView>>, ApiResponse<()>> {
    let rows = sqlx::query_as::<_, AddonRequestWithOwner>(&format!(
        "SELECT {JOINED_COLUMNS}
         FROM addon_requests ar
         JOIN profiles p ON p.id = ar.user_id
         WHERE ($1::addon_request_status IS NULL OR ar.status = $1)
         ORDER BY ar.created_at DESC"
    ))
    .bind(filter.status)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::internal("Failed to retrieve requests", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Add-on requests",
        rows.into_iter().map(AdminAddonRequestView::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/admin/addon-requests/{id}",
    params(("id" = Uuid, Path, description = "Add-on request ID")),
    responses(
        (status = 200, description = "Request with owner contact and available actions", body = AdminAddonRequestView),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Request not found")
    ),
    tag = "Add-on Requests",
    security(("bearerAuth" = []))
)]
pub async fn admin_get_addon_request(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AdminAddonRequestView>, ApiResponse<()>> {
    let row = find_addon_request_with_owner(&pool, id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve request", e))?
        .ok_or_else(|| ApiResponse::not_found("Add-on request not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Add-on request retrieved", row.into()))
}

#[utoipa::path(
    patch,
    path = "/admin/addon-requests/{id}",
    params(("id" = Uuid, Path, description = "Add-on request ID")),
    request_body = AddonRequestTransition,
    responses(
        (status = 200, description = "Status updated", body = AddonRequestView),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Transition not allowed from the current status"),
        (status = 500, description = "Failed to update request")
    ),
    tag = "Add-on Requests",
    security(("bearerAuth" = []))
)]
pub async fn transition_addon_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(body): Json<AddonRequestTransition>,
) -> Result<ApiResponse<AddonRequestView>, ApiResponse<()>> {
    let current = find_addon_request(&pool, id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve request", e))?
        .ok_or_else(|| ApiResponse::not_found("Add-on request not found"))?;

    let update = body.plan(current.status)?;

    let updated = apply_addon_update(&pool, id, &update)
        .await
        .map_err(|e| ApiResponse::internal("Failed to update request", e))?
        .ok_or_else(|| {
            ApiResponse::<()>::error(
                StatusCode::CONFLICT,
                "Request changed while you were reviewing it; refresh and try again",
                None,
            )
        })?;

    info!(
        "Add-on request {} moved {:?} -> {:?} by {}",
        id, update.expected, updated.status, claims.sub
    );
    Ok(ApiResponse::success(StatusCode::OK, "Add-on request updated", updated.into()))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        create_addon_request,
        list_my_addon_requests,
        get_addon_request,
        admin_list_addon_requests,
        admin_get_addon_request,
        transition_addon_request
    ),
    components(schemas(
        AddonRequest,
        NewAddonRequest,
        AddonRequestStatus,
        AddonRequestTransition,
        AddonRequestView,
        AdminAddonRequestView
    )),
    tags(
        (name = "Add-on Requests", description = "Add-on support requests and their review")
    )
)]
pub struct AddonRequestDoc;
