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
use crate::db::models::status::TransitionAction;
use crate::db::models::website_request::{
    AdminWebsiteRequestView, NewWebsiteRequest, WebsiteRequest, WebsiteRequestFilter,
    WebsiteRequestStatus, WebsiteRequestTransition, WebsiteRequestUpdate, WebsiteRequestView,
    WebsiteRequestWithOwner, WebsiteType,
};
use crate::middleware::auth::MaybeSession;
use crate::utils::api_response::ApiResponse;
use crate::utils::pending::{self, DraftParked, PendingDrafts, PendingSubmission};
use crate::utils::validation::non_blank;

const COLUMNS: &str = "id, user_id, template_id, template_style, contact_name, contact_email, \
    contact_phone, request_details, status, admin_notes, website_url, website_type, created_at, updated_at";

const JOINED_COLUMNS: &str = "wr.id, wr.user_id, wr.template_id, wr.template_style, wr.contact_name, \
    wr.contact_email, wr.contact_phone, wr.request_details, wr.status, wr.admin_notes, wr.website_url, \
    wr.website_type, wr.created_at, wr.updated_at, \
    p.name AS owner_name, p.email AS owner_email, p.phone AS owner_phone";

/// Writes a new build request. Status always starts at `pending`.
pub async fn insert_website_request(
    pool: &PgPool,
    owner: Uuid,
    form: &NewWebsiteRequest,
) -> Result<WebsiteRequest, sqlx::Error> {
    sqlx::query_as::<_, WebsiteRequest>(&format!(
        "INSERT INTO website_requests
            (id, user_id, template_id, template_style, contact_name, contact_email, contact_phone, request_details, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(owner)
    .bind(form.template_id.trim())
    .bind(non_blank(form.template_style.as_deref()))
    .bind(form.contact_name.trim())
    .bind(form.contact_email.trim())
    .bind(non_blank(form.contact_phone.as_deref()))
    .bind(form.request_details.trim())
    .bind(WebsiteRequestStatus::Pending)
    .fetch_one(pool)
    .await
}

pub async fn find_website_request(pool: &PgPool, id: Uuid) -> Result<Option<WebsiteRequest>, sqlx::Error> {
    sqlx::query_as::<_, WebsiteRequest>(&format!("SELECT {COLUMNS} FROM website_requests WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_website_request_with_owner(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<WebsiteRequestWithOwner>, sqlx::Error> {
    sqlx::query_as::<_, WebsiteRequestWithOwner>(&format!(
        "SELECT {JOINED_COLUMNS}
         FROM website_requests wr
         JOIN profiles p ON p.id = wr.user_id
         WHERE wr.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Applies an admin transition only if the row is still in the status the
/// plan was made from. `None` means someone else moved it first.
pub async fn apply_website_update(
    pool: &PgPool,
    id: Uuid,
    update: &WebsiteRequestUpdate,
) -> Result<Option<WebsiteRequest>, sqlx::Error> {
    sqlx::query_as::<_, WebsiteRequest>(&format!(
        "UPDATE website_requests
         SET status = $1,
             admin_notes = COALESCE($2, admin_notes),
             website_url = COALESCE($3, website_url),
             website_type = COALESCE($4, website_type),
             updated_at = NOW()
         WHERE id = $5 AND status = $6
         RETURNING {COLUMNS}"
    ))
    .bind(update.status)
    .bind(&update.admin_notes)
    .bind(&update.website_url)
    .bind(update.website_type)
    .bind(id)
    .bind(update.expected)
    .fetch_optional(pool)
    .await
}

#[utoipa::path(
    post,
    path = "/website-requests",
    request_body = NewWebsiteRequest,
    params(("x-draft-token" = Option<String>, Header, description = "Draft token from an earlier parked submission")),
    responses(
        (status = 201, description = "Request submitted", body = WebsiteRequestView),
        (status = 202, description = "No session: form parked, sign up to submit", body = DraftParked),
        (status = 400, description = "Missing required fields"),
        (status = 500, description = "Failed to submit request")
    ),
    tag = "Website Requests"
)]
pub async fn create_website_request(
    State(pool): State<PgPool>,
    State(drafts): State<PendingDrafts>,
    MaybeSession(session): MaybeSession,
    headers: HeaderMap,
    Json(form): Json<NewWebsiteRequest>,
) -> Result<Response, ApiResponse<()>> {
    form.validate()?;

    let Some(claims) = session else {
        return Ok(pending::park(&drafts, &headers, PendingSubmission::Website(form))?.into_response());
    };
    let owner = claims.user_id()?;

    let request = insert_website_request(&pool, owner, &form)
        .await
        .map_err(|e| ApiResponse::internal("Failed to submit request", e))?;

    info!("Website request {} submitted by {}", request.id, owner);
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Request submitted",
        WebsiteRequestView::from(request),
    )
    .into_response())
}

#[utoipa::path(
    get,
    path = "/website-requests/me",
    responses(
        (status = 200, description = "Caller's requests, newest first", body = [WebsiteRequestView]),
        (status = 500, description = "Failed to retrieve requests")
    ),
    tag = "Website Requests",
    security(("bearerAuth" = []))
)]
pub async fn list_my_website_requests(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<Vec<WebsiteRequestView>>, ApiResponse<()>> {
    let owner = claims.user_id()?;
    let requests = sqlx::query_as::<_, WebsiteRequest>(&format!(
        "SELECT {COLUMNS} FROM website_requests WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(owner)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::internal("Failed to retrieve requests", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Website requests",
        requests.into_iter().map(WebsiteRequestView::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/website-requests/{id}",
    params(("id" = Uuid, Path, description = "Website request ID")),
    responses(
        (status = 200, description = "Request retrieved", body = WebsiteRequestView),
        (status = 404, description = "Request not found")
    ),
    tag = "Website Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_website_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<WebsiteRequestView>, ApiResponse<()>> {
    let caller = claims.user_id()?;
    let request = find_website_request(&pool, id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve request", e))?
        // Other users' requests look the same as missing ones.
        .filter(|r| r.is_owned_by(caller))
        .ok_or_else(|| ApiResponse::not_found("Website request not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Website request retrieved", request.into()))
}

#[utoipa::path(
    get,
    path = "/admin/website-requests",
    params(WebsiteRequestFilter),
    responses(
        (status = 200, description = "Requests in the selected tab, newest first", body = [AdminWebsiteRequestView]),
        (status = 403, description = "Administrator access required"),
        (status = 500, description = "Failed to retrieve requests")
    ),
    tag = "Website Requests",
    security(("bearerAuth" = []))
)]
pub async fn admin_list_website_requests(
    State(pool): State<PgPool>,
    Query(filter): Query<WebsiteRequestFilter>,
) -> Result<ApiResponse<Vec<AdminWebsiteRequestView>>, ApiResponse<()>> {
    let rows = sqlx::query_as::<_, WebsiteRequestWithOwner>(&format!(
        "SELECT {JOINED_COLUMNS}
         FROM website_requests wr
         JOIN profiles p ON p.id = wr.user_id
         WHERE ($1::website_request_status IS NULL OR wr.status = $1)
         ORDER BY wr.created_at DESC"
    ))
    .bind(filter.status)
    .fetch_all(&pool)
    .await
    .map_err(|e| ApiResponse::internal("Failed to retrieve requests", e))?;

    Ok(ApiResponse::success(
        StatusCode::OK,
        "Website requests",
        rows.into_iter().map(AdminWebsiteRequestView::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/admin/website-requests/{id}",
    params(("id" = Uuid, Path, description = "Website request ID")),
    responses(
        (status = 200, description = "Request with owner contact and available actions", body = AdminWebsiteRequestView),
        (status = 403, description = "Administrator access required"),
        (status = 404, description = "Request not found")
    ),
    tag = "Website Requests",
    security(("bearerAuth" = []))
)]
pub async fn admin_get_website_request(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AdminWebsiteRequestView>, ApiResponse<()>> {
    let row = find_website_request_with_owner(&pool, id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve request", e))?
        .ok_or_else(|| ApiResponse::not_found("Website request not found"))?;

    Ok(ApiResponse::success(StatusCode::OK, "Website request retrieved", row.into()))
}

#[utoipa::path(
    patch,
    path = "/admin/website-requests/{id}",
    params(("id" = Uuid, Path, description = "Website request ID")),
    request_body = WebsiteRequestTransition,
    responses(
        (status = 200, description = "Status updated", body = WebsiteRequestView),
        (status = 400, description = "Website URL missing when completing"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Transition not allowed from the current status"),
        (status = 500, description = "Failed to update request")
    ),
    tag = "Website Requests",
    security(("bearerAuth" = []))
)]
pub async fn transition_website_request(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(body): Json<WebsiteRequestTransition>,
) -> Result<ApiResponse<WebsiteRequestView>, ApiResponse<()>> {
    let current = find_website_request(&pool, id)
        .await
        .map_err(|e| ApiResponse::internal("Failed to retrieve request", e))?
        .ok_or_else(|| ApiResponse::not_found("Website request not found"))?;

    let update = body.plan(current.status)?;

    let updated = apply_website_update(&pool, id, &update)
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
        "Website request {} moved {:?} -> {:?} by {}",
        id, update.expected, updated.status, claims.sub
    );
    Ok(ApiResponse::success(StatusCode::OK, "Website request updated", updated.into()))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        create_website_request,
        list_my_website_requests,
        get_website_request,
        admin_list_website_requests,
        admin_get_website_request,
        transition_website_request
    ),
    components(schemas(
        WebsiteRequest,
        NewWebsiteRequest,
        WebsiteRequestStatus,
        WebsiteType,
        WebsiteRequestTransition,
        WebsiteRequestView,
        AdminWebsiteRequestView,
        TransitionAction,
        DraftParked
    )),
    tags(
        (name = "Website Requests", description = "Website build requests and their review")
    )
)]
pub struct WebsiteRequestDoc;
