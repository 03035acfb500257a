use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use moka::sync::Cache; // ✅ High-performance TTL Cache
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use crate::api::auth::Claims;
use crate::app_state::AppState;
use crate::config::Config;
use crate::utils::api_response::ApiResponse;

/// ✅ **Admin flag cache using `moka`**
pub type AdminCache = Arc<Cache<Uuid, bool>>;

/// ✅ **Initialize the `moka` Cache**
pub fn create_admin_cache(ttl: Duration) -> AdminCache {
    Arc::new(Cache::builder().time_to_live(ttl).build())
}

/// Reads `Authorization: Bearer <jwt>`. `Ok(None)` when the header is absent.
fn bearer_claims(headers: &HeaderMap) -> Result<Option<Claims>, Response> {
    let Some(auth_header) = headers.get("Authorization") else {
        return Ok(None);
    };

    let token_str = auth_header.to_str().map_err(|_| {
        warn!("Invalid Authorization header format");
        ApiResponse::<()>::error(StatusCode::BAD_REQUEST, "Invalid Authorization header format", None).into_response()
    })?;

    let token = token_str.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid token format (missing 'Bearer ' prefix)");
        ApiResponse::<()>::error(StatusCode::BAD_REQUEST, "Invalid token format (missing 'Bearer ' prefix)", None).into_response()
    })?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("JWT decoding failed: {:?}", e);
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Invalid token", Some(json!({ "error": e.to_string() }))).into_response()
    })?;

    Ok(Some(token_data.claims))
}

/// ✅ **JWT Middleware** (session required)
pub async fn jwt_middleware(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    let claims = bearer_claims(req.headers())?.ok_or_else(|| {
        warn!("Missing Authorization header on {}", req.uri().path());
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Sign in required", Some(json!({ "redirect": "/signin" }))).into_response()
    })?;

    tracing::debug!("JWT decoded for user {}", claims.sub);
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Session-optional routes: claims are attached when a valid token is sent,
/// anonymous requests pass through, a bad token is still rejected.
pub async fn optional_jwt_middleware(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    if let Some(claims) = bearer_claims(req.headers())? {
        req.extensions_mut().insert(claims);
    }
    Ok(next.run(req).await)
}

/// Extracts the caller's claims if a session was established upstream.
pub struct MaybeSession(pub Option<Claims>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(parts.extensions.get::<Claims>().cloned()))
    }
}

/// ✅ **Admin Middleware with `moka`**
///
/// The token's `is_admin` claim is not trusted on its own; the profile row is
/// consulted (and cached) so revoked admins lose access within the cache TTL.
pub async fn admin_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let claims = req.extensions().get::<Claims>().cloned().ok_or_else(|| {
        error!("Missing JWT claims in request");
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing JWT claims in request", None).into_response()
    })?;

    let user_id = claims.user_id().map_err(IntoResponse::into_response)?;

    let is_admin = match state.admin_cache.get(&user_id) {
        Some(flag) => flag,
        None => {
            let flag = fetch_admin_flag(user_id, &state.pool).await.map_err(|err| {
                ApiResponse::internal("Failed to load user permissions", err).into_response()
            })?;
            // Unknown users are not cached so a later sign-up is picked up.
            let flag = flag.ok_or_else(|| {
                ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Unknown user", None).into_response()
            })?;
            state.admin_cache.insert(user_id, flag);
            flag
        }
    };

    if !is_admin {
        warn!("Non-admin {} attempted {}", user_id, req.uri().path());
        return Err(ApiResponse::forbidden("Administrator access required").into_response());
    }

    Ok(next.run(req).await)
}

async fn fetch_admin_flag(user_id: Uuid, pool: &PgPool) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT is_admin FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
