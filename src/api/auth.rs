use axum::{extract::State, http::StatusCode, routing::{get, post}, Extension, Json, Router};
use bcrypt::{hash, verify, DEFAULT_COST};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::config::Config;
use crate::db::models::profile::Profile;
use crate::db::queries::{addon_requests, profile, website_requests};
use crate::utils::api_response::ApiResponse;
use crate::utils::pending::{self, DraftAdoption, PendingDrafts, PendingSubmission};
use crate::utils::validation::{non_blank, Validator};

/// Where a signed-in user lands when no destination was requested.
pub const DEFAULT_REDIRECT: &str = "/dashboard";

/// JWT Claims used for authentication.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - profile id
    pub sub: String,
    pub email: String,
    /// Admin flag at sign-in time. Admin routes re-check the profile.
    pub is_admin: bool,
    /// Expiration timestamp (UNIX TIME)
    pub exp: usize,
}

impl Claims {
    /// Parses `sub` as the profile id, or returns a descriptive error.
    pub fn user_id(&self) -> Result<Uuid, ApiResponse<()>> {
        self.sub.parse::<Uuid>().map_err(|_| {
            ApiResponse::error(StatusCode::UNAUTHORIZED, "Invalid user ID format in token", None)
        })
    }

    pub fn for_profile(profile: &Profile, config: &Config) -> Self {
        Claims {
            sub: profile.id.to_string(),
            email: profile.email.clone(),
            is_admin: profile.is_admin,
            exp: chrono::Utc::now().timestamp() as usize + config.token_ttl.as_secs() as usize,
        }
    }
}

pub fn issue_token(claims: &Claims, config: &Config) -> Result<String, ApiResponse<()>> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiResponse::internal("Token generation failed", e))
}

/// Represents a request to register a new user.
#[derive(Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    /// Draft token handed out when forms were submitted before sign-up.
    pub draft_token: Option<String>,
    /// Page to return to after sign-up.
    pub redirect_to: Option<String>,
}

/// Represents a request to log in.
#[derive(Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub draft_token: Option<String>,
    pub redirect_to: Option<String>,
}

/// Returned by both sign-in and sign-up.
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: Uuid,
    pub is_admin: bool,
    /// Where the client should navigate next.
    pub redirect: String,
    /// Parked submissions written on behalf of the user.
    pub adopted: DraftAdoption,
}

#[derive(Serialize, ToSchema)]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// Only same-site paths are honoured as post-sign-in destinations.
pub fn resolve_redirect(requested: Option<&str>) -> String {
    match non_blank(requested) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => DEFAULT_REDIRECT.to_string(),
    }
}

/// Handles user login
///
/// # Returns
/// * `200 OK` - JWT plus any parked submissions now written for the user.
/// * `401 Unauthorized` - If credentials are incorrect.
/// * `500 Internal Server Error` - If a database or token generation error occurs.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn login(
    State(pool): State<PgPool>,
    State(drafts): State<PendingDrafts>,
    Json(payload): Json<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiResponse<()>> {
    let invalid = || ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Invalid email or password.", None);

    let email = payload.email.trim().to_lowercase();
    let Some(user) = profile::find_by_email(&pool, &email)
        .await
        .map_err(|e| ApiResponse::internal("Database error", e))?
    else {
        warn!("❌ Login attempt for unknown email: {}", email);
        return Err(invalid());
    };

    if !verify(&payload.password, &user.password_hash).unwrap_or(false) {
        warn!("❌ Invalid password attempt for: {}", email);
        return Err(invalid());
    }

    info!("✅ Login successful for: {}", email);
    let body = finish_sign_in(&pool, &drafts, &user, payload.draft_token.as_deref(), payload.redirect_to.as_deref()).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Signed in", body))
}

/// Handles user registration.
///
/// # Returns
/// * `201 Created` - Profile created, session issued.
/// * `400 Bad Request` - Missing name, email or password.
/// * `409 Conflict` - If the email is already registered.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "Authentication",
    responses(
        (status = 201, description = "Registered and signed in", body = AuthResponse),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn register(
    State(pool): State<PgPool>,
    State(drafts): State<PendingDrafts>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiResponse<()>> {
    Validator::new()
        .required("name", &payload.name)
        .email("email", &payload.email)
        .check("password", payload.password.len() >= 8, "must be at least 8 characters")
        .finish()?;

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| ApiResponse::internal("Password hashing failed", e))?;

    let new_profile = profile::NewProfile {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        phone: non_blank(payload.phone.as_deref()),
        password_hash,
    };

    let user = profile::insert_profile(&pool, &new_profile).await.map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return ApiResponse::<()>::error(StatusCode::CONFLICT, "Email already registered", None);
            }
        }
        ApiResponse::internal("Failed to create profile", e)
    })?;

    info!("✅ Registered profile {}", user.id);
    let body = finish_sign_in(&pool, &drafts, &user, payload.draft_token.as_deref(), payload.redirect_to.as_deref()).await?;
    Ok(ApiResponse::success(StatusCode::CREATED, "Registered", body))
}

/// Issues the session and writes any forms parked under the draft token.
async fn finish_sign_in(
    pool: &PgPool,
    drafts: &PendingDrafts,
    user: &Profile,
    draft_token: Option<&str>,
    redirect_to: Option<&str>,
) -> Result<AuthResponse, ApiResponse<()>> {
    let config = Config::get();
    let token = issue_token(&Claims::for_profile(user, &config), &config)?;

    let adopted = match draft_token.and_then(pending::verify_draft_token) {
        Some(draft_id) => {
            let owner = user.id;
            drafts
                .adopt_with(draft_id, |submission| write_submission(pool, owner, submission))
                .await
        }
        None => DraftAdoption::default(),
    };

    Ok(AuthResponse {
        token,
        user_id: user.id,
        is_admin: user.is_admin,
        redirect: resolve_redirect(redirect_to),
        adopted,
    })
}

async fn write_submission(
    pool: &PgPool,
    owner: Uuid,
    submission: PendingSubmission,
) -> Result<Uuid, sqlx::Error> {
    match submission {
        PendingSubmission::Website(form) => website_requests::insert_website_request(pool, owner, &form)
            .await
            .map(|row| row.id),
        PendingSubmission::Addon(form) => addon_requests::insert_addon_request(pool, owner, &form)
            .await
            .map(|row| row.id),
    }
}

/// Current-session lookup.
#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "Authentication",
    responses(
        (status = 200, description = "Session details", body = SessionInfo),
        (status = 401, description = "No session")
    ),
    security(("bearerAuth" = []))
)]
pub async fn session(
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<SessionInfo>, ApiResponse<()>> {
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Session active",
        SessionInfo {
            user_id: claims.user_id()?,
            email: claims.email.clone(),
            is_admin: claims.is_admin,
        },
    ))
}

/// Public authentication routes.
///
/// # Routes
/// - `POST /auth/register` → Create a profile and sign in.
/// - `POST /auth/login` → Authenticate and return a JWT.
///
/// Both accept `draft_token` to write forms submitted before the visitor had a
/// session:
/// ```sh
/// curl -X POST http://localhost:3000/auth/login -H "Content-Type: application/json" \
///   -d '{"email": "ada@example.com", "password": "hunter22", "draft_token": "<token>"}'
/// ```
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Session-protected authentication routes.
pub fn secure_auth_routes() -> Router<AppState> {
    Router::new().route("/auth/session", get(session))
}

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::openapi::Components;
use utoipa::Modify;
use utoipa::OpenApi;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.clone().unwrap_or(Components::default());
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        openapi.components = Some(components);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(login, register, session),
    components(schemas(LoginRequest, RegisterRequest, AuthResponse, SessionInfo, DraftAdoption)),
    tags(
        (name = "Authentication", description = "Sign-up, sign-in and session lookup")
    ),
    modifiers(&SecurityAddon)
)]
pub struct AuthDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_defaults_to_dashboard() {
        assert_eq!(resolve_redirect(None), "/dashboard");
        assert_eq!(resolve_redirect(Some("  ")), "/dashboard");
        assert_eq!(resolve_redirect(Some("/dashboard/requests")), "/dashboard/requests");
    }

    #[test]
    fn offsite_redirects_are_ignored() {
        assert_eq!(resolve_redirect(Some("https://evil.example")), "/dashboard");
        assert_eq!(resolve_redirect(Some("//evil.example")), "/dashboard");
    }

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let config = Config::init_for_tests();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "ada@example.com".into(),
            is_admin: false,
            exp: chrono::Utc::now().timestamp() as usize + 60,
        };
        let token = issue_token(&claims, &config).unwrap();
        let decoded = jsonwebtoken::decode::<Claims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.user_id().unwrap().to_string(), claims.sub);
    }

    #[test]
    fn session_and_draft_tokens_are_not_interchangeable() {
        let config = Config::init_for_tests();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "ada@example.com".into(),
            is_admin: true,
            exp: chrono::Utc::now().timestamp() as usize + 60,
        };
        let session = issue_token(&claims, &config).unwrap();
        assert_eq!(pending::verify_draft_token(&session), None);

        let draft = pending::issue_draft_token(Uuid::new_v4(), config.pending_draft_ttl).unwrap();
        assert!(jsonwebtoken::decode::<Claims>(
            &draft,
            &jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &jsonwebtoken::Validation::default(),
        )
        .is_err());
    }
}
