use std::future::Future;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::db::models::addon_request::NewAddonRequest;
use crate::db::models::status::RequestKind;
use crate::db::models::website_request::NewWebsiteRequest;
use crate::utils::api_response::ApiResponse;

/// Header a client echoes back to group anonymous submissions under the
/// draft the server issued.
pub const DRAFT_HEADER: &str = "x-draft-token";

/// Where anonymous submitters are sent to create a session.
pub const SIGNUP_REDIRECT: &str = "/signup";

/// A validated form submitted before the visitor had a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PendingSubmission {
    Website(NewWebsiteRequest),
    Addon(NewAddonRequest),
}

impl PendingSubmission {
    pub fn kind(&self) -> RequestKind {
        match self {
            PendingSubmission::Website(_) => RequestKind::Website,
            PendingSubmission::Addon(_) => RequestKind::Addon,
        }
    }
}

/// Forms parked until sign-in, keyed by draft id and request kind. Each
/// draft holds at most one submission per kind; stashing again replaces it.
#[derive(Clone)]
pub struct PendingDrafts {
    cache: Cache<(Uuid, RequestKind), PendingSubmission>,
    ttl: Duration,
}

impl PendingDrafts {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(100_000)
                .build(),
            ttl,
        }
    }

    pub fn stash(&self, draft_id: Uuid, submission: PendingSubmission) {
        let kind = submission.kind();
        self.cache.insert((draft_id, kind), submission);
        info!(%draft_id, %kind, "Parked submission until sign-in");
    }

    #[cfg(test)]
    pub fn get(&self, draft_id: Uuid, kind: RequestKind) -> Option<PendingSubmission> {
        self.cache.get(&(draft_id, kind))
    }

    /// Removes and returns everything parked under `draft_id`.
    pub fn take(&self, draft_id: Uuid) -> Vec<PendingSubmission> {
        RequestKind::ALL
            .into_iter()
            .filter_map(|kind| self.cache.remove(&(draft_id, kind)))
            .collect()
    }

    /// Drains the draft and hands each submission to `write` once. Entries
    /// are gone from the cache whether or not the write succeeds.
    pub async fn adopt_with<F, Fut>(&self, draft_id: Uuid, mut write: F) -> DraftAdoption
    where
        F: FnMut(PendingSubmission) -> Fut,
        Fut: Future<Output = Result<Uuid, sqlx::Error>>,
    {
        let mut adoption = DraftAdoption::default();
        for submission in self.take(draft_id) {
            let kind = submission.kind();
            match write(submission).await {
                Ok(id) => {
                    info!(%draft_id, %kind, request_id = %id, "Adopted parked submission");
                    adoption.created.push(AdoptedRequest { kind, id });
                }
                Err(e) => {
                    error!(%draft_id, %kind, "Failed to write parked submission: {e}");
                    adoption.failed.push(kind);
                }
            }
        }
        adoption
    }
}

/// Reply to an anonymous submission: nothing was written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DraftParked {
    /// Send back in `x-draft-token` on later submissions and as
    /// `draft_token` when signing in.
    pub draft_token: String,
    pub kind: RequestKind,
    pub redirect: String,
}

/// Signed draft handle. Only ids the server minted are ever honoured, so a
/// client cannot write into a draft it was not given.
#[derive(Debug, Serialize, Deserialize)]
struct DraftClaims {
    draft: Uuid,
    exp: usize,
}

pub fn issue_draft_token(draft_id: Uuid, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = chrono::Utc::now().timestamp() as usize + ttl.as_secs() as usize;
    encode(
        &Header::default(),
        &DraftClaims { draft: draft_id, exp },
        &EncodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
    )
}

/// `None` for tampered, expired or foreign tokens.
pub fn verify_draft_token(token: &str) -> Option<Uuid> {
    decode::<DraftClaims>(
        token.trim(),
        &DecodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.draft)
    .map_err(|e| warn!("Ignoring draft token: {e}"))
    .ok()
}

/// Reuses the caller's draft when it sent a token we issued.
pub fn draft_id_from(headers: &HeaderMap) -> Uuid {
    headers
        .get(DRAFT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(verify_draft_token)
        .unwrap_or_else(Uuid::new_v4)
}

/// Parks a validated submission and tells the client to sign up.
pub fn park(
    drafts: &PendingDrafts,
    headers: &HeaderMap,
    submission: PendingSubmission,
) -> Result<ApiResponse<DraftParked>, ApiResponse<()>> {
    let draft_id = draft_id_from(headers);
    let draft_token = issue_draft_token(draft_id, drafts.ttl)
        .map_err(|e| ApiResponse::internal("Failed to save your request", e))?;
    let kind = submission.kind();
    drafts.stash(draft_id, submission);
    Ok(ApiResponse::success(
        StatusCode::ACCEPTED,
        "Sign up to submit your request",
        DraftParked {
            draft_token,
            kind,
            redirect: SIGNUP_REDIRECT.to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AdoptedRequest {
    pub kind: RequestKind,
    pub id: Uuid,
}

/// Outcome of writing a draft after sign-in.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DraftAdoption {
    pub created: Vec<AdoptedRequest>,
    pub failed: Vec<RequestKind>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn website(details: &str) -> PendingSubmission {
        PendingSubmission::Website(NewWebsiteRequest {
            template_id: "personal-blog".into(),
            template_style: None,
            contact_name: "Ada".into(),
            contact_email: "ada@example.com".into(),
            contact_phone: None,
            request_details: details.into(),
        })
    }

    fn addon() -> PendingSubmission {
        PendingSubmission::Addon(NewAddonRequest {
            addon_type: "seo".into(),
            request_details: "Meta tags".into(),
        })
    }

    #[test]
    fn one_submission_per_kind() {
        let drafts = PendingDrafts::new(Duration::from_secs(60));
        let draft = Uuid::new_v4();

        drafts.stash(draft, website("first"));
        drafts.stash(draft, website("second"));
        drafts.stash(draft, addon());

        assert_eq!(drafts.get(draft, RequestKind::Website), Some(website("second")));
        assert_eq!(drafts.take(draft).len(), 2);
        assert!(drafts.take(draft).is_empty());
    }

    #[test]
    fn issued_draft_token_is_reused() {
        Config::init_for_tests();
        let draft = Uuid::new_v4();
        let token = issue_draft_token(draft, Duration::from_secs(60)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(DRAFT_HEADER, token.parse().unwrap());
        assert_eq!(draft_id_from(&headers), draft);
    }

    #[test]
    fn client_chosen_draft_ids_are_not_honoured() {
        Config::init_for_tests();
        let victim = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(DRAFT_HEADER, victim.to_string().parse().unwrap());
        assert_ne!(draft_id_from(&headers), victim);

        let forged = encode(
            &Header::default(),
            &DraftClaims { draft: victim, exp: chrono::Utc::now().timestamp() as usize + 60 },
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();
        assert_eq!(verify_draft_token(&forged), None);
    }

    #[test]
    fn parking_answers_with_signup_redirect() {
        Config::init_for_tests();
        let drafts = PendingDrafts::new(Duration::from_secs(60));
        let resp = park(&drafts, &HeaderMap::new(), addon()).unwrap();
        assert_eq!(resp.status_code, 202);
        let parked = resp.data.unwrap();
        assert_eq!(parked.redirect, "/signup");
        assert_eq!(parked.kind, RequestKind::Addon);
        let draft = verify_draft_token(&parked.draft_token).unwrap();
        assert_eq!(drafts.get(draft, RequestKind::Addon), Some(addon()));
    }

    #[test]
    fn drafts_are_isolated() {
        let drafts = PendingDrafts::new(Duration::from_secs(60));
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        drafts.stash(a, addon());
        assert!(drafts.take(b).is_empty());
        assert_eq!(drafts.take(a), vec![addon()]);
    }

    #[tokio::test]
    async fn adoption_writes_each_submission_exactly_once() {
        let drafts = PendingDrafts::new(Duration::from_secs(60));
        let draft = Uuid::new_v4();
        drafts.stash(draft, website("Build me a blog"));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let adoption = drafts
            .adopt_with(draft, move |submission| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert_eq!(submission.kind(), RequestKind::Website);
                    Ok(Uuid::new_v4())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(adoption.created.len(), 1);
        assert!(adoption.failed.is_empty());
        assert_eq!(drafts.get(draft, RequestKind::Website), None);

        let again = drafts
            .adopt_with(draft, |_| async { Ok(Uuid::new_v4()) })
            .await;
        assert_eq!(again, DraftAdoption::default());
    }

    #[tokio::test]
    async fn failed_writes_are_reported_and_not_retried() {
        let drafts = PendingDrafts::new(Duration::from_secs(60));
        let draft = Uuid::new_v4();
        drafts.stash(draft, addon());

        let adoption = drafts
            .adopt_with(draft, |_| async { Err(sqlx::Error::RowNotFound) })
            .await;
        assert_eq!(adoption.failed, vec![RequestKind::Addon]);
        assert!(drafts.take(draft).is_empty());
    }
}
