// src/db/models/website_request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::db::models::profile::OwnerSummary;
use crate::db::models::status::{RequestStatus, TransitionAction, TransitionError};
use crate::db::models::template;
use crate::utils::status_badge::StatusBadge;
use crate::utils::validation::{non_blank, ValidationError, Validator};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "website_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WebsiteRequestStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl RequestStatus for WebsiteRequestStatus {
    const PENDING: Self = Self::Pending;
    const ACTIVE: Self = Self::InProgress;
    const COMPLETED: Self = Self::Completed;
    const REJECTED: Self = Self::Rejected;

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

/// How a delivered site is billed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type, ToSchema)]
#[sqlx(type_name = "website_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WebsiteType {
    #[default]
    OneTime,
    Subscription,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, ToSchema)]
pub struct WebsiteRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: String,
    pub template_style: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub request_details: String,
    pub status: WebsiteRequestStatus,
    pub admin_notes: Option<String>,
    pub website_url: Option<String>,
    pub website_type: Option<WebsiteType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebsiteRequest {
    /// Requests are only ever shown to the profile that submitted them;
    /// reviewers go through the admin routes.
    pub fn is_owned_by(&self, caller: Uuid) -> bool {
        self.user_id == caller
    }
}

/// Row joined with the owner's contact fields for the admin list.
#[derive(Debug, sqlx::FromRow)]
pub struct WebsiteRequestWithOwner {
    #[sqlx(flatten)]
    pub request: WebsiteRequest,
    #[sqlx(flatten)]
    pub owner: OwnerSummary,
}

/// Submission form. Missing fields deserialize as blank so they surface as
/// validation errors rather than JSON rejections.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(default)]
pub struct NewWebsiteRequest {
    pub template_id: String,
    pub template_style: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub request_details: String,
}

impl NewWebsiteRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required("template_id", &self.template_id)
            .check(
                "template_id",
                template::find(self.template_id.trim()).is_some(),
                "is not a known template",
            )
            .required("contact_name", &self.contact_name)
            .email("contact_email", &self.contact_email)
            .required("request_details", &self.request_details)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct WebsiteRequestTransition {
    pub action: TransitionAction,
    pub admin_notes: Option<String>,
    pub website_url: Option<String>,
    pub website_type: Option<WebsiteType>,
}

/// Column values an admin transition writes. `None` leaves the column as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteRequestUpdate {
    pub expected: WebsiteRequestStatus,
    pub status: WebsiteRequestStatus,
    pub admin_notes: Option<String>,
    pub website_url: Option<String>,
    pub website_type: Option<WebsiteType>,
}

impl WebsiteRequestTransition {
    /// Works out what the update writes given the row's current status.
    /// Completion fields are only carried when the result is `completed`.
    pub fn plan(
        &self,
        current: WebsiteRequestStatus,
    ) -> Result<WebsiteRequestUpdate, TransitionError> {
        let status = current.apply(self.action)?;

        let (website_url, website_type) = if status == WebsiteRequestStatus::Completed {
            let url = non_blank(self.website_url.as_deref())
                .ok_or(TransitionError::MissingWebsiteUrl)?;
            (Some(url), Some(self.website_type.unwrap_or_default()))
        } else {
            (None, None)
        };

        Ok(WebsiteRequestUpdate {
            expected: current,
            status,
            admin_notes: non_blank(self.admin_notes.as_deref()),
            website_url,
            website_type,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebsiteRequestView {
    #[serde(flatten)]
    pub request: WebsiteRequest,
    pub badge: StatusBadge,
}

impl From<WebsiteRequest> for WebsiteRequestView {
    fn from(request: WebsiteRequest) -> Self {
        let badge = StatusBadge::for_website(request.status);
        Self { request, badge }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminWebsiteRequestView {
    #[serde(flatten)]
    pub request: WebsiteRequest,
    pub owner: OwnerSummary,
    pub badge: StatusBadge,
    pub actions: Vec<TransitionAction>,
}

impl From<WebsiteRequestWithOwner> for AdminWebsiteRequestView {
    fn from(row: WebsiteRequestWithOwner) -> Self {
        let badge = StatusBadge::for_website(row.request.status);
        let actions = row.request.status.available_actions();
        Self {
            request: row.request,
            owner: row.owner,
            badge,
            actions,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WebsiteRequestFilter {
    /// Status tab; omit for every status.
    pub status: Option<WebsiteRequestStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewWebsiteRequest {
        NewWebsiteRequest {
            template_id: "business-modern".into(),
            template_style: Some("modern".into()),
            contact_name: "Ada".into(),
            contact_email: "ada@example.com".into(),
            contact_phone: None,
            request_details: "Swap the hero photo".into(),
        }
    }

    fn complete_with(url: Option<&str>) -> WebsiteRequestTransition {
        WebsiteRequestTransition {
            action: TransitionAction::Complete,
            admin_notes: None,
            website_url: url.map(str::to_string),
            website_type: None,
        }
    }

    #[test]
    fn complete_form_validates() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn each_required_field_is_enforced() {
        let mut missing = form();
        missing.request_details = "  ".into();
        missing.contact_name.clear();
        let err = missing.validate().unwrap_err();
        assert_eq!(
            err.fields().copied().collect::<Vec<_>>(),
            vec!["contact_name", "request_details"]
        );
    }

    #[test]
    fn unknown_template_is_rejected() {
        let mut bad = form();
        bad.template_id = "does-not-exist".into();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.0.get("template_id"), Some(&"is not a known template"));
    }

    #[test]
    fn missing_body_fields_deserialize_blank() {
        let parsed: NewWebsiteRequest = serde_json::from_str(r#"{"template_id":"x"}"#).unwrap();
        assert!(parsed.contact_name.is_empty());
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn reject_leaves_completion_fields_untouched() {
        let body = WebsiteRequestTransition {
            action: TransitionAction::Reject,
            admin_notes: Some("Out of scope".into()),
            website_url: Some("https://ignored.example".into()),
            website_type: Some(WebsiteType::Subscription),
        };
        let update = body.plan(WebsiteRequestStatus::Pending).unwrap();
        assert_eq!(update.status, WebsiteRequestStatus::Rejected);
        assert_eq!(update.admin_notes.as_deref(), Some("Out of scope"));
        assert_eq!(update.website_url, None);
        assert_eq!(update.website_type, None);
    }

    #[test]
    fn completion_needs_a_url() {
        let mut body = complete_with(Some("   "));
        assert_eq!(
            body.plan(WebsiteRequestStatus::InProgress),
            Err(TransitionError::MissingWebsiteUrl)
        );
        body.website_url = None;
        assert_eq!(
            body.plan(WebsiteRequestStatus::InProgress),
            Err(TransitionError::MissingWebsiteUrl)
        );

        body.website_url = Some(" https://ada.example ".into());
        let update = body.plan(WebsiteRequestStatus::InProgress).unwrap();
        assert_eq!(update.status, WebsiteRequestStatus::Completed);
        assert_eq!(update.expected, WebsiteRequestStatus::InProgress);
        assert_eq!(update.website_url.as_deref(), Some("https://ada.example"));
        assert_eq!(update.website_type, Some(WebsiteType::OneTime));
    }

    fn row(owner: Uuid) -> WebsiteRequest {
        let now = Utc::now();
        WebsiteRequest {
            id: Uuid::new_v4(),
            user_id: owner,
            template_id: "business-modern".into(),
            template_style: None,
            contact_name: "Ada".into(),
            contact_email: "ada@example.com".into(),
            contact_phone: None,
            request_details: "Swap the hero photo".into(),
            status: WebsiteRequestStatus::Pending,
            admin_notes: None,
            website_url: None,
            website_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_the_submitter_owns_a_request() {
        let owner = Uuid::new_v4();
        let request = row(owner);
        assert!(request.is_owned_by(owner));
        assert!(!request.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn completing_a_pending_request_is_not_allowed() {
        let body = complete_with(Some("https://ada.example"));
        assert!(matches!(
            body.plan(WebsiteRequestStatus::Pending),
            Err(TransitionError::NotAllowed { from: "pending", .. })
        ));
    }
}
