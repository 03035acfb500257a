// src/db/models/addon_request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::db::models::profile::OwnerSummary;
use crate::db::models::status::{RequestStatus, TransitionAction, TransitionError};
use crate::utils::status_badge::StatusBadge;
use crate::utils::validation::{non_blank, ValidationError, Validator};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema)]
#[sqlx(type_name = "addon_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AddonRequestStatus {
    Pending,
    Accepted,
    Completed,
    Rejected,
}

impl RequestStatus for AddonRequestStatus {
    const PENDING: Self = Self::Pending;
    const ACTIVE: Self = Self::Accepted;
    const COMPLETED: Self = Self::Completed;
    const REJECTED: Self = Self::Rejected;

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow, ToSchema)]
pub struct AddonRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub addon_type: String,
    pub request_details: String,
    pub status: AddonRequestStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AddonRequest {
    /// Requests are only ever shown to the profile that submitted them;
    /// reviewers go through the admin routes.
    pub fn is_owned_by(&self, caller: Uuid) -> bool {
        self.user_id == caller
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AddonRequestWithOwner {
    #[sqlx(flatten)]
    pub request: AddonRequest,
    #[sqlx(flatten)]
    pub owner: OwnerSummary,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, ToSchema)]
#[serde(default)]
pub struct NewAddonRequest {
    /// Add-on category picked in the form, e.g. `seo` or `logo_design`.
    pub addon_type: String,
    pub request_details: String,
}

impl NewAddonRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required("addon_type", &self.addon_type)
            .required("request_details", &self.request_details)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct AddonRequestTransition {
    pub action: TransitionAction,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonRequestUpdate {
    pub expected: AddonRequestStatus,
    pub status: AddonRequestStatus,
    pub admin_notes: Option<String>,
}

impl AddonRequestTransition {
    pub fn plan(&self, current: AddonRequestStatus) -> Result<AddonRequestUpdate, TransitionError> {
        Ok(AddonRequestUpdate {
            expected: current,
            status: current.apply(self.action)?,
            admin_notes: non_blank(self.admin_notes.as_deref()),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddonRequestView {
    #[serde(flatten)]
    pub request: AddonRequest,
    pub badge: StatusBadge,
}

impl From<AddonRequest> for AddonRequestView {
    fn from(request: AddonRequest) -> Self {
        let badge = StatusBadge::for_addon(request.status);
        Self { request, badge }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminAddonRequestView {
    #[serde(flatten)]
    pub request: AddonRequest,
    pub owner: OwnerSummary,
    pub badge: StatusBadge,
    pub actions: Vec<TransitionAction>,
}

impl From<AddonRequestWithOwner> for AdminAddonRequestView {
    fn from(row: AddonRequestWithOwner) -> Self {
        let badge = StatusBadge::for_addon(row.request.status);
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
pub struct AddonRequestFilter {
    /// Status tab; omit for every status.
    pub status: Option<AddonRequestStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addon_type_and_details_are_required() {
        let err = NewAddonRequest::default().validate().unwrap_err();
        assert_eq!(
            err.fields().copied().collect::<Vec<_>>(),
            vec!["addon_type", "request_details"]
        );

        let ok = NewAddonRequest {
            addon_type: "seo".into(),
            request_details: "Rank for local bakery searches".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn accept_moves_pending_to_accepted_and_keeps_notes() {
        let body = AddonRequestTransition {
            action: TransitionAction::Accept,
            admin_notes: Some("Scheduled for next sprint".into()),
        };
        let update = body.plan(AddonRequestStatus::Pending).unwrap();
        assert_eq!(update.status, AddonRequestStatus::Accepted);
        assert_eq!(update.admin_notes.as_deref(), Some("Scheduled for next sprint"));
    }

    #[test]
    fn blank_notes_are_not_written() {
        let body = AddonRequestTransition {
            action: TransitionAction::Complete,
            admin_notes: Some("  ".into()),
        };
        let update = body.plan(AddonRequestStatus::Accepted).unwrap();
        assert_eq!(update.status, AddonRequestStatus::Completed);
        assert_eq!(update.admin_notes, None);
    }

    #[test]
    fn only_the_submitter_owns_a_request() {
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let request = AddonRequest {
            id: Uuid::new_v4(),
            user_id: owner,
            addon_type: "seo".into(),
            request_details: "Meta tags".into(),
            status: AddonRequestStatus::Accepted,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        };
        assert!(request.is_owned_by(owner));
        assert!(!request.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn completed_requests_stay_completed() {
        let body = AddonRequestTransition {
            action: TransitionAction::Reject,
            admin_notes: None,
        };
        assert!(body.plan(AddonRequestStatus::Completed).is_err());
    }
}
