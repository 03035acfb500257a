use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::utils::api_response::ApiResponse;

/// The two request tables that share the review workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Website,
    Addon,
}

impl RequestKind {
    pub const ALL: [RequestKind; 2] = [RequestKind::Website, RequestKind::Addon];
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Website => f.write_str("website"),
            RequestKind::Addon => f.write_str("addon"),
        }
    }
}

/// Admin actions on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    Accept,
    Reject,
    Complete,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action:?} a request that is {from}")]
    NotAllowed {
        from: &'static str,
        action: TransitionAction,
    },
    #[error("a website URL is required to complete this request")]
    MissingWebsiteUrl,
}

impl From<TransitionError> for ApiResponse<()> {
    fn from(err: TransitionError) -> Self {
        match &err {
            TransitionError::NotAllowed { from, action } => ApiResponse::error(
                StatusCode::CONFLICT,
                err.to_string(),
                Some(json!({ "status": from, "action": action })),
            ),
            TransitionError::MissingWebsiteUrl => ApiResponse::error(
                StatusCode::BAD_REQUEST,
                err.to_string(),
                Some(json!({ "website_url": "is required" })),
            ),
        }
    }
}

/// Forward-only review lifecycle shared by both request kinds.
///
/// ```text
/// pending --accept--> ACTIVE --complete--> completed
/// pending --reject--> rejected
/// ```
///
/// Each kind names its mid-state differently, so implementors supply the four
/// anchor states and the machine is written once here.
pub trait RequestStatus: Copy + Eq + fmt::Debug + 'static {
    const PENDING: Self;
    const ACTIVE: Self;
    const COMPLETED: Self;
    const REJECTED: Self;

    fn as_str(self) -> &'static str;

    fn apply(self, action: TransitionAction) -> Result<Self, TransitionError> {
        let next = match action {
            TransitionAction::Accept if self == Self::PENDING => Some(Self::ACTIVE),
            TransitionAction::Reject if self == Self::PENDING => Some(Self::REJECTED),
            TransitionAction::Complete if self == Self::ACTIVE => Some(Self::COMPLETED),
            _ => None,
        };
        next.ok_or(TransitionError::NotAllowed {
            from: self.as_str(),
            action,
        })
    }

    fn available_actions(self) -> Vec<TransitionAction> {
        [
            TransitionAction::Accept,
            TransitionAction::Reject,
            TransitionAction::Complete,
        ]
        .into_iter()
        .filter(|action| self.apply(*action).is_ok())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::addon_request::AddonRequestStatus;
    use crate::db::models::website_request::WebsiteRequestStatus;

    fn walk<S: RequestStatus>() {
        assert_eq!(S::PENDING.apply(TransitionAction::Accept), Ok(S::ACTIVE));
        assert_eq!(S::PENDING.apply(TransitionAction::Reject), Ok(S::REJECTED));
        assert_eq!(S::ACTIVE.apply(TransitionAction::Complete), Ok(S::COMPLETED));

        assert!(S::PENDING.apply(TransitionAction::Complete).is_err());
        assert!(S::ACTIVE.apply(TransitionAction::Accept).is_err());
        assert!(S::ACTIVE.apply(TransitionAction::Reject).is_err());

        for terminal in [S::COMPLETED, S::REJECTED] {
            assert!(terminal.available_actions().is_empty());
        }
    }

    #[test]
    fn website_lifecycle_is_forward_only() {
        walk::<WebsiteRequestStatus>();
        assert_eq!(
            WebsiteRequestStatus::Pending.available_actions(),
            vec![TransitionAction::Accept, TransitionAction::Reject]
        );
        assert_eq!(
            WebsiteRequestStatus::InProgress.available_actions(),
            vec![TransitionAction::Complete]
        );
    }

    #[test]
    fn addon_lifecycle_is_forward_only() {
        walk::<AddonRequestStatus>();
        assert_eq!(
            AddonRequestStatus::PENDING.apply(TransitionAction::Accept),
            Ok(AddonRequestStatus::Accepted)
        );
    }

    #[test]
    fn rejected_cannot_be_reopened() {
        let err = WebsiteRequestStatus::Rejected
            .apply(TransitionAction::Accept)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::NotAllowed {
                from: "rejected",
                action: TransitionAction::Accept
            }
        );
        let resp: ApiResponse<()> = err.into();
        assert_eq!(resp.status_code, 409);
    }
}
