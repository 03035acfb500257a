use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::addon_request::AddonRequestStatus;
use crate::db::models::status::{RequestKind, RequestStatus};
use crate::db::models::website_request::WebsiteRequestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    Warning,
    Info,
    Success,
    Destructive,
    Neutral,
}

/// What a status pill shows: text, colour family and icon name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusBadge {
    #[schema(value_type = String)]
    pub label: Cow<'static, str>,
    pub variant: BadgeVariant,
    #[schema(value_type = String)]
    pub icon: &'static str,
}

const WEBSITE_STATUSES: [WebsiteRequestStatus; 4] = [
    WebsiteRequestStatus::Pending,
    WebsiteRequestStatus::InProgress,
    WebsiteRequestStatus::Completed,
    WebsiteRequestStatus::Rejected,
];

const ADDON_STATUSES: [AddonRequestStatus; 4] = [
    AddonRequestStatus::Pending,
    AddonRequestStatus::Accepted,
    AddonRequestStatus::Completed,
    AddonRequestStatus::Rejected,
];

const fn badge(label: &'static str, variant: BadgeVariant, icon: &'static str) -> StatusBadge {
    StatusBadge { label: Cow::Borrowed(label), variant, icon }
}

const PENDING: StatusBadge = badge("Pending", BadgeVariant::Warning, "clock");
const IN_PROGRESS: StatusBadge = badge("In Progress", BadgeVariant::Info, "loader");
const COMPLETED: StatusBadge = badge("Completed", BadgeVariant::Success, "check-circle");
const REJECTED: StatusBadge = badge("Rejected", BadgeVariant::Destructive, "x-circle");

impl StatusBadge {
    pub fn for_website(status: WebsiteRequestStatus) -> Self {
        match status {
            WebsiteRequestStatus::Pending => badge("Pending Review", BadgeVariant::Warning, "clock"),
            WebsiteRequestStatus::InProgress => IN_PROGRESS,
            WebsiteRequestStatus::Completed => COMPLETED,
            WebsiteRequestStatus::Rejected => REJECTED,
        }
    }

    pub fn for_addon(status: AddonRequestStatus) -> Self {
        match status {
            AddonRequestStatus::Pending => PENDING,
            AddonRequestStatus::Accepted => badge("Accepted, In Progress", BadgeVariant::Info, "loader"),
            AddonRequestStatus::Completed => COMPLETED,
            AddonRequestStatus::Rejected => REJECTED,
        }
    }

    /// Badge for a raw status string. Text outside the kind's vocabulary is
    /// shown as-is with a neutral pill.
    pub fn for_status(kind: RequestKind, status: &str) -> Self {
        let status = status.trim();
        let known = match kind {
            RequestKind::Website => WEBSITE_STATUSES
                .into_iter()
                .find(|s| s.as_str() == status)
                .map(Self::for_website),
            RequestKind::Addon => ADDON_STATUSES
                .into_iter()
                .find(|s| s.as_str() == status)
                .map(Self::for_addon),
        };
        known.unwrap_or_else(|| StatusBadge {
            label: Cow::Owned(status.to_string()),
            variant: BadgeVariant::Neutral,
            icon: "help-circle",
        })
    }
}

/// Every status with its badge, per request kind, for clients that render
/// status pills without a round trip per row.
#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeLegend {
    pub website: BTreeMap<String, StatusBadge>,
    pub addon: BTreeMap<String, StatusBadge>,
}

pub fn legend() -> BadgeLegend {
    let website = WEBSITE_STATUSES
        .into_iter()
            .map(|s| (s.as_str().to_string(), StatusBadge::for_website(s)))
        .collect();

    let addon = ADDON_STATUSES
        .into_iter()
            .map(|s| (s.as_str().to_string(), StatusBadge::for_addon(s)))
        .collect();

    BadgeLegend { website, addon }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_state_labels_differ_per_kind() {
        assert_eq!(StatusBadge::for_website(WebsiteRequestStatus::InProgress).label, "In Progress");
        assert_eq!(
            StatusBadge::for_addon(AddonRequestStatus::Accepted).label,
            "Accepted, In Progress"
        );
        assert_eq!(StatusBadge::for_website(WebsiteRequestStatus::Pending).label, "Pending Review");
        assert_eq!(StatusBadge::for_addon(AddonRequestStatus::Pending).label, "Pending");
    }

    #[test]
    fn terminal_states_share_presentation() {
        assert_eq!(
            StatusBadge::for_website(WebsiteRequestStatus::Completed),
            StatusBadge::for_addon(AddonRequestStatus::Completed)
        );
        assert_eq!(
            StatusBadge::for_website(WebsiteRequestStatus::Rejected).variant,
            BadgeVariant::Destructive
        );
    }

    #[test]
    fn legend_uses_each_kinds_vocabulary() {
        let legend = legend();
        assert_eq!(legend.addon["accepted"].variant, BadgeVariant::Info);
        assert!(!legend.website.contains_key("accepted"));
        assert_eq!(legend.website["in_progress"].icon, "loader");
        assert_eq!(legend.website.len(), 4);
        assert_eq!(legend.addon.len(), 4);
    }

    #[test]
    fn raw_status_text_uses_the_kinds_vocabulary() {
        assert_eq!(
            StatusBadge::for_status(RequestKind::Addon, "accepted"),
            StatusBadge::for_addon(AddonRequestStatus::Accepted)
        );
        assert_eq!(
            StatusBadge::for_status(RequestKind::Website, " in_progress "),
            StatusBadge::for_website(WebsiteRequestStatus::InProgress)
        );
        // "accepted" is not a build request status
        assert_eq!(
            StatusBadge::for_status(RequestKind::Website, "accepted").variant,
            BadgeVariant::Neutral
        );
    }

    #[test]
    fn unknown_status_shows_its_own_text() {
        let badge = StatusBadge::for_status(RequestKind::Website, "on_hold");
        assert_eq!(badge.label, "on_hold");
        assert_eq!(badge.variant, BadgeVariant::Neutral);
        assert_eq!(badge.icon, "help-circle");
    }
}
