use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::utils::validation::{ValidationError, Validator};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, ToSchema)]
#[sqlx(type_name = "site_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SiteType {
    Business,
    Portfolio,
    Personal,
}

impl SiteType {
    /// Intake fields each onboarding form cannot be submitted without.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            SiteType::Business => &["business_name", "industry", "business_description"],
            SiteType::Portfolio => &["full_name", "profession", "portfolio_description"],
            SiteType::Personal => &["full_name", "site_purpose"],
        }
    }
}

/// Onboarding intake for a user's site. One row per user.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow, ToSchema)]
pub struct WebsiteInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub site_type: SiteType,
    #[schema(value_type = Object)]
    pub details: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertWebsiteInfo {
    pub site_type: SiteType,
    /// Free-form intake answers keyed by field name.
    #[schema(value_type = Object)]
    #[serde(default)]
    pub details: Value,
}

impl UpsertWebsiteInfo {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut validator = Validator::new();
        validator.check("details", self.details.is_object(), "must be an object");
        for &field in self.site_type.required_fields() {
            let value = self
                .details
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default();
            validator.required(field, value);
        }
        validator.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn business_intake_requires_business_fields() {
        let form = UpsertWebsiteInfo {
            site_type: SiteType::Business,
            details: json!({ "business_name": "Crumbs", "industry": "" }),
        };
        let err = form.validate().unwrap_err();
        assert_eq!(
            err.fields().copied().collect::<Vec<_>>(),
            vec!["business_description", "industry"]
        );
    }

    #[test]
    fn personal_intake_accepts_extra_fields() {
        let form = UpsertWebsiteInfo {
            site_type: SiteType::Personal,
            details: json!({
                "full_name": "Ada Lovelace",
                "site_purpose": "Blog",
                "favorite_color": "teal",
            }),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn details_must_be_an_object() {
        let form = UpsertWebsiteInfo {
            site_type: SiteType::Portfolio,
            details: json!(["not", "an", "object"]),
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.0.get("details"), Some(&"must be an object"));
    }
}
