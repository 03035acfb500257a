use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::utils::validation::non_blank;

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub plan: Option<String>,
    pub website_url: Option<String>,
    pub is_admin: bool,
    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner columns joined onto request rows for admin listings.
#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct OwnerSummary {
    #[sqlx(rename = "owner_name")]
    pub name: String,
    #[sqlx(rename = "owner_email")]
    pub email: String,
    #[sqlx(rename = "owner_phone")]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub plan: Option<String>,
}

impl UpdateProfile {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.plan.is_none()
    }

    /// Columns the patch touches, trimmed. Blank optional text clears the
    /// column instead of storing `""`.
    pub fn assignments(&self) -> Vec<(&'static str, Option<String>)> {
        [("name", &self.name), ("phone", &self.phone), ("plan", &self.plan)]
            .into_iter()
            .filter_map(|(column, value)| {
                value
                    .as_deref()
                    .map(|v| (column, non_blank(Some(v))))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_phone_clears_the_column() {
        let update = UpdateProfile {
            name: None,
            phone: Some("   ".into()),
            plan: Some(" pro ".into()),
        };
        assert_eq!(
            update.assignments(),
            vec![("phone", None), ("plan", Some("pro".to_string()))]
        );
    }

    #[test]
    fn untouched_fields_are_left_out() {
        let update = UpdateProfile {
            name: Some("Ada".into()),
            phone: None,
            plan: None,
        };
        assert_eq!(update.assignments(), vec![("name", Some("Ada".to_string()))]);
        assert!(!update.is_empty());
    }
}
