use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::utils::api_response::ApiResponse;

/// Field-level problems found before anything touches the store.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("validation failed for {} field(s)", .0.len())]
pub struct ValidationError(pub BTreeMap<&'static str, &'static str>);

impl ValidationError {
    pub fn fields(&self) -> impl Iterator<Item = &&'static str> {
        self.0.keys()
    }
}

/// Collects field errors; `finish` turns a non-empty set into an error.
#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<&'static str, &'static str>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(&mut self, field: &'static str, value: &str) -> &mut Self {
        if is_blank(value) {
            self.errors.insert(field, "is required");
        }
        self
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        if is_blank(value) {
            self.errors.insert(field, "is required");
        } else if !value.contains('@') {
            self.errors.insert(field, "must be an email address");
        }
        self
    }

    pub fn check(&mut self, field: &'static str, ok: bool, message: &'static str) -> &mut Self {
        if !ok {
            self.errors.entry(field).or_insert(message);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Trims and drops blank optional text.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl From<ValidationError> for ApiResponse<()> {
    fn from(err: ValidationError) -> Self {
        ApiResponse::error(
            StatusCode::BAD_REQUEST,
            "Please fill in all required fields",
            Some(json!(err.0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_whitespace_are_required_failures() {
        let err = Validator::new()
            .required("name", "")
            .required("details", "   \n")
            .required("ok", "present")
            .finish()
            .unwrap_err();

        let fields: Vec<_> = err.fields().copied().collect();
        assert_eq!(fields, vec!["details", "name"]);
    }

    #[test]
    fn email_needs_an_at_sign() {
        let err = Validator::new().email("contact_email", "nobody").finish().unwrap_err();
        assert_eq!(err.0.get("contact_email"), Some(&"must be an email address"));
        assert!(Validator::new().email("contact_email", "a@b.co").finish().is_ok());
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  hi ")), Some("hi".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn converts_to_bad_request_envelope() {
        let err = Validator::new().required("addon_type", "").finish().unwrap_err();
        let resp: ApiResponse<()> = err.into();
        assert_eq!(resp.status_code, 400);
        assert!(!resp.success);
        assert_eq!(resp.errors.unwrap()["addon_type"], "is required");
    }
}
