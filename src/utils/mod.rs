pub mod api_response;
pub mod pending;
pub mod status_badge;
pub mod validation;
