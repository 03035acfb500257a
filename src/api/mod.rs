pub mod addon_requests;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod profile;
pub mod website_info;
pub mod website_requests;
