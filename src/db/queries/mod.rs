pub mod addon_requests;
pub mod catalog;
pub mod profile;
pub mod website_info;
pub mod website_requests;
