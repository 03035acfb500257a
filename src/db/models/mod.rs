pub mod addon_request;
pub mod profile;
pub mod status;
pub mod template;
pub mod website_info;
pub mod website_request;
