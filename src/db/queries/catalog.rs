use axum::{
    extract::{Path, Query},
    http::StatusCode,
};
use serde::Deserialize;

use crate::db::models::status::RequestKind;
use crate::db::models::template::{self, Template};
use crate::db::models::website_info::SiteType;
use crate::utils::api_response::ApiResponse;
use crate::utils::status_badge::{self, BadgeLegend, BadgeVariant, StatusBadge};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TemplateFilter {
    /// Only templates for this site type.
    pub site_type: Option<SiteType>,
}

#[utoipa::path(
    get,
    path = "/templates",
    params(TemplateFilter),
    responses(
        (status = 200, description = "Template catalog", body = [Template])
    ),
    tag = "Catalog"
)]
pub async fn list_templates(Query(filter): Query<TemplateFilter>) -> ApiResponse<Vec<Template>> {
    let templates = match filter.site_type {
        Some(site_type) => template::for_site_type(site_type).copied().collect(),
        None => template::CATALOG.to_vec(),
    };
    ApiResponse::success(StatusCode::OK, "Templates", templates)
}

#[utoipa::path(
    get,
    path = "/status-badges",
    responses(
        (status = 200, description = "Status labels, variants and icons per request kind", body = BadgeLegend)
    ),
    tag = "Catalog"
)]
pub async fn status_badges() -> ApiResponse<BadgeLegend> {
    ApiResponse::success(StatusCode::OK, "Status badges", status_badge::legend())
}

#[utoipa::path(
    get,
    path = "/status-badges/{kind}/{status}",
    params(
        ("kind" = RequestKind, Path, description = "Request kind"),
        ("status" = String, Path, description = "Raw status text")
    ),
    responses(
        (status = 200, description = "Badge for the status; unknown text gets a neutral badge", body = StatusBadge)
    ),
    tag = "Catalog"
)]
pub async fn badge_for_status(Path((kind, status)): Path<(RequestKind, String)>) -> ApiResponse<StatusBadge> {
    ApiResponse::success(StatusCode::OK, "Status badge", StatusBadge::for_status(kind, &status))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(list_templates, status_badges, badge_for_status),
    components(schemas(Template, BadgeLegend, StatusBadge, BadgeVariant, RequestKind)),
    tags(
        (name = "Catalog", description = "Static data the UI renders from")
    )
)]
pub struct CatalogDoc;
