use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::website_info::SiteType;

/// Entry in the built-in template catalog.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Template {
    #[schema(value_type = String)]
    pub id: &'static str,
    #[schema(value_type = String)]
    pub name: &'static str,
    #[schema(value_type = String)]
    pub style: &'static str,
    pub site_type: SiteType,
}

pub const CATALOG: &[Template] = &[
    Template { id: "business-modern", name: "Modern Business", style: "modern", site_type: SiteType::Business },
    Template { id: "business-classic", name: "Classic Business", style: "classic", site_type: SiteType::Business },
    Template { id: "business-bold", name: "Bold Storefront", style: "bold", site_type: SiteType::Business },
    Template { id: "portfolio-minimal", name: "Minimal Portfolio", style: "minimal", site_type: SiteType::Portfolio },
    Template { id: "portfolio-gallery", name: "Gallery Portfolio", style: "gallery", site_type: SiteType::Portfolio },
    Template { id: "personal-blog", name: "Personal Blog", style: "blog", site_type: SiteType::Personal },
    Template { id: "personal-resume", name: "Online Resume", style: "resume", site_type: SiteType::Personal },
];

pub fn find(id: &str) -> Option<&'static Template> {
    CATALOG.iter().find(|t| t.id == id)
}

pub fn for_site_type(site_type: SiteType) -> impl Iterator<Item = &'static Template> {
    CATALOG.iter().filter(move |t| t.site_type == site_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        for (i, t) in CATALOG.iter().enumerate() {
            assert!(CATALOG[i + 1..].iter().all(|other| other.id != t.id), "{}", t.id);
        }
    }

    #[test]
    fn every_site_type_has_a_template() {
        for site_type in [SiteType::Business, SiteType::Portfolio, SiteType::Personal] {
            assert!(for_site_type(site_type).next().is_some());
        }
        assert_eq!(find("portfolio-gallery").map(|t| t.style), Some("gallery"));
        assert!(find("nope").is_none());
    }
}
