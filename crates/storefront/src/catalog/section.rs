//! Shop sections and their categories.

use aunclic_core::CategoryId;

/// One of the three catalog pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogSection {
    Products,
    Foods,
    Boutique,
}

impl CatalogSection {
    pub const ALL: [Self; 3] = [Self::Products, Self::Foods, Self::Boutique];

    /// URL segment under `/{locale}/`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Products => "productos",
            Self::Foods => "comidas",
            Self::Boutique => "boutique",
        }
    }

    #[must_use]
    pub const fn category_id(self) -> CategoryId {
        match self {
            Self::Products => CategoryId::new(1),
            Self::Foods => CategoryId::new(2),
            Self::Boutique => CategoryId::new(3),
        }
    }

    /// Message key for the page heading.
    #[must_use]
    pub const fn title_key(self) -> &'static str {
        match self {
            Self::Products => "nav.products",
            Self::Foods => "nav.foods",
            Self::Boutique => "nav.boutique",
        }
    }

    #[must_use]
    pub const fn subtitle_key(self) -> &'static str {
        match self {
            Self::Products => "catalog.productsSubtitle",
            Self::Foods => "catalog.foodsSubtitle",
            Self::Boutique => "catalog.boutiqueSubtitle",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.slug() == slug)
    }

    #[must_use]
    pub fn from_category(category: CategoryId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.category_id() == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_map_to_fixed_categories() {
        assert_eq!(CatalogSection::Products.category_id().as_i32(), 1);
        assert_eq!(CatalogSection::Foods.category_id().as_i32(), 2);
        assert_eq!(CatalogSection::Boutique.category_id().as_i32(), 3);
    }

    #[test]
    fn slug_round_trip() {
        for section in CatalogSection::ALL {
            assert_eq!(CatalogSection::from_slug(section.slug()), Some(section));
            assert_eq!(CatalogSection::from_category(section.category_id()), Some(section));
        }
        assert_eq!(CatalogSection::from_slug("favoritos"), None);
    }
}
