//! Favorites: rows, the in-page membership set, and the favorites page view.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use aunclic_core::{FavoriteId, Price, ProductId};

/// A favorite joined with its product and category name.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FavoriteProduct {
    pub favorite_id: FavoriteId,
    pub added_at: DateTime<Utc>,
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
    pub primary_image: Option<String>,
    pub category_name: Option<String>,
}

/// Product ids the current customer has favorited, used to draw heart
/// buttons on catalog grids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet(HashSet<ProductId>);

impl FavoriteSet {
    #[must_use]
    pub fn contains(&self, product: ProductId) -> bool {
        self.0.contains(&product)
    }

    /// Flip membership and return the new state.
    pub fn toggle(&mut self, product: ProductId) -> bool {
        if self.0.remove(&product) {
            false
        } else {
            self.0.insert(product);
            true
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ProductId> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FavoriteSort {
    PriceHighLow,
    PriceLowHigh,
    #[default]
    Newest,
    Oldest,
}

impl FavoriteSort {
    pub const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::PriceHighLow, Self::PriceLowHigh];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceHighLow => "priceHighLow",
            Self::PriceLowHigh => "priceLowHigh",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Raw favorites page query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoritesQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

/// Client-side style filtering of the already-loaded favorites list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesView {
    pub search: String,
    pub category: Option<String>,
    pub sort: FavoriteSort,
}

impl FavoritesView {
    #[must_use]
    pub fn from_query(query: &FavoritesQuery) -> Self {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        Self {
            search: non_empty(&query.search).unwrap_or_default(),
            category: non_empty(&query.category),
            sort: query
                .sort
                .as_deref()
                .and_then(FavoriteSort::parse)
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn apply(&self, items: Vec<FavoriteProduct>) -> Vec<FavoriteProduct> {
        let needle = self.search.to_lowercase();
        let mut kept: Vec<FavoriteProduct> = items
            .into_iter()
            .filter(|item| {
                needle.is_empty()
                    || item.name.to_lowercase().contains(&needle)
                    || item
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .filter(|item| {
                self.category
                    .as_deref()
                    .is_none_or(|wanted| item.category_name.as_deref() == Some(wanted))
            })
            .collect();

        match self.sort {
            FavoriteSort::PriceHighLow => kept.sort_by(|a, b| b.price.cmp(&a.price)),
            FavoriteSort::PriceLowHigh => kept.sort_by(|a, b| a.price.cmp(&b.price)),
            FavoriteSort::Newest => kept.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
            FavoriteSort::Oldest => kept.sort_by(|a, b| a.added_at.cmp(&b.added_at)),
        }
        kept
    }

    /// Distinct non-empty category names, sorted.
    #[must_use]
    pub fn category_options(items: &[FavoriteProduct]) -> Vec<String> {
        items
            .iter()
            .filter_map(|i| i.category_name.as_deref())
            .filter(|c| !c.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[must_use]
    pub fn is_filtered(&self) -> bool {
        !self.search.is_empty() || self.category.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn fav(id: i32, name: &str, cents: i64, day: u32, category: Option<&str>) -> FavoriteProduct {
        FavoriteProduct {
            favorite_id: FavoriteId::new(id),
            added_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).single().unwrap_or_default(),
            product_id: ProductId::new(id * 10),
            name: name.to_owned(),
            description: Some(format!("Delicioso {name}")),
            price: Price::new(Decimal::new(cents, 2)),
            stock: 1,
            primary_image: None,
            category_name: category.map(str::to_owned),
        }
    }

    fn sample() -> Vec<FavoriteProduct> {
        vec![
            fav(1, "Arepa", 450, 3, Some("comidas")),
            fav(2, "Poncho", 8900, 1, Some("boutique")),
            fav(3, "Café de Colombia", 1599, 5, Some("productos")),
            fav(4, "Tamal", 600, 2, None),
        ]
    }

    fn names(items: &[FavoriteProduct]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn toggle_twice_restores_membership() {
        let mut set: FavoriteSet = [ProductId::new(1)].into_iter().collect();
        let product = ProductId::new(2);

        assert!(set.toggle(product));
        assert!(set.contains(product));
        assert!(!set.toggle(product));
        assert!(!set.contains(product));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn default_view_sorts_newest_first() {
        let view = FavoritesView::default();
        assert_eq!(
            names(&view.apply(sample())),
            ["Café de Colombia", "Arepa", "Tamal", "Poncho"]
        );
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let view = FavoritesView {
            search: "CAFÉ".to_lowercase(),
            ..FavoritesView::default()
        };
        assert_eq!(names(&view.apply(sample())), ["Café de Colombia"]);

        let view = FavoritesView {
            search: "delicioso tam".to_owned(),
            ..FavoritesView::default()
        };
        assert_eq!(names(&view.apply(sample())), ["Tamal"]);
    }

    #[test]
    fn category_and_price_sort() {
        let view = FavoritesView::from_query(&FavoritesQuery {
            search: Some("  ".to_owned()),
            category: None,
            sort: Some("priceHighLow".to_owned()),
        });
        assert!(!view.is_filtered());
        assert_eq!(
            names(&view.apply(sample())),
            ["Poncho", "Café de Colombia", "Tamal", "Arepa"]
        );

        let view = FavoritesView {
            category: Some("comidas".to_owned()),
            sort: FavoriteSort::PriceLowHigh,
            ..FavoritesView::default()
        };
        assert_eq!(names(&view.apply(sample())), ["Arepa"]);
    }

    #[test]
    fn unknown_sort_falls_back_to_newest() {
        let view = FavoritesView::from_query(&FavoritesQuery {
            sort: Some("random".to_owned()),
            ..FavoritesQuery::default()
        });
        assert_eq!(view.sort, FavoriteSort::Newest);
    }

    #[test]
    fn category_options_are_distinct_and_sorted() {
        let mut items = sample();
        items.push(fav(5, "Mole", 700, 4, Some("comidas")));
        assert_eq!(
            FavoritesView::category_options(&items),
            ["boutique", "comidas", "productos"]
        );
    }
}
