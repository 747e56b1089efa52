//! Listing filters and their SQL.
//!
//! A [`ProductFilter`] is the normalized form of a listing query string. It
//! renders itself into a `sqlx::QueryBuilder` by chaining only the predicates
//! that are actually active, so the default filter produces a bare category
//! query.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use aunclic_core::{CategoryId, SubcategoryId};

pub const DEFAULT_MIN_PRICE: Decimal = Decimal::ZERO;
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::ONE_THOUSAND;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    Newest,
}

impl SortOrder {
    pub const ALL: [Self; 5] = [
        Self::NameAsc,
        Self::NameDesc,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Newest,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "nameAsc",
            Self::NameDesc => "nameDesc",
            Self::PriceAsc => "priceAsc",
            Self::PriceDesc => "priceDesc",
            Self::Newest => "newest",
        }
    }

    /// `ORDER BY` body; `p.id` keeps pagination stable across equal keys.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::NameAsc => "p.name ASC, p.id ASC",
            Self::NameDesc => "p.name DESC, p.id ASC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id ASC",
            Self::Newest => "p.created_at DESC, p.id ASC",
        }
    }

    /// Message key for the sort dropdown.
    #[must_use]
    pub const fn label_key(self) -> &'static str {
        match self {
            Self::NameAsc => "sort.nameAsc",
            Self::NameDesc => "sort.nameDesc",
            Self::PriceAsc => "sort.priceAsc",
            Self::PriceDesc => "sort.priceDesc",
            Self::Newest => "sort.newest",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// Listing query string as it arrives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub search: Option<String>,
    pub subcategory: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl FilterQuery {
    /// 1-based page number; anything unparsable is page 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

/// A single active predicate, in the order it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Category(CategoryId),
    /// `ILIKE` pattern, already escaped and `%`-wrapped.
    Search(String),
    Subcategory(SubcategoryId),
    MinPrice(Decimal),
    MaxPrice(Decimal),
}

/// Normalized listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFilter {
    pub search: String,
    pub subcategory: Option<SubcategoryId>,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub sort: SortOrder,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            subcategory: None,
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            sort: SortOrder::default(),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn parse_price(value: Option<&String>) -> Option<Decimal> {
    non_empty(value)
        .and_then(|s| s.parse::<Decimal>().ok())
        .map(|d| d.max(Decimal::ZERO).normalize())
}

impl ProductFilter {
    /// Parse a query string, ignoring blank or malformed values.
    ///
    /// An inverted range is swapped only when both bounds were given; a lone
    /// minimum above the default maximum leaves the top open.
    #[must_use]
    pub fn from_query(query: &FilterQuery) -> Self {
        let min = parse_price(query.min_price.as_ref());
        let max = parse_price(query.max_price.as_ref());
        let (min_price, max_price) = match (min, max) {
            (Some(low), Some(high)) if high < low => (high, low),
            (low, high) => (
                low.unwrap_or(DEFAULT_MIN_PRICE),
                high.unwrap_or(DEFAULT_MAX_PRICE),
            ),
        };

        Self {
            search: non_empty(query.search.as_ref()).unwrap_or_default().to_owned(),
            subcategory: non_empty(query.subcategory.as_ref()).and_then(|s| s.parse().ok()),
            min_price,
            max_price,
            sort: non_empty(query.sort.as_ref())
                .and_then(SortOrder::parse)
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty()
            || self.subcategory.is_some()
            || self.min_price > DEFAULT_MIN_PRICE
            || self.max_price < DEFAULT_MAX_PRICE
            || self.sort != SortOrder::NameAsc
    }

    #[must_use]
    pub fn predicates(&self, category: CategoryId) -> Vec<Predicate> {
        let mut predicates = vec![Predicate::Category(category)];
        if !self.search.is_empty() {
            predicates.push(Predicate::Search(format!("%{}%", escape_like(&self.search))));
        }
        if let Some(subcategory) = self.subcategory {
            predicates.push(Predicate::Subcategory(subcategory));
        }
        if self.min_price > DEFAULT_MIN_PRICE {
            predicates.push(Predicate::MinPrice(self.min_price));
        }
        if self.max_price < DEFAULT_MAX_PRICE {
            predicates.push(Predicate::MaxPrice(self.max_price));
        }
        predicates
    }

    /// Append ` WHERE ...` for this filter. Assumes the product table is aliased `p`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>, category: CategoryId) {
        for (i, predicate) in self.predicates(category).into_iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::Category(id) => {
                    qb.push("p.category_id = ").push_bind(id);
                }
                Predicate::Search(pattern) => {
                    qb.push("(p.name ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR p.description ILIKE ")
                        .push_bind(pattern)
                        .push(")");
                }
                Predicate::Subcategory(id) => {
                    qb.push("p.subcategory_id = ").push_bind(id);
                }
                Predicate::MinPrice(min) => {
                    qb.push("p.price >= ").push_bind(min);
                }
                Predicate::MaxPrice(max) => {
                    qb.push("p.price <= ").push_bind(max);
                }
            }
        }
    }

    pub fn push_order(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" ORDER BY ").push(self.sort.order_by());
    }

    /// Query string reproducing this filter, for "load more" and pagination
    /// links. Defaults are omitted. No leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        if let Some(subcategory) = self.subcategory {
            pairs.push(("subcategory", subcategory.to_string()));
        }
        if self.min_price > DEFAULT_MIN_PRICE {
            pairs.push(("minPrice", self.min_price.to_string()));
        }
        if self.max_price < DEFAULT_MAX_PRICE {
            pairs.push(("maxPrice", self.max_price.to_string()));
        }
        if self.sort != SortOrder::default() {
            pairs.push(("sortBy", self.sort.as_str().to_owned()));
        }
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(&v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
