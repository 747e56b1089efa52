//! Catalog rows.

use chrono::{DateTime, Utc};

use aunclic_core::{CategoryId, Price, ProductId, SubcategoryId};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
    /// Object path inside the public storage bucket.
    pub primary_image: Option<String>,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// A product with the names the detail page shows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductDetail {
    #[sqlx(flatten)]
    pub product: Product,
    pub category_name: String,
    pub subcategory_name: Option<String>,
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Rows matching the filter across all pages.
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl ProductPage {
    /// A full page means there may be more rows after it.
    #[must_use]
    pub fn has_more(&self) -> bool {
        usize::try_from(self.page_size).is_ok_and(|size| size > 0 && self.products.len() == size)
    }

    #[must_use]
    pub const fn next_page(&self) -> u32 {
        self.page.saturating_add(1)
    }
}
