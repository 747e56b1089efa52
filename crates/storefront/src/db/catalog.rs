//! Catalog queries: products and subcategories.

use sqlx::{PgPool, QueryBuilder};
use tracing::instrument;

use aunclic_core::{CategoryId, ProductId};

use super::RepositoryError;
use crate::catalog::ProductFilter;
use crate::models::{Product, ProductDetail, ProductPage, Subcategory};

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.stock, p.primary_image, \
                               p.category_id, p.subcategory_id, p.created_at";

pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of products in `category` matching `filter`.
    ///
    /// `page` is 1-based.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, filter), fields(category = %category))]
    pub async fn list_products(
        &self,
        category: CategoryId,
        page: u32,
        page_size: u32,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let offset = i64::from(page.max(1) - 1) * i64::from(page_size);

        let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM storefront.product p"));
        filter.push_where(&mut qb, category);
        filter.push_order(&mut qb);
        qb.push(" LIMIT ")
            .push_bind(i64::from(page_size))
            .push(" OFFSET ")
            .push_bind(offset);

        let products = qb.build_query_as::<Product>().fetch_all(self.pool).await?;
        Ok(products)
    }

    /// Number of products in `category` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, filter), fields(category = %category))]
    pub async fn count_products(
        &self,
        category: CategoryId,
        filter: &ProductFilter,
    ) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM storefront.product p");
        filter.push_where(&mut qb, category);

        let count = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Rows and total for one listing page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn load_page(
        &self,
        category: CategoryId,
        page: u32,
        page_size: u32,
        filter: &ProductFilter,
    ) -> Result<ProductPage, RepositoryError> {
        let (products, total) = tokio::try_join!(
            self.list_products(category, page, page_size, filter),
            self.count_products(category, filter),
        )?;

        Ok(ProductPage {
            products,
            total,
            page,
            page_size,
        })
    }

    /// Subcategories of `category`, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn list_subcategories(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Subcategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, Subcategory>(
            r"
            SELECT id, category_id, name
            FROM storefront.subcategory
            WHERE category_id = $1
            ORDER BY name ASC
            ",
        )
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Product with its category and subcategory names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductDetail>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS},
                   c.name AS category_name,
                   s.name AS subcategory_name
            FROM storefront.product p
            JOIN storefront.category c ON c.id = p.category_id
            LEFT JOIN storefront.subcategory s ON s.id = p.subcategory_id
            WHERE p.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Newest products of a category, unfiltered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn list_by_category(
        &self,
        category: CategoryId,
        limit: u32,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM storefront.product p
            WHERE p.category_id = $1
            ORDER BY p.created_at DESC, p.id ASC
            LIMIT $2
            "
        ))
        .bind(category)
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
