//! Saved products per customer.

use sqlx::PgPool;
use tracing::instrument;

use aunclic_core::{CustomerId, ProductId};

use super::RepositoryError;
use crate::models::{FavoriteProduct, FavoriteSet};

pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Favorites with their product and category, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(customer = %customer))]
    pub async fn list(&self, customer: CustomerId) -> Result<Vec<FavoriteProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, FavoriteProduct>(
            r"
            SELECT f.id AS favorite_id, f.added_at,
                   p.id AS product_id, p.name, p.description, p.price, p.stock,
                   p.primary_image,
                   c.name AS category_name
            FROM storefront.favorite f
            JOIN storefront.product p ON p.id = f.product_id
            LEFT JOIN storefront.category c ON c.id = p.category_id
            WHERE f.customer_id = $1
            ORDER BY f.added_at DESC, f.id DESC
            ",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Save a product. Saving one that is already saved is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, including
    /// when the product does not exist.
    #[instrument(skip(self), fields(customer = %customer, product = %product))]
    pub async fn add(&self, customer: CustomerId, product: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.favorite (customer_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (customer_id, product_id) DO NOTHING
            ",
        )
        .bind(customer)
        .bind(product)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(customer = %customer, product = %product))]
    pub async fn remove(
        &self,
        customer: CustomerId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM storefront.favorite WHERE customer_id = $1 AND product_id = $2",
        )
        .bind(customer)
        .bind(product)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flip membership and return the new state (`true` = now a favorite).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    pub async fn toggle(
        &self,
        customer: CustomerId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        if self.remove(customer, product).await? {
            return Ok(false);
        }
        self.add(customer, product).await?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(customer = %customer))]
    pub async fn count(&self, customer: CustomerId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.favorite WHERE customer_id = $1",
        )
        .bind(customer)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_favorite(
        &self,
        customer: CustomerId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM storefront.favorite
                WHERE customer_id = $1 AND product_id = $2
            )
            ",
        )
        .bind(customer)
        .bind(product)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Ids of every saved product, for marking hearts on listing pages.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_ids(&self, customer: CustomerId) -> Result<FavoriteSet, RepositoryError> {
        let ids = sqlx::query_scalar::<_, ProductId>(
            "SELECT product_id FROM storefront.favorite WHERE customer_id = $1",
        )
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }
}
