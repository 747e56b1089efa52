//! Product reviews and rating aggregates.

use sqlx::PgPool;
use tracing::instrument;

use aunclic_core::{CustomerId, ProductId, RatingStats, ReviewId};

use super::RepositoryError;
use crate::models::{NewReview, ReviewError, ReviewWithAuthor};

pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews for a product, newest first, with the author's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn list_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewWithAuthor>(
            r"
            SELECT r.id, r.product_id, r.customer_id, r.stars, r.comment, r.created_at,
                   c.name AS author_name,
                   c.email AS author_email
            FROM storefront.review r
            JOIN storefront.customer c ON c.id = r.customer_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Average stars (one decimal) and review count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn rating_stats(&self, product: ProductId) -> Result<RatingStats, RepositoryError> {
        let (sum, count) = sqlx::query_as::<_, (Option<i64>, i64)>(
            r"
            SELECT SUM(stars)::BIGINT, COUNT(*)
            FROM storefront.review
            WHERE product_id = $1
            ",
        )
        .bind(product)
        .fetch_one(self.pool)
        .await?;

        Ok(RatingStats::from_totals(sum.unwrap_or(0), count))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_reviewed(
        &self,
        product: ProductId,
        customer: CustomerId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM storefront.review
                WHERE product_id = $1 AND customer_id = $2
            )
            ",
        )
        .bind(product)
        .bind(customer)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Store a review.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::AlreadyReviewed` if the customer already
    /// reviewed this product and `ReviewError::ProductNotFound` if the
    /// product does not exist.
    #[instrument(skip(self, review), fields(product = %product, customer = %customer))]
    pub async fn add(
        &self,
        product: ProductId,
        customer: CustomerId,
        review: &NewReview,
    ) -> Result<ReviewId, ReviewError> {
        let result = sqlx::query_scalar::<_, ReviewId>(
            r"
            INSERT INTO storefront.review (product_id, customer_id, stars, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(product)
        .bind(customer)
        .bind(review.rating.as_i16())
        .bind(&review.comment)
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(id) => Ok(id),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(ReviewError::ProductNotFound)
            }
            Err(e) => match RepositoryError::from_write(e, "review exists") {
                RepositoryError::Conflict(_) => Err(ReviewError::AlreadyReviewed),
                other => Err(other.into()),
            },
        }
    }
}
