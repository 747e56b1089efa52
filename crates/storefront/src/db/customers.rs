//! Customer rows, one per Supabase auth identity.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use aunclic_core::{CustomerId, Email};

use super::RepositoryError;
use crate::models::Customer;

const CUSTOMER_COLUMNS: &str = "id, auth_id, email, name, created_at";

pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or refresh the customer row for an auth identity.
    ///
    /// The email always follows the auth provider. An existing name is kept
    /// when `name` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another identity already owns
    /// the email, `RepositoryError::Database` for other failures.
    #[instrument(skip(self, email, name), fields(auth_id = %auth_id))]
    pub async fn upsert_from_auth(
        &self,
        auth_id: Uuid,
        email: &Email,
        name: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            r"
            INSERT INTO storefront.customer (auth_id, email, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (auth_id) DO UPDATE
               SET email = EXCLUDED.email,
                   name = COALESCE(EXCLUDED.name, storefront.customer.name)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(auth_id)
        .bind(email)
        .bind(name.map(str::trim).filter(|n| !n.is_empty()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already belongs to another customer"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(customer = %id))]
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM storefront.customer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Change the display name. A blank name clears it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    #[instrument(skip(self, name), fields(customer = %id))]
    pub async fn update_name(
        &self,
        id: CustomerId,
        name: &str,
    ) -> Result<Customer, RepositoryError> {
        let name = Some(name.trim()).filter(|n| !n.is_empty());

        sqlx::query_as::<_, Customer>(&format!(
            r"
            UPDATE storefront.customer
            SET name = $2
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
