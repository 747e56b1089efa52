//! Shipping addresses. Every statement is scoped to the owning customer.

use sqlx::PgPool;
use tracing::instrument;

use aunclic_core::{AddressId, CustomerId};

use super::RepositoryError;
use crate::models::{AddressInput, ShippingAddress};

const ADDRESS_COLUMNS: &str = "id, customer_id, recipient, street, city, province, postal_code, \
                               country, phone, created_at";

pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(customer = %customer))]
    pub async fn list(&self, customer: CustomerId) -> Result<Vec<ShippingAddress>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShippingAddress>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS}
            FROM storefront.shipping_address
            WHERE customer_id = $1
            ORDER BY id ASC
            "
        ))
        .bind(customer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Store a normalized address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input), fields(customer = %customer))]
    pub async fn add(
        &self,
        customer: CustomerId,
        input: &AddressInput,
    ) -> Result<ShippingAddress, RepositoryError> {
        let row = sqlx::query_as::<_, ShippingAddress>(&format!(
            r"
            INSERT INTO storefront.shipping_address
                (customer_id, recipient, street, city, province, postal_code, country, phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(customer)
        .bind(&input.recipient)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.province)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(input.phone.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to another customer.
    #[instrument(skip(self, input), fields(customer = %customer, address = %id))]
    pub async fn update(
        &self,
        customer: CustomerId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<ShippingAddress, RepositoryError> {
        sqlx::query_as::<_, ShippingAddress>(&format!(
            r"
            UPDATE storefront.shipping_address
            SET recipient = $3, street = $4, city = $5, province = $6,
                postal_code = $7, country = $8, phone = $9
            WHERE id = $1 AND customer_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(customer)
        .bind(&input.recipient)
        .bind(&input.street)
        .bind(&input.city)
        .bind(&input.province)
        .bind(&input.postal_code)
        .bind(&input.country)
        .bind(input.phone.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    #[instrument(skip(self), fields(customer = %customer, address = %id))]
    pub async fn delete(&self, customer: CustomerId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM storefront.shipping_address WHERE id = $1 AND customer_id = $2",
        )
        .bind(id)
        .bind(customer)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
