//! Database access for the storefront `PostgreSQL` schema.
//!
//! # Schema: `storefront`
//!
//! - `category`, `subcategory`, `product` - the catalog
//! - `customer` - one row per Supabase auth identity
//! - `review` - one per (product, customer)
//! - `favorite` - one per (customer, product)
//! - `shipping_address`
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Stored in `crates/storefront/migrations/` and applied with:
//! ```bash
//! cargo run -p aunclic-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate
//! builds without a live database.

pub mod addresses;
pub mod catalog;
pub mod customers;
pub mod favorites;
pub mod reviews;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use catalog::CatalogRepository;
pub use customers::CustomerRepository;
pub use favorites::FavoriteRepository;
pub use reviews::ReviewRepository;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed domain validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
