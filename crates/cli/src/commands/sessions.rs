//! Session store maintenance.

use aunclic_storefront::db;

use super::{CommandError, database_url};

/// Delete expired rows from `tower_sessions.session`.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn prune() -> Result<(), CommandError> {
    let pool = db::create_pool(&database_url()?).await?;

    let deleted = sqlx::query("DELETE FROM tower_sessions.session WHERE expiry_date < now()")
        .execute(&pool)
        .await?
        .rows_affected();

    tracing::info!(deleted, "Expired sessions removed");
    Ok(())
}
