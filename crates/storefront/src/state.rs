//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::CatalogCache;
use crate::config::StorefrontConfig;
use crate::services::AuthEvents;
use crate::supabase::{StorageUrls, SupabaseClient, SupabaseError};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    supabase: SupabaseClient,
    storage: StorageUrls,
    catalog_cache: CatalogCache,
    auth_events: AuthEvents,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the Supabase HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, SupabaseError> {
        let supabase = SupabaseClient::new(&config.supabase)?;
        let storage = StorageUrls::new(supabase.base_url());
        let catalog_cache = CatalogCache::new(config.catalog.cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                supabase,
                storage,
                catalog_cache,
                auth_events: AuthEvents::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Public URLs for product images.
    #[must_use]
    pub fn storage(&self) -> &StorageUrls {
        &self.inner.storage
    }

    #[must_use]
    pub fn catalog_cache(&self) -> &CatalogCache {
        &self.inner.catalog_cache
    }

    #[must_use]
    pub fn auth_events(&self) -> &AuthEvents {
        &self.inner.auth_events
    }
}
