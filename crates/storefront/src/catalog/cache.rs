//! In-process cache for catalog listings.
//!
//! Keys are the JSON form of [`CatalogCacheKey`], so two requests with the
//! same normalized filter share an entry. Entries expire after the configured
//! TTL; concurrent misses on one key run a single loader.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;

use aunclic_core::CategoryId;

use super::filter::ProductFilter;
use crate::models::{ProductPage, Subcategory};

const MAX_PAGE_ENTRIES: u64 = 1000;
const MAX_SUBCATEGORY_ENTRIES: u64 = 16;

/// Everything that determines the contents of a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CatalogCacheKey {
    pub category: CategoryId,
    pub page: u32,
    pub page_size: u32,
    pub filter: ProductFilter,
}

impl CatalogCacheKey {
    #[must_use]
    pub fn to_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

#[derive(Clone)]
pub struct CatalogCache {
    pages: Cache<String, ProductPage>,
    subcategories: Cache<CategoryId, Arc<Vec<Subcategory>>>,
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: Cache::builder()
                .max_capacity(MAX_PAGE_ENTRIES)
                .time_to_live(ttl)
                .build(),
            subcategories: Cache::builder()
                .max_capacity(MAX_SUBCATEGORY_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Return the cached page or await `load`, storing its result on success.
    ///
    /// Failed loads are not cached.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, shared between coalesced callers.
    pub async fn get_or_load<Fut, E>(
        &self,
        key: &CatalogCacheKey,
        load: Fut,
    ) -> Result<ProductPage, Arc<E>>
    where
        Fut: Future<Output = Result<ProductPage, E>>,
        E: Send + Sync + 'static,
    {
        self.pages.try_get_with(key.to_key(), load).await
    }

    /// # Errors
    ///
    /// Returns the loader's error, shared between coalesced callers.
    pub async fn subcategories_or_load<Fut, E>(
        &self,
        category: CategoryId,
        load: Fut,
    ) -> Result<Arc<Vec<Subcategory>>, Arc<E>>
    where
        Fut: Future<Output = Result<Vec<Subcategory>, E>>,
        E: Send + Sync + 'static,
    {
        self.subcategories
            .try_get_with(category, async move { load.await.map(Arc::new) })
            .await
    }

    /// Drop every cached listing.
    pub fn invalidate_all(&self) {
        self.pages.invalidate_all();
        self.subcategories.invalidate_all();
    }
}
