//! Catalog listing logic shared by the three shop sections.
//!
//! - [`filter`] turns a listing query string into SQL predicates
//! - [`section`] maps URL sections to categories
//! - [`cache`] memoizes filtered pages in process

pub mod cache;
pub mod filter;
pub mod section;

pub use cache::{CatalogCache, CatalogCacheKey};
pub use filter::{FilterQuery, ProductFilter, SortOrder};
pub use section::CatalogSection;
