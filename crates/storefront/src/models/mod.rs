//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow`; view-side logic that does not touch the
//! database (favorites filtering, review validation) lives next to the types.

pub mod catalog;
pub mod customer;
pub mod favorite;
pub mod review;
pub mod session;

pub use catalog::{Product, ProductDetail, ProductPage, Subcategory};
pub use customer::{AddressError, AddressInput, Customer, ShippingAddress};
pub use favorite::{FavoriteProduct, FavoriteSet, FavoriteSort, FavoritesQuery, FavoritesView};
pub use review::{NewReview, ReviewError, ReviewWithAuthor};
pub use session::{AccessToken, CurrentUser, keys as session_keys};
