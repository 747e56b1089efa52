//! Business logic services for the storefront.
//!
//! - `auth` - Supabase-backed login, registration, password reset, OAuth
//! - `events` - auth state broadcast

pub mod auth;
pub mod events;

pub use events::{AuthEvent, AuthEvents};
