//! A un Clic la core - shared domain types.
//!
//! Used by:
//! - `storefront` - the public, server-rendered shop
//! - `cli` - migrations and catalog seeding
//!
//! The crate holds types only. No I/O, no database access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, prices, locales and review ratings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
