//! A un Clic la storefront library.
//!
//! The binary in `main.rs` is a thin wrapper around [`routes::app`]; keeping
//! everything here lets the integration tests drive the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod flash;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seo;
pub mod services;
pub mod state;
pub mod supabase;
