//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: strict limits for login, registration and password
//!   reset submissions (~10/min)
//! - `api_rate_limiter`: relaxed limits for favorite, review and address
//!   writes (~60/min, burst 30)
//!
//! Each layer owns its governor state. [`RateLimits`] builds both once so
//! every route and every locale prefix draws from the same budget.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Client IP from proxy headers, in order: `CF-Connecting-IP`,
/// `X-Forwarded-For` (first hop), `X-Real-IP`, `Fly-Client-IP`, then the
/// socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

const IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        IP_HEADERS
            .iter()
            .find_map(|name| {
                headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.split(',').next())
                    .and_then(|s| s.trim().parse::<IpAddr>().ok())
            })
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Auth form submissions: 1 token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Does not panic: `per_second(6)` and `burst_size(5)` are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Shopper writes: 1 token per second, burst of 30.
///
/// # Panics
///
/// Does not panic: `per_second(1)` and `burst_size(30)` are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1)
        .burst_size(30)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(30) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// The two budgets, built once and cloned into each route.
#[derive(Clone)]
pub struct RateLimits {
    pub auth: RateLimiterLayer,
    pub api: RateLimiterLayer,
}

impl RateLimits {
    #[must_use]
    pub fn new() -> Self {
        Self {
            auth: auth_rate_limiter(),
            api: api_rate_limiter(),
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::new()
    }
}
