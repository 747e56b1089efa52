//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span and Sentry scope)
//! 4. Security headers (CSP nonce, frame and referrer policy)
//! 5. Session layer (signed cookie, `PostgreSQL` store)
//! 6. Legacy path redirects to the locale-prefixed routes
//! 7. Rate limiting on auth form posts and favorite toggles (governor)

pub mod auth;
pub mod locale;
pub mod rate_limit;
pub mod request_id;
pub mod security;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAuth, clear_current_user, login_url, set_current_user,
};
pub use locale::{
    CurrentLocale, LOCALE_COOKIE, locale_cookie, locale_redirect_middleware, path_with_locale,
    safe_redirect_path,
};
pub use rate_limit::{RateLimits, api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security::{CspNonce, SecurityPolicy, security_headers_middleware};
pub use session::create_session_layer;
