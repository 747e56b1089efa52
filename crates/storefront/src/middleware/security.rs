//! CSP nonce and security headers.
//!
//! One middleware generates the per-request nonce, stores it in request
//! extensions for templates, and writes the response headers. The policy
//! allows product images from the Supabase storage origin and htmx from
//! unpkg; everything else is same-origin.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Script origin for htmx.
pub const HTMX_ORIGIN: &str = "https://unpkg.com";

/// A CSP nonce for script tags (128-bit, base64url so templates need no escaping).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce not found in request extensions - middleware may be misconfigured");
            Self(String::new())
        }))
    }
}

/// Origins the policy needs beyond `'self'`.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    image_origin: String,
}

impl SecurityPolicy {
    /// `image_origin` is the Supabase project origin serving product images.
    #[must_use]
    pub fn new(image_origin: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            image_origin: image_origin.into(),
        })
    }

    /// The `Content-Security-Policy` value for a response carrying `nonce`.
    #[must_use]
    pub fn content_security_policy(&self, nonce: &str) -> String {
        format!(
            "default-src 'none'; \
             script-src 'self' 'nonce-{nonce}' {HTMX_ORIGIN}; \
             style-src 'self'; \
             font-src 'self'; \
             img-src 'self' data: {images}; \
             connect-src 'self'; \
             frame-src 'none'; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'; \
             upgrade-insecure-requests",
            images = self.image_origin,
        )
    }
}

/// Generate the nonce, run the request, and add security headers.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (Supabase checks the
///   origin on OAuth redirects)
/// - `Content-Security-Policy` (see [`SecurityPolicy`])
/// - `Permissions-Policy` denying sensors, camera, payment and the like
/// - `Cache-Control: no-store` on pages; static assets keep their own
/// - `Cross-Origin-Opener-Policy: same-origin`
/// - `Cross-Origin-Embedder-Policy: credentialless` so storage images load
pub async fn security_headers_middleware(
    State(policy): State<Arc<SecurityPolicy>>,
    mut request: Request,
    next: Next,
) -> Response {
    let nonce = CspNonce::generate();
    let is_static = request.uri().path().starts_with("/static/");
    request.extensions_mut().insert(nonce.clone());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    match HeaderValue::from_str(&policy.content_security_policy(&nonce.0)) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => tracing::error!("Invalid CSP header value: {e}"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             hid=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(), \
             publickey-credentials-get=(), \
             serial=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if !is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );

    response
}
