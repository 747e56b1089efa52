//! Request correlation ids.
//!
//! An upstream id (Cloudflare, Fly proxy) is reused when it looks sane;
//! otherwise a UUID v4 is minted. The id is recorded on the tracing span,
//! tagged on the Sentry scope, and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Accept an upstream id only if it is short printable ASCII.
fn upstream_id(value: &str) -> Option<&str> {
    let value = value.trim();
    let valid = !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic());
    valid.then_some(value)
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(upstream_id)
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_sane_upstream_ids() {
        assert_eq!(upstream_id(" 8b1f-42 "), Some("8b1f-42"));
    }

    #[test]
    fn rejects_blank_oversized_or_spaced_ids() {
        assert_eq!(upstream_id("   "), None);
        assert_eq!(upstream_id(&"x".repeat(MAX_REQUEST_ID_LEN + 1)), None);
        assert_eq!(upstream_id("two words"), None);
    }
}
