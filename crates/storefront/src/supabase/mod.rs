//! Supabase REST clients.
//!
//! # Architecture
//!
//! - Auth goes through the GoTrue HTTP API (`/auth/v1/*`) with `reqwest`
//! - Catalog, favorites and reviews are read from Postgres directly (see
//!   [`crate::db`]), not through PostgREST
//! - Product images are public storage objects; [`StorageUrls`] only builds
//!   their URLs
//!
//! Every request carries the project's anon key in both the `apikey` header
//! and, unless a user token is supplied, the `Authorization` header.

pub mod auth;
mod storage;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::SupabaseConfig;

pub use auth::{AuthSession, AuthUser, SignUpResponse};
pub use storage::{PLACEHOLDER_IMAGE, StorageUrls};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors that can occur when calling Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Supabase answered with a non-success status.
    #[error("Supabase API error ({status}): {message}")]
    Api {
        status: u16,
        /// Machine-readable code (`error_code` or OAuth `error`), when sent.
        code: Option<String>,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SupabaseError {
    /// The error code Supabase reported, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Build an `Api` error from a response body.
    ///
    /// GoTrue answers either `{"error", "error_description"}` (OAuth token
    /// endpoint) or `{"code", "error_code", "msg"}`.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
            error_description: Option<String>,
            error_code: Option<String>,
            msg: Option<String>,
            message: Option<String>,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => {
                let message = parsed
                    .msg
                    .or(parsed.error_description)
                    .or(parsed.message)
                    .or_else(|| parsed.error.clone())
                    .unwrap_or_else(|| format!("HTTP {status}"));
                Self::Api {
                    status,
                    code: parsed.error_code.or(parsed.error),
                    message,
                }
            }
            Err(_) => Self::Api {
                status,
                code: None,
                message: body.chars().take(200).collect(),
            },
        }
    }
}

/// Shared Supabase HTTP client.
///
/// Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let anon_key = config.anon_key.expose_secret().to_owned();

        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&anon_key) {
            headers.insert("apikey", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.as_str().trim_end_matches('/').to_owned(),
                anon_key,
            }),
        })
    }

    /// Project URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a request and decode a JSON body.
    ///
    /// `bearer` overrides the anon key in `Authorization`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> Result<T, SupabaseError> {
        let text = self.send_raw(request, bearer).await?;
        let body = if text.trim().is_empty() { "null" } else { &text };

        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse Supabase response"
            );
            SupabaseError::Parse(e)
        })
    }

    /// Send a request and return the body as text, mapping error statuses.
    async fn send_raw(
        &self,
        request: reqwest::RequestBuilder,
        bearer: Option<&str>,
    ) -> Result<String, SupabaseError> {
        let token = bearer.unwrap_or(&self.inner.anon_key);
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(SupabaseError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            let err = SupabaseError::from_response(status.as_u16(), &text);
            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %text.chars().take(500).collect::<String>(),
                    "Supabase returned server error"
                );
            } else {
                tracing::debug!(status = %status, error = %err, "Supabase rejected request");
            }
            return Err(err);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gotrue_error_shape() {
        let err = SupabaseError::from_response(
            400,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert_eq!(err.code(), Some("invalid_credentials"));
        assert_eq!(
            err.to_string(),
            "Supabase API error (400): Invalid login credentials"
        );
    }

    #[test]
    fn parses_oauth_error_shape() {
        let err = SupabaseError::from_response(
            400,
            r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#,
        );
        assert_eq!(err.code(), Some("invalid_grant"));
        assert!(err.to_string().ends_with("Email not confirmed"));
    }

    #[test]
    fn non_json_body_is_truncated() {
        let body = "x".repeat(1000);
        let SupabaseError::Api { code, message, .. } = SupabaseError::from_response(502, &body)
        else {
            panic!("expected Api error");
        };
        assert!(code.is_none());
        assert_eq!(message.len(), 200);
    }

    #[test]
    fn transport_errors_have_no_code() {
        assert!(SupabaseError::RateLimited(3).code().is_none());
    }
}
