//! Request-level errors.
//!
//! Handlers return [`AppError`]. Server-side failures are sent to Sentry and
//! logged; the client only sees a status and a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use aunclic_core::{CustomerId, Email};

use crate::db::RepositoryError;
use crate::models::ReviewError;
use crate::services::auth::AuthError;
use crate::supabase::SupabaseError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Supabase error: {0}")]
    Supabase(#[from] SupabaseError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Supabase(SupabaseError::RateLimited(_)) | Self::RateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Supabase(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => auth_status(err),
            Self::Review(err) => match err {
                ReviewError::AlreadyReviewed => StatusCode::CONFLICT,
                ReviewError::ProductNotFound => StatusCode::NOT_FOUND,
                ReviewError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Supabase(_) => true,
            Self::Auth(err) => err.is_server_error(),
            Self::Review(err) => matches!(err, ReviewError::Repository(_)),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Supabase(_) => "External service error".to_string(),
            Self::Auth(err) if err.is_server_error() => "Authentication error".to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Review(ReviewError::Repository(_)) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Status for an auth failure, also used when a form is re-rendered with
/// its error.
#[must_use]
pub const fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials
        | AuthError::EmailNotConfirmed
        | AuthError::InvalidSessionState => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::InvalidEmail(_)
        | AuthError::MissingName
        | AuthError::WeakPassword(_)
        | AuthError::PasswordMismatch => StatusCode::BAD_REQUEST,
        AuthError::Supabase(SupabaseError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
        AuthError::Supabase(_) => StatusCode::BAD_GATEWAY,
        AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the signed-in customer to subsequent Sentry events.
pub fn set_sentry_user(customer: CustomerId, email: &Email) {
    let user = sentry::User {
        id: Some(customer.to_string()),
        email: Some(email.as_str().to_owned()),
        ..Default::default()
    };
    sentry::configure_scope(|scope| scope.set_user(Some(user)));
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a shopper action so error reports show what led up to them.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        data: data
            .iter()
            .map(|(key, value)| ((*key).to_owned(), serde_json::Value::from(*value)))
            .collect(),
        ..Default::default()
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        let cases = [
            (AppError::NotFound("product 42".into()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("login".into()), StatusCode::UNAUTHORIZED),
            (AppError::BadRequest("page".into()), StatusCode::BAD_REQUEST),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (AppError::Supabase(SupabaseError::RateLimited(5)), StatusCode::TOO_MANY_REQUESTS),
            (AppError::Review(ReviewError::AlreadyReviewed), StatusCode::CONFLICT),
            (AppError::Review(ReviewError::ProductNotFound), StatusCode::NOT_FOUND),
            (AppError::Auth(AuthError::PasswordMismatch), StatusCode::BAD_REQUEST),
            (AppError::Auth(AuthError::UserAlreadyExists), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[tokio::test]
    async fn internal_details_stay_server_side() {
        let response =
            AppError::Database(RepositoryError::DataCorruption("bad price in row 7".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"Internal server error");
    }
}
