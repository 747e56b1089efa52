//! Authentication error types.

use thiserror::Error;

use aunclic_core::EmailError;

use crate::db::RepositoryError;
use crate::supabase::SupabaseError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("name is required")]
    MissingName,

    #[error("password validation failed: {0}")]
    WeakPassword(String),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("email not confirmed")]
    EmailNotConfirmed,

    /// PKCE verifier or OAuth state missing from the session, or mismatched.
    #[error("invalid session state")]
    InvalidSessionState,

    #[error("auth provider error: {0}")]
    Supabase(#[source] SupabaseError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AuthError {
    /// Classify a GoTrue failure.
    ///
    /// Rejections the shopper can act on get their own variant; everything
    /// else stays a `Supabase` error.
    #[must_use]
    pub fn from_supabase(err: SupabaseError) -> Self {
        let SupabaseError::Api {
            status,
            ref code,
            ref message,
        } = err
        else {
            return Self::Supabase(err);
        };

        let message_lower = message.to_lowercase();
        let classified = match code.as_deref() {
            Some("invalid_credentials" | "invalid_grant")
                if message_lower.contains("not confirmed") =>
            {
                Some(Self::EmailNotConfirmed)
            }
            Some("email_not_confirmed") => Some(Self::EmailNotConfirmed),
            Some("invalid_credentials" | "invalid_grant") => Some(Self::InvalidCredentials),
            Some("user_already_exists" | "email_exists") => Some(Self::UserAlreadyExists),
            Some("weak_password") => Some(Self::WeakPassword(message.clone())),
            Some("flow_state_not_found" | "flow_state_expired" | "bad_code_verifier") => {
                Some(Self::InvalidSessionState)
            }
            _ if message_lower.contains("already registered") => Some(Self::UserAlreadyExists),
            _ if status == 422 && message_lower.contains("password") => {
                Some(Self::WeakPassword(message.clone()))
            }
            _ => None,
        };

        classified.unwrap_or_else(|| Self::Supabase(err))
    }

    /// Toast message key shown to the shopper.
    #[must_use]
    pub const fn message_key(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "auth.invalidEmail",
            Self::InvalidCredentials => "auth.invalidCredentials",
            Self::MissingName => "auth.nameRequired",
            Self::WeakPassword(_) => "auth.weakPassword",
            Self::PasswordMismatch => "auth.passwordMismatch",
            Self::UserAlreadyExists => "auth.userExists",
            Self::EmailNotConfirmed => "auth.emailNotConfirmed",
            Self::InvalidSessionState => "auth.linkExpired",
            Self::Supabase(SupabaseError::RateLimited(_)) => "auth.rateLimited",
            Self::Supabase(_) | Self::Repository(_) => "auth.unexpected",
        }
    }

    /// Whether this is an infrastructure failure worth reporting.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Repository(_) => true,
            Self::Supabase(SupabaseError::RateLimited(_)) => false,
            Self::Supabase(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: Option<&str>, message: &str) -> SupabaseError {
        SupabaseError::Api {
            status,
            code: code.map(str::to_owned),
            message: message.to_owned(),
        }
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let err = AuthError::from_supabase(api(
            400,
            Some("invalid_credentials"),
            "Invalid login credentials",
        ));
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.message_key(), "auth.invalidCredentials");
    }

    #[test]
    fn unconfirmed_email_from_either_shape() {
        let new_shape = api(400, Some("email_not_confirmed"), "Email not confirmed");
        let old_shape = api(400, Some("invalid_grant"), "Email not confirmed");
        assert!(matches!(AuthError::from_supabase(new_shape), AuthError::EmailNotConfirmed));
        assert!(matches!(AuthError::from_supabase(old_shape), AuthError::EmailNotConfirmed));
    }

    #[test]
    fn duplicate_signup_by_code_or_message() {
        let by_code = api(422, Some("user_already_exists"), "User already registered");
        let by_message = api(400, None, "User already registered");
        assert!(matches!(AuthError::from_supabase(by_code), AuthError::UserAlreadyExists));
        assert!(matches!(AuthError::from_supabase(by_message), AuthError::UserAlreadyExists));
    }

    #[test]
    fn weak_password_keeps_reason() {
        let err = AuthError::from_supabase(api(
            422,
            Some("weak_password"),
            "Password should be at least 6 characters.",
        ));
        let AuthError::WeakPassword(reason) = err else {
            panic!("expected WeakPassword");
        };
        assert!(reason.contains("6 characters"));
    }

    #[test]
    fn outages_stay_server_errors() {
        let err = AuthError::from_supabase(api(500, None, "upstream timeout"));
        assert!(err.is_server_error());
        assert_eq!(err.message_key(), "auth.unexpected");

        let limited = AuthError::from_supabase(SupabaseError::RateLimited(30));
        assert!(!limited.is_server_error());
        assert_eq!(limited.message_key(), "auth.rateLimited");
    }
}
