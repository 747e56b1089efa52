//! Types stored in the session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aunclic_core::{CustomerId, Email};

/// Supabase access token (JWT) kept server-side for user-scoped calls.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// The logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub customer_id: CustomerId,
    /// Supabase auth identity.
    pub auth_id: Uuid,
    pub email: Email,
    pub name: Option<String>,
    pub access_token: AccessToken,
}

impl CurrentUser {
    /// Name for the navbar greeting, falling back to the email local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.email.local_part())
    }
}

/// Session keys.
pub mod keys {
    pub const CURRENT_USER: &str = "current_user";

    /// Pending toast notifications.
    pub const FLASHES: &str = "flashes";

    /// PKCE verifier and CSRF state for Google sign-in.
    pub const OAUTH_VERIFIER: &str = "oauth_verifier";
    pub const OAUTH_STATE: &str = "oauth_state";

    /// Same pair for a password-recovery link. Kept apart from the OAuth
    /// pair so asking for a reset email mid sign-in breaks neither.
    pub const RECOVERY_VERIFIER: &str = "recovery_verifier";
    pub const RECOVERY_STATE: &str = "recovery_state";

    /// Where to send the user after a successful login.
    pub const POST_LOGIN_REDIRECT: &str = "post_login_redirect";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(name: Option<&str>) -> CurrentUser {
        CurrentUser {
            customer_id: CustomerId::new(1),
            auth_id: Uuid::nil(),
            email: Email::parse("lucia@example.ca").unwrap(),
            name: name.map(String::from),
            access_token: AccessToken::new("eyJ.secret.jwt".to_owned()),
        }
    }

    #[test]
    fn display_name_falls_back_to_email() {
        assert_eq!(user(Some("Lucía")).display_name(), "Lucía");
        assert_eq!(user(Some("  ")).display_name(), "lucia");
        assert_eq!(user(None).display_name(), "lucia");
    }

    #[test]
    fn debug_hides_token() {
        let debug = format!("{:?}", user(None));
        assert!(!debug.contains("eyJ.secret.jwt"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn survives_session_serialization() {
        let json = serde_json::to_value(user(Some("Lucía"))).unwrap();
        let back: CurrentUser = serde_json::from_value(json).unwrap();
        assert_eq!(back.access_token.expose(), "eyJ.secret.jwt");
        assert_eq!(back.email.as_str(), "lucia@example.ca");
    }
}
