//! GoTrue endpoints used by the storefront.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use super::{SupabaseClient, SupabaseError};

/// `code_challenge_method` value GoTrue expects for SHA-256 challenges.
const CHALLENGE_METHOD: &str = "s256";

/// A Supabase user as returned by GoTrue.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    /// Set by OAuth providers such as Google.
    #[serde(default)]
    pub full_name: Option<String>,
}

impl AuthUser {
    /// Name from sign-up metadata, falling back to the OAuth profile name.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        let present = |n: &&str| !n.trim().is_empty();
        self.user_metadata
            .name
            .as_deref()
            .filter(present)
            .or_else(|| self.user_metadata.full_name.as_deref().filter(present))
    }
}

/// Tokens plus the signed-in user.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Sign-up either logs the user in (auto-confirm) or waits for the
/// confirmation email.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(AuthSession),
    PendingConfirmation(AuthUser),
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl SupabaseClient {
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` for rejected credentials.
    #[instrument(skip_all)]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&PasswordCredentials { email, password });

        self.send(request, None).await
    }

    /// Register a user, storing `name` in the user metadata.
    ///
    /// `redirect_to` is where the confirmation email link lands.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` if the email is taken or the password is
    /// rejected.
    #[instrument(skip_all)]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpResponse, SupabaseError> {
        let mut request = self.inner.client.post(self.endpoint("/auth/v1/signup"));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        let request = request.json(&json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        }));

        self.send(request, None).await
    }

    /// Send a password reset email whose link completes a PKCE exchange.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if GoTrue rejects the request.
    #[instrument(skip_all)]
    pub async fn recover(
        &self,
        email: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<(), SupabaseError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/v1/recover"))
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({
                "email": email,
                "code_challenge": code_challenge,
                "code_challenge_method": CHALLENGE_METHOD,
            }));

        self.send_raw(request, None).await.map(|_| ())
    }

    /// URL that starts an OAuth sign-in with `provider`.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::InvalidUrl` if the project URL is malformed.
    pub fn authorize_url(
        &self,
        provider: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> Result<Url, SupabaseError> {
        let mut url = Url::parse(&self.endpoint("/auth/v1/authorize"))?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", CHALLENGE_METHOD);
        Ok(url)
    }

    /// Trade an auth code for a session.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError::Api` if the code is expired or the verifier
    /// does not match.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "pkce")])
            .json(&json!({
                "auth_code": auth_code,
                "code_verifier": code_verifier,
            }));

        self.send(request, None).await
    }

    /// # Errors
    ///
    /// Returns `SupabaseError::Api` if the token is invalid or the password
    /// is rejected.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<AuthUser, SupabaseError> {
        let request = self
            .inner
            .client
            .put(self.endpoint("/auth/v1/user"))
            .json(&json!({ "password": password }));

        self.send(request, Some(access_token)).await
    }

    /// Revoke the session's refresh tokens.
    ///
    /// # Errors
    ///
    /// Returns `SupabaseError` if the request fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let request = self.inner.client.post(self.endpoint("/auth/v1/logout"));
        self.send_raw(request, Some(access_token)).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::SupabaseConfig;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: Url::parse("https://abcd1234.supabase.co").unwrap(),
            anon_key: SecretString::from("anon-key"),
        })
        .unwrap()
    }

    #[test]
    fn authorize_url_carries_pkce_challenge() {
        let url = client()
            .authorize_url(
                "google",
                "https://aunclicla.ca/es/auth/callback?flow=oauth&state=abc",
                "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
            )
            .unwrap();

        assert_eq!(url.path(), "/auth/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("provider".into(), "google".into())));
        assert!(pairs.contains(&("code_challenge_method".into(), "s256".into())));
        assert!(pairs.contains(&(
            "redirect_to".into(),
            "https://aunclicla.ca/es/auth/callback?flow=oauth&state=abc".into()
        )));
    }

    #[test]
    fn signup_with_session_when_auto_confirmed() {
        let body = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": {"id": "7f1c1b8e-9c1a-4b8e-8a51-0f6f2a9c3d11", "email": "ana@example.com",
                     "user_metadata": {"name": "Ana"}}
        }"#;
        let response: SignUpResponse = serde_json::from_str(body).unwrap();
        let SignUpResponse::Session(session) = response else {
            panic!("expected session");
        };
        assert_eq!(session.user.display_name(), Some("Ana"));
    }

    #[test]
    fn signup_without_session_needs_confirmation() {
        let body = r#"{
            "id": "7f1c1b8e-9c1a-4b8e-8a51-0f6f2a9c3d11",
            "email": "ana@example.com",
            "confirmation_sent_at": "2024-05-01T12:00:00Z",
            "user_metadata": {}
        }"#;
        let response: SignUpResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response, SignUpResponse::PendingConfirmation(_)));
    }

    #[test]
    fn oauth_full_name_is_a_fallback() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id": "7f1c1b8e-9c1a-4b8e-8a51-0f6f2a9c3d11",
                "user_metadata": {"name": " ", "full_name": "Ana Gómez"}}"#,
        )
        .unwrap();
        assert_eq!(user.display_name(), Some("Ana Gómez"));
    }

    #[test]
    fn session_debug_hides_token() {
        let session: AuthSession = serde_json::from_str(
            r#"{"access_token": "secret-jwt",
                "user": {"id": "7f1c1b8e-9c1a-4b8e-8a51-0f6f2a9c3d11"}}"#,
        )
        .unwrap();
        assert!(!format!("{session:?}").contains("secret-jwt"));
    }
}
