//! Authentication service.
//!
//! Credentials never touch this database: Supabase GoTrue verifies them and
//! issues the access token. This service validates form input, calls GoTrue,
//! and makes sure a `storefront.customer` row exists for the identity.

mod error;
pub mod pkce;

pub use error::AuthError;
pub use pkce::{PkcePair, generate_state};

use sqlx::PgPool;

use aunclic_core::Email;

use crate::db::{CustomerRepository, RepositoryError};
use crate::models::{AccessToken, CurrentUser};
use crate::services::events::{AuthEvent, AuthEvents};
use crate::supabase::{AuthSession, SignUpResponse, SupabaseClient};

/// GoTrue's default minimum.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration form.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug)]
pub enum RegisterOutcome {
    /// Auto-confirmed project: the user is logged in.
    SignedIn(CurrentUser),
    /// A confirmation email was sent to this address.
    ConfirmationSent(Email),
}

pub struct AuthService<'a> {
    customers: CustomerRepository<'a>,
    supabase: &'a SupabaseClient,
    events: &'a AuthEvents,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, supabase: &'a SupabaseClient, events: &'a AuthEvents) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
            supabase,
            events,
        }
    }

    /// Email/password login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong password and
    /// `AuthError::EmailNotConfirmed` before the account is confirmed.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self
            .supabase
            .sign_in_with_password(email.as_str(), password)
            .await
            .map_err(AuthError::from_supabase)?;

        self.establish(session).await
    }

    /// Create an account. `redirect_to` is where the confirmation link lands.
    ///
    /// # Errors
    ///
    /// Returns a validation error before calling GoTrue, or
    /// `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn register(
        &self,
        input: &RegisterInput,
        redirect_to: &str,
    ) -> Result<RegisterOutcome, AuthError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(&input.email)?;
        validate_password(&input.password)?;
        confirm_matches(&input.password, &input.confirm_password)?;

        let response = self
            .supabase
            .sign_up(email.as_str(), &input.password, name, Some(redirect_to))
            .await
            .map_err(AuthError::from_supabase)?;

        match response {
            SignUpResponse::Session(session) => {
                self.events.publish(AuthEvent::SignedUp {
                    email,
                    confirmed: true,
                });
                self.establish(session).await.map(RegisterOutcome::SignedIn)
            }
            SignUpResponse::PendingConfirmation(_) => {
                self.events.publish(AuthEvent::SignedUp {
                    email: email.clone(),
                    confirmed: false,
                });
                Ok(RegisterOutcome::ConfirmationSent(email))
            }
        }
    }

    /// Send the reset email. The caller keeps `pkce.verifier` in the session
    /// so the link can be exchanged later.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or a GoTrue failure.
    pub async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
        pkce: &PkcePair,
    ) -> Result<Email, AuthError> {
        let email = Email::parse(email)?;

        self.supabase
            .recover(email.as_str(), redirect_to, &pkce.challenge)
            .await
            .map_err(AuthError::from_supabase)?;

        self.events.publish(AuthEvent::PasswordRecoveryRequested {
            email: email.clone(),
        });
        Ok(email)
    }

    /// Finish an OAuth or recovery redirect by trading the code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSessionState` if the code or verifier is
    /// rejected.
    pub async fn complete_code_exchange(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<CurrentUser, AuthError> {
        if code.trim().is_empty() || verifier.is_empty() {
            return Err(AuthError::InvalidSessionState);
        }

        let session = self
            .supabase
            .exchange_code(code, verifier)
            .await
            .map_err(|e| match AuthError::from_supabase(e) {
                AuthError::InvalidCredentials => AuthError::InvalidSessionState,
                other => other,
            })?;

        self.establish(session).await
    }

    /// # Errors
    ///
    /// Returns a validation error, or `AuthError::InvalidSessionState` when
    /// the access token has expired.
    pub async fn update_password(
        &self,
        user: &CurrentUser,
        password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        validate_password(password)?;
        confirm_matches(password, confirm)?;

        self.supabase
            .update_password(user.access_token.expose(), password)
            .await
            .map_err(|e| match e {
                crate::supabase::SupabaseError::Api { status: 401 | 403, .. } => {
                    AuthError::InvalidSessionState
                }
                other => AuthError::from_supabase(other),
            })?;

        self.events.publish(AuthEvent::PasswordUpdated {
            customer_id: user.customer_id,
        });
        Ok(())
    }

    /// Revoke the GoTrue session. Failures are logged, not returned: the
    /// local session is cleared regardless.
    pub async fn logout(&self, user: &CurrentUser) {
        if let Err(e) = self.supabase.sign_out(user.access_token.expose()).await {
            tracing::warn!(error = %e, customer = %user.customer_id, "Supabase sign-out failed");
        }
        self.events.publish(AuthEvent::SignedOut {
            customer_id: user.customer_id,
        });
    }

    /// Turn a GoTrue session into a `CurrentUser`, creating the customer row
    /// on first login.
    async fn establish(&self, session: AuthSession) -> Result<CurrentUser, AuthError> {
        let raw_email = session.user.email.as_deref().unwrap_or_default();
        let email = Email::parse(raw_email).map_err(|e| {
            AuthError::Repository(RepositoryError::DataCorruption(format!(
                "auth user {} has invalid email: {e}",
                session.user.id
            )))
        })?;

        let customer = self
            .customers
            .upsert_from_auth(session.user.id, &email, session.user.display_name())
            .await?;

        self.events.publish(AuthEvent::SignedIn {
            customer_id: customer.id,
            email: customer.email.clone(),
        });

        Ok(CurrentUser {
            customer_id: customer.id,
            auth_id: customer.auth_id,
            email: customer.email,
            name: customer.name,
            access_token: AccessToken::new(session.access_token),
        })
    }
}

/// # Errors
///
/// Returns `AuthError::WeakPassword` below [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn confirm_matches(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password == confirm {
        Ok(())
    } else {
        Err(AuthError::PasswordMismatch)
    }
}
