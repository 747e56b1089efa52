//! Authentication route handlers.
//!
//! Email/password login and registration post to GoTrue through
//! [`AuthService`]. Google OAuth and password recovery both leave the site
//! and come back through `/{locale}/auth/callback` with a PKCE code; the
//! verifier and a CSRF `state` wait in the session meanwhile.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aunclic_core::Locale;

use super::shell::Shell;
use crate::error::{AppError, auth_status};
use crate::filters;
use crate::flash::{self, Flash};
use crate::middleware::{
    CurrentLocale, OptionalAuth, RequireAuth, clear_current_user, safe_redirect_path,
    set_current_user,
};
use crate::models::session_keys;
use crate::services::auth::{
    AuthError, AuthService, PkcePair, RegisterInput, RegisterOutcome, generate_state,
};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "confirmPassword")]
    pub confirm_password: String,
}

// =============================================================================
// Query Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

/// Which round trip a callback completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackFlow {
    #[default]
    Oauth,
    Recovery,
}

impl CallbackFlow {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Oauth => "oauth",
            Self::Recovery => "recovery",
        }
    }

    /// Session keys holding this flow's verifier and CSRF state.
    const fn session_keys(self) -> (&'static str, &'static str) {
        match self {
            Self::Oauth => (session_keys::OAUTH_VERIFIER, session_keys::OAUTH_STATE),
            Self::Recovery => (session_keys::RECOVERY_VERIFIER, session_keys::RECOVERY_STATE),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub flow: CallbackFlow,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub shell: Shell,
    pub email: String,
    pub redirect: String,
    pub error: Option<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub shell: Shell,
    pub name: String,
    pub email: String,
    pub error: Option<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub shell: Shell,
    pub email: String,
    pub sent: bool,
    pub error: Option<&'static str>,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub shell: Shell,
    pub error: Option<&'static str>,
}

// =============================================================================
// Helpers
// =============================================================================

fn service(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.pool(), state.supabase(), state.auth_events())
}

fn home(locale: Locale) -> String {
    format!("/{}", locale.code())
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

/// Log server-side failures and return the toast key for the form.
fn error_key(err: &AuthError) -> &'static str {
    if err.is_server_error() {
        tracing::error!(error = %err, "Auth request failed");
    } else {
        tracing::debug!(error = %err, "Auth request rejected");
    }
    err.message_key()
}

/// Absolute callback URL GoTrue redirects back to.
fn callback_url(state: &AppState, locale: Locale, flow: CallbackFlow, csrf: &str) -> String {
    format!(
        "{}/{}/auth/callback?flow={}&state={csrf}",
        state.config().base_url.trim_end_matches('/'),
        locale.code(),
        flow.as_str()
    )
}

/// Keep a fresh verifier and state for the upcoming round trip.
async fn begin_round_trip(
    session: &Session,
    flow: CallbackFlow,
) -> Result<(PkcePair, String), AppError> {
    let (verifier_key, state_key) = flow.session_keys();
    let pkce = PkcePair::generate();
    let csrf = generate_state();
    session
        .insert(verifier_key, &pkce.verifier)
        .await
        .map_err(|e| session_error(&e))?;
    session
        .insert(state_key, &csrf)
        .await
        .map_err(|e| session_error(&e))?;
    Ok((pkce, csrf))
}

/// Consume the verifier and state stored for `flow`. Single use.
async fn take_round_trip(
    session: &Session,
    flow: CallbackFlow,
) -> Result<(Option<String>, Option<String>), AppError> {
    let (verifier_key, state_key) = flow.session_keys();
    let verifier = session
        .remove(verifier_key)
        .await
        .map_err(|e| session_error(&e))?;
    let csrf = session
        .remove(state_key)
        .await
        .map_err(|e| session_error(&e))?;
    Ok((verifier, csrf))
}

// =============================================================================
// Login
// =============================================================================

/// Display the login page. Logged-in shoppers go straight to the target.
pub async fn login_page(shell: Shell, Query(query): Query<RedirectQuery>) -> Response {
    let redirect = safe_redirect_path(query.redirect.as_deref())
        .unwrap_or_default()
        .to_owned();
    if shell.is_logged_in() {
        let target = if redirect.is_empty() { home(shell.locale) } else { redirect };
        return Redirect::to(&target).into_response();
    }

    LoginTemplate {
        shell: shell.with_title("login.title"),
        email: String::new(),
        redirect,
        error: None,
    }
    .into_response()
}

/// Handle the login form.
///
/// # Errors
///
/// Returns an error only if the session cannot be written.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    shell: Shell,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let redirect = safe_redirect_path(form.redirect.as_deref())
        .unwrap_or_default()
        .to_owned();

    match service(&state).login(&form.email, &form.password).await {
        Ok(user) => {
            set_current_user(&session, &user)
                .await
                .map_err(|e| session_error(&e))?;
            flash::push(&session, Flash::success("toast.loginSuccess")).await;
            let target = if redirect.is_empty() { home(shell.locale) } else { redirect };
            Ok(Redirect::to(&target).into_response())
        }
        Err(err) => {
            let status = auth_status(&err);
            let template = LoginTemplate {
                shell: shell.with_title("login.title"),
                email: form.email.trim().to_owned(),
                redirect,
                error: Some(error_key(&err)),
            };
            Ok((status, template).into_response())
        }
    }
}

// =============================================================================
// Registration
// =============================================================================

pub async fn register_page(shell: Shell) -> Response {
    if shell.is_logged_in() {
        return Redirect::to(&home(shell.locale)).into_response();
    }
    RegisterTemplate {
        shell: shell.with_title("register.title"),
        name: String::new(),
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle the registration form.
///
/// # Errors
///
/// Returns an error only if the session cannot be written.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    shell: Shell,
    session: Session,
    Form(form): Form<RegisterInput>,
) -> Result<Response, AppError> {
    let locale = shell.locale;
    let confirm_redirect = format!(
        "{}/{}/login",
        state.config().base_url.trim_end_matches('/'),
        locale.code()
    );

    match service(&state).register(&form, &confirm_redirect).await {
        Ok(RegisterOutcome::SignedIn(user)) => {
            set_current_user(&session, &user)
                .await
                .map_err(|e| session_error(&e))?;
            flash::push(&session, Flash::success("toast.registerSuccess")).await;
            Ok(Redirect::to(&home(locale)).into_response())
        }
        Ok(RegisterOutcome::ConfirmationSent(email)) => {
            tracing::info!(domain = email.domain(), "Confirmation email sent");
            flash::push(&session, Flash::info("toast.confirmEmail")).await;
            Ok(Redirect::to(&format!("/{}/login", locale.code())).into_response())
        }
        Err(err) => {
            let status = auth_status(&err);
            let template = RegisterTemplate {
                shell: shell.with_title("register.title"),
                name: form.name.trim().to_owned(),
                email: form.email.trim().to_owned(),
                error: Some(error_key(&err)),
            };
            Ok((status, template).into_response())
        }
    }
}

// =============================================================================
// Password Reset
// =============================================================================

pub async fn forgot_password_page(shell: Shell) -> impl IntoResponse {
    ForgotPasswordTemplate {
        shell: shell.with_title("forgot.title"),
        email: String::new(),
        sent: false,
        error: None,
    }
}

/// Send the recovery email.
///
/// # Errors
///
/// Returns an error only if the session cannot be written.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    shell: Shell,
    session: Session,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    let (pkce, csrf) = begin_round_trip(&session, CallbackFlow::Recovery).await?;
    let redirect_to = callback_url(&state, shell.locale, CallbackFlow::Recovery, &csrf);

    let (sent, error, status) = match service(&state)
        .request_password_reset(&form.email, &redirect_to, &pkce)
        .await
    {
        Ok(_) => (true, None, StatusCode::OK),
        Err(err) => (false, Some(error_key(&err)), auth_status(&err)),
    };

    let template = ForgotPasswordTemplate {
        shell: shell.with_title("forgot.title"),
        email: form.email.trim().to_owned(),
        sent,
        error,
    };
    Ok((status, template).into_response())
}

/// Display the new-password form. Reached through the recovery callback,
/// which has already logged the shopper in.
pub async fn reset_password_page(RequireAuth(_user): RequireAuth, shell: Shell) -> impl IntoResponse {
    ResetPasswordTemplate {
        shell: shell.with_title("reset.title"),
        error: None,
    }
}

/// Set the new password.
///
/// # Errors
///
/// Returns an error only if the session cannot be written.
#[instrument(skip_all, fields(customer = %user.customer_id))]
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    shell: Shell,
    session: Session,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    let locale = shell.locale;
    match service(&state)
        .update_password(&user, &form.password, &form.confirm_password)
        .await
    {
        Ok(()) => {
            flash::push(&session, Flash::success("toast.passwordUpdated")).await;
            Ok(Redirect::to(&format!("/{}/perfil", locale.code())).into_response())
        }
        Err(AuthError::InvalidSessionState) => {
            clear_current_user(&session)
                .await
                .map_err(|e| session_error(&e))?;
            flash::push(&session, Flash::error("auth.linkExpired")).await;
            Ok(Redirect::to(&format!("/{}/forgot-password", locale.code())).into_response())
        }
        Err(err) => {
            let status = auth_status(&err);
            let template = ResetPasswordTemplate {
                shell: shell.with_title("reset.title"),
                error: Some(error_key(&err)),
            };
            Ok((status, template).into_response())
        }
    }
}

// =============================================================================
// Google OAuth and the shared callback
// =============================================================================

/// Start Google sign-in.
///
/// # Errors
///
/// Returns an error if the session cannot be written or the authorize URL
/// cannot be built.
#[instrument(skip_all)]
pub async fn google(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    session: Session,
    Query(query): Query<RedirectQuery>,
) -> Result<Redirect, AppError> {
    let (pkce, csrf) = begin_round_trip(&session, CallbackFlow::Oauth).await?;

    match safe_redirect_path(query.redirect.as_deref()) {
        Some(target) => session
            .insert(session_keys::POST_LOGIN_REDIRECT, target)
            .await
            .map_err(|e| session_error(&e))?,
        None => {
            session
                .remove::<String>(session_keys::POST_LOGIN_REDIRECT)
                .await
                .map_err(|e| session_error(&e))?;
        }
    }

    let redirect_to = callback_url(&state, locale, CallbackFlow::Oauth, &csrf);
    let url = state
        .supabase()
        .authorize_url("google", &redirect_to, &pkce.challenge)?;
    Ok(Redirect::to(url.as_str()))
}

/// Finish an OAuth login or a password recovery link.
///
/// # Errors
///
/// Returns an error only if the session cannot be written.
#[instrument(skip_all, fields(flow = query.flow.as_str()))]
pub async fn callback(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let failure_page = match query.flow {
        CallbackFlow::Oauth => format!("/{}/login", locale.code()),
        CallbackFlow::Recovery => format!("/{}/forgot-password", locale.code()),
    };

    let (verifier, expected_state) = take_round_trip(&session, query.flow).await?;

    if let Some(error) = &query.error {
        tracing::warn!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "Provider returned an error"
        );
        let key = match query.flow {
            CallbackFlow::Oauth => "auth.oauthError",
            CallbackFlow::Recovery => "auth.linkExpired",
        };
        flash::push(&session, Flash::error(key)).await;
        return Ok(Redirect::to(&failure_page));
    }

    let state_matches = matches!(
        (&expected_state, &query.state),
        (Some(expected), Some(got)) if expected == got
    );
    let (Some(verifier), Some(code), true) = (verifier, query.code.as_deref(), state_matches)
    else {
        tracing::warn!("Auth callback without matching state or verifier");
        flash::push(&session, Flash::error("auth.linkExpired")).await;
        return Ok(Redirect::to(&failure_page));
    };

    let user = match service(&state).complete_code_exchange(code, &verifier).await {
        Ok(user) => user,
        Err(err) => {
            flash::push(&session, Flash::error(error_key(&err))).await;
            return Ok(Redirect::to(&failure_page));
        }
    };

    set_current_user(&session, &user)
        .await
        .map_err(|e| session_error(&e))?;

    match query.flow {
        CallbackFlow::Recovery => Ok(Redirect::to(&format!("/{}/reset-password", locale.code()))),
        CallbackFlow::Oauth => {
            let target: Option<String> = session
                .remove(session_keys::POST_LOGIN_REDIRECT)
                .await
                .map_err(|e| session_error(&e))?;
            flash::push(&session, Flash::success("toast.loginSuccess")).await;
            let target = target
                .as_deref()
                .and_then(|t| safe_redirect_path(Some(t)))
                .map_or_else(|| home(locale), str::to_owned);
            Ok(Redirect::to(&target))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log out locally and revoke the GoTrue session.
///
/// # Errors
///
/// Returns an error if the session cannot be cleared.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    OptionalAuth(user): OptionalAuth,
    session: Session,
) -> Result<Redirect, AppError> {
    if let Some(user) = user {
        service(&state).logout(&user).await;
    }
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    flash::push(&session, Flash::success("toast.logoutSuccess")).await;
    Ok(Redirect::to(&home(locale)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[test]
    fn callback_flow_parses_from_query() {
        let query = parse_callback("code=abc&state=xyz&flow=recovery");
        assert_eq!(query.flow, CallbackFlow::Recovery);
        assert_eq!(query.code.as_deref(), Some("abc"));

        let query = parse_callback("code=abc&state=xyz");
        assert_eq!(query.flow, CallbackFlow::Oauth);
    }

    fn parse_callback(raw: &str) -> CallbackQuery {
        let uri: axum::http::Uri = format!("/es/auth/callback?{raw}")
            .parse()
            .unwrap_or_default();
        Query::<CallbackQuery>::try_from_uri(&uri)
            .map(|q| q.0)
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn recovery_request_keeps_pending_oauth_verifier() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let (oauth, oauth_csrf) = begin_round_trip(&session, CallbackFlow::Oauth)
            .await
            .unwrap();
        let (recovery, recovery_csrf) = begin_round_trip(&session, CallbackFlow::Recovery)
            .await
            .unwrap();

        let (verifier, csrf) = take_round_trip(&session, CallbackFlow::Oauth).await.unwrap();
        assert_eq!(verifier.as_deref(), Some(oauth.verifier.as_str()));
        assert_eq!(csrf.as_deref(), Some(oauth_csrf.as_str()));

        let (verifier, csrf) = take_round_trip(&session, CallbackFlow::Recovery)
            .await
            .unwrap();
        assert_eq!(verifier.as_deref(), Some(recovery.verifier.as_str()));
        assert_eq!(csrf.as_deref(), Some(recovery_csrf.as_str()));
    }

    #[tokio::test]
    async fn round_trip_values_are_single_use() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        begin_round_trip(&session, CallbackFlow::Oauth).await.unwrap();

        take_round_trip(&session, CallbackFlow::Oauth).await.unwrap();
        let (verifier, csrf) = take_round_trip(&session, CallbackFlow::Oauth).await.unwrap();
        assert!(verifier.is_none());
        assert!(csrf.is_none());
    }

    #[test]
    fn home_is_locale_root() {
        assert_eq!(home(Locale::Fr), "/fr");
    }
}
