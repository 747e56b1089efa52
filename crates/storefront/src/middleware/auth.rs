//! Authentication extractors.
//!
//! The logged-in shopper is the `CurrentUser` stored in the session at login.
//! Both extractors tag the request's Sentry hub with that shopper; the hub is
//! forked per request by `NewSentryLayer`, so the tag never outlives it.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use aunclic_core::Locale;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in shopper.
///
/// Page requests are redirected to `/{locale}/login?redirect=<current path>`;
/// HTMX requests get a 401 with an `HX-Redirect` header instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn favorites(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when a page needs a login.
#[derive(Debug)]
pub enum AuthRejection {
    RedirectToLogin(String),
    /// HTMX request: the client follows `HX-Redirect`.
    HxRedirect(String),
    /// No session layer on this route.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(to) => Redirect::to(&to).into_response(),
            Self::HxRedirect(to) => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                if let Ok(value) = HeaderValue::from_str(&to) {
                    response.headers_mut().insert("hx-redirect", value);
                }
                response
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// `/{locale}/login?redirect=…` for a request that needs a login.
#[must_use]
pub fn login_url(locale: Locale, return_to: &str) -> String {
    format!(
        "/{}/login?redirect={}",
        locale.code(),
        urlencoding::encode(return_to)
    )
}

fn is_htmx(parts: &Parts) -> bool {
    parts.headers.get("hx-request").is_some_and(|v| v == "true")
}

/// Path the shopper asked for, before any router nesting stripped it.
fn requested_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user = session_user(session).await;

        user.map(Self).ok_or_else(|| {
            let locale = parts.extensions.get::<Locale>().copied().unwrap_or_default();
            let return_to = if is_htmx(parts) {
                // the fragment URL is not a page; send them back to where they were
                parts
                    .headers
                    .get("hx-current-url")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|u| url::Url::parse(u).ok())
                    .map_or_else(|| format!("/{}", locale.code()), |u| u.path().to_owned())
            } else {
                requested_path(parts)
            };

            let to = login_url(locale, &return_to);
            if is_htmx(parts) {
                AuthRejection::HxRedirect(to)
            } else {
                AuthRejection::RedirectToLogin(to)
            }
        })
    }
}

async fn session_user(session: &Session) -> Option<CurrentUser> {
    let user: Option<CurrentUser> = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten();
    if let Some(user) = &user {
        set_sentry_user(user.customer_id, &user.email);
    }
    user
}

/// Extractor that optionally gets the current shopper.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the shopper in the session, rotating the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    set_sentry_user(user.customer_id, &user.email);
    Ok(())
}

/// Remove the shopper from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(session_keys::CURRENT_USER).await?;
    clear_sentry_user();
    session.cycle_id().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use sentry::Hub;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::models::AccessToken;
    use aunclic_core::{CustomerId, Email};

    fn shopper() -> CurrentUser {
        CurrentUser {
            customer_id: CustomerId::new(42),
            auth_id: uuid::Uuid::nil(),
            email: Email::parse("ana@example.com").unwrap(),
            name: Some("Ana".to_owned()),
            access_token: AccessToken::new("jwt".to_owned()),
        }
    }

    fn event_user(event: &sentry::protocol::Event<'_>) -> Option<String> {
        event.user.as_ref().and_then(|u| u.id.clone())
    }

    #[test]
    fn sentry_user_is_scoped_to_the_request_hub() {
        let events = sentry::test::with_captured_events(|| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            // what NewSentryLayer does for each request
            let request_hub = Arc::new(Hub::new_from_top(Hub::current()));
            Hub::run(request_hub, || {
                runtime.block_on(async {
                    let session = Session::new(None, Arc::new(MemoryStore::default()), None);
                    session.insert(session_keys::CURRENT_USER, shopper()).await.unwrap();

                    let (mut parts, ()) = Request::builder()
                        .uri("/es/favoritos")
                        .body(())
                        .unwrap()
                        .into_parts();
                    parts.extensions.insert(session);
                    let OptionalAuth(user) =
                        OptionalAuth::from_request_parts(&mut parts, &()).await.unwrap();
                    assert!(user.is_some());
                });
                sentry::capture_message("inside", sentry::Level::Error);
            });

            // the next request on this thread starts from a clean hub
            let next_hub = Arc::new(Hub::new_from_top(Hub::current()));
            Hub::run(next_hub, || {
                sentry::capture_message("next request", sentry::Level::Error);
            });
        });

        assert_eq!(events.len(), 2);
        assert_eq!(events.first().and_then(event_user).as_deref(), Some("42"));
        assert_eq!(events.get(1).and_then(event_user), None);
    }

    #[test]
    fn login_url_encodes_return_path() {
        assert_eq!(
            login_url(Locale::Fr, "/fr/favoritos?sort=oldest"),
            "/fr/login?redirect=%2Ffr%2Ffavoritos%3Fsort%3Doldest"
        );
    }

    #[tokio::test]
    async fn missing_session_layer_is_unauthorized() {
        let (mut parts, ()) = Request::builder()
            .uri("/es/favoritos")
            .body(())
            .unwrap()
            .into_parts();
        let rejection = RequireAuth::from_request_parts(&mut parts, &()).await.err();
        assert!(matches!(rejection, Some(AuthRejection::Unauthorized)));
    }

    #[test]
    fn hx_redirect_sets_header() {
        let response = AuthRejection::HxRedirect("/es/login?redirect=%2Fes".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("hx-redirect").and_then(|v| v.to_str().ok()),
            Some("/es/login?redirect=%2Fes")
        );
    }
}
