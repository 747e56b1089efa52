//! Locale routing: legacy unprefixed paths, the root redirect, and the
//! `CurrentLocale` extractor.
//!
//! Every page lives under `/{locale}/…`. The router nests one copy of the
//! page routes per locale and attaches the `Locale` as a request extension.

use axum::{
    extract::{FromRequestParts, Request},
    http::{
        HeaderMap,
        header::{ACCEPT_LANGUAGE, COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::cookie::Cookie;

use aunclic_core::Locale;

/// Cookie remembering the shopper's language choice.
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

/// Unprefixed paths from the previous site that still receive traffic.
const LEGACY_PATHS: [&str; 6] = [
    "/perfil",
    "/productos",
    "/comidas",
    "/boutique",
    "/favoritos",
    "/login",
];

/// Locale for the current request, set by the per-locale router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentLocale(pub Locale);

impl<S> FromRequestParts<S> for CurrentLocale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<Locale>().copied().unwrap_or_default(),
        ))
    }
}

/// Value of the `NEXT_LOCALE` cookie, if any.
#[must_use]
pub fn locale_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == LOCALE_COOKIE)
        .map(|cookie| cookie.value().to_owned())
}

/// Where an unprefixed request should go, if anywhere.
///
/// `/` goes to the negotiated locale root. Legacy paths go to the same path
/// under the cookie locale (default `es`); `/login` keeps its `redirect`
/// parameter.
#[must_use]
pub fn legacy_redirect_target(
    path: &str,
    query: Option<&str>,
    cookie_locale: Option<&str>,
    accept_language: Option<&str>,
) -> Option<String> {
    if path == "/" {
        let locale = Locale::negotiate(cookie_locale, accept_language);
        return Some(format!("/{}", locale.code()));
    }

    if !LEGACY_PATHS.contains(&path) {
        return None;
    }

    let locale = cookie_locale
        .and_then(Locale::from_path_segment)
        .unwrap_or_default();
    let target = format!("/{}{path}", locale.code());

    let redirect_param = (path == "/login")
        .then(|| query_param(query?, "redirect"))
        .flatten();

    Some(match redirect_param {
        Some(redirect) => format!("{target}?redirect={}", urlencoding::encode(&redirect)),
        None => target,
    })
}

fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Redirect `/` and legacy unprefixed paths to their localized equivalents.
pub async fn locale_redirect_middleware(request: Request, next: Next) -> Response {
    let uri = request.uri();
    let cookie = locale_cookie(request.headers());
    let accept_language = request
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    if let Some(target) =
        legacy_redirect_target(uri.path(), uri.query(), cookie.as_deref(), accept_language)
    {
        tracing::debug!(from = %uri, to = %target, "Locale redirect");
        return Redirect::temporary(&target).into_response();
    }

    next.run(request).await
}

/// Swap the locale segment of `path` for `locale`, or prefix it when the
/// path has none.
///
/// ```
/// use aunclic_core::Locale;
/// use aunclic_storefront::middleware::path_with_locale;
///
/// assert_eq!(path_with_locale("/es/comidas", Locale::Fr), "/fr/comidas");
/// assert_eq!(path_with_locale("/comidas", Locale::En), "/en/comidas");
/// ```
#[must_use]
pub fn path_with_locale(path: &str, locale: Locale) -> String {
    let trimmed = path.trim_start_matches('/');
    let (first, rest) = trimmed
        .split_once('/')
        .map_or((trimmed, ""), |(first, rest)| (first, rest));

    let remainder = if Locale::from_path_segment(first).is_some() {
        rest
    } else {
        trimmed
    };

    if remainder.is_empty() {
        format!("/{}", locale.code())
    } else {
        format!("/{}/{remainder}", locale.code())
    }
}

/// Only same-site absolute paths are accepted as post-login destinations.
#[must_use]
pub fn safe_redirect_path(candidate: Option<&str>) -> Option<&str> {
    candidate
        .map(str::trim)
        .filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
}
