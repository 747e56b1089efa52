//! Language switcher.

use axum::{
    extract::{Path, Query},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use aunclic_core::Locale;

use crate::middleware::{CurrentLocale, LOCALE_COOKIE, path_with_locale, safe_redirect_path};

#[derive(Debug, Default, Deserialize)]
pub struct SwitchQuery {
    pub path: Option<String>,
}

/// `NEXT_LOCALE` cookie remembering the choice for a year.
fn locale_cookie(locale: Locale) -> String {
    Cookie::build((LOCALE_COOKIE, locale.code()))
        .path("/")
        .max_age(Duration::days(365))
        .same_site(SameSite::Lax)
        .build()
        .to_string()
}

/// Remember the chosen language and go to the same page in it. Unknown
/// codes go back to the current locale's home.
pub async fn switch(
    CurrentLocale(current): CurrentLocale,
    Path(code): Path<String>,
    Query(query): Query<SwitchQuery>,
) -> Response {
    let Some(locale) = Locale::from_path_segment(&code) else {
        return Redirect::to(&format!("/{}", current.code())).into_response();
    };

    let target = safe_redirect_path(query.path.as_deref())
        .map_or_else(|| format!("/{}", locale.code()), |path| path_with_locale(path, locale));
    tracing::debug!(from = %current, to = %locale, "Locale switched");

    (
        AppendHeaders([(SET_COOKIE, locale_cookie(locale))]),
        Redirect::to(&target),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_site_wide_and_long_lived() {
        let cookie = locale_cookie(Locale::Fr);
        assert!(cookie.starts_with("NEXT_LOCALE=fr"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=31536000"));
        assert!(cookie.contains("SameSite=Lax"));
    }
}
