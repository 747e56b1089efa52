//! The navigation shell every full page renders inside.
//!
//! [`Shell`] is an extractor: it resolves the locale, the logged-in shopper,
//! queued toasts, the CSP nonce, and SEO metadata for the current path, so
//! page handlers only load their own data.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use tower_sessions::Session;

use aunclic_core::Locale;

use crate::db::FavoriteRepository;
use crate::flash::{self, Flash};
use crate::i18n::Messages;
use crate::middleware::{CspNonce, OptionalAuth, path_with_locale};
use crate::models::CurrentUser;
use crate::seo::PageMeta;
use crate::state::AppState;

/// Entry in the language switcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleLink {
    pub code: &'static str,
    pub name: &'static str,
    pub href: String,
    pub active: bool,
}

/// Nav link with its active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

pub struct Shell {
    pub locale: Locale,
    pub t: Messages,
    pub user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
    pub nonce: String,
    /// Request path including the locale segment.
    pub path: String,
    pub meta: PageMeta,
    pub nav: Vec<NavLink>,
    pub locales: Vec<LocaleLink>,
    pub favorites_count: i64,
}

impl Shell {
    /// `/{locale}{suffix}` for links in templates.
    #[must_use]
    pub fn href(&self, suffix: &str) -> String {
        format!("/{}{suffix}", self.locale.code())
    }

    #[must_use]
    pub fn with_title(mut self, key: &str) -> Self {
        self.meta = self.meta.with_title(self.t.get(key));
        self
    }

    #[must_use]
    pub fn with_page_title(mut self, title: &str) -> Self {
        self.meta = self.meta.with_title(title);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.meta = self.meta.with_description(description);
        self
    }

    /// Queue a toast on this render rather than the next one.
    pub fn toast(&mut self, flash: Flash) {
        if !self.flashes.contains(&flash) {
            self.flashes.push(flash);
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or("", CurrentUser::display_name)
    }
}

/// The path after the locale segment (`""` for the locale root).
#[must_use]
pub fn strip_locale(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((first, rest)) if Locale::from_path_segment(first).is_some() => {
            path.get(path.len() - rest.len() - 1..).unwrap_or(path)
        }
        None if Locale::from_path_segment(trimmed).is_some() => "",
        _ => path,
    }
}

fn nav_links(locale: Locale, path: &str) -> Vec<NavLink> {
    let rest = strip_locale(path);
    [
        ("", "nav.home"),
        ("/productos", "nav.products"),
        ("/comidas", "nav.foods"),
        ("/boutique", "nav.boutique"),
    ]
    .into_iter()
    .map(|(suffix, label)| NavLink {
        href: format!("/{}{suffix}", locale.code()),
        label,
        active: if suffix.is_empty() {
            rest.is_empty()
        } else {
            rest == suffix || rest.starts_with(&format!("{suffix}/"))
        },
    })
    .collect()
}

fn locale_links(current: Locale, path: &str) -> Vec<LocaleLink> {
    Locale::ALL
        .iter()
        .map(|&locale| LocaleLink {
            code: locale.code(),
            name: locale.native_name(),
            href: format!(
                "/{}/locale/{}?path={}",
                current.code(),
                locale.code(),
                urlencoding::encode(&path_with_locale(path, locale))
            ),
            active: locale == current,
        })
        .collect()
}

impl FromRequestParts<AppState> for Shell {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        let nonce = CspNonce::from_request_parts(parts, state).await?.0;

        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path().to_owned(), |uri| uri.0.path().to_owned());

        // routes outside the locale nest (the fallback) read it from the path
        let locale = parts
            .extensions
            .get::<Locale>()
            .copied()
            .or_else(|| {
                path.trim_start_matches('/')
                    .split('/')
                    .next()
                    .and_then(Locale::from_path_segment)
            })
            .unwrap_or_default();

        let flashes = match parts.extensions.get::<Session>() {
            Some(session) => flash::take(session).await,
            None => Vec::new(),
        };

        let favorites_count = match &user {
            Some(user) => FavoriteRepository::new(state.pool())
                .count(user.customer_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to count favorites");
                    0
                }),
            None => 0,
        };

        let meta = PageMeta::new(&state.config().base_url, locale, strip_locale(&path));

        Ok(Self {
            locale,
            t: Messages::new(locale),
            user,
            flashes,
            nonce,
            nav: nav_links(locale, &path),
            locales: locale_links(locale, &path),
            path,
            meta,
            favorites_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_locale() {
        assert_eq!(strip_locale("/es/comidas"), "/comidas");
        assert_eq!(strip_locale("/fr/productos/7"), "/productos/7");
        assert_eq!(strip_locale("/en"), "");
        assert_eq!(strip_locale("/health"), "/health");
    }

    #[test]
    fn marks_active_nav_entry() {
        let nav = nav_links(Locale::En, "/en/productos/12");
        let active: Vec<_> = nav.iter().filter(|l| l.active).map(|l| l.label).collect();
        assert_eq!(active, ["nav.products"]);
        assert_eq!(nav[0].href, "/en");

        let home = nav_links(Locale::Fr, "/fr");
        assert!(home[0].active);
    }

    #[test]
    fn locale_links_keep_the_current_page() {
        let links = locale_links(Locale::Es, "/es/comidas");
        let fr = links.iter().find(|l| l.code == "fr");
        assert_eq!(
            fr.map(|l| l.href.as_str()),
            Some("/es/locale/fr?path=%2Ffr%2Fcomidas")
        );
        assert!(links.iter().any(|l| l.code == "es" && l.active));
    }
}
