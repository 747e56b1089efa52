//! Supported storefront locales.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported locale: {0}")]
pub struct LocaleError(pub String);

/// A UI language. Spanish is the shop's primary audience and the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
    Fr,
}

impl Locale {
    pub const ALL: [Self; 3] = [Self::Es, Self::En, Self::Fr];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Language tag for the Canadian market, used in `hreflang` and `<html lang>`.
    #[must_use]
    pub const fn region_tag(self) -> &'static str {
        match self {
            Self::Es => "es-ca",
            Self::En => "en-ca",
            Self::Fr => "fr-ca",
        }
    }

    /// Name of the language in that language, for the switcher.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::Es => "Español",
            Self::En => "English",
            Self::Fr => "Français",
        }
    }

    /// Interpret a URL path segment as a locale. Exact, lowercase match only.
    #[must_use]
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == segment)
    }

    /// Pick a locale from the `NEXT_LOCALE` cookie value, falling back to the
    /// first supported language in `Accept-Language`, then the default.
    #[must_use]
    pub fn negotiate(cookie: Option<&str>, accept_language: Option<&str>) -> Self {
        if let Some(locale) = cookie.and_then(|c| c.trim().parse().ok()) {
            return locale;
        }

        accept_language
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(|part| {
                let tag = part.split(';').next()?.trim();
                let primary = tag.split(['-', '_']).next()?;
                primary.parse().ok()
            })
            .next()
            .unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "es" => Ok(Self::Es),
            "en" => Ok(Self::En),
            "fr" => Ok(Self::Fr),
            _ => Err(LocaleError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segment_must_be_exact() {
        assert_eq!(Locale::from_path_segment("fr"), Some(Locale::Fr));
        assert_eq!(Locale::from_path_segment("FR"), None);
        assert_eq!(Locale::from_path_segment("productos"), None);
    }

    #[test]
    fn cookie_wins_over_header() {
        let locale = Locale::negotiate(Some("en"), Some("fr-CA,fr;q=0.9"));
        assert_eq!(locale, Locale::En);
    }

    #[test]
    fn invalid_cookie_falls_through_to_header() {
        let locale = Locale::negotiate(Some("de"), Some("de-DE, fr-CA;q=0.8, en;q=0.5"));
        assert_eq!(locale, Locale::Fr);
    }

    #[test]
    fn defaults_to_spanish() {
        assert_eq!(Locale::negotiate(None, None), Locale::Es);
        assert_eq!(Locale::negotiate(None, Some("de, it")), Locale::Es);
    }
}
