//! UI strings per locale.
//!
//! Tables live in `locales/{es,en,fr}.json` as nested objects and are
//! flattened to dotted keys (`nav.products`) on first use. A missing key
//! renders as the key itself.

use std::collections::HashMap;
use std::sync::LazyLock;

use aunclic_core::Locale;

type Table = HashMap<String, String>;

static ES: LazyLock<Table> = LazyLock::new(|| load(include_str!("../locales/es.json"), "es"));
static EN: LazyLock<Table> = LazyLock::new(|| load(include_str!("../locales/en.json"), "en"));
static FR: LazyLock<Table> = LazyLock::new(|| load(include_str!("../locales/fr.json"), "fr"));

fn load(source: &str, code: &str) -> Table {
    match serde_json::from_str::<serde_json::Value>(source) {
        Ok(value) => {
            let mut table = Table::new();
            flatten("", &value, &mut table);
            table
        }
        Err(e) => {
            tracing::error!(locale = code, error = %e, "Invalid locale file");
            Table::new()
        }
    }
}

fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Table) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, child, out);
            }
        }
        serde_json::Value::String(s) => {
            out.insert(prefix.to_owned(), s.clone());
        }
        other => {
            out.insert(prefix.to_owned(), other.to_string());
        }
    }
}

/// String lookup for one locale. `Copy`, so templates can hold it by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    #[must_use]
    pub const fn locale(self) -> Locale {
        self.locale
    }

    fn table(self) -> &'static Table {
        match self.locale {
            Locale::Es => &ES,
            Locale::En => &EN,
            Locale::Fr => &FR,
        }
    }

    /// The string for `key`, or `key` when it has no translation.
    #[must_use]
    pub fn get<'k>(&self, key: &'k str) -> &'k str {
        match self.table().get(key) {
            Some(value) => value.as_str(),
            None => key,
        }
    }

    /// `get` with `{name}` placeholders replaced.
    #[must_use]
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.get(key).to_owned(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }

    /// Whether `key` exists in this locale's table.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.table().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn keys(locale: Locale) -> BTreeSet<&'static String> {
        Messages::new(locale).table().keys().collect()
    }

    #[test]
    fn every_locale_has_the_same_keys() {
        let es = keys(Locale::Es);
        assert!(!es.is_empty());
        for locale in [Locale::En, Locale::Fr] {
            let other = keys(locale);
            let missing: Vec<_> = es.symmetric_difference(&other).collect();
            assert!(missing.is_empty(), "{locale}: {missing:?}");
        }
    }

    #[test]
    fn looks_up_per_locale() {
        assert_eq!(Messages::new(Locale::Es).get("nav.foods"), "Comidas");
        assert_eq!(Messages::new(Locale::En).get("nav.foods"), "Foods");
        assert_eq!(Messages::new(Locale::Fr).get("nav.foods"), "Aliments");
    }

    #[test]
    fn unknown_key_renders_as_itself() {
        assert_eq!(Messages::new(Locale::En).get("nope.missing"), "nope.missing");
    }

    #[test]
    fn format_fills_placeholders() {
        let text = Messages::new(Locale::En).format("catalog.results", &[("count", "3")]);
        assert_eq!(text, "3 products");
    }
}
