//! Per-locale page metadata: title, description, canonical and hreflang links.

use aunclic_core::Locale;

const SITE_NAME: &str = "A un Clic la";

struct SiteCopy {
    title: &'static str,
    description: &'static str,
    keywords: &'static str,
}

const fn site_copy(locale: Locale) -> SiteCopy {
    match locale {
        Locale::Es => SiteCopy {
            title: "A un Clic la | Productos Auténticos Latinoamericanos en Canadá",
            description: "Descubre productos auténticos latinoamericanos, comidas y artículos de \
                          boutique con entrega a domicilio en todo Canadá. Conéctate con los \
                          sabores y la cultura de las Américas.",
            keywords: "productos latinoamericanos, comida hispana Canadá, abarrotes latinos, \
                       comida mexicana auténtica, productos sudamericanos, boutique \
                       latinoamericana, entrega de comida étnica Canadá",
        },
        Locale::En => SiteCopy {
            title: "A un Clic la | Authentic Latin American Products in Canada",
            description: "Discover authentic Latin American products, foods, and boutique items \
                          delivered to your door across Canada. Connect with the flavors and \
                          culture of the Americas.",
            keywords: "Latin American products, Hispanic food Canada, Latin American grocery, \
                       authentic Mexican food, South American products, Latin American \
                       boutique, ethnic food delivery Canada",
        },
        Locale::Fr => SiteCopy {
            title: "A un Clic la | Produits Authentiques Latino-Américains au Canada",
            description: "Découvrez des produits authentiques latino-américains, des aliments et \
                          des articles de boutique livrés à votre porte partout au Canada. \
                          Connectez-vous avec les saveurs et la culture des Amériques.",
            keywords: "produits latino-américains, nourriture hispanique Canada, épicerie \
                       latino-américaine, nourriture mexicaine authentique, produits \
                       sud-américains, boutique latino-américaine, livraison de nourriture \
                       ethnique Canada",
        },
    }
}

/// One `<link rel="alternate" hreflang=…>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternate {
    pub hreflang: &'static str,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: &'static str,
    pub canonical: String,
    pub alternates: Vec<Alternate>,
    /// `es_CA`-style tag for `og:locale`.
    pub og_locale: String,
    pub site_name: &'static str,
}

impl PageMeta {
    /// Site-wide metadata for `path` (the part after the locale segment,
    /// `""` for the locale root).
    #[must_use]
    pub fn new(base_url: &str, locale: Locale, path: &str) -> Self {
        let copy = site_copy(locale);
        let base = base_url.trim_end_matches('/');
        let path = normalize_path(path);

        let mut alternates: Vec<Alternate> = Locale::ALL
            .iter()
            .map(|l| Alternate {
                hreflang: l.region_tag(),
                href: format!("{base}/{}{path}", l.code()),
            })
            .collect();
        alternates.push(Alternate {
            hreflang: "x-default",
            href: format!("{base}/{}{path}", Locale::En.code()),
        });

        Self {
            title: copy.title.to_owned(),
            description: copy.description.to_owned(),
            keywords: copy.keywords,
            canonical: format!("{base}/{}{path}", locale.code()),
            alternates,
            og_locale: format!("{}_CA", locale.code()),
            site_name: SITE_NAME,
        }
    }

    /// Prefix the page title to the site name.
    #[must_use]
    pub fn with_title(mut self, page_title: &str) -> Self {
        let page_title = page_title.trim();
        if !page_title.is_empty() {
            self.title = format!("{page_title} | {SITE_NAME}");
        }
        self
    }

    /// Replace the description, e.g. with a product's own.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        let description = description.trim();
        if !description.is_empty() {
            self.description = description.chars().take(160).collect();
        }
        self
    }
}

/// `""` or `/segment/...` without a trailing slash.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_page_alternates() {
        let meta = PageMeta::new("https://aunclicla.ca/", Locale::Es, "");
        assert_eq!(meta.canonical, "https://aunclicla.ca/es");
        assert_eq!(
            meta.title,
            "A un Clic la | Productos Auténticos Latinoamericanos en Canadá"
        );

        let pairs: Vec<(&str, &str)> = meta
            .alternates
            .iter()
            .map(|a| (a.hreflang, a.href.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("es-ca", "https://aunclicla.ca/es"),
                ("en-ca", "https://aunclicla.ca/en"),
                ("fr-ca", "https://aunclicla.ca/fr"),
                ("x-default", "https://aunclicla.ca/en"),
            ]
        );
    }

    #[test]
    fn subpage_keeps_path_in_every_link() {
        let meta = PageMeta::new("https://aunclicla.ca", Locale::Fr, "comidas/");
        assert_eq!(meta.canonical, "https://aunclicla.ca/fr/comidas");
        assert!(meta.alternates.iter().all(|a| a.href.ends_with("/comidas")));
        assert_eq!(meta.og_locale, "fr_CA");
    }

    #[test]
    fn page_title_and_description_overrides() {
        let meta = PageMeta::new("https://aunclicla.ca", Locale::En, "/productos/4")
            .with_title("Harina P.A.N.")
            .with_description("  ");
        assert_eq!(meta.title, "Harina P.A.N. | A un Clic la");
        assert!(meta.description.starts_with("Discover authentic"));
    }
}
