//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::catalog::{ProductCard, favorite_set};
use super::shell::Shell;
use crate::catalog::CatalogSection;
use crate::db::CatalogRepository;
use crate::filters;
use crate::flash::Flash;
use crate::i18n::Messages;
use crate::state::AppState;

/// Newest products shown per section.
const HIGHLIGHTS_PER_SECTION: u32 = 4;

/// A section teaser on the home page.
#[derive(Debug, Clone)]
pub struct SectionTeaser {
    pub href: String,
    pub title: &'static str,
    pub description: &'static str,
    pub cards: Vec<ProductCard>,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub shell: Shell,
    pub t: Messages,
    pub sections: Vec<SectionTeaser>,
}

const fn description_key(section: CatalogSection) -> &'static str {
    match section {
        CatalogSection::Products => "home.productsDescription",
        CatalogSection::Foods => "home.foodsDescription",
        CatalogSection::Boutique => "home.boutiqueDescription",
    }
}

/// Display the home page.
#[instrument(skip_all, fields(locale = %shell.locale))]
pub async fn home(State(state): State<AppState>, mut shell: Shell) -> impl IntoResponse {
    let locale = shell.locale;
    let t = shell.t;
    let repo = CatalogRepository::new(state.pool());

    let (products, foods, boutique, favorites) = tokio::join!(
        repo.list_by_category(CatalogSection::Products.category_id(), HIGHLIGHTS_PER_SECTION),
        repo.list_by_category(CatalogSection::Foods.category_id(), HIGHLIGHTS_PER_SECTION),
        repo.list_by_category(CatalogSection::Boutique.category_id(), HIGHLIGHTS_PER_SECTION),
        favorite_set(&state, shell.user.as_ref()),
    );

    let mut load_failed = false;
    let sections = CatalogSection::ALL
        .into_iter()
        .zip([products, foods, boutique])
        .map(|(section, rows)| {
            let href = format!("/{}/{}", locale.code(), section.slug());
            let cards = rows.map_or_else(
                |e| {
                    tracing::error!(error = %e, section = section.slug(), "Failed to load highlights");
                    load_failed = true;
                    Vec::new()
                },
                |rows| {
                    rows.iter()
                        .map(|p| ProductCard::new(p, locale, state.storage(), favorites.as_ref(), &href))
                        .collect()
                },
            );
            SectionTeaser {
                title: t.get(section.title_key()),
                description: t.get(description_key(section)),
                cards,
                href,
            }
        })
        .collect();

    if load_failed {
        shell.toast(Flash::error("toast.loadError"));
    }

    HomeTemplate {
        t,
        sections,
        shell,
    }
}
