//! Catalog listings: the three section pages and their "load more" fragment.
//!
//! Filters arrive as query parameters; the normalized [`ProductFilter`]
//! decides both the SQL and the cache key, so equal filter states share a
//! cached page.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use aunclic_core::{Locale, ProductId};

use super::shell::Shell;
use crate::catalog::{CatalogCacheKey, CatalogSection, FilterQuery, ProductFilter, SortOrder};
use crate::db::{CatalogRepository, FavoriteRepository, RepositoryError};
use crate::filters;
use crate::flash::Flash;
use crate::i18n::Messages;
use crate::middleware::{CurrentLocale, OptionalAuth, login_url};
use crate::models::{CurrentUser, FavoriteSet, Product, ProductPage, Subcategory};
use crate::state::AppState;
use crate::supabase::StorageUrls;

/// Product display data for grids and cards.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub in_stock: bool,
    pub href: String,
    pub is_favorite: bool,
    /// Favorite toggle endpoint, or `None` for anonymous shoppers.
    pub toggle_url: Option<String>,
    /// Where the heart sends anonymous shoppers.
    pub login_url: String,
}

impl ProductCard {
    #[must_use]
    pub fn new(
        product: &Product,
        locale: Locale,
        storage: &StorageUrls,
        favorites: Option<&FavoriteSet>,
        return_to: &str,
    ) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description_text().to_owned(),
            price: product.price.display(locale),
            image_url: storage.public_url(product.primary_image.as_deref()),
            in_stock: product.in_stock(),
            href: format!("/{}/productos/{}", locale.code(), product.id),
            is_favorite: favorites.is_some_and(|set| set.contains(product.id)),
            toggle_url: favorites
                .map(|_| format!("/{}/favoritos/{}/toggle", locale.code(), product.id)),
            login_url: login_url(locale, return_to),
        }
    }
}

/// Subcategory option for the filter sidebar.
#[derive(Debug, Clone)]
pub struct SubcategoryOption {
    pub id: String,
    pub name: String,
    pub selected: bool,
}

/// Sort option for the filter sidebar.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Catalog section page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub shell: Shell,
    pub t: Messages,
    pub section_slug: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub filter: ProductFilter,
    pub subcategories: Vec<SubcategoryOption>,
    pub sorts: Vec<SortOption>,
    pub cards: Vec<ProductCard>,
    pub total: i64,
    pub next_url: Option<String>,
    pub has_filters: bool,
    pub load_failed: bool,
}

impl CatalogTemplate {
    fn results_text(&self) -> String {
        self.t
            .format("catalog.results", &[("count", &self.total.to_string())])
    }

    fn min_price(&self) -> String {
        if self.filter.min_price.is_zero() {
            String::new()
        } else {
            self.filter.min_price.to_string()
        }
    }

    fn max_price(&self) -> String {
        if self.filter.max_price >= crate::catalog::filter::DEFAULT_MAX_PRICE {
            String::new()
        } else {
            self.filter.max_price.to_string()
        }
    }
}

/// "Load more" fragment: the next cards plus the next button, swapped in
/// place of the previous button.
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid_page.html")]
pub struct ProductGridPageTemplate {
    pub t: Messages,
    pub cards: Vec<ProductCard>,
    pub next_url: Option<String>,
}

/// Load one listing page through the catalog cache.
pub(crate) async fn load_page(
    state: &AppState,
    section: CatalogSection,
    page: u32,
    filter: &ProductFilter,
) -> Result<ProductPage, Arc<RepositoryError>> {
    let page_size = state.config().catalog.page_size;
    let key = CatalogCacheKey {
        category: section.category_id(),
        page,
        page_size,
        filter: filter.clone(),
    };
    let repo = CatalogRepository::new(state.pool());
    state
        .catalog_cache()
        .get_or_load(
            &key,
            repo.load_page(section.category_id(), page, page_size, filter),
        )
        .await
}

async fn load_subcategories(
    state: &AppState,
    section: CatalogSection,
) -> Result<Arc<Vec<Subcategory>>, Arc<RepositoryError>> {
    let repo = CatalogRepository::new(state.pool());
    state
        .catalog_cache()
        .subcategories_or_load(
            section.category_id(),
            repo.list_subcategories(section.category_id()),
        )
        .await
}

/// Favorite ids for the hearts, `None` when nobody is logged in.
pub(crate) async fn favorite_set(state: &AppState, user: Option<&CurrentUser>) -> Option<FavoriteSet> {
    let user = user?;
    let set = FavoriteRepository::new(state.pool())
        .product_ids(user.customer_id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load favorite ids");
            FavoriteSet::default()
        });
    Some(set)
}

fn more_url(locale: Locale, section: CatalogSection, page: &ProductPage, filter: &ProductFilter) -> Option<String> {
    page.has_more().then(|| {
        let query = filter.to_query_string();
        let sep = if query.is_empty() { "" } else { "&" };
        format!(
            "/{}/{}/more?{query}{sep}page={}",
            locale.code(),
            section.slug(),
            page.next_page()
        )
    })
}

/// Display a catalog section.
#[instrument(skip_all, fields(section = section.slug()))]
pub async fn index(
    State(state): State<AppState>,
    Extension(section): Extension<CatalogSection>,
    mut shell: Shell,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let locale = shell.locale;
    let filter = ProductFilter::from_query(&query);

    let (page, subcategories, favorites) = tokio::join!(
        load_page(&state, section, 1, &filter),
        load_subcategories(&state, section),
        favorite_set(&state, shell.user.as_ref()),
    );

    let subcategories = subcategories.map_or_else(
        |e| {
            tracing::error!(error = %e, "Failed to load subcategories");
            Vec::new()
        },
        |rows| {
            rows.iter()
                .map(|s| SubcategoryOption {
                    id: s.id.to_string(),
                    name: s.name.clone(),
                    selected: filter.subcategory == Some(s.id),
                })
                .collect()
        },
    );

    let load_failed = page.is_err();
    let (cards, total, next_url) = page.map_or_else(
        |e| {
            tracing::error!(error = %e, "Failed to load catalog page");
            (Vec::new(), 0, None)
        },
        |page| {
            let cards = page
                .products
                .iter()
                .map(|p| ProductCard::new(p, locale, state.storage(), favorites.as_ref(), &shell.path))
                .collect();
            (cards, page.total, more_url(locale, section, &page, &filter))
        },
    );
    if load_failed {
        shell.toast(Flash::error("toast.loadError"));
    }

    let t = shell.t;
    let shell = shell
        .with_title(section.title_key())
        .with_description(t.get(section.subtitle_key()));

    CatalogTemplate {
        t,
        section_slug: section.slug(),
        title: t.get(section.title_key()),
        subtitle: t.get(section.subtitle_key()),
        sorts: SortOrder::ALL
            .into_iter()
            .map(|s| SortOption {
                value: s.as_str(),
                label: t.get(s.label_key()),
                selected: s == filter.sort,
            })
            .collect(),
        has_filters: filter.has_active_filters(),
        filter,
        subcategories,
        cards,
        total,
        next_url,
        load_failed,
        shell,
    }
}

/// Next page of a section (HTMX).
#[instrument(skip_all, fields(section = section.slug(), locale = %locale))]
pub async fn more(
    State(state): State<AppState>,
    Extension(section): Extension<CatalogSection>,
    CurrentLocale(locale): CurrentLocale,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let filter = ProductFilter::from_query(&query);
    let page_number = query.page();
    let return_to = format!("/{}/{}", locale.code(), section.slug());

    let (page, favorites) = tokio::join!(
        load_page(&state, section, page_number, &filter),
        favorite_set(&state, user.as_ref()),
    );

    let (cards, next_url) = page.map_or_else(
        |e| {
            tracing::error!(error = %e, page = page_number, "Failed to load more products");
            (Vec::new(), None)
        },
        |page| {
            let cards = page
                .products
                .iter()
                .map(|p| ProductCard::new(p, locale, state.storage(), favorites.as_ref(), &return_to))
                .collect();
            (cards, more_url(locale, section, &page, &filter))
        },
    );

    ProductGridPageTemplate {
        t: Messages::new(locale),
        cards,
        next_url,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use aunclic_core::{CategoryId, Price};

    use super::*;

    fn product(id: i32, image: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            name: "Arepa".to_owned(),
            description: None,
            price: Price::new(Decimal::new(450, 2)),
            stock: 0,
            primary_image: image.map(str::to_owned),
            category_id: CategoryId::new(2),
            subcategory_id: None,
            created_at: Utc::now(),
        }
    }

    fn storage() -> StorageUrls {
        StorageUrls::new("https://abcd.supabase.co")
    }

    #[test]
    fn anonymous_card_links_to_login() {
        let storage = storage();
        let card = ProductCard::new(&product(7, None), Locale::Fr, &storage, None, "/fr/comidas");
        assert_eq!(card.href, "/fr/productos/7");
        assert_eq!(card.toggle_url, None);
        assert_eq!(card.login_url, "/fr/login?redirect=%2Ffr%2Fcomidas");
        assert!(!card.in_stock);
        assert!(card.image_url.ends_with("placeholder-product.svg"));
    }

    #[test]
    fn logged_in_card_marks_favorite() {
        let storage = storage();
        let favorites: FavoriteSet = [ProductId::new(7)].into_iter().collect();
        let card = ProductCard::new(
            &product(7, Some("foods/arepa.jpg")),
            Locale::En,
            &storage,
            Some(&favorites),
            "/en/comidas",
        );
        assert!(card.is_favorite);
        assert_eq!(card.toggle_url.as_deref(), Some("/en/favoritos/7/toggle"));
        assert_eq!(card.price, "$4.50");
        assert_eq!(
            card.image_url,
            "https://abcd.supabase.co/storage/v1/object/public/foods/arepa.jpg"
        );
    }

    #[test]
    fn more_url_carries_filter_and_next_page() {
        let filter = ProductFilter {
            sort: SortOrder::PriceDesc,
            ..ProductFilter::default()
        };
        let full = ProductPage {
            products: vec![product(1, None), product(2, None)],
            total: 5,
            page: 1,
            page_size: 2,
        };
        assert_eq!(
            more_url(Locale::Es, CatalogSection::Boutique, &full, &filter).as_deref(),
            Some("/es/boutique/more?sortBy=priceDesc&page=2")
        );

        let short = ProductPage {
            products: vec![product(3, None)],
            page: 3,
            ..full
        };
        assert_eq!(more_url(Locale::Es, CatalogSection::Boutique, &short, &filter), None);
    }
}
