//! Favorites page and the heart toggle.
//!
//! Toggle and remove answer HTMX requests with a fragment and an
//! `HX-Trigger: favoritesChanged` header so the navbar badge refreshes;
//! plain form posts get a toast and a redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aunclic_core::{Locale, ProductId};

use super::catalog::ProductCard;
use super::shell::Shell;
use crate::db::FavoriteRepository;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::flash::{self, Flash};
use crate::i18n::Messages;
use crate::middleware::{CurrentLocale, OptionalAuth, RequireAuth, login_url, safe_redirect_path};
use crate::models::{FavoriteProduct, FavoriteSet, FavoriteSort, FavoritesQuery, FavoritesView};
use crate::state::AppState;
use crate::supabase::StorageUrls;

const FAVORITES_CHANGED: (&str, &str) = ("HX-Trigger", "favoritesChanged");

/// A favorite as shown on the favorites page.
#[derive(Debug, Clone)]
pub struct FavoriteCard {
    pub card: ProductCard,
    pub category_name: Option<String>,
    pub remove_url: String,
}

#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct FavoriteSortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "favorites/index.html")]
pub struct FavoritesTemplate {
    pub shell: Shell,
    pub t: Messages,
    pub items: Vec<FavoriteCard>,
    pub total: usize,
    pub search: String,
    pub categories: Vec<CategoryOption>,
    pub sorts: Vec<FavoriteSortOption>,
    pub is_filtered: bool,
}

impl FavoritesTemplate {
    fn count_text(&self) -> String {
        self.t
            .format("favorites.count", &[("count", &self.items.len().to_string())])
    }
}

/// Heart button fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/favorite_button.html")]
pub struct FavoriteButtonTemplate {
    pub t: Messages,
    pub card: FavoriteButton,
}

/// The fields the heart partial reads from a card.
#[derive(Debug, Clone)]
pub struct FavoriteButton {
    pub id: ProductId,
    pub is_favorite: bool,
    pub toggle_url: Option<String>,
    pub login_url: String,
}

/// Navbar badge fragment (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/favorite_count.html")]
pub struct FavoriteCountTemplate {
    pub count: i64,
    pub count_url: String,
    pub favorites_url: String,
    pub label: &'static str,
}

fn favorite_card(
    item: &FavoriteProduct,
    locale: Locale,
    storage: &StorageUrls,
    favorites: &FavoriteSet,
) -> FavoriteCard {
    let code = locale.code();
    FavoriteCard {
        card: ProductCard {
            id: item.product_id,
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            price: item.price.display(locale),
            image_url: storage.public_url(item.primary_image.as_deref()),
            in_stock: item.stock > 0,
            href: format!("/{code}/productos/{}", item.product_id),
            is_favorite: favorites.contains(item.product_id),
            toggle_url: Some(format!("/{code}/favoritos/{}/toggle", item.product_id)),
            login_url: login_url(locale, &format!("/{code}/favoritos")),
        },
        category_name: item.category_name.clone(),
        remove_url: format!("/{code}/favoritos/{}/remove", item.product_id),
    }
}

fn sort_label(sort: FavoriteSort) -> &'static str {
    match sort {
        FavoriteSort::Newest => "favoritesSort.newest",
        FavoriteSort::Oldest => "favoritesSort.oldest",
        FavoriteSort::PriceHighLow => "favoritesSort.priceHighLow",
        FavoriteSort::PriceLowHigh => "favoritesSort.priceLowHigh",
    }
}

/// Display the shopper's favorites with search, category and sort applied.
#[instrument(skip_all, fields(customer = %user.customer_id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut shell: Shell,
    Query(query): Query<FavoritesQuery>,
) -> impl IntoResponse {
    let locale = shell.locale;
    let t = shell.t;
    let view = FavoritesView::from_query(&query);

    let all = FavoriteRepository::new(state.pool())
        .list(user.customer_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load favorites");
            shell.toast(Flash::error("toast.loadError"));
            Vec::new()
        });

    let total = all.len();
    let saved: FavoriteSet = all.iter().map(|f| f.product_id).collect();
    let categories = FavoritesView::category_options(&all)
        .into_iter()
        .map(|name| CategoryOption {
            selected: view.category.as_deref() == Some(name.as_str()),
            name,
        })
        .collect();
    let items = view
        .apply(all)
        .iter()
        .map(|item| favorite_card(item, locale, state.storage(), &saved))
        .collect();

    FavoritesTemplate {
        t,
        items,
        total,
        search: view.search.clone(),
        categories,
        sorts: FavoriteSort::ALL
            .into_iter()
            .map(|s| FavoriteSortOption {
                value: s.as_str(),
                label: t.get(sort_label(s)),
                selected: s == view.sort,
            })
            .collect(),
        is_filtered: view.is_filtered(),
        shell: shell.with_title("favorites.title"),
    }
}

/// Optional return path on non-HTMX toggles.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnForm {
    pub redirect: Option<String>,
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some_and(|v| v == "true")
}

fn parse_product(id: &str) -> Result<ProductId, AppError> {
    id.parse()
        .map_err(|_| AppError::NotFound(format!("product {id}")))
}

/// Toggle a favorite.
///
/// # Errors
///
/// Returns an error if the product id is malformed or the write fails.
#[instrument(skip_all, fields(customer = %user.customer_id, product = %id))]
pub async fn toggle(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    RequireAuth(user): RequireAuth,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ReturnForm>,
) -> Result<Response, AppError> {
    let product = parse_product(&id)?;
    let outcome = FavoriteRepository::new(state.pool())
        .toggle(user.customer_id, product)
        .await;

    let now_favorite = match outcome {
        Ok(now_favorite) => now_favorite,
        Err(e) => {
            tracing::error!(error = %e, "Failed to toggle favorite");
            if is_htmx(&headers) {
                return Err(e.into());
            }
            flash::push(&session, Flash::error("toast.favoriteError")).await;
            return Ok(back(locale, form.redirect.as_deref()).into_response());
        }
    };

    let product_id = product.to_string();
    add_breadcrumb(
        "favorites",
        if now_favorite { "Added favorite" } else { "Removed favorite" },
        &[("product_id", product_id.as_str())],
    );

    if is_htmx(&headers) {
        let button = FavoriteButtonTemplate {
            t: Messages::new(locale),
            card: FavoriteButton {
                id: product,
                is_favorite: now_favorite,
                toggle_url: Some(format!("/{}/favoritos/{product}/toggle", locale.code())),
                login_url: login_url(locale, &format!("/{}/favoritos", locale.code())),
            },
        };
        return Ok((AppendHeaders([FAVORITES_CHANGED]), button).into_response());
    }

    let key = if now_favorite {
        "toast.favoriteAdded"
    } else {
        "toast.favoriteRemoved"
    };
    flash::push(&session, Flash::success(key)).await;
    Ok(back(locale, form.redirect.as_deref()).into_response())
}

/// Remove a favorite from the favorites page.
///
/// # Errors
///
/// Returns an error if the product id is malformed or the delete fails.
#[instrument(skip_all, fields(customer = %user.customer_id, product = %id))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    RequireAuth(user): RequireAuth,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let product = parse_product(&id)?;
    let removed = FavoriteRepository::new(state.pool())
        .remove(user.customer_id, product)
        .await?;

    if removed {
        let product_id = product.to_string();
        add_breadcrumb(
            "favorites",
            "Removed favorite",
            &[("product_id", product_id.as_str())],
        );
    }

    if is_htmx(&headers) {
        // the card is swapped out with an empty body
        return Ok((AppendHeaders([FAVORITES_CHANGED]), "").into_response());
    }

    flash::push(&session, Flash::success("toast.favoriteRemoved")).await;
    Ok(Redirect::to(&format!("/{}/favoritos", locale.code())).into_response())
}

/// Navbar favorites badge. Anonymous shoppers get an empty badge.
#[instrument(skip_all)]
pub async fn count(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let count = match user {
        Some(user) => FavoriteRepository::new(state.pool())
            .count(user.customer_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to count favorites");
                0
            }),
        None => 0,
    };

    FavoriteCountTemplate {
        count,
        count_url: format!("/{}/favoritos/count", locale.code()),
        favorites_url: format!("/{}/favoritos", locale.code()),
        label: Messages::new(locale).get("nav.favorites"),
    }
}

fn back(locale: Locale, redirect: Option<&str>) -> Redirect {
    let fallback = format!("/{}/favoritos", locale.code());
    Redirect::to(safe_redirect_path(redirect).unwrap_or(&fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_ignores_offsite_targets() {
        let response = back(Locale::En, Some("https://evil.example")).into_response();
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/en/favoritos")
        );

        let response = back(Locale::En, Some("/en/comidas")).into_response();
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/en/comidas")
        );
    }

    #[test]
    fn sort_labels_exist_in_every_locale() {
        for sort in FavoriteSort::ALL {
            for locale in Locale::ALL {
                assert!(Messages::new(locale).contains(sort_label(sort)), "{sort:?}");
            }
        }
    }

    #[test]
    fn bad_product_ids_are_not_found() {
        assert!(matches!(parse_product("abc"), Err(AppError::NotFound(_))));
        assert_eq!(parse_product("42").ok(), Some(ProductId::new(42)));
    }
}
