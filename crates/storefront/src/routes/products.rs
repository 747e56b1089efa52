//! Product detail page and review submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use aunclic_core::{Locale, ProductId, Rating, RatingStats};

use super::catalog::{ProductCard, favorite_set};
use super::not_found::NotFoundTemplate;
use super::shell::Shell;
use crate::catalog::CatalogSection;
use crate::db::{CatalogRepository, ReviewRepository};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::flash::{self, Flash};
use crate::i18n::Messages;
use crate::middleware::{CurrentLocale, RequireAuth, login_url};
use crate::models::{FavoriteSet, NewReview, ProductDetail, ReviewError, ReviewWithAuthor};
use crate::state::AppState;

/// Review display data.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub author: String,
    pub stars: String,
    pub rating: i16,
    pub comment: String,
    pub date: String,
}

impl From<&ReviewWithAuthor> for ReviewView {
    fn from(review: &ReviewWithAuthor) -> Self {
        Self {
            author: review.author().to_owned(),
            stars: star_string(review.filled_stars()),
            rating: review.stars,
            comment: review.comment.clone(),
            date: review.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// `★★★☆☆` for `filled` out of five.
fn star_string(filled: u8) -> String {
    (1..=Rating::MAX)
        .map(|i| if i <= filled { '★' } else { '☆' })
        .collect()
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub shell: Shell,
    pub t: Messages,
    pub card: ProductCard,
    pub category_name: String,
    pub category_href: String,
    pub subcategory_name: Option<String>,
    pub stock_text: String,
    pub stats: RatingStats,
    pub average_stars: String,
    pub reviews: Vec<ReviewView>,
    pub review_url: String,
    pub review_login_url: String,
    pub has_reviewed: bool,
}

impl ProductShowTemplate {
    fn average_text(&self) -> String {
        self.t.format(
            "reviews.average",
            &[("average", &self.stats.average_rating.to_string())],
        )
    }

    fn count_text(&self) -> String {
        self.t
            .format("reviews.count", &[("count", &self.stats.review_count.to_string())])
    }
}

fn product_path(locale: Locale, id: ProductId) -> String {
    format!("/{}/productos/{id}", locale.code())
}

/// Display a product with its reviews.
#[instrument(skip_all, fields(product = %id))]
pub async fn show(
    State(state): State<AppState>,
    mut shell: Shell,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = id.parse::<ProductId>() else {
        return NotFoundTemplate::render_for(shell);
    };

    let detail = match CatalogRepository::new(state.pool()).get_product(id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return NotFoundTemplate::render_for(shell),
        Err(e) => return AppError::from(e).into_response(),
    };

    let reviews_repo = ReviewRepository::new(state.pool());
    let has_reviewed = async {
        match &shell.user {
            Some(user) => reviews_repo.has_reviewed(id, user.customer_id).await,
            None => Ok(false),
        }
    };
    let (reviews, stats, has_reviewed, favorites) = tokio::join!(
        reviews_repo.list_for_product(id),
        reviews_repo.rating_stats(id),
        has_reviewed,
        favorite_set(&state, shell.user.as_ref()),
    );

    let mut load_failed = false;
    let reviews = reviews.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load reviews");
        load_failed = true;
        Vec::new()
    });
    let stats = stats.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load rating stats");
        load_failed = true;
        RatingStats::default()
    });
    let has_reviewed = has_reviewed.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to check existing review");
        false
    });
    if load_failed {
        shell.toast(Flash::error("toast.loadError"));
    }

    render_detail(&state, shell, &detail, reviews, stats, has_reviewed, favorites.as_ref())
}

fn render_detail(
    state: &AppState,
    shell: Shell,
    detail: &ProductDetail,
    reviews: Vec<ReviewWithAuthor>,
    stats: RatingStats,
    has_reviewed: bool,
    favorites: Option<&FavoriteSet>,
) -> Response {
    let locale = shell.locale;
    let t = shell.t;
    let product = &detail.product;
    let path = product_path(locale, product.id);
    let card = ProductCard::new(product, locale, state.storage(), favorites, &path);

    let category_href = CatalogSection::from_category(product.category_id)
        .map_or_else(|| format!("/{}", locale.code()), |s| format!("/{}/{}", locale.code(), s.slug()));
    let stock_text = if product.in_stock() {
        t.format("product.stock", &[("count", &product.stock.to_string())])
    } else {
        t.get("product.outOfStock").to_owned()
    };

    let description = product.description_text().to_owned();
    let shell = shell.with_page_title(&product.name).with_description(&description);

    ProductShowTemplate {
        t,
        category_name: detail.category_name.clone(),
        category_href,
        subcategory_name: detail.subcategory_name.clone(),
        stock_text,
        average_stars: star_string(stats.filled_stars()),
        stats,
        reviews: reviews.iter().map(ReviewView::from).collect(),
        review_url: format!("{path}/reviews"),
        review_login_url: login_url(locale, &format!("{path}#reviews")),
        has_reviewed,
        card,
        shell,
    }
    .into_response()
}

/// Review form data.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

/// Submit a review, then return to the product's review section.
#[instrument(skip_all, fields(product = %id, customer = %user.customer_id))]
pub async fn submit_review(
    State(state): State<AppState>,
    CurrentLocale(locale): CurrentLocale,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect, AppError> {
    let id = id
        .parse::<ProductId>()
        .map_err(|_| AppError::NotFound(format!("product {id}")))?;
    let back = format!("{}#reviews", product_path(locale, id));

    let stars = form.rating.trim().parse::<i64>().unwrap_or(0);
    let review = match NewReview::parse(stars, &form.comment) {
        Ok(review) => review,
        Err(e) => {
            flash::push(&session, Flash::error(e.message_key())).await;
            return Ok(Redirect::to(&back));
        }
    };

    let repo = ReviewRepository::new(state.pool());
    if repo.has_reviewed(id, user.customer_id).await? {
        flash::push(&session, Flash::error("reviews.alreadyReviewed")).await;
        return Ok(Redirect::to(&back));
    }

    match repo.add(id, user.customer_id, &review).await {
        Ok(review_id) => {
            let product_id = id.to_string();
            let review_id = review_id.to_string();
            add_breadcrumb(
                "reviews",
                "Submitted review",
                &[("product_id", product_id.as_str()), ("review_id", review_id.as_str())],
            );
            flash::push(&session, Flash::success("reviews.submitted")).await;
        }
        Err(e) => {
            if matches!(e, ReviewError::Repository(_)) {
                tracing::error!(error = %e, "Failed to store review");
            }
            flash::push(&session, Flash::error(e.message_key())).await;
        }
    }

    Ok(Redirect::to(&back))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_string_fills_from_the_left() {
        assert_eq!(star_string(0), "☆☆☆☆☆");
        assert_eq!(star_string(3), "★★★☆☆");
        assert_eq!(star_string(5), "★★★★★");
    }

    #[test]
    fn product_paths_are_localized() {
        assert_eq!(product_path(Locale::Fr, ProductId::new(12)), "/fr/productos/12");
    }
}
