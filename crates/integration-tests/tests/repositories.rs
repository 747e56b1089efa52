//! Repository tests against `PostgreSQL`.
//!
//! `#[sqlx::test]` creates a throwaway database per test and applies the
//! storefront migrations, so the categories are seeded and nothing else is.
//! Point `DATABASE_URL` at a server the tests may create databases on.

use axum::http::StatusCode;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use aunclic_core::{CategoryId, CustomerId, Email, ProductId};
use aunclic_integration_tests::{body_text, test_app_with, test_config};
use aunclic_storefront::catalog::{CatalogSection, FilterQuery, ProductFilter, SortOrder};
use aunclic_storefront::db::{
    CatalogRepository, CustomerRepository, FavoriteRepository, ReviewRepository,
};
use aunclic_storefront::models::{NewReview, ReviewError};

async fn seed_customer(pool: &PgPool, email: &str) -> CustomerId {
    let email = Email::parse(email).expect("valid email");
    CustomerRepository::new(pool)
        .upsert_from_auth(Uuid::new_v4(), &email, None)
        .await
        .expect("customer")
        .id
}

async fn seed_product(pool: &PgPool, category: CategoryId, name: &str, price: i32) -> ProductId {
    sqlx::query_scalar::<_, ProductId>(
        r"
        INSERT INTO storefront.product (name, price, stock, category_id)
        VALUES ($1, $2, 10, $3)
        RETURNING id
        ",
    )
    .bind(name)
    .bind(price)
    .bind(category)
    .fetch_one(pool)
    .await
    .expect("product")
}

/// `Plato 1` through `Plato n` in `section`, priced 100 apart.
async fn seed_section(pool: &PgPool, section: CatalogSection, n: i32) -> Vec<ProductId> {
    let mut ids = Vec::new();
    for i in 1..=n {
        ids.push(seed_product(pool, section.category_id(), &format!("Plato {i}"), i * 100).await);
    }
    ids
}

fn review(stars: i64) -> NewReview {
    NewReview::parse(stars, "Muy rico").expect("valid review")
}

// ============================================================================
// Favorites
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_adding_a_favorite_twice_keeps_one_row(pool: PgPool) {
    let customer = seed_customer(&pool, "ana@example.com").await;
    let product = seed_product(&pool, CategoryId::new(2), "Arepa", 5).await;
    let favorites = FavoriteRepository::new(&pool);

    favorites.add(customer, product).await.expect("first add");
    favorites.add(customer, product).await.expect("second add");

    assert_eq!(favorites.count(customer).await.expect("count"), 1);
    assert!(favorites.is_favorite(customer, product).await.expect("lookup"));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_toggling_twice_restores_membership(pool: PgPool) {
    let customer = seed_customer(&pool, "ana@example.com").await;
    let product = seed_product(&pool, CategoryId::new(2), "Arepa", 5).await;
    let favorites = FavoriteRepository::new(&pool);

    assert!(favorites.toggle(customer, product).await.expect("toggle on"));
    assert!(!favorites.toggle(customer, product).await.expect("toggle off"));
    assert!(!favorites.is_favorite(customer, product).await.expect("lookup"));
    assert_eq!(favorites.count(customer).await.expect("count"), 0);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_remove_reports_whether_a_row_went_away(pool: PgPool) {
    let customer = seed_customer(&pool, "ana@example.com").await;
    let product = seed_product(&pool, CategoryId::new(2), "Arepa", 5).await;
    let favorites = FavoriteRepository::new(&pool);

    assert!(!favorites.remove(customer, product).await.expect("remove absent"));
    favorites.add(customer, product).await.expect("add");
    assert!(favorites.remove(customer, product).await.expect("remove present"));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_favorites_are_per_customer(pool: PgPool) {
    let ana = seed_customer(&pool, "ana@example.com").await;
    let luis = seed_customer(&pool, "luis@example.com").await;
    let product = seed_product(&pool, CategoryId::new(3), "Bolso", 40).await;
    let favorites = FavoriteRepository::new(&pool);

    favorites.add(ana, product).await.expect("add");

    assert!(favorites.product_ids(ana).await.expect("ids").contains(product));
    assert!(!favorites.product_ids(luis).await.expect("ids").contains(product));
    assert_eq!(favorites.list(ana).await.expect("list").len(), 1);
}

// ============================================================================
// Reviews
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_second_review_is_rejected(pool: PgPool) {
    let customer = seed_customer(&pool, "ana@example.com").await;
    let product = seed_product(&pool, CategoryId::new(2), "Arepa", 5).await;
    let reviews = ReviewRepository::new(&pool);

    reviews.add(product, customer, &review(5)).await.expect("first review");
    let second = reviews.add(product, customer, &review(1)).await;

    assert!(matches!(second, Err(ReviewError::AlreadyReviewed)), "{second:?}");
    assert!(reviews.has_reviewed(product, customer).await.expect("lookup"));
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_review_of_missing_product_is_not_found(pool: PgPool) {
    let customer = seed_customer(&pool, "ana@example.com").await;

    let result = ReviewRepository::new(&pool)
        .add(ProductId::new(999_999), customer, &review(4))
        .await;

    assert!(matches!(result, Err(ReviewError::ProductNotFound)), "{result:?}");
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_rating_stats_round_to_one_decimal(pool: PgPool) {
    let product = seed_product(&pool, CategoryId::new(2), "Arepa", 5).await;
    let reviews = ReviewRepository::new(&pool);

    let empty = reviews.rating_stats(product).await.expect("stats");
    assert_eq!(empty.review_count, 0);
    assert_eq!(empty.average_rating, Decimal::ZERO);

    for (email, stars) in [("a@example.com", 5), ("b@example.com", 4), ("c@example.com", 4)] {
        let customer = seed_customer(&pool, email).await;
        reviews.add(product, customer, &review(stars)).await.expect("review");
    }

    let stats = reviews.rating_stats(product).await.expect("stats");
    assert_eq!(stats.review_count, 3);
    assert_eq!(stats.average_rating, Decimal::new(43, 1));
    assert_eq!(reviews.list_for_product(product).await.expect("list").len(), 3);
}

// ============================================================================
// Catalog
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_count_products_applies_filter(pool: PgPool) {
    seed_section(&pool, CatalogSection::Foods, 5).await;
    seed_product(&pool, CategoryId::new(3), "Plato ajeno", 100).await;
    let catalog = CatalogRepository::new(&pool);
    let foods = CatalogSection::Foods.category_id();

    let all = catalog
        .count_products(foods, &ProductFilter::default())
        .await
        .expect("count");
    assert_eq!(all, 5);

    let pricey = ProductFilter {
        min_price: Decimal::from(300),
        ..ProductFilter::default()
    };
    assert_eq!(catalog.count_products(foods, &pricey).await.expect("count"), 3);

    let search = ProductFilter::from_query(&FilterQuery {
        search: Some("plato 2".to_owned()),
        ..FilterQuery::default()
    });
    assert_eq!(catalog.count_products(foods, &search).await.expect("count"), 1);
}

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_load_page_slices_in_sort_order(pool: PgPool) {
    seed_section(&pool, CatalogSection::Foods, 5).await;
    let catalog = CatalogRepository::new(&pool);
    let foods = CatalogSection::Foods.category_id();
    let filter = ProductFilter {
        sort: SortOrder::PriceDesc,
        ..ProductFilter::default()
    };

    let second = catalog.load_page(foods, 2, 2, &filter).await.expect("page 2");
    let names: Vec<&str> = second.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Plato 3", "Plato 2"]);
    assert_eq!(second.total, 5);
    assert!(second.has_more());

    let last = catalog.load_page(foods, 3, 2, &filter).await.expect("page 3");
    assert_eq!(last.products.len(), 1);
    assert!(!last.has_more());
}

// ============================================================================
// Load more
// ============================================================================

#[sqlx::test(migrations = "../storefront/migrations")]
#[ignore = "Requires DATABASE_URL pointing at a PostgreSQL server"]
async fn test_load_more_returns_next_slice_and_button(pool: PgPool) {
    seed_section(&pool, CatalogSection::Foods, 5).await;
    let mut config = test_config();
    config.catalog.page_size = 2;
    let app = test_app_with(config, pool);

    let response = tower::ServiceExt::oneshot(
        app.clone(),
        axum::http::Request::builder()
            .uri("/es/comidas/more?sortBy=priceDesc&page=2")
            .body(axum::body::Body::empty())
            .expect("request"),
    )
    .await
    .expect("infallible router");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;

    assert_eq!(body.matches("class=\"product-card\"").count(), 2);
    assert!(body.contains("Plato 3") && body.contains("Plato 2"), "{body}");
    assert!(!body.contains("Plato 4"), "{body}");
    assert!(body.contains("/es/comidas/more?sortBy=priceDesc"), "{body}");
    assert!(body.contains("page=3"), "{body}");
    assert!(!body.contains("<html"));

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/es/comidas/more?sortBy=priceDesc&page=3")
            .body(axum::body::Body::empty())
            .expect("request"),
    )
    .await
    .expect("infallible router");
    let body = body_text(response).await;
    assert_eq!(body.matches("class=\"product-card\"").count(), 1);
    assert!(!body.contains("id=\"load-more\""), "{body}");
}
