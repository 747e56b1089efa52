//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready            - Liveness / readiness
//! GET  /static/*                         - Static assets
//! GET  /                                 - Redirect to the negotiated locale
//!
//! Under each /{locale} (es, en, fr):
//!
//! GET  /                                 - Home
//! GET  /productos | /comidas | /boutique - Catalog sections
//! GET  /{section}/more                   - Next page of a section (HTMX)
//! GET  /productos/{id}                   - Product detail with reviews
//! POST /productos/{id}/reviews           - Submit a review
//!
//! # Favorites (login required)
//! GET  /favoritos                        - Favorites page
//! GET  /favoritos/count                  - Navbar badge (HTMX)
//! POST /favoritos/{id}/toggle            - Toggle (HTMX fragment or redirect)
//! POST /favoritos/{id}/remove            - Remove
//!
//! # Auth
//! GET|POST /login, /register, /forgot-password, /reset-password
//! GET  /auth/google                      - Start Google OAuth
//! GET  /auth/callback                    - OAuth / recovery PKCE callback
//! POST /logout
//!
//! # Profile (login required)
//! GET  /perfil
//! POST /perfil/name
//! POST /perfil/addresses                 - Add
//! POST /perfil/addresses/{id}            - Update
//! POST /perfil/addresses/{id}/delete     - Delete
//!
//! GET  /locale/{code}?path=              - Switch language
//! ```

pub mod auth;
pub mod catalog;
pub mod favorites;
pub mod home;
pub mod locale;
pub mod not_found;
pub mod products;
pub mod profile;
pub mod shell;

use axum::{
    Extension, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header::CACHE_CONTROL},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use aunclic_core::Locale;

use crate::catalog::CatalogSection;
use crate::middleware::{
    RateLimits, SecurityPolicy, create_session_layer,
    locale_redirect_middleware, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

pub use shell::Shell;

/// Static assets, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Auth pages: GET renders the form, POST is rate limited.
fn auth_routes(limits: &RateLimits) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limits.auth.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limits.auth.clone())),
        )
        .route(
            "/forgot-password",
            get(auth::forgot_password_page)
                .merge(post(auth::forgot_password).layer(limits.auth.clone())),
        )
        .route(
            "/reset-password",
            get(auth::reset_password_page)
                .merge(post(auth::reset_password).layer(limits.auth.clone())),
        )
        .route("/auth/google", get(auth::google))
        .route("/auth/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

fn catalog_routes(limits: &RateLimits) -> Router<AppState> {
    let router = CatalogSection::ALL
        .into_iter()
        .fold(Router::new(), |router, section| {
            router
                .route(
                    &format!("/{}", section.slug()),
                    get(catalog::index).layer(Extension(section)),
                )
                .route(
                    &format!("/{}/more", section.slug()),
                    get(catalog::more).layer(Extension(section)),
                )
        });

    router
        .route("/productos/{id}", get(products::show))
        .route(
            "/productos/{id}/reviews",
            post(products::submit_review).layer(limits.api.clone()),
        )
}

fn favorite_routes(limits: &RateLimits) -> Router<AppState> {
    Router::new()
        .route("/favoritos", get(favorites::index))
        .route("/favoritos/count", get(favorites::count))
        .route(
            "/favoritos/{id}/toggle",
            post(favorites::toggle).layer(limits.api.clone()),
        )
        .route(
            "/favoritos/{id}/remove",
            post(favorites::remove).layer(limits.api.clone()),
        )
}

fn profile_routes(limits: &RateLimits) -> Router<AppState> {
    Router::new()
        .route("/perfil", get(profile::index))
        .route("/perfil/name", post(profile::update_name))
        .route(
            "/perfil/addresses",
            post(profile::add_address).layer(limits.api.clone()),
        )
        .route("/perfil/addresses/{id}", post(profile::update_address))
        .route("/perfil/addresses/{id}/delete", post(profile::delete_address))
}

/// Every page under one locale prefix. `limits` is shared across prefixes.
pub fn locale_routes(limits: &RateLimits) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/locale/{code}", get(locale::switch))
        .merge(catalog_routes(limits))
        .merge(favorite_routes(limits))
        .merge(auth_routes(limits))
        .merge(profile_routes(limits))
}

/// Locale-prefixed routes, health checks and static files, without state
/// or middleware.
pub fn routes() -> Router<AppState> {
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400"),
        ))
        .service(ServeDir::new(STATIC_DIR));
    let limits = RateLimits::new();

    Locale::ALL.into_iter().fold(
        Router::new()
            .route("/health", get(health))
            .route("/health/ready", get(readiness))
            .nest_service("/static", static_files),
        |router, locale| {
            router.nest(
                &format!("/{}", locale.code()),
                locale_routes(&limits).layer(Extension(locale)),
            )
        },
    )
}

/// The complete application: routes, 404 fallback and the middleware stack
/// (Sentry layers are added by the binary).
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());
    let policy = SecurityPolicy::new(state.config().supabase.origin());

    routes()
        .fallback(not_found::fallback)
        .layer(from_fn(locale_redirect_middleware))
        .layer(session_layer)
        .layer(from_fn_with_state(policy, security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
