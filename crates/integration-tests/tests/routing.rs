//! Router-level tests: locale redirects, 404 pages and auth guards.
//!
//! These drive the real router in-process. None of the requests here reach
//! the database: anonymous requests carry no session cookie, so the session
//! store is never read.

use axum::http::StatusCode;

use aunclic_integration_tests::{body_text, get, header};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let response = get("/health", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

// ============================================================================
// Locale redirects
// ============================================================================

#[tokio::test]
async fn test_root_redirects_to_accept_language() {
    let response = get("/", &[("accept-language", "fr-CA,fr;q=0.9,en;q=0.8")]).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header(&response, "location"), Some("/fr"));
}

#[tokio::test]
async fn test_root_prefers_locale_cookie() {
    let response = get(
        "/",
        &[("cookie", "NEXT_LOCALE=en"), ("accept-language", "fr-CA")],
    )
    .await;
    assert_eq!(header(&response, "location"), Some("/en"));
}

#[tokio::test]
async fn test_root_defaults_to_spanish() {
    let response = get("/", &[]).await;
    assert_eq!(header(&response, "location"), Some("/es"));
}

#[tokio::test]
async fn test_legacy_paths_get_a_locale_prefix() {
    let response = get("/comidas", &[("cookie", "NEXT_LOCALE=fr")]).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header(&response, "location"), Some("/fr/comidas"));

    let response = get("/login?redirect=%2Fes%2Ffavoritos", &[]).await;
    assert_eq!(
        header(&response, "location"),
        Some("/es/login?redirect=%2Fes%2Ffavoritos")
    );
}

#[tokio::test]
async fn test_locale_switch_sets_cookie_and_keeps_page() {
    let response = get("/es/locale/fr?path=%2Fes%2Fcomidas", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&response, "location"), Some("/fr/comidas"));
    let cookie = header(&response, "set-cookie").unwrap_or_default();
    assert!(cookie.starts_with("NEXT_LOCALE=fr"), "{cookie}");
}

#[tokio::test]
async fn test_locale_switch_rejects_offsite_paths() {
    let response = get("/es/locale/en?path=%2F%2Fevil.example", &[]).await;
    assert_eq!(header(&response, "location"), Some("/en"));

    let response = get("/es/locale/de", &[]).await;
    assert_eq!(header(&response, "location"), Some("/es"));
    assert!(header(&response, "set-cookie").is_none());
}

// ============================================================================
// 404
// ============================================================================

#[tokio::test]
async fn test_unknown_page_renders_localized_404() {
    let response = get("/fr/nulle-part", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_text(response).await;
    assert!(body.contains(r#"<html lang="fr">"#));
    assert!(body.contains("Page introuvable"));
}

#[tokio::test]
async fn test_malformed_product_id_is_not_found() {
    let response = get("/en/productos/not-a-number", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Page not found"));
}

// ============================================================================
// Auth guards
// ============================================================================

#[tokio::test]
async fn test_favorites_require_login() {
    let response = get("/es/favoritos", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        header(&response, "location"),
        Some("/es/login?redirect=%2Fes%2Ffavoritos")
    );
}

#[tokio::test]
async fn test_htmx_requests_get_hx_redirect() {
    let response = get(
        "/en/perfil",
        &[
            ("hx-request", "true"),
            ("hx-current-url", "http://localhost:3000/en/comidas"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        header(&response, "hx-redirect"),
        Some("/en/login?redirect=%2Fen%2Fcomidas")
    );
}

#[tokio::test]
async fn test_anonymous_favorite_badge_is_empty() {
    let response = get("/es/favoritos/count", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains(r#"hx-get="/es/favoritos/count""#));
    assert!(!body.contains("badge"));
}

// ============================================================================
// Auth pages
// ============================================================================

#[tokio::test]
async fn test_login_page_keeps_safe_redirect() {
    let response = get("/en/login?redirect=%2Fen%2Ffavoritos", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains(r#"name="redirect" value="/en/favoritos""#));
    assert!(body.contains("Welcome back"));
}

#[tokio::test]
async fn test_login_page_drops_offsite_redirect() {
    let body = body_text(get("/es/login?redirect=https%3A%2F%2Fevil.example", &[]).await).await;
    assert!(!body.contains("evil.example"));
}

#[tokio::test]
async fn test_register_page_renders_in_each_locale() {
    for (locale, title) in [
        ("es", "Crea tu cuenta"),
        ("en", "Create your account"),
        ("fr", "Créez votre compte"),
    ] {
        let response = get(&format!("/{locale}/register"), &[]).await;
        assert_eq!(response.status(), StatusCode::OK, "{locale}");
        let body = body_text(response).await;
        assert!(body.contains(title), "{locale}");
        assert!(body.contains(r#"name="confirmPassword""#));
    }
}
