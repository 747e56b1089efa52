//! Localized 404 page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::shell::Shell;
use crate::filters;

#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub shell: Shell,
}

impl NotFoundTemplate {
    /// Render the 404 page inside the given shell.
    #[must_use]
    pub fn render_for(shell: Shell) -> Response {
        let shell = shell.with_title("notFound.title");
        (StatusCode::NOT_FOUND, Self { shell }).into_response()
    }
}

/// Router fallback.
pub async fn fallback(shell: Shell) -> Response {
    tracing::debug!(path = %shell.path, "No route matched");
    NotFoundTemplate::render_for(shell)
}
