//! One-shot toast messages carried across a redirect in the session.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier for the toast.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A toast: its kind and the message key to translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub key: String,
}

impl Flash {
    #[must_use]
    pub fn success(key: &str) -> Self {
        Self {
            kind: FlashKind::Success,
            key: key.to_owned(),
        }
    }

    #[must_use]
    pub fn error(key: &str) -> Self {
        Self {
            kind: FlashKind::Error,
            key: key.to_owned(),
        }
    }

    #[must_use]
    pub fn info(key: &str) -> Self {
        Self {
            kind: FlashKind::Info,
            key: key.to_owned(),
        }
    }
}

/// Queue a toast for the next full page render.
pub async fn push(session: &Session, flash: Flash) {
    let mut queued: Vec<Flash> = session
        .get(session_keys::FLASHES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    // the same toast twice in a row adds nothing
    if queued.last() != Some(&flash) {
        queued.push(flash);
    }

    if let Err(e) = session.insert(session_keys::FLASHES, queued).await {
        tracing::warn!("Failed to store flash message: {e}");
    }
}

/// Remove and return every queued toast.
pub async fn take(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASHES).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read flash messages: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn take_drains_queue() {
        let session = session();
        push(&session, Flash::success("toast.loginSuccess")).await;
        push(&session, Flash::error("toast.favoriteError")).await;

        let flashes = take(&session).await;
        assert_eq!(
            flashes,
            vec![
                Flash::success("toast.loginSuccess"),
                Flash::error("toast.favoriteError")
            ]
        );
        assert!(take(&session).await.is_empty());
    }

    #[tokio::test]
    async fn consecutive_duplicates_collapse() {
        let session = session();
        push(&session, Flash::info("toast.loginRequired")).await;
        push(&session, Flash::info("toast.loginRequired")).await;
        assert_eq!(take(&session).await.len(), 1);
    }
}
