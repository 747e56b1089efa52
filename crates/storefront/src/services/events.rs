//! Auth state broadcast.
//!
//! The auth service publishes every login/logout transition here. A listener
//! task started in `main` logs each event. It runs outside any request, so it
//! never touches the Sentry scope; the auth extractors tag the request hub.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use aunclic_core::{CustomerId, Email};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn { customer_id: CustomerId, email: Email },
    /// `confirmed` is false while the confirmation email is pending.
    SignedUp { email: Email, confirmed: bool },
    SignedOut { customer_id: CustomerId },
    PasswordRecoveryRequested { email: Email },
    PasswordUpdated { customer_id: CustomerId },
}

impl AuthEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SignedIn { .. } => "signed_in",
            Self::SignedUp { .. } => "signed_up",
            Self::SignedOut { .. } => "signed_out",
            Self::PasswordRecoveryRequested { .. } => "password_recovery_requested",
            Self::PasswordUpdated { .. } => "password_updated",
        }
    }
}

/// Broadcast sender for [`AuthEvent`]s. Cheap to clone.
#[derive(Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish to every current subscriber. Returns how many received it;
    /// having none is not an error.
    pub fn publish(&self, event: AuthEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Spawn the logging listener. Ends when every sender is dropped.
    pub fn spawn_listener(&self) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => record(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

fn record(event: &AuthEvent) {
    match event {
        AuthEvent::SignedIn { customer_id, .. }
        | AuthEvent::SignedOut { customer_id }
        | AuthEvent::PasswordUpdated { customer_id } => {
            tracing::info!(event = event.name(), customer = %customer_id, "Auth state changed");
        }
        AuthEvent::SignedUp { confirmed, .. } => {
            tracing::info!(event = event.name(), confirmed, "Auth state changed");
        }
        AuthEvent::PasswordRecoveryRequested { .. } => {
            tracing::info!(event = event.name(), "Auth state changed");
        }
    }
}
