use std::{collections::BTreeSet, sync::Arc};

use shared::domain::{CategoryFilter, Quote};
use tokio::sync::broadcast;
use tracing::debug;

use crate::ClientEvent;

pub const SYNCED_MESSAGE: &str = "Quotes synced with server!";

/// Where quotes and transient messages end up for the user.
pub trait Presenter: Send + Sync {
    /// `None` renders the "no quotes available" placeholder.
    fn render(&self, quote: Option<&Quote>);
    fn notify(&self, message: &str);
    fn render_category_options(&self, categories: &BTreeSet<String>, selected: &CategoryFilter);
}

/// Message shown for an event, if it warrants one.
pub fn notification_for(event: &ClientEvent) -> Option<String> {
    match event {
        ClientEvent::QuotesSynced { .. } => Some(SYNCED_MESSAGE.to_string()),
        ClientEvent::QuotePublished { quote } => Some(format!(
            "Quote published to server with id {}",
            quote.id.map(|id| id.to_string()).unwrap_or_default()
        )),
        ClientEvent::RemoteUnavailable { .. } => None,
    }
}

/// Forwards client events to `presenter` until the sender side closes.
pub async fn relay_events(
    mut events: broadcast::Receiver<ClientEvent>,
    presenter: Arc<dyn Presenter>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(message) = notification_for(&event) {
                    presenter.notify(&message);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "presenter: lagged behind client events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
