use shared::domain::Quote;

pub mod error;
pub mod merge;
pub mod presenter;
pub mod remote;
pub mod store;
pub mod sync;

pub use error::QuoteError;
pub use merge::merge_quotes;
pub use presenter::{relay_events, Presenter};
pub use remote::{HttpQuoteRemote, MissingQuoteRemote, QuoteRemote};
pub use store::{pick_random, LoadOutcome, QuoteStore, SeedReason};
pub use sync::{Reconciler, SyncHandle, SyncOutcome, SyncPhase, DEFAULT_SYNC_INTERVAL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    QuotesSynced { total: usize, from_remote: usize },
    QuotePublished { quote: Quote },
    RemoteUnavailable { reason: String },
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
