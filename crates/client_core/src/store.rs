//! The authoritative in-memory quote list and its durable backing.

use std::{collections::BTreeSet, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use shared::domain::{default_quotes, CategoryFilter, Quote, QuoteDraft, QuoteId};
use storage::{
    KeyValueStore, MemoryStore, Storage, LAST_VIEWED_QUOTE_KEY, QUOTES_KEY, SELECTED_CATEGORY_KEY,
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::QuoteError;

/// Source of local quote ids.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored { count: usize },
    Seeded { reason: SeedReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedReason {
    Missing,
    Empty,
    Corrupt,
    Unreadable,
}

enum PersistedQuotes {
    Present(Vec<Quote>),
    Missing,
    Corrupt(serde_json::Error),
    Unreadable(anyhow::Error),
}

struct StoreState {
    quotes: Vec<Quote>,
    selected: CategoryFilter,
    last_issued_id: i64,
}

pub struct QuoteStore {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<StoreState>,
}

impl QuoteStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self::new_with_clock(durable, session, Arc::new(SystemClock))
    }

    pub fn new_with_clock(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            durable,
            session,
            clock,
            state: Mutex::new(StoreState {
                quotes: Vec::new(),
                selected: CategoryFilter::All,
                last_issued_id: 0,
            }),
        }
    }

    /// Opens the SQLite database at `database_url` and loads it.
    pub async fn open(database_url: &str) -> Result<Arc<Self>> {
        let storage = Storage::new(database_url)
            .await
            .with_context(|| format!("failed to initialize quote storage at '{database_url}'"))?;
        let store = Arc::new(Self::new(Arc::new(storage), Arc::new(MemoryStore::new())));
        let outcome = store.load().await;
        debug!(?outcome, %database_url, "store: opened");
        Ok(store)
    }

    async fn read_persisted(&self) -> PersistedQuotes {
        match self.durable.get_item(QUOTES_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Quote>>(&raw) {
                Ok(quotes) => PersistedQuotes::Present(quotes),
                Err(err) => PersistedQuotes::Corrupt(err),
            },
            Ok(None) => PersistedQuotes::Missing,
            Err(err) => PersistedQuotes::Unreadable(err),
        }
    }

    async fn persist(&self, quotes: &[Quote]) -> Result<()> {
        let encoded = serde_json::to_string(quotes).context("failed to encode quotes")?;
        self.durable.set_item(QUOTES_KEY, &encoded).await
    }

    /// Replaces the in-memory state with what storage holds.
    ///
    /// Never fails: missing, empty or corrupt data seeds and persists the
    /// default quotes. An unreadable backend seeds them in memory only, so
    /// whatever storage holds is left in place.
    pub async fn load(&self) -> LoadOutcome {
        let mut state = self.state.lock().await;

        let (quotes, reason) = match self.read_persisted().await {
            PersistedQuotes::Present(quotes) if quotes.is_empty() => (quotes, Some(SeedReason::Empty)),
            PersistedQuotes::Present(quotes) => (quotes, None),
            PersistedQuotes::Missing => (Vec::new(), Some(SeedReason::Missing)),
            PersistedQuotes::Corrupt(err) => {
                warn!(error = %err, "store: persisted quotes are corrupt; resetting");
                (Vec::new(), Some(SeedReason::Corrupt))
            }
            PersistedQuotes::Unreadable(err) => {
                warn!(error = %err, "store: persisted quotes are unreadable; using defaults without saving");
                (Vec::new(), Some(SeedReason::Unreadable))
            }
        };

        let outcome = match reason {
            None => {
                state.quotes = quotes;
                LoadOutcome::Restored {
                    count: state.quotes.len(),
                }
            }
            Some(SeedReason::Unreadable) => {
                state.quotes = default_quotes();
                LoadOutcome::Seeded {
                    reason: SeedReason::Unreadable,
                }
            }
            Some(reason) => {
                state.quotes = default_quotes();
                if let Err(err) = self.persist(&state.quotes).await {
                    warn!(error = %err, "store: failed to persist default quotes");
                }
                LoadOutcome::Seeded { reason }
            }
        };

        match self.durable.get_item(SELECTED_CATEGORY_KEY).await {
            Ok(Some(raw)) => state.selected = CategoryFilter::from(raw.as_str()),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "store: failed to read selected category"),
        }

        info!(
            quotes = state.quotes.len(),
            selected = %state.selected,
            "store: loaded"
        );
        outcome
    }

    pub async fn save(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.persist(&state.quotes).await
    }

    pub async fn quotes(&self) -> Vec<Quote> {
        self.state.lock().await.quotes.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.quotes.len()
    }

    pub async fn add(&self, text: &str, category: &str) -> Result<Quote, QuoteError> {
        let draft = QuoteDraft::parse(text, category)?;

        let mut state = self.state.lock().await;
        let id = self.clock.now_millis().max(state.last_issued_id + 1);
        let quote = draft.into_quote(Some(QuoteId(id)));

        let mut next = state.quotes.clone();
        next.push(quote.clone());
        self.persist(&next).await?;

        state.quotes = next;
        state.last_issued_id = id;
        info!(id, category = %quote.category, "store: quote added");
        Ok(quote)
    }

    pub async fn filtered_by(&self, filter: &CategoryFilter) -> Vec<Quote> {
        let state = self.state.lock().await;
        filter_quotes(&state.quotes, filter).cloned().collect()
    }

    pub async fn selected_category(&self) -> CategoryFilter {
        self.state.lock().await.selected.clone()
    }

    /// Selects `all` or a category some current quote carries.
    pub async fn set_selected_category(&self, filter: CategoryFilter) -> Result<(), QuoteError> {
        let mut state = self.state.lock().await;
        if let CategoryFilter::Only(category) = &filter {
            if !state.quotes.iter().any(|quote| &quote.category == category) {
                return Err(QuoteError::UnknownCategory(category.clone()));
            }
        }
        self.durable
            .set_item(SELECTED_CATEGORY_KEY, filter.as_str())
            .await?;
        state.selected = filter;
        Ok(())
    }

    pub async fn categories(&self) -> BTreeSet<String> {
        let state = self.state.lock().await;
        state
            .quotes
            .iter()
            .map(|quote| quote.category.clone())
            .collect()
    }

    /// Picks a quote eligible under the selected category and remembers it
    /// in the session slot.
    pub async fn show_random<R: Rng>(&self, rng: &mut R) -> Option<Quote> {
        let picked = {
            let state = self.state.lock().await;
            let eligible: Vec<&Quote> = filter_quotes(&state.quotes, &state.selected).collect();
            pick_random(&eligible, rng).map(|quote| (*quote).clone())
        };

        if let Some(quote) = &picked {
            self.record_last_viewed(quote).await;
        }
        picked
    }

    async fn record_last_viewed(&self, quote: &Quote) {
        let result = match serde_json::to_string(quote) {
            Ok(encoded) => self.session.set_item(LAST_VIEWED_QUOTE_KEY, &encoded).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!(error = %err, "store: failed to record last viewed quote");
        }
    }

    pub async fn last_viewed(&self) -> Option<Quote> {
        let raw = match self.session.get_item(LAST_VIEWED_QUOTE_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "store: failed to read last viewed quote");
                return None;
            }
        };
        serde_json::from_str(&raw).ok()
    }

    /// Appends every quote of a JSON array document as-is.
    pub async fn import_json(&self, document: &str) -> Result<usize, QuoteError> {
        let value: serde_json::Value =
            serde_json::from_str(document).map_err(QuoteError::ImportParse)?;
        if !value.is_array() {
            return Err(QuoteError::ImportNotArray);
        }
        let imported: Vec<Quote> =
            serde_json::from_value(value).map_err(QuoteError::ImportParse)?;
        let count = imported.len();

        let mut state = self.state.lock().await;
        let mut next = state.quotes.clone();
        next.extend(imported);
        self.persist(&next).await?;
        state.quotes = next;

        info!(count, total = state.quotes.len(), "store: quotes imported");
        Ok(count)
    }

    pub async fn export_json(&self) -> Result<String, QuoteError> {
        let state = self.state.lock().await;
        serde_json::to_string_pretty(&state.quotes).map_err(QuoteError::Encode)
    }

    /// Swaps a locally issued id for the one the remote assigned.
    pub async fn replace_id(&self, old: QuoteId, new: QuoteId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(position) = state.quotes.iter().position(|quote| quote.id == Some(old)) else {
            return Ok(false);
        };

        let mut next = state.quotes.clone();
        next[position].id = Some(new);
        self.persist(&next).await?;
        state.quotes = next;
        debug!(old = old.0, new = new.0, "store: quote id superseded by remote");
        Ok(true)
    }

    /// Locks the store for a read-merge-write cycle.
    ///
    /// The snapshot is the persisted list; when that is missing or corrupt the
    /// in-memory list stands in for it.
    pub async fn lock_snapshot(&self) -> SnapshotGuard<'_> {
        let state = self.state.lock().await;
        let local = match self.read_persisted().await {
            PersistedQuotes::Present(quotes) => quotes,
            PersistedQuotes::Missing => state.quotes.clone(),
            PersistedQuotes::Corrupt(err) => {
                warn!(error = %err, "store: persisted snapshot corrupt; using in-memory quotes");
                state.quotes.clone()
            }
            PersistedQuotes::Unreadable(err) => {
                warn!(error = %err, "store: persisted snapshot unreadable; using in-memory quotes");
                state.quotes.clone()
            }
        };
        SnapshotGuard {
            store: self,
            state,
            local,
        }
    }
}

pub struct SnapshotGuard<'a> {
    store: &'a QuoteStore,
    state: MutexGuard<'a, StoreState>,
    local: Vec<Quote>,
}

impl SnapshotGuard<'_> {
    pub fn local(&self) -> &[Quote] {
        &self.local
    }

    pub async fn replace(mut self, quotes: Vec<Quote>) -> Result<()> {
        self.store.persist(&quotes).await?;
        self.state.quotes = quotes;
        Ok(())
    }
}

pub fn filter_quotes<'a>(
    quotes: &'a [Quote],
    filter: &'a CategoryFilter,
) -> impl Iterator<Item = &'a Quote> + 'a {
    quotes.iter().filter(move |quote| filter.matches(quote))
}

/// Uniform pick; `None` means there is nothing to show.
pub fn pick_random<'a, T, R: Rng>(candidates: &'a [T], rng: &mut R) -> Option<&'a T> {
    if candidates.is_empty() {
        return None;
    }
    candidates.get(rng.gen_range(0..candidates.len()))
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
