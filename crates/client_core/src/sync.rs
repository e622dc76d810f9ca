//! Periodic server-wins reconciliation of the quote store.
//!
//! Each cycle walks `Idle -> Fetching -> Merging -> (Idle | Applying -> Idle)`.
//! A failed fetch counts as an empty remote list, so the merge keeps every
//! local quote and the cycle ends without a write.

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use shared::domain::Quote;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{merge::merge_quotes, remote::QuoteRemote, store::QuoteStore, ClientEvent};

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Merging,
    Applying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Applied { total: usize, from_remote: usize },
    /// The loop was cancelled while the fetch was in flight.
    Discarded,
}

pub struct Reconciler {
    store: Arc<QuoteStore>,
    remote: Arc<dyn QuoteRemote>,
    phase: watch::Sender<SyncPhase>,
    events: broadcast::Sender<ClientEvent>,
}

impl Reconciler {
    pub fn new(store: Arc<QuoteStore>, remote: Arc<dyn QuoteRemote>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let (phase, _) = watch::channel(SyncPhase::Idle);
        Arc::new(Self {
            store,
            remote,
            phase,
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.phase.send_replace(phase);
    }

    /// Runs one fetch-merge-apply cycle right now.
    pub async fn sync_once(&self) -> Result<SyncOutcome> {
        self.run_cycle(|| false).await
    }

    async fn run_cycle(&self, cancelled: impl Fn() -> bool) -> Result<SyncOutcome> {
        self.set_phase(SyncPhase::Fetching);
        let remote = self.fetch_remote().await;

        let outcome = if cancelled() {
            debug!(
                discarded = remote.len(),
                "sync: cancelled during fetch; discarding remote quotes"
            );
            Ok(SyncOutcome::Discarded)
        } else {
            self.apply_remote(&remote).await
        };

        self.set_phase(SyncPhase::Idle);
        outcome
    }

    async fn fetch_remote(&self) -> Vec<Quote> {
        match self.remote.fetch_quotes().await {
            Ok(quotes) => quotes,
            Err(err) => {
                warn!(error = %err, "sync: remote fetch failed; treating as empty");
                let _ = self.events.send(ClientEvent::RemoteUnavailable {
                    reason: err.to_string(),
                });
                Vec::new()
            }
        }
    }

    async fn apply_remote(&self, remote: &[Quote]) -> Result<SyncOutcome> {
        self.set_phase(SyncPhase::Merging);
        let snapshot = self.store.lock_snapshot().await;
        let merged = merge_quotes(snapshot.local(), remote);
        if merged.as_slice() == snapshot.local() {
            debug!(quotes = merged.len(), "sync: local quotes already up to date");
            return Ok(SyncOutcome::Unchanged);
        }

        self.set_phase(SyncPhase::Applying);
        let total = merged.len();
        snapshot.replace(merged).await?;
        info!(total, from_remote = remote.len(), "sync: applied remote quotes");

        let _ = self.events.send(ClientEvent::QuotesSynced {
            total,
            from_remote: remote.len(),
        });
        Ok(SyncOutcome::Applied {
            total,
            from_remote: remote.len(),
        })
    }

    /// Publishes a locally created quote and adopts the id the remote assigns.
    ///
    /// Failures are logged and returned; nothing is retried.
    pub async fn publish(&self, quote: &Quote) -> Result<Quote> {
        let stored = match self.remote.post_quote(quote).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, "sync: failed to post quote");
                return Err(err);
            }
        };

        if let (Some(local_id), Some(remote_id)) = (quote.id, stored.id) {
            if local_id != remote_id {
                self.store.replace_id(local_id, remote_id).await?;
            }
        }
        info!(id = ?stored.id, "sync: quote published");
        let _ = self.events.send(ClientEvent::QuotePublished {
            quote: stored.clone(),
        });
        Ok(stored)
    }

    /// Starts the periodic loop. The first cycle runs one full `period` after
    /// the call.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> SyncHandle {
        let (cancel, mut cancel_rx) = watch::channel(false);
        let reconciler = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_secs = period.as_secs_f64(), "sync: scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let outcome = reconciler.run_cycle(|| *cancel_rx.borrow()).await;
                match outcome {
                    Ok(SyncOutcome::Discarded) => break,
                    Ok(outcome) => debug!(?outcome, "sync: cycle finished"),
                    Err(err) => warn!(error = %err, "sync: failed to apply merged quotes"),
                }
            }

            info!("sync: scheduler stopped");
        });

        SyncHandle { cancel, task }
    }
}

/// Handle to a running sync loop. Dropping it also stops the loop.
pub struct SyncHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops scheduling further cycles and waits for the loop to exit.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "sync: scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
