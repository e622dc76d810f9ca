use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    ClientEvent, HttpQuoteRemote, MissingQuoteRemote, Presenter, QuoteError, QuoteRemote,
    QuoteStore, Reconciler, SyncOutcome, SyncPhase,
};
use rand::{rngs::StdRng, SeedableRng};
use shared::domain::{CategoryFilter, Quote};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{broadcast, watch},
};
use tracing::{info, warn};

use crate::config::ClientSettings;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show a random quote from the selected category.
    Show {
        /// Select this category first (`all` clears the filter).
        #[arg(long)]
        category: Option<String>,
    },
    /// Add a quote to the local collection.
    Add {
        text: String,
        category: String,
        /// Also post the quote to the configured server.
        #[arg(long)]
        publish: bool,
    },
    /// Remember a category filter and show a quote from it.
    Filter { category: String },
    /// List every category, marking the selected one.
    Categories,
    /// Append the quotes of a JSON array file.
    Import { file: PathBuf },
    /// Write all quotes to a JSON file.
    Export { file: PathBuf },
    /// Show the last quote viewed in this session.
    Last,
    /// Reconcile with the server once.
    Sync,
    /// Keep reconciling on a fixed interval until interrupted.
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Stop after this many cycles.
        #[arg(long)]
        ticks: Option<usize>,
    },
    /// Read commands from stdin, one per line, within a single session.
    Repl,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "quotes")]
struct ReplLine {
    #[command(subcommand)]
    command: Command,
}

pub struct App {
    store: Arc<QuoteStore>,
    reconciler: Arc<Reconciler>,
    presenter: Arc<dyn Presenter>,
    sync_interval: Duration,
}

impl App {
    pub fn new(
        store: Arc<QuoteStore>,
        remote: Arc<dyn QuoteRemote>,
        presenter: Arc<dyn Presenter>,
        sync_interval: Duration,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(store.clone(), remote),
            store,
            presenter,
            sync_interval,
        }
    }

    pub async fn connect(settings: &ClientSettings, presenter: Arc<dyn Presenter>) -> Result<Self> {
        let store = QuoteStore::open(&settings.database_url).await?;
        let remote: Arc<dyn QuoteRemote> = match settings.server_url.as_deref() {
            Some(server_url) => Arc::new(HttpQuoteRemote::new(server_url)?),
            None => {
                info!("app: no server configured; running offline");
                Arc::new(MissingQuoteRemote)
            }
        };
        Ok(Self::new(store, remote, presenter, settings.sync_interval))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.reconciler.subscribe_events()
    }

    pub fn presenter(&self) -> Arc<dyn Presenter> {
        self.presenter.clone()
    }

    /// Runs one command. User mistakes are reported through the presenter
    /// and do not fail the call.
    pub async fn execute(&self, command: Command) -> Result<()> {
        match self.dispatch(command).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_user_facing() => {
                self.presenter.notify(&err.to_string());
                Ok(())
            }
            Err(QuoteError::Storage(err)) => Err(err),
            Err(err) => Err(err.into()),
        }
    }

    async fn dispatch(&self, command: Command) -> Result<(), QuoteError> {
        match command {
            Command::Show { category } => {
                if let Some(category) = category {
                    self.store
                        .set_selected_category(CategoryFilter::from(category.as_str()))
                        .await?;
                }
                self.show_random().await;
            }
            Command::Add {
                text,
                category,
                publish,
            } => {
                let quote = self.store.add(&text, &category).await?;
                self.presenter.render(Some(&quote));
                self.render_categories().await;
                if publish {
                    self.publish(&quote).await;
                }
            }
            Command::Filter { category } => {
                self.store
                    .set_selected_category(CategoryFilter::from(category.as_str()))
                    .await?;
                self.render_categories().await;
                self.show_random().await;
            }
            Command::Categories => self.render_categories().await,
            Command::Import { file } => {
                let document = match tokio::fs::read_to_string(&file).await {
                    Ok(document) => document,
                    Err(err) => {
                        self.presenter
                            .notify(&format!("could not read '{}': {err}", file.display()));
                        return Ok(());
                    }
                };
                let count = self.store.import_json(&document).await?;
                self.presenter
                    .notify(&format!("Imported {count} quotes successfully!"));
                self.show_random().await;
            }
            Command::Export { file } => {
                let document = self.store.export_json().await?;
                if let Err(err) = tokio::fs::write(&file, document).await {
                    self.presenter
                        .notify(&format!("could not write '{}': {err}", file.display()));
                    return Ok(());
                }
                self.presenter.notify(&format!(
                    "Exported {} quotes to {}",
                    self.store.len().await,
                    file.display()
                ));
            }
            Command::Last => match self.store.last_viewed().await {
                Some(quote) => self.presenter.render(Some(&quote)),
                None => self.presenter.notify("No quote viewed yet in this session."),
            },
            Command::Sync => match self.reconciler.sync_once().await? {
                SyncOutcome::Unchanged => self.presenter.notify("Quotes already up to date."),
                SyncOutcome::Applied { .. } | SyncOutcome::Discarded => {}
            },
            Command::Watch {
                interval_secs,
                ticks,
            } => self.watch(interval_secs, ticks).await,
            Command::Repl => self.presenter.notify("Already reading commands interactively."),
        }
        Ok(())
    }

    async fn show_random(&self) -> Option<Quote> {
        let mut rng = StdRng::from_entropy();
        let picked = self.store.show_random(&mut rng).await;
        self.presenter.render(picked.as_ref());
        picked
    }

    async fn render_categories(&self) {
        let categories = self.store.categories().await;
        let selected = self.store.selected_category().await;
        self.presenter.render_category_options(&categories, &selected);
    }

    async fn publish(&self, quote: &Quote) {
        if let Err(err) = self.reconciler.publish(quote).await {
            self.presenter
                .notify(&format!("Quote kept locally; publishing failed: {err}"));
        }
    }

    async fn watch(&self, interval_secs: Option<u64>, ticks: Option<usize>) {
        let period = match interval_secs {
            Some(0) => {
                self.presenter.notify("--interval-secs must be at least 1");
                return;
            }
            Some(secs) => Duration::from_secs(secs),
            None => self.sync_interval,
        };

        let phases = self.reconciler.watch_phase();
        let handle = self.reconciler.spawn(period);
        self.presenter.notify(&format!(
            "Syncing every {}s; press Ctrl-C to stop.",
            period.as_secs()
        ));

        tokio::select! {
            _ = wait_for_cycles(phases, ticks) => {}
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "app: failed to listen for Ctrl-C");
                }
            }
        }
        handle.stop().await;
    }

    /// Executes one command per input line until EOF or `quit`.
    pub async fn repl<R: AsyncBufRead + Unpin>(&self, input: R) -> Result<()> {
        self.presenter
            .notify("Enter commands (show, add, filter, categories, import, export, last, sync, watch) or quit.");
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let words = match split_words(&line) {
                Ok(words) => words,
                Err(message) => {
                    self.presenter.notify(message);
                    continue;
                }
            };
            match words.first().map(String::as_str) {
                None => continue,
                Some("quit" | "exit") => break,
                Some(_) => {}
            }

            match ReplLine::try_parse_from(&words) {
                Ok(parsed) => self.execute(parsed.command).await?,
                Err(err) => self.presenter.notify(err.render().to_string().trim_end()),
            }
        }
        Ok(())
    }
}

/// Resolves once the sync loop has gone back to idle `ticks` times.
async fn wait_for_cycles(mut phases: watch::Receiver<SyncPhase>, ticks: Option<usize>) {
    let Some(ticks) = ticks else {
        return std::future::pending().await;
    };

    let mut finished = 0;
    while finished < ticks {
        if phases.changed().await.is_err() {
            return;
        }
        if *phases.borrow_and_update() == SyncPhase::Idle {
            finished += 1;
        }
    }
}

/// Splits a line on whitespace, keeping double-quoted runs together.
fn split_words(line: &str) -> Result<Vec<String>, &'static str> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            ch if ch.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            ch => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
