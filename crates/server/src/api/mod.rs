use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use shared::{
    domain::{Quote, QuoteDraft, QuoteId},
    error::ApiError,
    protocol::PostQuoteRequest,
};
use tracing::info;

/// The server's authoritative quote list.
///
/// Ids come from a counter and are never reused.
#[derive(Debug, Clone)]
pub struct QuoteBook {
    quotes: Vec<Quote>,
    next_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuotesQuery {
    pub category: Option<String>,
}

impl QuoteBook {
    /// Quotes without an id get one from the counter, in order.
    pub fn new(seed: Vec<Quote>) -> Self {
        let next_id = seed
            .iter()
            .filter_map(|quote| quote.id)
            .map(|id| id.0)
            .max()
            .unwrap_or(0)
            + 1;
        let mut book = Self {
            quotes: Vec::with_capacity(seed.len()),
            next_id,
        };
        for mut quote in seed {
            if quote.id.is_none() {
                quote.id = Some(book.issue_id());
            }
            book.quotes.push(quote);
        }
        book
    }

    pub fn seeded() -> Self {
        Self::new(vec![
            Quote::new(
                None,
                "The best way to get started is to quit talking and begin doing.",
                "Motivation",
            ),
            Quote::new(
                None,
                "Simplicity is the soul of efficiency.",
                "Engineering",
            ),
            Quote::new(
                None,
                "In the middle of difficulty lies opportunity.",
                "Inspiration",
            ),
        ])
    }

    fn issue_id(&mut self) -> QuoteId {
        let id = QuoteId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn list(&self, query: &ListQuotesQuery) -> Vec<Quote> {
        match query.category.as_deref() {
            Some(category) => self
                .quotes
                .iter()
                .filter(|quote| quote.category == category)
                .cloned()
                .collect(),
            None => self.quotes.clone(),
        }
    }

    /// Validates and stores a posted quote, replacing any client id.
    pub fn create(&mut self, req: PostQuoteRequest) -> Result<Quote, ApiError> {
        let draft = QuoteDraft::parse(&req.text, &req.category)?;
        let id = self.issue_id();
        let quote = draft.into_quote(Some(id));
        self.quotes.push(quote.clone());
        info!(
            id = id.0,
            client_id = ?req.id.map(|id| id.0),
            "quote stored"
        );
        Ok(quote)
    }
}

pub fn load_seed(path: &Path) -> anyhow::Result<Vec<Quote>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file '{}'", path.display()))?;
    let quotes = serde_json::from_str(&raw)
        .with_context(|| format!("seed file '{}' is not a JSON array of quotes", path.display()))?;
    Ok(quotes)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
