use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Quote,
    protocol::{PostQuoteRequest, QUOTES_PATH},
};
use url::Url;

/// The remote source of truth for quotes.
#[async_trait]
pub trait QuoteRemote: Send + Sync {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>>;
    /// Publishes `quote`; the returned copy carries the remote-assigned id.
    async fn post_quote(&self, quote: &Quote) -> Result<Quote>;
}

pub struct MissingQuoteRemote;

#[async_trait]
impl QuoteRemote for MissingQuoteRemote {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>> {
        Err(anyhow!("quote server is not configured"))
    }

    async fn post_quote(&self, _quote: &Quote) -> Result<Quote> {
        Err(anyhow!("quote server is not configured"))
    }
}

pub struct HttpQuoteRemote {
    http: Client,
    quotes_url: Url,
}

impl HttpQuoteRemote {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        let mut base = Url::parse(server_url)
            .with_context(|| format!("invalid quote server url '{server_url}'"))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(anyhow!("server_url must start with http:// or https://"));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let quotes_url = base
            .join(QUOTES_PATH.trim_start_matches('/'))
            .with_context(|| format!("failed to build quotes url from '{server_url}'"))?;
        Ok(Self { http, quotes_url })
    }

    pub fn quotes_url(&self) -> &Url {
        &self.quotes_url
    }
}

#[async_trait]
impl QuoteRemote for HttpQuoteRemote {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>> {
        let quotes = self
            .http
            .get(self.quotes_url.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.quotes_url))?
            .error_for_status()?
            .json::<Vec<Quote>>()
            .await
            .context("quote server returned an invalid quote list")?;
        Ok(quotes)
    }

    async fn post_quote(&self, quote: &Quote) -> Result<Quote> {
        let stored = self
            .http
            .post(self.quotes_url.clone())
            .json(&PostQuoteRequest {
                id: quote.id,
                text: quote.text.clone(),
                category: quote.category.clone(),
            })
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.quotes_url))?
            .error_for_status()?
            .json::<Quote>()
            .await
            .context("quote server returned an invalid quote")?;
        Ok(stored)
    }
}
