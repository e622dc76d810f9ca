use serde::{Deserialize, Serialize};

use crate::domain::QuoteId;

/// Body of `POST /quotes`.
///
/// A client-generated `id` may be present; the server always replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostQuoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuoteId>,
    pub text: String,
    pub category: String,
}

pub const QUOTES_PATH: &str = "/quotes";
pub const HEALTHZ_PATH: &str = "/healthz";
