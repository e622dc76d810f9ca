use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(QuoteId);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single quote record.
///
/// `id` is the merge identity. Quotes without one are never deduplicated
/// against remote quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuoteId>,
    pub text: String,
    pub category: String,
}

impl Quote {
    pub fn new(id: Option<QuoteId>, text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            category: category.into(),
        }
    }

    pub fn with_id(id: i64, text: impl Into<String>, category: impl Into<String>) -> Self {
        Self::new(Some(QuoteId(id)), text, category)
    }
}

/// Trimmed, validated text and category for a quote that has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDraft {
    text: String,
    category: String,
}

impl QuoteDraft {
    pub fn parse(text: &str, category: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let category = category.trim();
        if category.is_empty() {
            return Err(ValidationError::EmptyCategory);
        }
        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn into_quote(self, id: Option<QuoteId>) -> Quote {
        Quote {
            id,
            text: self.text,
            category: self.category,
        }
    }
}

pub const ALL_CATEGORIES: &str = "all";

/// Which quotes are eligible for random selection.
///
/// Persists as a plain string: `all` or the category name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => quote.category == *category,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(category) => category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CategoryFilter {
    fn from(raw: &str) -> Self {
        if raw == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(raw.to_string())
        }
    }
}

/// Seeded into an empty or unreadable quote list.
pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            None,
            "The only limit to our realization of tomorrow is our doubts of today.",
            "Inspiration",
        ),
        Quote::new(
            None,
            "Act as if what you do makes a difference. It does.",
            "Motivation",
        ),
    ]
}
