use shared::error::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("invalid file format: expected an array of quotes")]
    ImportNotArray,
    #[error("error importing quotes: {0}")]
    ImportParse(#[source] serde_json::Error),
    #[error("failed to encode quotes: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl QuoteError {
    /// Failures the user caused and can fix; shown as a message rather than logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            QuoteError::Validation(_)
                | QuoteError::UnknownCategory(_)
                | QuoteError::ImportNotArray
                | QuoteError::ImportParse(_)
        )
    }
}
