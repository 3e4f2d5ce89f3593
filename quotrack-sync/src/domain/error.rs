use thiserror::Error;

/// Errors a quote backend can report to the sync engine.
#[derive(Debug, Error)]
pub enum QuoteServiceError {
    #[error("record not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    Remote(String),
}

impl QuoteServiceError {
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}
