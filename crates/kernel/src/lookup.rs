//! Metadata provider seam: resolves book links and free-text queries.

use async_trait::async_trait;
use thiserror::Error;

use crate::club::Book;

/// Faults raised by a metadata provider. "Not found" is not an error.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not parse provider response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait BookLookup: Send + Sync {
    /// Resolve a canonical book link to a single record.
    async fn lookup(&self, url: &str) -> Result<Option<Book>, LookupError>;

    /// Search by free text; at most a provider-defined number of results.
    async fn search(&self, query: &str) -> Result<Vec<Book>, LookupError>;
}
