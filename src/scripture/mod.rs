//! Scripture lookups against third-party verse APIs.

mod books;
mod http;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

pub use books::book_name;
pub use http::HttpScripture;

/// A single verse (or passage) returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseResult {
    /// Human readable reference, e.g. `John 3:16`.
    pub reference: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    pub translation: String,
}

/// Why a lookup produced nothing.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid request url: {0}")]
    Url(#[from] url::ParseError),
    #[error("No results")]
    NotFound,
    #[error("Request timed out")]
    Timeout,
}

/// Somewhere verses come from.
#[async_trait]
pub trait ScriptureSource: Send + Sync {
    /// Look up a reference such as `John 3:16` or `Psalm 23:1-3`.
    async fn lookup(&self, reference: &str) -> Result<VerseResult, LookupError>;

    /// Free-text search. Returns at most `limit` verses, never an empty list.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<VerseResult>, LookupError>;

    /// The verse of the day.
    async fn daily(&self) -> Result<VerseResult, LookupError>;
}
