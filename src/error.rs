//! Errors surfaced by the store, the query builder and the executor.
//!
//! Builder-time problems (`InvalidParameter`) are returned from the chain
//! method that received the bad value, so a malformed query never compiles.
//! Execution problems come back from `fetch` / `search` as typed failures.
//!
//! Two situations are deliberately *not* errors: sorting on a field no
//! document has (the key is a no-op) and a `skip` past the end of the result
//! (the result is empty).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Invalid query parameter: {0}")]
    InvalidParameter(String),
    #[error("Cannot load snapshot: {0}")]
    LoadFailure(String),
    #[error("Text query issued but no search index is configured")]
    IndexUnavailable,
}

impl ContentError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub(crate) fn load(message: impl std::fmt::Display) -> Self {
        Self::LoadFailure(message.to_string())
    }
}
