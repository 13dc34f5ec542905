use std::fmt::Display;

use thiserror::Error;

/// Key-value layer failure (quota exceeded, backend corruption, ...).
///
/// Non-fatal by design: a failed write leaves the in-memory document ahead
/// of storage; the caller decides whether to retry or warn.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn backend(err: impl Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Domain-rule violation. The attempted mutation is rejected before any
/// state is assigned; the document is left exactly as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

/// Failure installing an externally supplied snapshot.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("malformed import payload: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Umbrella for store operations that can fail either on a domain rule or
/// on the write-through persistence step.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
