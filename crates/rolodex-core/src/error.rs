//! Core error types.

use thiserror::Error;

/// Errors surfaced by the resolver, the assembler and the store.
#[derive(Debug, Error)]
pub enum Error {
    /// The store failed to read rows or apply a batch.
    #[error("store error: {0}")]
    Store(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] rolodex_proto::Error),

    /// A caller-supplied argument was rejected before touching the store.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// A predicate reached a relation it does not belong to.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Config(e.to_string())
    }
}
