//! Protocol error types.

use thiserror::Error;

/// Errors raised while building or interpreting the query IR.
#[derive(Debug, Error)]
pub enum Error {
    /// A predicate tree has a shape that cannot be evaluated.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A kind tag that is neither built in nor registered.
    #[error("unknown kind: {0}")]
    UnknownKind(String),
}
