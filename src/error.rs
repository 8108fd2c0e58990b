//! Error taxonomy for the retrieval engine.
//!
//! Only [`SelectError::EmbeddingFailure`] and [`SelectError::InvalidRequest`]
//! ever surface from the public entry point; index trouble and budget
//! exhaustion are recovered inside the tier loop and recorded in the
//! [`SelectionReport`](crate::report::SelectionReport) instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectError {
    /// The query text could not be embedded. Retrieval aborts; the caller
    /// proceeds without augmentation.
    #[error("failed to embed query: {0}")]
    EmbeddingFailure(#[source] anyhow::Error),

    /// The request was malformed at the boundary (empty query text).
    #[error("invalid retrieval request: {0}")]
    InvalidRequest(String),

    /// A tier's index call failed. Recovered per tier, never propagated from
    /// the selector; carried here so index wrappers can classify failures.
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(#[source] anyhow::Error),

    /// The multi-tier time budget ran out. Recovered: the selector returns
    /// the partial report assembled so far.
    #[error("retrieval time budget of {budget_ms}ms exceeded")]
    TimeoutExceeded { budget_ms: u64 },
}
