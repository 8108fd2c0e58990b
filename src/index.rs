//! Vector index abstraction.
//!
//! The [`VectorIndex`] trait is the engine's only view of fragment storage.
//! It exposes one primitive — a scored candidate search with an optional
//! scope predicate — and leaves persistence, compaction, and cascading
//! deletes to the owning backend.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Fragment;
use crate::strategy::ScopePredicate;

/// A candidate fragment returned from a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    /// Similarity in `[0.0, 1.0]`. The index need not return candidates in
    /// score order; the selector sorts.
    pub score: f32,
}

/// Abstract similarity-search backend.
///
/// Predicate pushdown is optional. A backend that cannot filter on fragment
/// metadata reports `false` from
/// [`supports_predicate_pushdown`](VectorIndex::supports_predicate_pushdown)
/// and simply ignores the predicate argument; the selector then fetches a
/// superset and filters client-side. The selector re-applies the predicate
/// even when pushdown is claimed, so a partially filtering backend cannot
/// mis-scope results.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `candidate_limit` scored candidates for `query_vec`,
    /// optionally restricted to fragments matching `predicate`.
    async fn search(
        &self,
        query_vec: &[f32],
        candidate_limit: usize,
        predicate: Option<&ScopePredicate>,
    ) -> Result<Vec<ScoredFragment>>;

    /// Whether [`search`](VectorIndex::search) honors the predicate argument.
    fn supports_predicate_pushdown(&self) -> bool {
        false
    }
}
