//! In-memory [`VectorIndex`] implementation.
//!
//! Brute-force cosine similarity over all stored fragments behind a
//! `std::sync::RwLock`. Serves as the reference backend for embedded use and
//! as the test substrate; production deployments wrap their own store.
//!
//! Raw cosine lands in `[-1, 1]`; scores are clamped to the `[0, 1]` contract
//! of [`VectorIndex::search`] (anti-correlated vectors are just "unrelated"
//! for retrieval purposes).

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::embedding::cosine_similarity;
use crate::index::{ScoredFragment, VectorIndex};
use crate::models::Fragment;
use crate::strategy::ScopePredicate;

/// In-memory fragment index with predicate pushdown.
pub struct InMemoryIndex {
    fragments: RwLock<Vec<Fragment>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            fragments: RwLock::new(Vec::new()),
        }
    }

    pub fn insert(&self, fragment: Fragment) {
        self.fragments.write().unwrap().push(fragment);
    }

    pub fn insert_all(&self, fragments: impl IntoIterator<Item = Fragment>) {
        self.fragments.write().unwrap().extend(fragments);
    }

    /// Remove every fragment owned by `conversation_id` (persisted or
    /// pending). Mirrors the cascading delete the owning store performs when
    /// a conversation is destroyed.
    pub fn remove_conversation(&self, conversation_id: &str) {
        self.fragments
            .write()
            .unwrap()
            .retain(|f| !f.metadata.owned_by(conversation_id));
    }

    /// Remove every fragment carrying `tag`.
    pub fn remove_collection(&self, tag: &str) {
        self.fragments
            .write()
            .unwrap()
            .retain(|f| !f.metadata.collection_tags.contains(tag));
    }

    /// Apply the pending → persisted transition for `conversation_id`.
    pub fn promote_pending(&self, conversation_id: &str) {
        let mut fragments = self.fragments.write().unwrap();
        for fragment in fragments.iter_mut() {
            if fragment.metadata.pending_conversation_id.as_deref() == Some(conversation_id) {
                fragment.promote_pending();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.read().unwrap().is_empty()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(
        &self,
        query_vec: &[f32],
        candidate_limit: usize,
        predicate: Option<&ScopePredicate>,
    ) -> Result<Vec<ScoredFragment>> {
        let fragments = self.fragments.read().unwrap();
        let mut candidates: Vec<ScoredFragment> = fragments
            .iter()
            .filter(|f| match predicate {
                Some(p) => p.matches(&f.metadata),
                None => true,
            })
            .map(|f| ScoredFragment {
                fragment: f.clone(),
                score: cosine_similarity(query_vec, &f.embedding).clamp(0.0, 1.0),
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(candidate_limit);
        debug!(
            stored = fragments.len(),
            returned = candidates.len(),
            "in-memory index search"
        );
        Ok(candidates)
    }

    fn supports_predicate_pushdown(&self) -> bool {
        true
    }
}
