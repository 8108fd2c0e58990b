//! Core data types: fragments, their metadata, and retrieval requests.
//!
//! Fragment metadata is a fixed struct with explicit optional fields rather
//! than an open key/value map. The conversation-id / pending-conversation-id
//! pair in particular has caused enough "file not found" defects as loose map
//! keys that both are modeled as typed `Option`s here.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result count used when a request carries no limit or a non-positive one.
pub const DEFAULT_RESULT_LIMIT: usize = 4;

/// Metadata attached to an embedded fragment.
///
/// All fields are optional; a fragment with no conversation association and
/// no tags is reachable only through the unscoped tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentMetadata {
    /// Owning conversation, set once that conversation is durably persisted.
    pub conversation_id: Option<String>,
    /// Owning conversation before persistence completes. May coexist with
    /// `conversation_id` during the transition window.
    pub pending_conversation_id: Option<String>,
    /// User-assigned labels. A fragment with any tag is addressable from any
    /// conversation, not just the one that uploaded it.
    #[serde(default)]
    pub collection_tags: BTreeSet<String>,
    /// Path of the source file this fragment was split from.
    pub source_path: Option<String>,
    /// Ingestion timestamp; breaks score ties (most recent first).
    pub added_at: DateTime<Utc>,
}

impl FragmentMetadata {
    /// True if the fragment belongs to `conversation_id`, through either the
    /// persisted or the pending association.
    pub fn owned_by(&self, conversation_id: &str) -> bool {
        self.conversation_id.as_deref() == Some(conversation_id)
            || self.pending_conversation_id.as_deref() == Some(conversation_id)
    }

    /// True if any of the fragment's tags appears in `tags`.
    pub fn tagged_with_any(&self, tags: &BTreeSet<String>) -> bool {
        !self.collection_tags.is_disjoint(tags)
    }
}

/// An immutable embedded unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Globally unique id, stable across re-ingestion of the same content.
    pub id: String,
    /// Fixed-length embedding vector.
    pub embedding: Vec<f32>,
    /// The fragment's textual content.
    pub text: String,
    pub metadata: FragmentMetadata,
}

impl Fragment {
    /// Build a fragment with a fresh v4 id.
    pub fn new(text: impl Into<String>, embedding: Vec<f32>, metadata: FragmentMetadata) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            embedding,
            text: text.into(),
            metadata,
        }
    }

    /// The one permitted metadata mutation: move the pending conversation
    /// association to the persisted slot once the owning conversation row
    /// exists. No-op when nothing is pending.
    pub fn promote_pending(&mut self) {
        if let Some(id) = self.metadata.pending_conversation_id.take() {
            self.metadata.conversation_id = Some(id);
        }
    }
}

/// Inputs for a single retrieval invocation.
#[derive(Debug, Clone, Default)]
pub struct RetrievalRequest {
    /// The user's query text, embedded by the engine before searching.
    pub query_text: String,
    /// Current session scope, if any.
    pub conversation_id: Option<String>,
    /// Explicit tag addressing. When non-empty the request runs in global
    /// collection mode and `conversation_id` is ignored.
    pub collection_tags: BTreeSet<String>,
    /// Maximum fragments to return. Non-positive values clamp to 1 at
    /// selection time; [`RetrievalRequest::new`] starts from
    /// [`DEFAULT_RESULT_LIMIT`].
    pub result_limit: usize,
}

impl RetrievalRequest {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            result_limit: DEFAULT_RESULT_LIMIT,
            ..Self::default()
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_collection_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collection_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    /// Effective result cap: non-positive (or missing) limits clamp to 1.
    pub fn clamped_limit(&self) -> usize {
        self.result_limit.max(1)
    }
}
