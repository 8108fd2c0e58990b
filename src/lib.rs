//! # Context Select
//!
//! A tiered fallback context retrieval engine for AI chat tools.
//!
//! Given a user query, the engine decides which previously embedded document
//! fragments to inject as context into a downstream language-model call. It
//! runs an ordered sequence of scoped, thresholded search passes against a
//! pluggable vector index, stopping at the first tier that yields a
//! qualifying fragment, and reports which tier satisfied the request.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────┐   ┌─────────────┐
//! │ Embedder │──▶│ TieredSelector │──▶│ VectorIndex │
//! │ (trait)  │   │  tier plan     │   │  (trait)    │
//! └──────────┘   │  rank/dedup    │   └─────────────┘
//!                └───────┬────────┘
//!                        ▼
//!               SelectionReport
//!               fragments + provenance
//! ```
//!
//! Tag-addressed requests run a single cross-conversation collection pass;
//! everything else falls through conversation → pending → recent-sweep →
//! global → emergency, each tier cheaper in relevance and looser in
//! threshold than the last. The emergency pass guarantees *some* context
//! from a non-empty index, capped to a single fragment.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use anyhow::Result;
//! use async_trait::async_trait;
//! use context_select::{
//!     Embedder, Fragment, FragmentMetadata, InMemoryIndex, RetrievalRequest,
//!     SelectorConfig, TieredSelector,
//! };
//!
//! struct HashEmbedder;
//!
//! #[async_trait]
//! impl Embedder for HashEmbedder {
//!     async fn embed(&self, text: &str) -> Result<Vec<f32>> {
//!         let mut v = vec![0.0f32; 4];
//!         for (i, b) in text.bytes().enumerate() {
//!             v[i % 4] += f32::from(b);
//!         }
//!         Ok(v)
//!     }
//!     fn dims(&self) -> usize {
//!         4
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<()> {
//! let index = Arc::new(InMemoryIndex::new());
//! index.insert(Fragment::new(
//!     "deploy notes",
//!     HashEmbedder.embed("deploy notes").await?,
//!     FragmentMetadata::default(),
//! ));
//!
//! let selector = TieredSelector::new(index, Arc::new(HashEmbedder), SelectorConfig::default());
//! let report = selector.select_context(&RetrievalRequest::new("deploy notes")).await?;
//! assert_eq!(report.fragments.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Fragments, typed metadata, retrieval requests |
//! | [`strategy`] | Scope predicates and the ordered tier plan |
//! | [`selector`] | Orchestration: tier loop, ranking, dedup, budget, abort |
//! | [`report`] | Selection report and per-tier observability |
//! | [`index`] | Vector index trait |
//! | [`memory`] | In-memory reference index |
//! | [`embedding`] | Embedder trait and cosine helper |
//! | [`config`] | Thresholds, candidate sizing, time budget |
//! | [`error`] | Error taxonomy |

pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod memory;
pub mod models;
pub mod report;
pub mod selector;
pub mod strategy;

pub use config::SelectorConfig;
pub use embedding::{cosine_similarity, Embedder};
pub use error::SelectError;
pub use index::{ScoredFragment, VectorIndex};
pub use memory::InMemoryIndex;
pub use models::{Fragment, FragmentMetadata, RetrievalRequest, DEFAULT_RESULT_LIMIT};
pub use report::{SelectedFragment, SelectionReport, TierStats};
pub use selector::{CancelHandle, TieredSelector};
pub use strategy::{plan_for_request, ScopePredicate, TierName, TierStrategy};
