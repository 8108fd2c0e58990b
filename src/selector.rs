//! Tiered selection orchestration.
//!
//! Runs the ordered tier plan against the vector index, applying each tier's
//! predicate and threshold client-side, and stops at the first tier (or
//! sweep step) that yields at least one qualifying fragment. Ranking,
//! deduplication, and capping happen here; the index only has to return
//! scored candidates.
//!
//! The selector holds no locks and no per-invocation state: concurrent
//! invocations against one shared index are safe, and a caller enforcing
//! last-request-wins can abort an in-flight invocation cheaply through a
//! [`CancelHandle`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::SelectorConfig;
use crate::embedding::Embedder;
use crate::error::SelectError;
use crate::index::{ScoredFragment, VectorIndex};
use crate::models::RetrievalRequest;
use crate::report::{SelectedFragment, SelectionReport, TierStats};
use crate::strategy::plan_for_request;

/// Cooperative abort flag for an in-flight selection.
///
/// Checked between tiers and sweep steps. Cancelling does not interrupt an
/// index call already in progress; it stops the plan at the next boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The retrieval engine: embeds a query, walks the tier plan, and packages a
/// [`SelectionReport`]. Constructed once and shared; all mutable state lives
/// in the index.
pub struct TieredSelector {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: SelectorConfig,
}

/// Why the tier loop stopped before exhausting the plan.
enum Interrupt {
    BudgetExhausted,
    Cancelled,
}

impl TieredSelector {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        config: SelectorConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select context for a request, embedding the query first.
    ///
    /// Fails only at the boundary: empty query text or an embedding failure.
    /// Everything downstream degrades to a partial or empty report instead
    /// of erroring.
    pub async fn select_context(
        &self,
        request: &RetrievalRequest,
    ) -> Result<SelectionReport, SelectError> {
        self.select_context_with(request, &CancelHandle::new()).await
    }

    /// [`select_context`](Self::select_context) with a caller-owned abort
    /// handle, for last-request-wins supersession.
    pub async fn select_context_with(
        &self,
        request: &RetrievalRequest,
        cancel: &CancelHandle,
    ) -> Result<SelectionReport, SelectError> {
        if request.query_text.trim().is_empty() {
            return Err(SelectError::InvalidRequest(
                "query text must be non-empty".to_string(),
            ));
        }

        let query_vec = self
            .embedder
            .embed(&request.query_text)
            .await
            .map_err(SelectError::EmbeddingFailure)?;

        Ok(self.select_with_vector(request, &query_vec, cancel).await)
    }

    /// Run the tier plan against a pre-embedded query vector. Infallible:
    /// per-tier index failures are logged and recorded, budget exhaustion
    /// and cancellation return whatever was assembled so far.
    pub async fn select_with_vector(
        &self,
        request: &RetrievalRequest,
        query_vec: &[f32],
        cancel: &CancelHandle,
    ) -> SelectionReport {
        let started = Instant::now();
        let budget = self.config.time_budget();
        let limit = request.clamped_limit();
        if request.result_limit == 0 {
            debug!(clamped_to = limit, "result_limit missing or non-positive, clamped");
        }
        let candidate_limit = self.config.candidate_limit(limit);

        let plan = plan_for_request(&self.config, request);
        let mut report = SelectionReport::empty(started.elapsed());
        let mut interrupted: Option<Interrupt> = None;

        for tier in &plan {
            if let Some(cause) = &interrupted {
                let loosest = tier.thresholds.last().copied().unwrap_or(0.0);
                report.tiers.push(TierStats::skipped(tier.name, loosest));
                match cause {
                    Interrupt::BudgetExhausted => report.budget_exhausted = true,
                    Interrupt::Cancelled => report.cancelled = true,
                }
                continue;
            }

            let mut stats =
                TierStats::attempted(tier.name, tier.thresholds.first().copied().unwrap_or(0.0));
            let mut qualifying: Vec<ScoredFragment> = Vec::new();

            'sweep: for &threshold in &tier.thresholds {
                if cancel.is_cancelled() {
                    interrupted = Some(Interrupt::Cancelled);
                    report.cancelled = true;
                    break 'sweep;
                }
                let remaining = budget.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    interrupted = Some(Interrupt::BudgetExhausted);
                    report.budget_exhausted = true;
                    break 'sweep;
                }
                stats.threshold = threshold;

                let searched = tokio::time::timeout(
                    remaining,
                    self.index
                        .search(query_vec, candidate_limit, Some(&tier.predicate)),
                )
                .await;

                let candidates = match searched {
                    Ok(Ok(candidates)) => candidates,
                    Ok(Err(err)) => {
                        // One unavailable tier must not sink the whole search.
                        let err = SelectError::IndexUnavailable(err);
                        warn!(tier = %tier.name, error = %err, "skipping tier");
                        stats.error = Some(err.to_string());
                        break 'sweep;
                    }
                    Err(_) => {
                        let err = SelectError::TimeoutExceeded {
                            budget_ms: self.config.time_budget_ms,
                        };
                        warn!(tier = %tier.name, error = %err, "aborting remaining tiers");
                        stats.error = Some(err.to_string());
                        interrupted = Some(Interrupt::BudgetExhausted);
                        report.budget_exhausted = true;
                        break 'sweep;
                    }
                };

                stats.examined += candidates.len();
                // Re-apply the predicate even when the index claims pushdown;
                // a partially filtering backend must not mis-scope results.
                qualifying = candidates
                    .into_iter()
                    .filter(|c| c.score >= threshold && tier.predicate.matches(&c.fragment.metadata))
                    .collect();
                if !qualifying.is_empty() {
                    break 'sweep;
                }
            }

            // Interrupted before the first index call of this tier: the tier
            // never actually ran, record it like the ones behind it.
            if interrupted.is_some() && stats.examined == 0 && stats.error.is_none() {
                stats.skipped = true;
            }

            if !qualifying.is_empty() {
                rank(&mut qualifying);
                dedup_by_id(&mut qualifying);
                if let Some(cap) = tier.cap {
                    qualifying.truncate(cap);
                }
                qualifying.truncate(limit);

                stats.qualified = qualifying.len();
                debug!(tier = %tier.name, threshold = stats.threshold,
                    examined = stats.examined, qualified = stats.qualified,
                    "tier satisfied request");
                report.satisfied_by_tier = Some(tier.name);
                report.fragments = qualifying
                    .into_iter()
                    .map(|c| SelectedFragment {
                        id: c.fragment.id,
                        text: c.fragment.text,
                        score: c.score,
                        metadata: c.fragment.metadata,
                    })
                    .collect();
                report.tiers.push(stats);
                break;
            }

            debug!(tier = %tier.name, examined = stats.examined, "tier yielded nothing");
            report.tiers.push(stats);
        }

        report.elapsed = started.elapsed();
        report
    }
}

/// Order candidates by score descending, `added_at` descending (most recent
/// first), then id ascending for full determinism.
fn rank(candidates: &mut [ScoredFragment]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.fragment.metadata.added_at.cmp(&a.fragment.metadata.added_at))
            .then(a.fragment.id.cmp(&b.fragment.id))
    });
}

/// Drop repeated ids, keeping the first (highest-ranked) occurrence. Must run
/// after [`rank`] and before capping.
fn dedup_by_id(candidates: &mut Vec<ScoredFragment>) {
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.fragment.id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fragment, FragmentMetadata};
    use chrono::{TimeZone, Utc};

    fn scored(id: &str, score: f32, added_secs: i64) -> ScoredFragment {
        ScoredFragment {
            fragment: Fragment {
                id: id.to_string(),
                embedding: Vec::new(),
                text: String::new(),
                metadata: FragmentMetadata {
                    added_at: Utc.timestamp_opt(added_secs, 0).unwrap(),
                    ..FragmentMetadata::default()
                },
            },
            score,
        }
    }

    #[test]
    fn test_rank_score_descending() {
        let mut candidates = vec![scored("a", 0.2, 0), scored("b", 0.9, 0), scored("c", 0.5, 0)];
        rank(&mut candidates);
        let ids: Vec<&str> = candidates.iter().map(|c| c.fragment.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_ties_break_on_recency_then_id() {
        let mut candidates = vec![
            scored("b", 0.5, 100),
            scored("a", 0.5, 100),
            scored("c", 0.5, 200),
        ];
        rank(&mut candidates);
        let ids: Vec<&str> = candidates.iter().map(|c| c.fragment.id.as_str()).collect();
        // c is most recent; a and b share a timestamp so id ascending decides.
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut candidates = vec![scored("a", 0.9, 0), scored("b", 0.7, 0), scored("a", 0.4, 0)];
        dedup_by_id(&mut candidates);
        assert_eq!(candidates.len(), 2);
        assert!((candidates[0].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_cancel_handle() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
    }
}
