//! Selection report: ranked fragments plus tier provenance.
//!
//! The per-tier counters exist so logs can explain *why* a tier did or did
//! not fire — the first question asked when a "this file isn't found" report
//! comes in.

use std::time::Duration;

use serde::Serialize;

use crate::models::FragmentMetadata;
use crate::strategy::TierName;

/// One ranked fragment in a report.
#[derive(Debug, Clone, Serialize)]
pub struct SelectedFragment {
    pub id: String,
    pub text: String,
    /// Similarity score in `[0.0, 1.0]`.
    pub score: f32,
    pub metadata: FragmentMetadata,
}

/// Observability record for a single tier attempt.
///
/// Sweep steps fold into one entry for their tier; `threshold` records the
/// step that satisfied the tier, or the loosest step tried.
#[derive(Debug, Clone, Serialize)]
pub struct TierStats {
    pub tier: TierName,
    /// Candidates returned by the index for this tier.
    pub examined: usize,
    /// Candidates surviving predicate and threshold.
    pub qualified: usize,
    pub threshold: f32,
    /// Index failure recovered on this tier, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when the tier was never attempted (budget exhausted or request
    /// cancelled first).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl TierStats {
    pub(crate) fn attempted(tier: TierName, threshold: f32) -> Self {
        Self {
            tier,
            examined: 0,
            qualified: 0,
            threshold,
            error: None,
            skipped: false,
        }
    }

    pub(crate) fn skipped(tier: TierName, threshold: f32) -> Self {
        Self {
            skipped: true,
            ..Self::attempted(tier, threshold)
        }
    }
}

/// The engine's output: ranked, deduplicated, capped fragments plus the
/// provenance of which tier satisfied the request.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    /// Ranked by score descending, then `added_at` descending, then id
    /// ascending.
    pub fragments: Vec<SelectedFragment>,
    /// `None` when no tier produced a qualifying fragment — a valid,
    /// non-error outcome.
    pub satisfied_by_tier: Option<TierName>,
    /// One entry per planned tier, in plan order.
    pub tiers: Vec<TierStats>,
    /// Wall-clock duration of the whole selection.
    pub elapsed: Duration,
    /// The time budget ran out before the plan finished.
    pub budget_exhausted: bool,
    /// The caller aborted the request before the plan finished.
    pub cancelled: bool,
}

impl SelectionReport {
    /// An empty report for requests that never reached the tier loop.
    pub fn empty(elapsed: Duration) -> Self {
        Self {
            fragments: Vec::new(),
            satisfied_by_tier: None,
            tiers: Vec::new(),
            elapsed,
            budget_exhausted: false,
            cancelled: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Stable attribution label: the satisfying tier's name, or `"none"`.
    /// Suitable for UI source attribution ("source: collection").
    pub fn satisfied_label(&self) -> &'static str {
        self.satisfied_by_tier.map_or("none", TierName::as_str)
    }

    /// Total candidates examined across all tiers.
    pub fn examined_total(&self) -> usize {
        self.tiers.iter().map(|t| t.examined).sum()
    }
}
