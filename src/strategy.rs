//! Tier strategy definitions: scope predicates, tier names, and the ordered
//! fallback plan.
//!
//! A tier is pure data — a name, a metadata predicate, and a threshold sweep.
//! The selector evaluates the plan with a single loop and early exit, so
//! adding or reordering tiers is a data change here, not a control-flow
//! rewrite in the orchestrator.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::SelectorConfig;
use crate::models::{FragmentMetadata, RetrievalRequest};

/// The metadata condition restricting which fragments a tier may consider.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopePredicate {
    /// Persisted or pending association with this conversation.
    Conversation { id: String },
    /// Pending association only. Catches fragments mid-persistence when the
    /// owning conversation row is not yet durably linked.
    PendingConversation { id: String },
    /// Non-empty intersection with these tags; cross-conversation by design.
    CollectionTags { tags: BTreeSet<String> },
    /// No filter — the whole index.
    Any,
}

impl ScopePredicate {
    /// Evaluate the predicate against a fragment's metadata. Pure; testable
    /// without any index.
    pub fn matches(&self, metadata: &FragmentMetadata) -> bool {
        match self {
            Self::Conversation { id } => metadata.owned_by(id),
            Self::PendingConversation { id } => {
                metadata.pending_conversation_id.as_deref() == Some(id.as_str())
            }
            Self::CollectionTags { tags } => metadata.tagged_with_any(tags),
            Self::Any => true,
        }
    }
}

/// Stable identifier for each tier, used for provenance attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierName {
    Conversation,
    Pending,
    Recent,
    Global,
    Emergency,
    Collection,
}

impl TierName {
    /// Lowercase label exposed in `satisfied_by_tier` and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Pending => "pending",
            Self::Recent => "recent",
            Self::Global => "global",
            Self::Emergency => "emergency",
            Self::Collection => "collection",
        }
    }
}

impl std::fmt::Display for TierName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scoped, thresholded search pass in the fallback sequence.
#[derive(Debug, Clone)]
pub struct TierStrategy {
    pub name: TierName,
    pub predicate: ScopePredicate,
    /// Threshold sweep, tried in order; the first value yielding a non-empty
    /// qualifying set wins. Single-element for non-sweeping tiers.
    pub thresholds: Vec<f32>,
    /// Tier-local result cap applied before the request limit. The emergency
    /// tier uses this to return at most one fragment.
    pub cap: Option<usize>,
}

impl TierStrategy {
    fn single(name: TierName, predicate: ScopePredicate, threshold: f32) -> Self {
        Self {
            name,
            predicate,
            thresholds: vec![threshold],
            cap: None,
        }
    }

    /// Filter a synthetic candidate list the way the selector would: keep
    /// candidates matching the predicate and scoring at or above `threshold`.
    pub fn qualify<'a>(
        &self,
        candidates: &'a [(FragmentMetadata, f32)],
        threshold: f32,
    ) -> Vec<&'a (FragmentMetadata, f32)> {
        candidates
            .iter()
            .filter(|(meta, score)| *score >= threshold && self.predicate.matches(meta))
            .collect()
    }
}

/// Build the ordered tier plan for a request.
///
/// Tag-addressed requests get exactly one collection-scoped pass: tagged
/// corpora must be reachable from any conversation, so no conversation
/// scoping applies even when the request carries a conversation id.
/// Everything else gets the progressive fallback sequence; the two
/// conversation-scoped tiers are only planned when there is a conversation
/// to scope to.
pub fn plan_for_request(config: &SelectorConfig, request: &RetrievalRequest) -> Vec<TierStrategy> {
    if !request.collection_tags.is_empty() {
        return vec![TierStrategy::single(
            TierName::Collection,
            ScopePredicate::CollectionTags {
                tags: request.collection_tags.clone(),
            },
            config.collection_threshold,
        )];
    }

    let mut plan = Vec::with_capacity(5);
    if let Some(id) = &request.conversation_id {
        plan.push(TierStrategy::single(
            TierName::Conversation,
            ScopePredicate::Conversation { id: id.clone() },
            config.conversation_threshold,
        ));
        plan.push(TierStrategy::single(
            TierName::Pending,
            ScopePredicate::PendingConversation { id: id.clone() },
            config.conversation_threshold,
        ));
    }
    plan.push(TierStrategy {
        name: TierName::Recent,
        predicate: ScopePredicate::Any,
        thresholds: config.recent_sweep.clone(),
        cap: None,
    });
    plan.push(TierStrategy::single(
        TierName::Global,
        ScopePredicate::Any,
        config.global_threshold,
    ));
    plan.push(TierStrategy {
        name: TierName::Emergency,
        predicate: ScopePredicate::Any,
        thresholds: vec![config.emergency_threshold],
        cap: Some(1),
    });
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(conversation: Option<&str>, pending: Option<&str>, tags: &[&str]) -> FragmentMetadata {
        FragmentMetadata {
            conversation_id: conversation.map(String::from),
            pending_conversation_id: pending.map(String::from),
            collection_tags: tags.iter().map(|t| t.to_string()).collect(),
            source_path: None,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_conversation_predicate_matches_either_slot() {
        let pred = ScopePredicate::Conversation { id: "a".into() };
        assert!(pred.matches(&meta(Some("a"), None, &[])));
        assert!(pred.matches(&meta(None, Some("a"), &[])));
        assert!(!pred.matches(&meta(Some("b"), Some("c"), &[])));
    }

    #[test]
    fn test_pending_predicate_ignores_persisted_slot() {
        let pred = ScopePredicate::PendingConversation { id: "a".into() };
        assert!(pred.matches(&meta(None, Some("a"), &[])));
        assert!(!pred.matches(&meta(Some("a"), None, &[])));
    }

    #[test]
    fn test_collection_predicate_intersects() {
        let pred = ScopePredicate::CollectionTags {
            tags: ["docs".to_string()].into(),
        };
        assert!(pred.matches(&meta(Some("b"), None, &["docs", "misc"])));
        assert!(!pred.matches(&meta(Some("b"), None, &["misc"])));
        assert!(!pred.matches(&meta(Some("b"), None, &[])));
    }

    #[test]
    fn test_qualify_applies_threshold_and_predicate() {
        let tier = TierStrategy::single(
            TierName::Conversation,
            ScopePredicate::Conversation { id: "a".into() },
            0.25,
        );
        let candidates = vec![
            (meta(Some("a"), None, &[]), 0.9),
            (meta(Some("a"), None, &[]), 0.1), // below threshold
            (meta(Some("b"), None, &[]), 0.9), // wrong scope
        ];
        let qualifying = tier.qualify(&candidates, 0.25);
        assert_eq!(qualifying.len(), 1);
        assert!((qualifying[0].1 - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_plan_collection_mode_is_single_tier() {
        let config = SelectorConfig::default();
        let request = RetrievalRequest::new("q")
            .with_conversation("conv-a")
            .with_collection_tags(["docs"]);
        let plan = plan_for_request(&config, &request);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].name, TierName::Collection);
        // Conversation scoping must not leak into collection mode.
        assert!(matches!(
            plan[0].predicate,
            ScopePredicate::CollectionTags { .. }
        ));
    }

    #[test]
    fn test_plan_full_fallback_sequence() {
        let config = SelectorConfig::default();
        let request = RetrievalRequest::new("q").with_conversation("conv-a");
        let names: Vec<TierName> = plan_for_request(&config, &request)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            names,
            vec![
                TierName::Conversation,
                TierName::Pending,
                TierName::Recent,
                TierName::Global,
                TierName::Emergency,
            ]
        );
    }

    #[test]
    fn test_plan_without_conversation_skips_scoped_tiers() {
        let config = SelectorConfig::default();
        let request = RetrievalRequest::new("q");
        let names: Vec<TierName> = plan_for_request(&config, &request)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            names,
            vec![TierName::Recent, TierName::Global, TierName::Emergency]
        );
    }

    #[test]
    fn test_recent_sweep_is_strict_first() {
        let config = SelectorConfig::default();
        let request = RetrievalRequest::new("q");
        let plan = plan_for_request(&config, &request);
        let recent = plan.iter().find(|t| t.name == TierName::Recent).unwrap();
        let mut sorted = recent.thresholds.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(recent.thresholds, sorted, "sweep must go strict to loose");
    }

    #[test]
    fn test_emergency_caps_at_one() {
        let config = SelectorConfig::default();
        let plan = plan_for_request(&config, &RetrievalRequest::new("q"));
        let emergency = plan.iter().find(|t| t.name == TierName::Emergency).unwrap();
        assert_eq!(emergency.cap, Some(1));
    }
}
