//! Comparison reports
//!
//! The single output of a comparison. Downstream routing reads
//! `quorum_decision` and `route_to`; exporters read `semantic_distance`.

use crate::artifact::ArtifactRef;
use crate::quorum::{QuorumDecision, Route, Verdict};
use crate::similarity::SimilaritySignals;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Free-form per-comparison diagnostics, ordered by key
pub type Diagnostics = BTreeMap<String, serde_json::Value>;

/// Diagnostic keys
pub mod keys {
    /// Fingerprint of artifact A
    pub const METRICS_A: &str = "metrics_a";
    /// Fingerprint of artifact B
    pub const METRICS_B: &str = "metrics_b";
    /// Token count of artifact A
    pub const TOKEN_COUNT_A: &str = "token_count_a";
    /// Token count of artifact B
    pub const TOKEN_COUNT_B: &str = "token_count_b";
    /// Distinct tokens present in both
    pub const COMMON_TOKENS: &str = "common_tokens";
    /// Distinct tokens only in A
    pub const UNIQUE_TOKENS_A: &str = "unique_tokens_a";
    /// Distinct tokens only in B
    pub const UNIQUE_TOKENS_B: &str = "unique_tokens_b";
    /// Edit similarity signal
    pub const EDIT_SIMILARITY: &str = "edit_similarity";
    /// Per-metric structural similarities
    pub const STRUCTURAL_BREAKDOWN: &str = "structural_breakdown";
    /// Composite weights
    pub const WEIGHTS: &str = "weights";
    /// Diff threshold applied
    pub const THRESHOLD_USED: &str = "threshold_used";
    /// `1 - threshold_used`
    pub const PASS_THRESHOLD: &str = "pass_threshold";
    /// Both artifacts have the same digest
    pub const IDENTICAL_CONTENT: &str = "identical_content";
    /// Labels of artifacts holding no code
    pub const EMPTY_ARTIFACTS: &str = "empty_artifacts";
    /// Failure summary
    pub const ERROR: &str = "error";
    /// Labels of artifacts that failed to parse
    pub const FAILED_ARTIFACTS: &str = "failed_artifacts";
    /// Parse error of artifact A
    pub const PARSE_ERROR_A: &str = "parse_error_a";
    /// Parse error of artifact B
    pub const PARSE_ERROR_B: &str = "parse_error_b";
}

/// Result of comparing two artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// First artifact
    pub artifact_a_ref: ArtifactRef,
    /// Second artifact
    pub artifact_b_ref: ArtifactRef,
    /// Composite similarity in `[0, 1]`
    pub ast_similarity: f64,
    /// Token sequence signal
    pub token_similarity: f64,
    /// Edit distance signal
    pub edit_similarity: f64,
    /// Fingerprint signal
    pub structural_similarity: f64,
    /// `1 - ast_similarity`
    pub semantic_distance: f64,
    /// Pass or fail
    pub quorum_decision: QuorumDecision,
    /// Routing label
    pub route_to: Route,
    /// Per-metric breakdowns and counts
    pub diagnostics: Diagnostics,
    /// Wall time spent comparing
    pub duration: Duration,
    /// Completion time
    pub timestamp: DateTime<Utc>,
}

impl ComparisonReport {
    /// Assemble a report; `semantic_distance` is derived here
    pub(crate) fn new(
        refs: (ArtifactRef, ArtifactRef),
        signals: SimilaritySignals,
        ast_similarity: f64,
        verdict: Verdict,
        diagnostics: Diagnostics,
        duration: Duration,
    ) -> Self {
        Self {
            artifact_a_ref: refs.0,
            artifact_b_ref: refs.1,
            ast_similarity,
            token_similarity: signals.token_similarity,
            edit_similarity: signals.edit_similarity,
            structural_similarity: signals.structural_similarity,
            semantic_distance: 1.0 - ast_similarity,
            quorum_decision: verdict.decision,
            route_to: verdict.route,
            diagnostics,
            duration,
            timestamp: Utc::now(),
        }
    }

    /// True when the pair passed quorum
    #[inline]
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.quorum_decision == QuorumDecision::Pass
    }

    /// True when the pair must be escalated
    #[inline]
    #[must_use]
    pub fn requires_audit(&self) -> bool {
        self.route_to == Route::Audit
    }

    /// Composite similarity as a percentage
    #[inline]
    #[must_use]
    pub fn similarity_percent(&self) -> f64 {
        self.ast_similarity * 100.0
    }

    /// Semantic distance as a percentage
    #[inline]
    #[must_use]
    pub fn semantic_distance_percent(&self) -> f64 {
        self.semantic_distance * 100.0
    }

    /// Component signals
    #[must_use]
    pub fn signals(&self) -> SimilaritySignals {
        SimilaritySignals {
            token_similarity: self.token_similarity,
            edit_similarity: self.edit_similarity,
            structural_similarity: self.structural_similarity,
        }
    }

    /// Diagnostic value by key
    #[inline]
    #[must_use]
    pub fn diagnostic(&self, key: &str) -> Option<&serde_json::Value> {
        self.diagnostics.get(key)
    }

    /// Equal in everything but `duration` and `timestamp`
    #[must_use]
    pub fn same_outcome(&self, other: &Self) -> bool {
        self.artifact_a_ref == other.artifact_a_ref
            && self.artifact_b_ref == other.artifact_b_ref
            && self.ast_similarity.to_bits() == other.ast_similarity.to_bits()
            && self.signals() == other.signals()
            && self.semantic_distance.to_bits() == other.semantic_distance.to_bits()
            && self.quorum_decision == other.quorum_decision
            && self.route_to == other.route_to
            && self.diagnostics == other.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::SourceArtifact;

    fn report(ast_similarity: f64, verdict: Verdict) -> ComparisonReport {
        ComparisonReport::new(
            (
                SourceArtifact::a("x = 1").reference(),
                SourceArtifact::b("x = 2").reference(),
            ),
            SimilaritySignals {
                token_similarity: ast_similarity,
                edit_similarity: ast_similarity,
                structural_similarity: ast_similarity,
            },
            ast_similarity,
            verdict,
            Diagnostics::new(),
            Duration::from_millis(3),
        )
    }

    #[test]
    fn distance_complements_similarity() {
        let r = report(0.75, Verdict::FAIL);
        assert_eq!(r.semantic_distance, 0.25);
        assert_eq!(r.semantic_distance_percent(), 25.0);
        assert_eq!(r.similarity_percent(), 75.0);
    }

    #[test]
    fn helpers_follow_verdict() {
        let pass = report(1.0, Verdict::PASS);
        assert!(pass.is_pass());
        assert!(!pass.requires_audit());

        let fail = report(0.0, Verdict::FAIL);
        assert!(!fail.is_pass());
        assert!(fail.requires_audit());
    }

    #[test]
    fn same_outcome_ignores_timing() {
        let a = report(0.5, Verdict::FAIL);
        let mut b = a.clone();
        b.duration = Duration::from_secs(9);
        b.timestamp = a.timestamp + chrono::Duration::seconds(5);
        assert!(a.same_outcome(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_decision_and_route_lower_case() {
        let json = serde_json::to_value(report(0.0, Verdict::FAIL)).unwrap();
        assert_eq!(json["quorum_decision"], "fail");
        assert_eq!(json["route_to"], "audit");
        assert_eq!(json["artifact_a_ref"]["label"], "A");
    }
}
