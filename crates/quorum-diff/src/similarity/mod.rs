//! Similarity signals
//!
//! Three independent scores, each in `[0, 1]`:
//! - token: Ratcliff–Obershelp ratio of the token sequences
//! - edit: normalized Levenshtein similarity of the joined token strings
//! - structural: mean per-metric similarity of the fingerprints
//!
//! [`SimilarityScorer`] combines them with [`SimilarityWeights`].

pub mod edit;
pub mod sequence;
pub mod structural;

pub use edit::{edit_similarity, levenshtein};
pub use sequence::{sequence_ratio, MatchingBlock, SequenceMatcher};
pub use structural::{relative_similarity, StructuralComparison};

use crate::config::SimilarityWeights;
use crate::fingerprint::StructuralFingerprint;
use crate::tokens::TokenSequence;
use serde::{Deserialize, Serialize};

/// The three component scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilaritySignals {
    /// Sequence similarity of the token streams
    pub token_similarity: f64,
    /// Inverse edit distance of the joined token strings
    pub edit_similarity: f64,
    /// Fingerprint similarity
    pub structural_similarity: f64,
}

impl SimilaritySignals {
    /// All signals zero (parse failure, one side empty)
    pub const ZERO: Self = Self::uniform(0.0);

    /// All signals one (both sides empty)
    pub const ONE: Self = Self::uniform(1.0);

    const fn uniform(value: f64) -> Self {
        Self {
            token_similarity: value,
            edit_similarity: value,
            structural_similarity: value,
        }
    }
}

/// Signals plus the structural breakdown behind them
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityAssessment {
    /// Component scores
    pub signals: SimilaritySignals,
    /// Per-metric structural similarities
    pub structural: StructuralComparison,
}

/// Computes signals and the weighted composite
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
}

impl SimilarityScorer {
    /// Create scorer with weights
    #[inline]
    #[must_use]
    pub fn new(weights: SimilarityWeights) -> Self {
        Self { weights }
    }

    /// Weights in use
    #[inline]
    #[must_use]
    pub fn weights(&self) -> SimilarityWeights {
        self.weights
    }

    /// Compute the three signals
    #[must_use]
    pub fn score(
        &self,
        fp_a: &StructuralFingerprint,
        fp_b: &StructuralFingerprint,
        tok_a: &TokenSequence,
        tok_b: &TokenSequence,
    ) -> SimilaritySignals {
        self.assess(fp_a, fp_b, tok_a, tok_b).signals
    }

    /// Compute the three signals, keeping the structural breakdown
    #[must_use]
    pub fn assess(
        &self,
        fp_a: &StructuralFingerprint,
        fp_b: &StructuralFingerprint,
        tok_a: &TokenSequence,
        tok_b: &TokenSequence,
    ) -> SimilarityAssessment {
        let structural = structural::compare(fp_a, fp_b);

        let signals = SimilaritySignals {
            token_similarity: sequence_ratio(tok_a.as_slice(), tok_b.as_slice()),
            edit_similarity: edit_similarity(&tok_a.joined(), &tok_b.joined()),
            // No metric had a denominator only when both fingerprints are all-zero
            structural_similarity: structural.score.unwrap_or(1.0),
        };

        SimilarityAssessment {
            signals,
            structural,
        }
    }

    /// Weighted composite, clamped to `[0, 1]`
    ///
    /// The sum is normalized by the total weight, so signals that are all
    /// one score exactly one for any accepted weights.
    #[must_use]
    pub fn composite(&self, signals: &SimilaritySignals) -> f64 {
        let w = &self.weights;
        let total_weight = w.sum();
        if total_weight <= 0.0 || !total_weight.is_finite() {
            return 0.0;
        }

        let total = signals.token_similarity * w.token
            + signals.edit_similarity * w.edit
            + signals.structural_similarity * w.structural;
        (total / total_weight).clamp(0.0, 1.0)
    }
}
