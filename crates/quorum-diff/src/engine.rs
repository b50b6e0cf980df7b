//! Diff engine
//!
//! Orchestrates parse → fingerprint → tokenize → score → decide for a pair
//! of artifacts. Edge policies are handled explicitly, in order:
//! 1. blank text on both sides passes with similarity 1.0, on one side fails
//! 2. a parse failure on either side fails with similarity 0.0
//! 3. the same emptiness policy again for modules without statements
//!
//! The engine holds only immutable configuration, so one instance can serve
//! any number of threads.

use crate::artifact::{ArtifactLabel, ArtifactRef, SourceArtifact};
use crate::config::DiffConfig;
use crate::error::{ConfigError, ParseError};
use crate::fingerprint::StructuralFingerprint;
use crate::parser::{ParsedTree, PythonParser, SourceParser};
use crate::quorum::{QuorumDecider, Verdict};
use crate::report::{keys, ComparisonReport, Diagnostics};
use crate::similarity::{SimilarityScorer, SimilaritySignals};
use crate::tokens::TokenSequence;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Which sides of a pair hold no code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emptiness {
    Both,
    One(ArtifactLabel),
}

impl Emptiness {
    fn detect(a_empty: bool, b_empty: bool) -> Option<Self> {
        match (a_empty, b_empty) {
            (true, true) => Some(Emptiness::Both),
            (true, false) => Some(Emptiness::One(ArtifactLabel::A)),
            (false, true) => Some(Emptiness::One(ArtifactLabel::B)),
            (false, false) => None,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Semantic diff engine
#[derive(Debug, Clone)]
pub struct DiffEngine<P = PythonParser> {
    config: DiffConfig,
    decider: QuorumDecider,
    scorer: SimilarityScorer,
    parser: P,
}

impl DiffEngine<PythonParser> {
    /// Create engine with the Python parser
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the configuration is invalid.
    pub fn new(config: DiffConfig) -> Result<Self, ConfigError> {
        Self::with_parser(config, PythonParser::new())
    }
}

impl Default for DiffEngine<PythonParser> {
    fn default() -> Self {
        let config = DiffConfig::default();
        Self {
            decider: QuorumDecider::default(),
            scorer: SimilarityScorer::new(config.weights),
            parser: PythonParser::new(),
            config,
        }
    }
}

impl<P: SourceParser> DiffEngine<P> {
    /// Create engine with a custom parser
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the configuration is invalid.
    pub fn with_parser(config: DiffConfig, parser: P) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            decider: QuorumDecider::new(config.diff_threshold)?,
            scorer: SimilarityScorer::new(config.weights),
            parser,
            config,
        })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Parser in use
    #[inline]
    #[must_use]
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Compare two artifacts
    #[must_use]
    pub fn compare(&self, a: &SourceArtifact, b: &SourceArtifact) -> ComparisonReport {
        let started = Instant::now();
        let refs = (a.reference(), b.reference());
        tracing::info!("Comparing {} against {}", refs.0, refs.1);

        let mut diagnostics = self.base_diagnostics(&refs);

        if let Some(emptiness) = Emptiness::detect(a.is_blank(), b.is_blank()) {
            return self.finish_empty(refs, emptiness, diagnostics, started);
        }

        let (tree_a, tree_b) = match (self.parser.parse(a.content()), self.parser.parse(b.content())) {
            (Ok(tree_a), Ok(tree_b)) => (tree_a, tree_b),
            (result_a, result_b) => {
                return self.finish_parse_failure(
                    refs,
                    result_a.err(),
                    result_b.err(),
                    diagnostics,
                    started,
                );
            }
        };

        if let Some(emptiness) = Emptiness::detect(tree_a.is_empty(), tree_b.is_empty()) {
            return self.finish_empty(refs, emptiness, diagnostics, started);
        }

        let (signals, ast_similarity) = self.score(&tree_a, &tree_b, &mut diagnostics);
        let verdict = self.decider.decide(ast_similarity);

        self.finish(refs, signals, ast_similarity, verdict, diagnostics, started)
    }

    /// Compare many pairs in parallel, preserving input order
    #[must_use]
    pub fn compare_many(&self, pairs: &[(SourceArtifact, SourceArtifact)]) -> Vec<ComparisonReport> {
        tracing::debug!("Comparing {} pairs", pairs.len());
        pairs.par_iter().map(|(a, b)| self.compare(a, b)).collect()
    }

    fn base_diagnostics(&self, refs: &(ArtifactRef, ArtifactRef)) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        diagnostics.insert(
            keys::THRESHOLD_USED.to_string(),
            Value::from(self.decider.diff_threshold()),
        );
        diagnostics.insert(
            keys::PASS_THRESHOLD.to_string(),
            Value::from(self.decider.pass_threshold()),
        );
        diagnostics.insert(keys::WEIGHTS.to_string(), to_json(&self.scorer.weights()));
        diagnostics.insert(
            keys::IDENTICAL_CONTENT.to_string(),
            Value::from(refs.0.digest == refs.1.digest),
        );
        diagnostics
    }

    fn score(
        &self,
        tree_a: &ParsedTree,
        tree_b: &ParsedTree,
        diagnostics: &mut Diagnostics,
    ) -> (SimilaritySignals, f64) {
        let fp_a = StructuralFingerprint::extract(tree_a);
        let fp_b = StructuralFingerprint::extract(tree_b);
        let tok_a = TokenSequence::tokenize(tree_a);
        let tok_b = TokenSequence::tokenize(tree_b);

        let assessment = self.scorer.assess(&fp_a, &fp_b, &tok_a, &tok_b);
        let signals = assessment.signals;
        let ast_similarity = self.scorer.composite(&signals);

        tracing::debug!(
            "Signals: token={:.4} edit={:.4} structural={:.4}",
            signals.token_similarity,
            signals.edit_similarity,
            signals.structural_similarity
        );

        let distinct_a = tok_a.distinct();
        let distinct_b = tok_b.distinct();
        let common = distinct_a.intersection(&distinct_b).count();

        let mut insert = |key: &str, value: Value| {
            diagnostics.insert(key.to_string(), value);
        };
        insert(keys::METRICS_A, to_json(&fp_a));
        insert(keys::METRICS_B, to_json(&fp_b));
        insert(keys::TOKEN_COUNT_A, Value::from(tok_a.len()));
        insert(keys::TOKEN_COUNT_B, Value::from(tok_b.len()));
        insert(keys::COMMON_TOKENS, Value::from(common));
        insert(keys::UNIQUE_TOKENS_A, Value::from(distinct_a.len() - common));
        insert(keys::UNIQUE_TOKENS_B, Value::from(distinct_b.len() - common));
        insert(keys::EDIT_SIMILARITY, Value::from(signals.edit_similarity));
        insert(
            keys::STRUCTURAL_BREAKDOWN,
            to_json(&assessment.structural.breakdown),
        );

        (signals, ast_similarity)
    }

    fn finish_empty(
        &self,
        refs: (ArtifactRef, ArtifactRef),
        emptiness: Emptiness,
        mut diagnostics: Diagnostics,
        started: Instant,
    ) -> ComparisonReport {
        let (labels, signals, ast_similarity, verdict) = match emptiness {
            Emptiness::Both => (
                vec![ArtifactLabel::A, ArtifactLabel::B],
                SimilaritySignals::ONE,
                1.0,
                Verdict::PASS,
            ),
            Emptiness::One(label) => {
                tracing::warn!("Artifact {} is empty", label);
                diagnostics.insert(
                    keys::ERROR.to_string(),
                    Value::from(format!("artifact {label} is empty")),
                );
                (vec![label], SimilaritySignals::ZERO, 0.0, Verdict::FAIL)
            }
        };
        diagnostics.insert(keys::EMPTY_ARTIFACTS.to_string(), to_json(&labels));

        self.finish(refs, signals, ast_similarity, verdict, diagnostics, started)
    }

    fn finish_parse_failure(
        &self,
        refs: (ArtifactRef, ArtifactRef),
        error_a: Option<ParseError>,
        error_b: Option<ParseError>,
        mut diagnostics: Diagnostics,
        started: Instant,
    ) -> ComparisonReport {
        let mut failed = Vec::new();
        for (label, key, error) in [
            (ArtifactLabel::A, keys::PARSE_ERROR_A, error_a),
            (ArtifactLabel::B, keys::PARSE_ERROR_B, error_b),
        ] {
            if let Some(error) = error {
                tracing::warn!("Artifact {} failed to parse: {}", label, error);
                diagnostics.insert(key.to_string(), Value::from(error.to_string()));
                failed.push(label);
            }
        }

        diagnostics.insert(keys::ERROR.to_string(), Value::from("parse failure"));
        diagnostics.insert(keys::FAILED_ARTIFACTS.to_string(), to_json(&failed));

        self.finish(
            refs,
            SimilaritySignals::ZERO,
            0.0,
            Verdict::FAIL,
            diagnostics,
            started,
        )
    }

    fn finish(
        &self,
        refs: (ArtifactRef, ArtifactRef),
        signals: SimilaritySignals,
        ast_similarity: f64,
        verdict: Verdict,
        diagnostics: Diagnostics,
        started: Instant,
    ) -> ComparisonReport {
        let report = ComparisonReport::new(
            refs,
            signals,
            ast_similarity,
            verdict,
            diagnostics,
            started.elapsed(),
        );

        tracing::info!(
            "Comparison completed: {:.2}% similar, decision={}, route={}",
            report.similarity_percent(),
            report.quorum_decision,
            report.route_to
        );
        report
    }
}

/// Compare two artifacts with a one-off engine
///
/// # Errors
/// Returns [`ConfigError`] before any work when `config` is invalid.
pub fn compare(
    a: &SourceArtifact,
    b: &SourceArtifact,
    config: &DiffConfig,
) -> Result<ComparisonReport, ConfigError> {
    Ok(DiffEngine::new(*config)?.compare(a, b))
}
