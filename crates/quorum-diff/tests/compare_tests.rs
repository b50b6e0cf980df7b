//! End-to-end comparison tests
//!
//! Pass/fail scenarios for the dual-render gate.

use pretty_assertions::assert_eq;
use quorum_diff::report::keys;
use quorum_diff::{
    compare, DiffConfig, DiffEngine, QuorumDecision, Route, SimilarityWeights, SourceArtifact,
};
use quorum_test_utils::*;

#[test]
fn test_identical_files_pass() {
    init_tracing();
    let engine = default_engine();
    let report = engine.compare(&SourceArtifact::a(GREETER), &SourceArtifact::b(GREETER));

    assert_eq!(report.ast_similarity, 1.0);
    assert_eq!(report.semantic_distance, 0.0);
    assert_eq!(report.quorum_decision, QuorumDecision::Pass);
    assert_eq!(report.route_to, Route::None);
    assert_eq!(
        report.diagnostic(keys::IDENTICAL_CONTENT),
        Some(&serde_json::Value::from(true))
    );
}

#[test]
fn test_typed_program_identity_passes() {
    init_tracing();
    let report = default_engine().compare(&SourceArtifact::a(TYPED), &SourceArtifact::b(TYPED));

    assert!(report.diagnostic(keys::ERROR).is_none(), "{:?}", report.diagnostics);
    assert_eq!(report.ast_similarity, 1.0);
    assert_eq!(report.quorum_decision, QuorumDecision::Pass);
}

#[test]
fn test_annotation_change_is_detected() {
    let (a, b) = artifacts(
        "def total(xs: list[int]) -> int:\n    return sum(xs)\n",
        "def total(xs: dict[str, int]) -> int:\n    return sum(xs)\n",
    );
    let report = default_engine().compare(&a, &b);

    assert!(report.diagnostic(keys::ERROR).is_none());
    assert!(report.ast_similarity > 0.5 && report.ast_similarity < 1.0);
}

#[test]
fn test_identity_is_exact_under_uneven_weights() {
    let config = DiffConfig::new()
        .with_threshold(1e-6)
        .with_weights(SimilarityWeights::new(0.6, 0.3, 0.1));
    let engine = DiffEngine::new(config).unwrap();
    let report = engine.compare(&SourceArtifact::a(GREETER), &SourceArtifact::b(GREETER));

    assert_eq!(report.ast_similarity, 1.0);
    assert_eq!(report.quorum_decision, QuorumDecision::Pass);
}

#[test]
fn test_deep_nesting_fails_closed() {
    init_tracing();
    let engine = default_engine();

    for terms in [3_000, 10_000] {
        let source = addition_chain(terms);
        let (a, b) = artifacts(&source, &source);
        let report = engine.compare(&a, &b);

        assert_eq!(report.ast_similarity, 0.0);
        assert_eq!(report.quorum_decision, QuorumDecision::Fail);
        assert_eq!(report.route_to, Route::Audit);
        let reason = report
            .diagnostic(keys::PARSE_ERROR_A)
            .and_then(|v| v.as_str())
            .unwrap();
        assert!(reason.contains("nesting deeper"), "reason: {reason}");
    }
}

#[test]
fn test_moderate_nesting_compares_normally() {
    let source = addition_chain(150);
    let (a, b) = artifacts(&source, &source);
    let report = default_engine().compare(&a, &b);

    assert_eq!(report.ast_similarity, 1.0);
    assert!(report.is_pass());
}

#[test]
fn test_python2_operator_fails_closed() {
    let (a, b) = artifacts("ok = a != b\n", "ok = a <> b\n");
    let report = default_engine().compare(&a, &b);

    assert_eq!(report.quorum_decision, QuorumDecision::Fail);
    assert_eq!(
        report.diagnostic(keys::FAILED_ARTIFACTS),
        Some(&serde_json::json!(["B"]))
    );
}

#[test]
fn test_cosmetic_changes_pass() {
    init_tracing();
    let engine = default_engine();

    for pair in COSMETIC_PAIRS {
        let (a, b) = pair.artifacts();
        let report = engine.compare(&a, &b);
        assert!(
            report.ast_similarity >= 0.97,
            "{}: similarity {}",
            pair.name,
            report.ast_similarity
        );
        assert_eq!(report.quorum_decision, QuorumDecision::Pass, "{}", pair.name);
        assert_eq!(report.route_to, Route::None, "{}", pair.name);
    }
}

#[test]
fn test_divergent_algorithms_fail() {
    init_tracing();
    let engine = default_engine();
    let pass_threshold = engine.config().pass_threshold();

    for pair in DIVERGENT_PAIRS {
        let (a, b) = pair.artifacts();
        let report = engine.compare(&a, &b);
        assert!(
            report.ast_similarity < pass_threshold,
            "{}: similarity {}",
            pair.name,
            report.ast_similarity
        );
        assert_eq!(report.quorum_decision, QuorumDecision::Fail, "{}", pair.name);
        assert_eq!(report.route_to, Route::Audit, "{}", pair.name);
        assert!(report.requires_audit());
    }
}

#[test]
fn test_syntax_error_fails_closed() {
    init_tracing();
    let (a, b) = SYNTAX_ERROR.artifacts();
    let report = default_engine().compare(&a, &b);

    assert_eq!(report.ast_similarity, 0.0);
    assert_eq!(report.token_similarity, 0.0);
    assert_eq!(report.edit_similarity, 0.0);
    assert_eq!(report.structural_similarity, 0.0);
    assert_eq!(report.quorum_decision, QuorumDecision::Fail);
    assert_eq!(report.route_to, Route::Audit);
    assert_eq!(
        report.diagnostic(keys::FAILED_ARTIFACTS),
        Some(&serde_json::json!(["B"]))
    );
    assert!(report.diagnostic(keys::PARSE_ERROR_A).is_none());

    let reason = report
        .diagnostic(keys::PARSE_ERROR_B)
        .and_then(|v| v.as_str())
        .unwrap();
    assert!(reason.contains("syntax error"), "reason: {reason}");
}

#[test]
fn test_short_syntax_error_against_valid() {
    let (a, b) = artifacts("def f(:", "def f(): pass");
    let report = default_engine().compare(&a, &b);

    assert_eq!(report.ast_similarity, 0.0);
    assert_eq!(report.quorum_decision, QuorumDecision::Fail);
    assert_eq!(report.route_to, Route::Audit);
}

#[test]
fn test_both_empty_pass() {
    let (a, b) = artifacts("", "");
    let report = default_engine().compare(&a, &b);

    assert_eq!(report.ast_similarity, 1.0);
    assert_eq!(report.quorum_decision, QuorumDecision::Pass);
    assert_eq!(report.route_to, Route::None);
}

#[test]
fn test_whitespace_only_counts_as_empty() {
    let (a, b) = artifacts("   \n\n\t", "");
    let report = default_engine().compare(&a, &b);

    assert_eq!(report.ast_similarity, 1.0);
    assert!(report.is_pass());
}

#[test]
fn test_one_empty_fails() {
    let engine = default_engine();

    for (a, b) in [
        artifacts("", "def f(): pass"),
        artifacts("def f(): pass", ""),
    ] {
        let report = engine.compare(&a, &b);
        assert_eq!(report.ast_similarity, 0.0);
        assert_eq!(report.quorum_decision, QuorumDecision::Fail);
        assert_eq!(report.route_to, Route::Audit);
    }
}

#[test]
fn test_threshold_boundary_is_inclusive() {
    let (a, b) = SINGLE_OPERATOR.artifacts();
    let similarity = default_engine().compare(&a, &b).ast_similarity;
    assert!(similarity > 0.5 && similarity < 1.0, "similarity {similarity}");

    // For s >= 0.5 both 1 - s and 1 - (1 - s) are exact
    let report = engine_with_threshold(1.0 - similarity).compare(&a, &b);
    assert_eq!(report.ast_similarity, similarity);
    assert_eq!(report.quorum_decision, QuorumDecision::Pass);
}

#[test]
fn test_threshold_changes_decision() {
    let (a, b) = MISSING_METHODS.artifacts();

    let strict = engine_with_threshold(0.01).compare(&a, &b);
    let lenient = engine_with_threshold(0.95).compare(&a, &b);

    assert_eq!(strict.quorum_decision, QuorumDecision::Fail);
    assert_eq!(lenient.quorum_decision, QuorumDecision::Pass);
    assert_eq!(strict.ast_similarity, lenient.ast_similarity);
}

#[test]
fn test_semantic_distance_complements_similarity() {
    let engine = default_engine();
    for pair in DIVERGENT_PAIRS.iter().chain(COSMETIC_PAIRS) {
        let (a, b) = pair.artifacts();
        let report = engine.compare(&a, &b);
        assert_eq!(report.semantic_distance, 1.0 - report.ast_similarity);
        assert!((0.0..=1.0).contains(&report.ast_similarity));
    }
}

#[test]
fn test_reports_are_deterministic() {
    let engine = default_engine();
    for pair in DIVERGENT_PAIRS {
        let (a, b) = pair.artifacts();
        let first = engine.compare(&a, &b);
        let second = engine.compare(&a, &b);
        assert!(first.same_outcome(&second), "{}", pair.name);
    }
}

#[test]
fn test_compare_many_matches_sequential() {
    let engine = default_engine();
    let pairs: Vec<_> = DIVERGENT_PAIRS
        .iter()
        .chain(COSMETIC_PAIRS)
        .chain([&SYNTAX_ERROR, &SINGLE_OPERATOR])
        .map(FixturePair::artifacts)
        .collect();

    let batch = engine.compare_many(&pairs);
    assert_eq!(batch.len(), pairs.len());

    for ((a, b), report) in pairs.iter().zip(&batch) {
        let sequential = engine.compare(a, b);
        assert!(report.same_outcome(&sequential));
        assert_eq!(report.artifact_a_ref.path, a.path().map(String::from));
    }
}

#[test]
fn test_invalid_threshold_is_config_error() {
    let (a, b) = artifacts("x = 1", "x = 1");
    for threshold in [0.0, 1.0, -0.5, 2.0] {
        let result = compare(&a, &b, &DiffConfig::new().with_threshold(threshold));
        assert!(result.is_err(), "threshold {threshold} accepted");
    }
}

#[test]
fn test_report_carries_artifact_refs() {
    let (a, b) = RENAMED_VARIABLES.artifacts();
    let report = default_engine().compare(&a, &b);

    assert_eq!(report.artifact_a_ref, a.reference());
    assert_eq!(report.artifact_b_ref, b.reference());
    assert_eq!(report.artifact_b_ref.path.as_deref(), Some("rename_b.py"));
}

#[test]
fn test_report_serializes() {
    let (a, b) = FIBONACCI.artifacts();
    let report = default_engine().compare(&a, &b);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["quorum_decision"], "fail");
    assert_eq!(json["route_to"], "audit");
    assert!(json["diagnostics"]["structural_breakdown"].is_object());
    assert!(json["diagnostics"]["metrics_a"]["node_type_histogram"].is_object());
}
