//! Property tests over generated programs

use proptest::prelude::*;
use quorum_diff::{
    parse, DiffEngine, ParseError, QuorumDecision, SourceArtifact, StructuralFingerprint,
    TokenSequence,
};
use quorum_test_utils::{addition_chain, default_engine, engine_with_threshold, SNIPPETS};

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(SNIPPETS), 0..8).prop_map(|lines| lines.join("\n"))
}

fn engine() -> DiffEngine {
    default_engine()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_output_is_bounded(a in program(), b in program()) {
        let report = engine().compare(&SourceArtifact::a(a), &SourceArtifact::b(b));
        prop_assert!((0.0..=1.0).contains(&report.ast_similarity));
        prop_assert!((0.0..=1.0).contains(&report.token_similarity));
        prop_assert!((0.0..=1.0).contains(&report.edit_similarity));
        prop_assert!((0.0..=1.0).contains(&report.structural_similarity));
        prop_assert_eq!(report.semantic_distance, 1.0 - report.ast_similarity);
    }

    #[test]
    fn prop_arbitrary_text_never_panics(a in "\\PC{0,60}", b in "\\PC{0,60}") {
        let report = engine().compare(&SourceArtifact::a(a), &SourceArtifact::b(b));
        prop_assert!((0.0..=1.0).contains(&report.ast_similarity));
    }

    #[test]
    fn prop_identity_passes(source in program()) {
        let report = engine().compare(
            &SourceArtifact::a(source.clone()),
            &SourceArtifact::b(source),
        );
        prop_assert_eq!(report.ast_similarity, 1.0);
        prop_assert_eq!(report.quorum_decision, QuorumDecision::Pass);
    }

    #[test]
    fn prop_comparison_is_deterministic(a in program(), b in program()) {
        let (a, b) = (SourceArtifact::a(a), SourceArtifact::b(b));
        let engine = engine();
        prop_assert!(engine.compare(&a, &b).same_outcome(&engine.compare(&a, &b)));
    }

    #[test]
    fn prop_stricter_threshold_never_flips_fail_to_pass(
        a in program(),
        b in program(),
        t1 in 0.001f64..0.999,
        t2 in 0.001f64..0.999,
    ) {
        let (lenient, strict) = if t1 >= t2 { (t1, t2) } else { (t2, t1) };
        let (a, b) = (SourceArtifact::a(a), SourceArtifact::b(b));

        let strict_report = engine_with_threshold(strict).compare(&a, &b);
        let lenient_report = engine_with_threshold(lenient).compare(&a, &b);

        prop_assert_eq!(strict_report.ast_similarity, lenient_report.ast_similarity);
        if strict_report.is_pass() {
            prop_assert!(lenient_report.is_pass());
        }
    }

    #[test]
    fn prop_nesting_depth_never_panics(terms in 0usize..1_200) {
        let source = addition_chain(terms);
        let report = engine().compare(
            &SourceArtifact::a(source.clone()),
            &SourceArtifact::b(source.clone()),
        );

        prop_assert!((0.0..=1.0).contains(&report.ast_similarity));
        if terms <= 200 {
            prop_assert!(report.is_pass());
        }
        if terms >= 300 {
            prop_assert!(report.requires_audit());
            prop_assert!(matches!(parse(&source), Err(ParseError::TooDeep { .. })), "terms {}", terms);
        }
    }

    #[test]
    fn prop_fingerprint_histogram_sums_to_node_count(source in program()) {
        let tree = parse(&source).unwrap();
        let fp = StructuralFingerprint::extract(&tree);
        prop_assert_eq!(fp.node_type_histogram.values().sum::<usize>(), fp.node_count);
        prop_assert_eq!(TokenSequence::tokenize(&tree), TokenSequence::tokenize(&tree));
    }
}
