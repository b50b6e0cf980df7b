//! Structural fingerprint comparison

use crate::fingerprint::StructuralFingerprint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Breakdown key for the histogram metric
pub const HISTOGRAM_METRIC: &str = "node_type_histogram";

/// Relative similarity `1 - |a - b| / max(a, b)`
///
/// `None` when both values are zero.
#[must_use]
pub fn relative_similarity(a: f64, b: f64) -> Option<f64> {
    let denominator = a.max(b);
    if denominator > 0.0 {
        Some(1.0 - (a - b).abs() / denominator)
    } else {
        None
    }
}

/// Per-metric similarities and their average
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralComparison {
    /// Similarity of each metric that had a non-zero denominator
    pub breakdown: BTreeMap<String, f64>,
    /// Mean of the breakdown; `None` when no metric contributed
    pub score: Option<f64>,
}

/// Compare two fingerprints metric by metric
///
/// The node-type histogram contributes one extra metric: the mean relative
/// similarity over the union of node types.
#[must_use]
pub fn compare(a: &StructuralFingerprint, b: &StructuralFingerprint) -> StructuralComparison {
    let mut breakdown = BTreeMap::new();

    for ((name, value_a), (_, value_b)) in a.scalar_metrics().into_iter().zip(b.scalar_metrics()) {
        if let Some(similarity) = relative_similarity(value_a, value_b) {
            breakdown.insert(name.to_string(), similarity);
        }
    }

    if let Some(similarity) = histogram_similarity(&a.node_type_histogram, &b.node_type_histogram) {
        breakdown.insert(HISTOGRAM_METRIC.to_string(), similarity);
    }

    let score = mean(breakdown.values().copied());
    StructuralComparison { breakdown, score }
}

fn histogram_similarity(a: &BTreeMap<String, usize>, b: &BTreeMap<String, usize>) -> Option<f64> {
    let types: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    mean(types.into_iter().filter_map(|node_type| {
        let count_a = a.get(node_type).copied().unwrap_or(0) as f64;
        let count_b = b.get(node_type).copied().unwrap_or(0) as f64;
        relative_similarity(count_a, count_b)
    }))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fp(node_count: usize, functions: usize, histogram: &[(&str, usize)]) -> StructuralFingerprint {
        StructuralFingerprint {
            node_count,
            max_depth: 3,
            function_count: functions,
            complexity_score: (functions * 2) as f64,
            node_type_histogram: histogram.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
            ..StructuralFingerprint::default()
        }
    }

    #[test]
    fn relative_similarity_formula() {
        assert_eq!(relative_similarity(0.0, 0.0), None);
        assert_eq!(relative_similarity(4.0, 4.0), Some(1.0));
        assert_eq!(relative_similarity(4.0, 2.0), Some(0.5));
        assert_eq!(relative_similarity(0.0, 3.0), Some(0.0));
    }

    #[test]
    fn identical_fingerprints_score_one() {
        let a = fp(10, 1, &[("Module", 1), ("FunctionDef", 1)]);
        let result = compare(&a, &a);
        assert_eq!(result.score, Some(1.0));
    }

    #[test]
    fn zero_metrics_are_skipped() {
        let a = fp(8, 2, &[("Module", 1)]);
        let b = fp(4, 1, &[("Module", 1)]);
        let result = compare(&a, &b);

        // class_count and import_count are zero on both sides
        assert!(!result.breakdown.contains_key("class_count"));
        assert!(!result.breakdown.contains_key("import_count"));
        assert_eq!(result.breakdown["node_count"], 0.5);
        assert_eq!(result.breakdown["max_depth"], 1.0);
        assert_eq!(result.breakdown["function_count"], 0.5);
        assert_eq!(result.breakdown["complexity_score"], 0.5);
        assert_eq!(result.breakdown[HISTOGRAM_METRIC], 1.0);
        // (0.5 + 1.0 + 0.5 + 0.5 + 1.0) / 5
        assert_eq!(result.score, Some(0.7));
    }

    #[test]
    fn histogram_uses_union_of_types() {
        let a = fp(1, 0, &[("If", 2)]);
        let b = fp(1, 0, &[("While", 2)]);
        assert_eq!(compare(&a, &b).breakdown[HISTOGRAM_METRIC], 0.0);
    }

    #[test]
    fn all_zero_fingerprints_have_no_score() {
        let empty = StructuralFingerprint::default();
        let result = compare(&empty, &empty);
        assert!(result.breakdown.is_empty());
        assert_eq!(result.score, None);
    }
}
