//! Structural fingerprints
//!
//! A bounded numeric summary of a tree's shape. Two artifacts implementing
//! the same algorithm produce near-identical fingerprints regardless of
//! naming or layout.

use crate::ast::{Node, NodeKind};
use crate::parser::ParsedTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shape summary of one parsed artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralFingerprint {
    /// Total nodes visited
    pub node_count: usize,
    /// Deepest level reached (root = 0)
    pub max_depth: usize,
    /// `FunctionDef` and `AsyncFunctionDef` nodes
    pub function_count: usize,
    /// `ClassDef` nodes
    pub class_count: usize,
    /// `Import` and `ImportFrom` nodes
    pub import_count: usize,
    /// Weighted count of definitions and control-flow constructs
    pub complexity_score: f64,
    /// Occurrences per node type name
    pub node_type_histogram: BTreeMap<String, usize>,
}

impl StructuralFingerprint {
    /// Extract fingerprint from a parsed tree
    #[must_use]
    pub fn extract(tree: &ParsedTree) -> Self {
        Self::from_node(tree.root())
    }

    /// Extract fingerprint from any subtree
    #[must_use]
    pub fn from_node(root: &Node) -> Self {
        let mut walker = Walker::default();
        let mut pending = vec![(root, 0)];
        while let Some((node, depth)) = pending.pop() {
            walker.visit(node, depth);
            pending.extend(node.children().iter().map(|child| (child, depth + 1)));
        }
        walker.finish()
    }

    /// Occurrences of one node type
    #[inline]
    #[must_use]
    pub fn count_of(&self, type_name: &str) -> usize {
        self.node_type_histogram.get(type_name).copied().unwrap_or(0)
    }

    /// Scalar metrics in a fixed order, as `(name, value)` pairs
    #[must_use]
    pub fn scalar_metrics(&self) -> [(&'static str, f64); 6] {
        [
            ("node_count", self.node_count as f64),
            ("max_depth", self.max_depth as f64),
            ("function_count", self.function_count as f64),
            ("class_count", self.class_count as f64),
            ("import_count", self.import_count as f64),
            ("complexity_score", self.complexity_score),
        ]
    }
}

#[derive(Default)]
struct Walker {
    fingerprint: StructuralFingerprint,
    branches: usize,
}

impl Walker {
    fn visit(&mut self, node: &Node, depth: usize) {
        let fp = &mut self.fingerprint;
        fp.node_count += 1;
        fp.max_depth = fp.max_depth.max(depth);
        *fp
            .node_type_histogram
            .entry(node.type_name().to_string())
            .or_insert(0) += 1;

        match node.kind() {
            NodeKind::FunctionDef { .. } | NodeKind::AsyncFunctionDef { .. } => {
                fp.function_count += 1;
            }
            NodeKind::ClassDef { .. } => fp.class_count += 1,
            NodeKind::Import | NodeKind::ImportFrom => fp.import_count += 1,
            NodeKind::If | NodeKind::For | NodeKind::While | NodeKind::Try => self.branches += 1,
            _ => {}
        }
    }

    fn finish(mut self) -> StructuralFingerprint {
        let fp = &mut self.fingerprint;
        fp.complexity_score =
            (fp.function_count * 2 + fp.class_count * 3 + self.branches) as f64;
        self.fingerprint
    }
}
