//! Token sequences
//!
//! Linearizes a tree into normalized tokens, in source order:
//! - every node emits its type name
//! - `FunctionDef`, `AsyncFunctionDef` and `ClassDef` emit `NAME:<name>`
//! - other nodes carrying a name (`alias`, `ExceptHandler`, `MatchAs`,
//!   `MatchStar`, `TypeAlias`, type parameters) emit `NAME:var`
//! - `Name` and `arg` emit `ID:identifier`
//! - `Attribute` emits `ATTR:<attr>`
//!
//! Variable names vanish while declared names and attribute names stay.

use crate::ast::{Node, NodeKind};
use crate::parser::ParsedTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Token emitted for identifier references and parameters
pub const IDENTIFIER_TOKEN: &str = "ID:identifier";

/// Token emitted for non-declaration names
pub const ANONYMOUS_NAME_TOKEN: &str = "NAME:var";

/// Delimiter used when a sequence is flattened into one string
pub const TOKEN_DELIMITER: &str = " ";

/// Ordered, normalized tokens of one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSequence {
    tokens: Vec<String>,
}

impl TokenSequence {
    /// Tokenize a parsed tree
    #[must_use]
    pub fn tokenize(tree: &ParsedTree) -> Self {
        Self::from_node(tree.root())
    }

    /// Tokenize any subtree
    #[must_use]
    pub fn from_node(root: &Node) -> Self {
        let mut tokens = Vec::with_capacity(root.size() * 2);
        push_tokens(root, &mut tokens);
        Self { tokens }
    }

    /// Tokens as a slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the sequence holds no tokens
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens joined with [`TOKEN_DELIMITER`]
    #[must_use]
    pub fn joined(&self) -> String {
        self.tokens.join(TOKEN_DELIMITER)
    }

    /// Distinct tokens
    #[must_use]
    pub fn distinct(&self) -> BTreeSet<&str> {
        self.tokens.iter().map(String::as_str).collect()
    }
}

impl FromIterator<String> for TokenSequence {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// Pre-order walk with an explicit stack
fn push_tokens(root: &Node, out: &mut Vec<String>) {
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        push_node_tokens(node, out);
        pending.extend(node.children().iter().rev());
    }
}

fn push_node_tokens(node: &Node, out: &mut Vec<String>) {
    out.push(node.type_name().to_string());

    match node.kind() {
        NodeKind::FunctionDef { name }
        | NodeKind::AsyncFunctionDef { name }
        | NodeKind::ClassDef { name } => out.push(format!("NAME:{name}")),
        NodeKind::Alias { .. }
        | NodeKind::ExceptHandler { .. }
        | NodeKind::MatchAs
        | NodeKind::MatchStar
        | NodeKind::TypeAlias
        | NodeKind::TypeVar
        | NodeKind::ParamSpec
        | NodeKind::TypeVarTuple => out.push(ANONYMOUS_NAME_TOKEN.to_string()),
        NodeKind::Name { .. } | NodeKind::Arg { .. } => out.push(IDENTIFIER_TOKEN.to_string()),
        NodeKind::Attribute { attr } => out.push(format!("ATTR:{attr}")),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn tokens(source: &str) -> Vec<String> {
        TokenSequence::tokenize(&parse(source).unwrap()).as_slice().to_vec()
    }

    #[test]
    fn empty_module_has_one_token() {
        assert_eq!(tokens(""), vec!["Module"]);
    }

    #[test]
    fn function_tokens_in_source_order() {
        assert_eq!(
            tokens("def add(a):\n    return a\n"),
            vec![
                "Module",
                "FunctionDef",
                "NAME:add",
                "arguments",
                "arg",
                "ID:identifier",
                "Return",
                "Name",
                "ID:identifier",
                "Load",
            ]
        );
    }

    #[test]
    fn attributes_keep_their_names() {
        assert_eq!(
            tokens("self.value\n"),
            vec!["Module", "Expr", "Attribute", "ATTR:value", "Name", "ID:identifier", "Load", "Load"]
        );
    }

    #[test]
    fn import_aliases_are_anonymous() {
        assert_eq!(
            tokens("import os\n"),
            vec!["Module", "Import", "alias", "NAME:var"]
        );
    }

    #[test]
    fn type_parameters_are_anonymous() {
        assert_eq!(
            tokens("class Box[T]:\n    pass\n"),
            vec!["Module", "ClassDef", "NAME:Box", "TypeVar", "NAME:var", "Pass"]
        );
    }

    #[test]
    fn long_chains_tokenize() {
        let source = format!("x = {}1\n", "1 + ".repeat(200));
        let seq = tokens(&source);
        assert_eq!(seq.iter().filter(|t| *t == "BinOp").count(), 200);
        assert_eq!(seq[..4].to_vec(), vec!["Module", "Assign", "Name", "ID:identifier"]);
    }

    #[test]
    fn renamed_variables_tokenize_identically() {
        let a = tokens("def f(x):\n    y = x + 1\n    return y\n");
        let b = tokens("def f(item):\n    out = item + 1\n    return out\n");
        assert_eq!(a, b);
    }

    #[test]
    fn renamed_functions_differ() {
        assert_ne!(tokens("def f():\n    pass\n"), tokens("def g():\n    pass\n"));
    }

    #[test]
    fn tokenize_is_deterministic() {
        let tree = parse("class A:\n    def m(self):\n        return self.x\n").unwrap();
        assert_eq!(TokenSequence::tokenize(&tree), TokenSequence::tokenize(&tree));
    }

    #[test]
    fn joined_uses_space_delimiter() {
        let seq: TokenSequence = ["Module", "Pass"].into_iter().map(String::from).collect();
        assert_eq!(seq.joined(), "Module Pass");
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.distinct().len(), 2);
    }
}
