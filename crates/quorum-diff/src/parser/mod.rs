//! Source parsers
//!
//! Turns raw source text into a [`ParsedTree`] or a [`ParseError`]:
//! - tree-sitter builds a concrete syntax tree
//! - any ERROR or MISSING node rejects the input
//! - the concrete tree is lowered into the [`crate::ast::Node`] tree
//!
//! Parsing is a pure function of the text. A fresh tree-sitter parser is
//! created per call so parsers can be shared freely across threads.

use crate::ast::Node;
use crate::error::ParseError;

mod lower;

use lower::Lowerer;

/// Deepest nesting of statements, expressions and patterns accepted
///
/// Deeper input is rejected with [`ParseError::TooDeep`].
pub const MAX_NESTING_DEPTH: usize = 256;

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Language {
    /// Python 3
    Python,
}

impl Language {
    /// Get file extensions for this language
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py", "pyi"],
        }
    }

    /// Get human-readable name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
        }
    }

    /// Get tree-sitter grammar
    #[inline]
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            Language::Python => tree_sitter_python::LANGUAGE.into(),
        }
    }
}

/// A successfully parsed artifact
///
/// Owned by the comparison that produced it and dropped when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTree {
    root: Node,
}

impl ParsedTree {
    /// Wrap a lowered root node
    #[inline]
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Root node (`Module`)
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// True when the module holds no statements
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }
}

/// Parser trait for turning source text into trees
///
/// Implement this trait to put another front end in front of the engine.
/// Implementations must be pure: same text, same tree.
pub trait SourceParser: Send + Sync {
    /// Language this parser accepts
    fn language(&self) -> Language;

    /// Parse text into a tree
    ///
    /// # Errors
    /// Returns [`ParseError`] when the text is not valid source.
    fn parse(&self, text: &str) -> Result<ParsedTree, ParseError>;
}

/// Python 3 parser backed by tree-sitter-python
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonParser;

impl PythonParser {
    /// Create new Python parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for PythonParser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse(&self, text: &str) -> Result<ParsedTree, ParseError> {
        let ts_lang = self.language().tree_sitter_language();

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&ts_lang)
            .map_err(|e| ParseError::ParserInit(e.to_string()))?;

        let tree = parser.parse(text, None).ok_or(ParseError::ParseFailed)?;
        let root = tree.root_node();

        if root.has_error() {
            return Err(describe_error(root, text));
        }

        let module = Lowerer::new(text).module(root)?;
        Ok(ParsedTree::new(module))
    }
}

/// Parse Python source with the default parser
///
/// # Errors
/// Returns [`ParseError`] when the text is not valid Python 3.
pub fn parse(text: &str) -> Result<ParsedTree, ParseError> {
    PythonParser.parse(text)
}

/// Build a readable error from the first ERROR or MISSING node
fn describe_error(root: tree_sitter::Node<'_>, source: &str) -> ParseError {
    let Some(node) = find_error(root) else {
        return ParseError::syntax_at(root.start_position(), "invalid syntax");
    };

    if node.is_missing() {
        return ParseError::syntax_at(node.start_position(), format!("missing `{}`", node.kind()));
    }

    let snippet: String = node
        .utf8_text(source.as_bytes())
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .chars()
        .take(32)
        .collect();

    if snippet.is_empty() {
        ParseError::syntax_at(node.start_position(), "invalid syntax")
    } else {
        ParseError::syntax_at(node.start_position(), format!("unexpected `{snippet}`"))
    }
}

/// Depth-first search for the first error node in source order
fn find_error(root: tree_sitter::Node<'_>) -> Option<tree_sitter::Node<'_>> {
    let mut node = root;
    loop {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }

        let mut cursor = node.walk();
        let next = node
            .children(&mut cursor)
            .find(|child| child.has_error() || child.is_missing());
        node = next?;
    }
}
