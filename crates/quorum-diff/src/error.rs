//! Error types for the diff engine
//!
//! Two classes exist:
//! - [`ParseError`]: an artifact is not valid source. Folded into a failing
//!   report by the engine, never returned to callers of `compare`.
//! - [`ConfigError`]: the operator supplied an unusable configuration.
//!   Surfaced before any comparison work starts.

/// Errors while turning source text into a tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Syntax error reported by the parser
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
        /// Human-readable reason
        message: String,
    },

    /// Syntax the lowering does not model
    #[error("unsupported syntax `{kind}` at {line}:{column}")]
    Unsupported {
        /// Grammar node kind
        kind: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },

    /// Python 2 forms rejected by Python 3
    #[error("python 2 `{construct}` at {line}:{column}")]
    LegacySyntax {
        /// Offending keyword or operator
        construct: String,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },

    /// Statements, expressions or patterns nested past the lowering limit
    #[error("nesting deeper than {limit} levels at {line}:{column}")]
    TooDeep {
        /// Deepest accepted nesting
        limit: usize,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
    },

    /// Grammar could not be loaded into the parser
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Parser produced no tree
    #[error("parse failed")]
    ParseFailed,
}

impl ParseError {
    /// Create syntax error at a tree-sitter position
    pub(crate) fn syntax_at(point: tree_sitter::Point, message: impl Into<String>) -> Self {
        Self::Syntax {
            line: point.row + 1,
            column: point.column + 1,
            message: message.into(),
        }
    }

    /// Create unsupported-syntax error for a grammar node
    pub(crate) fn unsupported(node: &tree_sitter::Node<'_>) -> Self {
        let point = node.start_position();
        Self::Unsupported {
            kind: node.kind().to_string(),
            line: point.row + 1,
            column: point.column + 1,
        }
    }

    /// Create legacy-syntax error for a Python 2 keyword or operator
    pub(crate) fn legacy(node: &tree_sitter::Node<'_>, construct: impl Into<String>) -> Self {
        let point = node.start_position();
        Self::LegacySyntax {
            construct: construct.into(),
            line: point.row + 1,
            column: point.column + 1,
        }
    }

    /// Create nesting-limit error at the node that crossed `limit`
    pub(crate) fn too_deep(node: &tree_sitter::Node<'_>, limit: usize) -> Self {
        let point = node.start_position();
        Self::TooDeep {
            limit,
            line: point.row + 1,
            column: point.column + 1,
        }
    }
}

/// Errors in engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Diff threshold outside the open interval (0, 1)
    #[error("diff threshold must lie in (0.0, 1.0), got {0}")]
    ThresholdOutOfRange(f64),

    /// Negative or non-finite weight
    #[error("weight `{name}` must be finite and non-negative, got {value}")]
    InvalidWeight {
        /// Weight name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Weights do not sum to one
    #[error("similarity weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    /// Malformed TOML configuration
    #[error("invalid configuration document: {0}")]
    Toml(#[from] toml::de::Error),
}
