//! Quorum Diff
//!
//! Semantic equivalence gate for two independently produced renders of the
//! same task.
//!
//! # Core Concepts
//!
//! - [`SourceArtifact`]: One producer's source text, labeled `A` or `B`
//! - [`SourceParser`]: Source text → [`ParsedTree`] (Python via tree-sitter)
//! - [`StructuralFingerprint`]: Counts, depth, complexity, node-type histogram
//! - [`TokenSequence`]: Identifier-normalized token stream in source order
//! - [`SimilarityScorer`]: Token, edit and structural signals plus composite
//! - [`QuorumDecider`]: Pass iff composite `>= 1 - diff_threshold`
//! - [`ComparisonReport`]: The immutable result handed to routing
//!
//! Parse failures and one-sided empty inputs fail closed: the report says
//! `fail` and routes to `audit`.
//!
//! # Example
//!
//! ```rust,ignore
//! use quorum_diff::{DiffConfig, DiffEngine, SourceArtifact};
//!
//! let engine = DiffEngine::new(DiffConfig::default())?;
//! let report = engine.compare(
//!     &SourceArtifact::a("def f(x):\n    return x * 2\n"),
//!     &SourceArtifact::b("def f(y):\n    return y * 2\n"),
//! );
//! assert!(report.is_pass());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod artifact;
pub mod ast;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod parser;
pub mod quorum;
pub mod report;
pub mod similarity;
pub mod tokens;

pub use artifact::{ArtifactLabel, ArtifactRef, SourceArtifact};
pub use config::{DiffConfig, SimilarityWeights, DEFAULT_DIFF_THRESHOLD};
pub use engine::{compare, DiffEngine};
pub use error::{ConfigError, ParseError};
pub use fingerprint::StructuralFingerprint;
pub use parser::{parse, Language, ParsedTree, PythonParser, SourceParser, MAX_NESTING_DEPTH};
pub use quorum::{decide, QuorumDecider, QuorumDecision, Route, Verdict};
pub use report::{ComparisonReport, Diagnostics};
pub use similarity::{SimilarityAssessment, SimilarityScorer, SimilaritySignals};
pub use tokens::TokenSequence;

/// Common imports
pub mod prelude {
    pub use crate::{
        compare, ComparisonReport, DiffConfig, DiffEngine, QuorumDecision, Route, SourceArtifact,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
