//! Quorum decision
//!
//! `EVALUATING -> {PASS, FAIL}` in one pure step: a pair passes when its
//! composite similarity reaches `1 - diff_threshold`.

use crate::config::{validate_threshold, DEFAULT_DIFF_THRESHOLD};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuorumDecision {
    /// Renders agree
    Pass,
    /// Renders diverge or could not be compared
    Fail,
}

impl QuorumDecision {
    /// Lower-case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuorumDecision::Pass => "pass",
            QuorumDecision::Fail => "fail",
        }
    }
}

impl fmt::Display for QuorumDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where downstream routing should send the pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// No escalation
    None,
    /// Escalate for audit
    Audit,
}

impl Route {
    /// Lower-case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::None => "none",
            Route::Audit => "audit",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision plus route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verdict {
    /// Pass or fail
    pub decision: QuorumDecision,
    /// Routing label
    pub route: Route,
}

impl Verdict {
    /// Passing verdict, no routing
    pub const PASS: Self = Self {
        decision: QuorumDecision::Pass,
        route: Route::None,
    };

    /// Failing verdict, routed to audit
    pub const FAIL: Self = Self {
        decision: QuorumDecision::Fail,
        route: Route::Audit,
    };
}

/// Applies a validated threshold to composite scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuorumDecider {
    diff_threshold: f64,
}

impl QuorumDecider {
    /// Create decider
    ///
    /// # Errors
    /// Returns [`ConfigError::ThresholdOutOfRange`] unless
    /// `0 < diff_threshold < 1`.
    pub fn new(diff_threshold: f64) -> Result<Self, ConfigError> {
        validate_threshold(diff_threshold)?;
        Ok(Self { diff_threshold })
    }

    /// Configured diff threshold
    #[inline]
    #[must_use]
    pub fn diff_threshold(&self) -> f64 {
        self.diff_threshold
    }

    /// Minimum similarity for a pass
    #[inline]
    #[must_use]
    pub fn pass_threshold(&self) -> f64 {
        1.0 - self.diff_threshold
    }

    /// Decide a composite similarity (inclusive at the boundary)
    #[must_use]
    pub fn decide(&self, ast_similarity: f64) -> Verdict {
        if ast_similarity >= self.pass_threshold() {
            Verdict::PASS
        } else {
            Verdict::FAIL
        }
    }
}

impl Default for QuorumDecider {
    fn default() -> Self {
        Self {
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
        }
    }
}

/// Validate `diff_threshold` and decide in one call
///
/// # Errors
/// Returns [`ConfigError::ThresholdOutOfRange`] for thresholds outside `(0, 1)`.
pub fn decide(ast_similarity: f64, diff_threshold: f64) -> Result<Verdict, ConfigError> {
    Ok(QuorumDecider::new(diff_threshold)?.decide(ast_similarity))
}
