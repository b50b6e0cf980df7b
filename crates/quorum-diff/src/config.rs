//! Engine configuration
//!
//! A single immutable value passed into every comparison. Validation runs
//! once, when an engine is built from it.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default diff threshold (97% similarity required to pass)
pub const DEFAULT_DIFF_THRESHOLD: f64 = 0.03;

/// Tolerance on the weight sum
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Weights of the three similarity signals in the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    /// Token sequence similarity weight
    pub token: f64,
    /// Edit distance similarity weight
    pub edit: f64,
    /// Structural fingerprint similarity weight
    pub structural: f64,
}

impl SimilarityWeights {
    /// Create weights
    #[inline]
    #[must_use]
    pub const fn new(token: f64, edit: f64, structural: f64) -> Self {
        Self {
            token,
            edit,
            structural,
        }
    }

    /// Sum of all weights
    #[inline]
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.token + self.edit + self.structural
    }

    /// Check every weight is usable and the total is one
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidWeight`] or [`ConfigError::WeightSum`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("token", self.token),
            ("edit", self.edit),
            ("structural", self.structural),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        // Structure dominates: renames and comments alone must not fail a pair.
        Self::new(0.3, 0.2, 0.5)
    }
}

/// Diff engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Maximum tolerated semantic distance; pass threshold is `1 - diff_threshold`
    pub diff_threshold: f64,
    /// Composite score weights
    pub weights: SimilarityWeights,
}

impl DiffConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With diff threshold
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, diff_threshold: f64) -> Self {
        self.diff_threshold = diff_threshold;
        self
    }

    /// With composite weights
    #[inline]
    #[must_use]
    pub fn with_weights(mut self, weights: SimilarityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Minimum composite similarity for a pass
    #[inline]
    #[must_use]
    pub fn pass_threshold(&self) -> f64 {
        1.0 - self.diff_threshold
    }

    /// Validate threshold range and weights
    ///
    /// # Errors
    /// Returns [`ConfigError::ThresholdOutOfRange`] when the threshold is not
    /// strictly between 0 and 1 (NaN included), or a weight error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold(self.diff_threshold)?;
        self.weights.validate()
    }

    /// Load and validate configuration from a TOML document
    ///
    /// ```toml
    /// diff_threshold = 0.05
    ///
    /// [weights]
    /// token = 0.3
    /// edit = 0.2
    /// structural = 0.5
    /// ```
    ///
    /// Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] for malformed documents, or any
    /// validation error.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            weights: SimilarityWeights::default(),
        }
    }
}

/// Reject thresholds outside the open interval (0, 1)
pub(crate) fn validate_threshold(diff_threshold: f64) -> Result<(), ConfigError> {
    if diff_threshold > 0.0 && diff_threshold < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange(diff_threshold))
    }
}
