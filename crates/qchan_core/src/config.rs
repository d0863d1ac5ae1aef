//! Term-expansion configuration
//!
//! Gantree: L0_Foundation → TermExpansionConfig
//!
//! Settings that steer `highmagnitude_terms` and polynomial construction.

use crate::constants::expansion;
use crate::error::{QchanError, QchanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Term-expansion configuration
/// Gantree: TermExpansionConfig // 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermExpansionConfig {
    /// Terms whose magnitude falls below this are pruned
    /// Gantree: min_term_mag: f64 // 최소 크기 (1e-6)
    pub min_term_mag: f64,

    /// Keep every first-order term regardless of magnitude
    /// Gantree: force_first_order: bool // 1차 강제
    pub force_first_order: bool,

    /// Highest Taylor order explored
    /// Gantree: max_taylor_order: usize // 최대 차수 (3)
    pub max_taylor_order: usize,

    /// Bound on polynomial variable indices
    /// Gantree: max_polynomial_vars: usize // 변수 한도 (100)
    pub max_polynomial_vars: usize,
}

impl TermExpansionConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Configuration with the default limits
    pub fn new() -> Self {
        Self {
            min_term_mag: expansion::DEFAULT_MIN_TERM_MAG,
            force_first_order: true,
            max_taylor_order: expansion::DEFAULT_MAX_TAYLOR_ORDER,
            max_polynomial_vars: expansion::DEFAULT_MAX_POLYNOMIAL_VARS,
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set the minimum term magnitude
    pub fn with_min_term_mag(mut self, min_term_mag: f64) -> Self {
        self.min_term_mag = min_term_mag;
        self
    }

    /// Enable/disable forcing first-order terms
    pub fn with_force_first_order(mut self, enabled: bool) -> Self {
        self.force_first_order = enabled;
        self
    }

    /// Set the highest Taylor order
    pub fn with_max_taylor_order(mut self, order: usize) -> Self {
        self.max_taylor_order = order;
        self
    }

    /// Set the polynomial variable bound
    pub fn with_max_polynomial_vars(mut self, max_vars: usize) -> Self {
        self.max_polynomial_vars = max_vars;
        self
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    /// Gantree: validate(&self) -> QchanResult // 검증
    pub fn validate(&self) -> QchanResult<()> {
        if !self.min_term_mag.is_finite() || self.min_term_mag < 0.0 {
            return Err(QchanError::ConfigError(format!(
                "min_term_mag must be a finite value >= 0, got {}",
                self.min_term_mag
            )));
        }

        if self.max_polynomial_vars == 0 {
            return Err(QchanError::ConfigError(
                "max_polynomial_vars must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Parse and validate from JSON
    pub fn from_json(json: &str) -> QchanResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> QchanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for TermExpansionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TermExpansionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TermExpansionConfig(min_mag={:e}, force_first={}, max_order={}, max_vars={})",
            self.min_term_mag, self.force_first_order, self.max_taylor_order, self.max_polynomial_vars
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
