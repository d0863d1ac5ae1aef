//! Constants for qchan
//!
//! Gantree: L0_Foundation → Constants
//!
//! Expansion limits and numerical tolerances shared across crates.

// ============================================================================
// Term Expansion
// ============================================================================

/// Term-expansion limits
pub mod expansion {
    /// Default bound on the number of polynomial variables
    pub const DEFAULT_MAX_POLYNOMIAL_VARS: usize = 100;

    /// Default highest Taylor order explored by `highmagnitude_terms`
    pub const DEFAULT_MAX_TAYLOR_ORDER: usize = 3;

    /// Highest order whose terms are built and evaluated together;
    /// higher orders go through the filtered path
    pub const MAX_CACHED_TERM_ORDER: usize = 1;

    /// Default minimum term magnitude
    pub const DEFAULT_MIN_TERM_MAG: f64 = 1e-6;
}

// ============================================================================
// Tolerances
// ============================================================================

/// Numerical tolerances
pub mod tolerance {
    /// Two basis matrices sharing a label must agree to this norm
    pub const BASIS_LABEL: f64 = 1e-6;

    /// Largest imaginary part tolerated when a superoperator is made real
    pub const SUPEROP_IMAG: f64 = 1e-10;

    /// Residual allowed when projecting a transformed map onto a parameterization
    pub const TRANSFORM: f64 = 1e-8;

    /// Distance below which a similarity transform counts as the identity
    pub const IDENTITY: f64 = 1e-12;

    /// Slack on probabilities before they are rejected
    pub const PROBABILITY: f64 = 1e-12;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_defaults() {
        assert_eq!(expansion::DEFAULT_MAX_POLYNOMIAL_VARS, 100);
        assert_eq!(expansion::MAX_CACHED_TERM_ORDER, 1);
        assert!(expansion::DEFAULT_MAX_TAYLOR_ORDER > expansion::MAX_CACHED_TERM_ORDER);
    }

    #[test]
    fn test_tolerance_ordering() {
        assert!(tolerance::IDENTITY < tolerance::TRANSFORM);
        assert!(tolerance::TRANSFORM < tolerance::BASIS_LABEL);
    }
}
