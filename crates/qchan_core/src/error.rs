//! Error types for qchan
//!
//! Gantree: L0_Foundation → Errors
//!
//! One error enum shared by every crate in the workspace, grouped the way
//! failures surface: eagerly at construction, at the point an invariant
//! breaks, or when an operation is asked of a kind that cannot perform it.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for qchan
/// Gantree: QchanError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QchanError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Operators combined into one composite disagree on dimension
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Operators combined into one composite disagree on evolution type
    #[error("Evolution type mismatch: expected '{expected}', got '{got}'")]
    EvotypeMismatch { expected: String, got: String },

    /// Composite factors built on different matrix bases
    #[error("Matrix basis mismatch: expected '{expected}', got '{got}'")]
    MatrixBasisMismatch { expected: String, got: String },

    /// Basis size does not equal the operator dimension
    #[error("Basis '{basis}' has size {size} but the operator dimension is {dim}")]
    BasisSizeMismatch {
        basis: String,
        size: usize,
        dim: usize,
    },

    /// Evolution type not available for an operator kind
    #[error("Evolution type '{evotype}' not available with {operator}")]
    UnsupportedEvotype { evotype: String, operator: String },

    /// Unknown evolution type tag
    #[error("Invalid evolution type '{0}'")]
    InvalidEvotype(String),

    /// Unknown basis name or malformed explicit basis
    #[error("Invalid basis: {0}")]
    InvalidBasis(String),

    /// Malformed Lindblad term key
    #[error("Invalid Lindblad term key: {0}")]
    InvalidTermKey(String),

    /// Coefficient or rate outside its domain
    #[error("Invalid coefficient {value} for {term}")]
    InvalidCoefficient { term: String, value: f64 },

    /// Composite constructed with nothing to infer its shape from
    #[error("Empty composite: {0}")]
    EmptyComposite(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ========================================================================
    // Invariant Violations
    // ========================================================================
    /// Two factors use the same basis label for different matrices
    #[error("Ambiguous basis label '{0}'")]
    AmbiguousBasisLabel(String),

    /// Coefficient keys that none of the factors can express
    #[error("Invalid L-term descriptor key(s): {}", .0.join(", "))]
    UnknownTermKeys(Vec<String>),

    /// Polynomial variable index beyond the configured bound
    #[error("Polynomial variable index {index} exceeds max_num_vars = {max}")]
    TooManyPolynomialVars { index: usize, max: usize },

    // ========================================================================
    // Index Errors
    // ========================================================================
    /// Index outside the addressable range
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Absolute index not addressed by an index set
    #[error("Index {0} is not contained in the enclosing index set")]
    IndexNotFound(usize),

    /// Index repeated within one index set
    #[error("Index {0} repeated within one index set")]
    DuplicateIndex(usize),

    /// Parameter vector of the wrong length
    #[error("Parameter vector length mismatch: expected {expected}, got {got}")]
    ParamLengthMismatch { expected: usize, got: usize },

    /// Matrix of the wrong shape
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    // ========================================================================
    // Unsupported Operations
    // ========================================================================
    /// Operation not implemented for this operator or representation kind
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Similarity transform not representable by the parameterization
    #[error("Transform not representable: {0}")]
    TransformNotSupported(String),

    /// Operator cannot have its dense value set directly
    #[error("Cannot set the value of a {0} directly")]
    CannotSetDense(String),

    /// Singular transform matrix
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    // ========================================================================
    // Soft Conditions
    // ========================================================================
    /// Optional capability missing (e.g. diamond-norm solver)
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    // ========================================================================
    // Sampling Errors
    // ========================================================================
    /// Probability value out of range [0, 1]
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Wrong number of CHP qubit targets
    #[error("Got {got} targets instead of required {expected}")]
    TargetCountMismatch { expected: usize, got: usize },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for qchan operations
/// Gantree: QchanResult<T> // type alias
pub type QchanResult<T> = Result<T, QchanError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QchanError {
    fn from(err: serde_json::Error) -> Self {
        QchanError::JsonError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QchanError {
    /// Check if error is raised eagerly at construction
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            QchanError::DimensionMismatch { .. }
                | QchanError::EvotypeMismatch { .. }
                | QchanError::MatrixBasisMismatch { .. }
                | QchanError::BasisSizeMismatch { .. }
                | QchanError::UnsupportedEvotype { .. }
                | QchanError::InvalidEvotype(_)
                | QchanError::InvalidBasis(_)
                | QchanError::InvalidTermKey(_)
                | QchanError::InvalidCoefficient { .. }
                | QchanError::EmptyComposite(_)
                | QchanError::ConfigError(_)
        )
    }

    /// Check if error reports a broken invariant
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            QchanError::AmbiguousBasisLabel(_)
                | QchanError::UnknownTermKeys(_)
                | QchanError::TooManyPolynomialVars { .. }
        )
    }

    /// Check if error is an index error
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            QchanError::IndexOutOfRange { .. }
                | QchanError::IndexNotFound(_)
                | QchanError::DuplicateIndex(_)
                | QchanError::ParamLengthMismatch { .. }
                | QchanError::ShapeMismatch { .. }
        )
    }

    /// Check if the operation is unsupported for this kind
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            QchanError::NotImplemented(_)
                | QchanError::TransformNotSupported(_)
                | QchanError::CannotSetDense(_)
        )
    }

    /// Check if error only marks a missing optional capability
    pub fn is_capability_gap(&self) -> bool {
        matches!(self, QchanError::CapabilityUnavailable(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
