//! # qchan Core
//!
//! Foundation types for the parameterized quantum-operator algebra: the
//! parameter-index mapping between operators and their parents, evolution
//! types, operator bases, Lindblad term keys, polynomials and rank-one terms.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qchan_core // L0: Foundation (완료)
//!     L0_Foundation // 기반 타입/상수/에러 (완료)
//!         Errors // 에러 타입 (완료)
//!         Constants // 확장 한도/허용 오차 (완료)
//!         TermExpansionConfig // 설정 (완료)
//!         Evotype // 진화 타입 (완료)
//!         ParameterIndexMapping // compose/decompose (완료)
//!         Basis // 기저 (완료)
//!         Lindblad // 항 키/초연산자 (완료)
//!         Polynomial // 다항식 (완료)
//!         RankOneTerm // Taylor 항 (완료)
//!         SparseMatrix // CSR (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qchan_core::prelude::*;
//!
//! // A composite at global offset 10 owning 5 parameters
//! let outer = ParamIndices::slice(10, 5);
//! // A child using local positions 2..4 of the composite
//! let inner = ParamIndices::slice(2, 2);
//!
//! assert_eq!(compose(&outer, &inner).unwrap().to_vec(), vec![12, 13]);
//! assert_eq!(decompose(&outer, &inner).unwrap(), vec![2, 3]);
//! ```
//!
//! ## Lindblad Terms
//!
//! ```rust
//! use qchan_core::prelude::*;
//!
//! let basis = Basis::pauli_product(1);
//! let key = LindbladTermKey::stochastic("X");
//! let gen = term_superop(&basis, &key).unwrap();
//!
//! assert_eq!(key.to_string(), "('S','X')");
//! assert!((gen[[2, 2]] + 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Term-expansion configuration (Gantree: L0_Foundation → TermExpansionConfig)
pub mod config;

/// Evolution types (Gantree: L0_Foundation → Evotype)
pub mod evotype;

/// Parameter-index mapping (Gantree: L0_Foundation → ParameterIndexMapping)
pub mod gpindices;

/// Dense linear-algebra helpers
pub mod linalg;

/// Operator bases (Gantree: L0_Foundation → Basis)
pub mod basis;

/// Lindblad term keys and superoperators (Gantree: L0_Foundation → Lindblad)
pub mod lindblad;

/// Polynomials (Gantree: L0_Foundation → Polynomial)
pub mod polynomial;

/// Rank-one terms (Gantree: L0_Foundation → RankOneTerm)
pub mod term;

/// Sparse matrices (Gantree: L0_Foundation → SparseMatrix)
pub mod sparse;

// ============================================================================
// Re-exports
// ============================================================================

pub use basis::Basis;
pub use config::TermExpansionConfig;
pub use constants::{expansion, tolerance};
pub use error::{QchanError, QchanResult};
pub use evotype::Evotype;
pub use gpindices::{compose, decompose, is_partition, locate, ParamIndices, ParentLink, RebuildHook};
pub use lindblad::{
    term_superop, CoefficientAction, LindbladCoefficients, LindbladTermKey, TermKind,
};
pub use polynomial::{CompactPolynomial, Polynomial};
pub use sparse::SparseMatrix;
pub use term::RankOneTerm;

/// Complex scalar used for Hilbert-space matrices and polynomial coefficients
pub use num_complex::Complex64 as C64;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qchan_core::prelude::*;
    //! ```

    pub use crate::basis::Basis;
    pub use crate::config::TermExpansionConfig;
    pub use crate::constants::{expansion, tolerance};
    pub use crate::error::{QchanError, QchanResult};
    pub use crate::evotype::Evotype;
    pub use crate::gpindices::{
        compose, decompose, is_partition, locate, ParamIndices, ParentLink, RebuildHook,
    };
    pub use crate::lindblad::{
        term_superop, CoefficientAction, LindbladCoefficients, LindbladTermKey, TermKind,
    };
    pub use crate::polynomial::{CompactPolynomial, Polynomial};
    pub use crate::sparse::SparseMatrix;
    pub use crate::term::RankOneTerm;
    pub use crate::C64;
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================
