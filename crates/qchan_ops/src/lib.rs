//! # qchan Ops
//!
//! Parameterized operators over the `qchan_core` foundation: the
//! [`LinearOperator`] contract, evolution-type representations, distance
//! metrics, error generators and their sums, stochastic noise, and the
//! Taylor-term expansion engine.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qchan_ops // L1: Operators (완료)
//!     L1_Operators // 연산자 계층 (완료)
//!         LinearOperator // 공통 계약 + 항 전개 엔진 (완료)
//!         OpRep // 진화 타입 표현 (완료)
//!         ChpRep // CHP 프로그램 (완료)
//!         Similarity // 게이지 변환 (완료)
//!         Metrics // 거리 (완료)
//!         DenseOperator // 밀집 연산자 (완료)
//!         ErrorGenerator // 오류 생성자 계약 (완료)
//!         LindbladErrorgen // H/S/A 항 (완료)
//!         ComposedErrorgen // 생성자 합 (완료)
//!         StochasticNoiseOp // 확률적 잡음 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qchan_ops::prelude::*;
//!
//! let op = StochasticNoiseOp::new(4, "pp", Evotype::DensityMx, Some(&[0.1, 0.0, 0.0]), None).unwrap();
//! let dense = op.to_dense().unwrap();
//!
//! assert_eq!(dense[[0, 0]], 1.0);
//! assert!((dense[[2, 2]] - 0.9).abs() < 1e-12);
//! ```
//!
//! ## Composing Error Generators
//!
//! ```rust
//! use qchan_ops::prelude::*;
//! use std::sync::Arc;
//!
//! let basis = Arc::new(Basis::pauli_product(1));
//! let f1 = LindbladErrorgen::hamiltonian(basis.clone(), &[("X", 0.01)], Evotype::DensityMx).unwrap();
//! let f2 = LindbladErrorgen::hamiltonian(basis, &[("X", 0.02)], Evotype::DensityMx).unwrap();
//!
//! let composed = ComposedErrorgen::new(vec![Box::new(f1), Box::new(f2)], None, None).unwrap();
//! let coeffs = composed.coefficients(false).unwrap();
//! assert!((coeffs[&LindbladTermKey::ham("X")].re - 0.03).abs() < 1e-15);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// The operator contract and term expansion (Gantree: L1_Operators → LinearOperator)
pub mod operator;

/// Evolution-type representations (Gantree: L1_Operators → OpRep)
pub mod rep;

/// CHP programs (Gantree: L1_Operators → ChpRep)
pub mod chp;

/// Similarity transforms and projections (Gantree: L1_Operators → Similarity)
pub mod transform;

/// Distance metrics (Gantree: L1_Operators → Metrics)
pub mod metrics;

/// Dense operators (Gantree: L1_Operators → DenseOperator)
pub mod dense;

/// Error-generator contract (Gantree: L1_Operators → ErrorGenerator)
pub mod errorgen;

/// Lindblad error generators (Gantree: L1_Operators → LindbladErrorgen)
pub mod lindblad_errorgen;

/// Sums of error generators (Gantree: L1_Operators → ComposedErrorgen)
pub mod composed;

/// Stochastic noise (Gantree: L1_Operators → StochasticNoiseOp)
pub mod stochastic;

// ============================================================================
// Re-exports
// ============================================================================

pub use chp::{standard_chp_conversion, ChpRep};
pub use composed::ComposedErrorgen;
pub use dense::{DenseOperator, DenseParameterization, StaticUnitaryOp};
pub use errorgen::ErrorGenerator;
pub use lindblad_errorgen::{LindbladErrorgen, NonHamMode};
pub use metrics::{DiamondNormSolver, NoDiamondSolver};
pub use operator::{HighMagnitudeTerms, LinearOperator, MemberState, TaylorTerms, TermCache};
pub use rep::{OpRep, StateRep};
pub use stochastic::{BasisSpec, StochasticNoiseOp};
pub use transform::Similarity;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qchan_ops::prelude::*;
    //! ```

    pub use crate::chp::ChpRep;
    pub use crate::composed::ComposedErrorgen;
    pub use crate::dense::{DenseOperator, DenseParameterization, StaticUnitaryOp};
    pub use crate::errorgen::ErrorGenerator;
    pub use crate::lindblad_errorgen::{LindbladErrorgen, NonHamMode};
    pub use crate::metrics::{DiamondNormSolver, NoDiamondSolver};
    pub use crate::operator::{HighMagnitudeTerms, LinearOperator, TaylorTerms};
    pub use crate::rep::{OpRep, StateRep};
    pub use crate::stochastic::{BasisSpec, StochasticNoiseOp};
    pub use crate::transform::Similarity;
    pub use qchan_core::prelude::*;
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

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{s, Array2};
    use std::sync::Arc;

    fn pp1() -> Arc<Basis> {
        Arc::new(Basis::pauli_product(1))
    }

    #[test]
    fn test_stochastic_scenario() {
        let op = StochasticNoiseOp::new(4, "pp", Evotype::DensityMx, Some(&[0.1, 0.0, 0.0]), None)
            .unwrap();
        let ident = DenseOperator::new_static(Array2::eye(4)).unwrap();
        assert_eq!(op.to_dense().unwrap()[[0, 0]], 1.0);
        assert_abs_diff_eq!(
            op.frobeniusdist(&ident, None).unwrap(),
            (2.0f64 * 0.01).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_composed_scenario() {
        let basis = pp1();
        let f1 = LindbladErrorgen::hamiltonian(basis.clone(), &[("X", 0.01)], Evotype::DensityMx).unwrap();
        let f2 = LindbladErrorgen::hamiltonian(basis, &[("X", 0.02)], Evotype::DensityMx).unwrap();
        let composed = ComposedErrorgen::new(vec![Box::new(f1), Box::new(f2)], None, None).unwrap();
        assert_abs_diff_eq!(
            composed.coefficients(false).unwrap()[&LindbladTermKey::ham("X")].re,
            0.03,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_append_scenario() {
        let basis = pp1();
        let three = LindbladErrorgen::hamiltonian(
            basis.clone(),
            &[("X", 0.1), ("Y", 0.2), ("Z", 0.3)],
            Evotype::DensityMx,
        )
        .unwrap();
        let two = LindbladErrorgen::stochastic(
            basis,
            &[("X", 0.01), ("Z", 0.09)],
            NonHamMode::Squared,
            Evotype::DensityMx,
        )
        .unwrap();
        let two_v = two.to_vector();

        let mut composed = ComposedErrorgen::new(vec![Box::new(three)], None, None).unwrap();
        composed.append(vec![Box::new(two)]).unwrap();
        assert_eq!(composed.num_params(), 5);
        assert_eq!(composed.to_vector().slice(s![3..5]), two_v);
    }

    #[test]
    #[should_panic]
    fn test_errorgen_order_contract() {
        let mut gen = LindbladErrorgen::hamiltonian(pp1(), &[("Z", 0.01)], Evotype::Term).unwrap();
        let _ = gen.taylor_order_terms(2, 100, false);
    }

    #[test]
    fn test_diamond_distance_is_a_capability() {
        let a = DenseOperator::new_static(Array2::eye(4)).unwrap();
        let b = StochasticNoiseOp::new(4, "pp", Evotype::DensityMx, Some(&[0.0, 0.0, 0.1]), None)
            .unwrap();
        let basis = Basis::pauli_product(1);
        let err = a.diamonddist(&b, &basis, None, &NoDiamondSolver).unwrap_err();
        assert!(err.is_capability_gap());
        assert!(a.jtracedist(&b, &basis, None).unwrap() > 0.0);
    }

    #[test]
    fn test_gauge_transform_of_composite() {
        let basis = pp1();
        let gen = LindbladErrorgen::stochastic(
            basis,
            &[("X", 0.02), ("Y", 0.02), ("Z", 0.02)],
            NonHamMode::Squared,
            Evotype::DensityMx,
        )
        .unwrap();
        let mut composed = ComposedErrorgen::new(vec![Box::new(gen)], None, None).unwrap();
        let before = composed.to_dense().unwrap();
        let mut s = Array2::eye(4);
        s[[1, 1]] = 0.5;
        s[[2, 2]] = 0.5;
        s[[3, 3]] = 0.5;
        composed.transform_inplace(&Similarity::new(s).unwrap()).unwrap();
        let after = composed.to_dense().unwrap();
        for (x, y) in before.iter().zip(after.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-10);
        }
    }
}
