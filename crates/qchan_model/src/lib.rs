//! # qchan Model
//!
//! Top-level owner of the global parameter vector. Operators added to an
//! [`OpModel`] receive contiguous slices of it, and report parameter-count
//! changes back through their parent link.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qchan_model // L2: Model (완료)
//!     L2_Model // 전역 파라미터 (완료)
//!         OpModel // 레이아웃 + 재구성 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qchan_model::prelude::*;
//!
//! let mut model = OpModel::new(4, Evotype::DensityMx);
//! let noise = StochasticNoiseOp::new(4, "pp", Evotype::DensityMx, Some(&[0.01, 0.0, 0.0]), None).unwrap();
//! model.add_operator("Gi", Box::new(noise)).unwrap();
//!
//! assert_eq!(model.num_params().unwrap(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Parameter ownership (Gantree: L2_Model → OpModel)
pub mod model;

pub use model::OpModel;

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qchan_model::prelude::*;
    //! ```

    pub use crate::model::OpModel;
    pub use qchan_ops::prelude::*;
}

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
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "qchan_model");
    }

    #[test]
    fn test_nested_growth_scenario() {
        let basis = Arc::new(Basis::pauli_product(1));
        let mut model = OpModel::new(4, Evotype::DensityMx);
        let ham = LindbladErrorgen::hamiltonian(basis.clone(), &[("X", 0.1), ("Y", 0.2), ("Z", 0.3)], Evotype::DensityMx)
            .unwrap();
        model
            .add_operator("Gx", Box::new(ComposedErrorgen::new(vec![Box::new(ham)], None, None).unwrap()))
            .unwrap();
        assert_eq!(model.num_params().unwrap(), 3);

        let sto = LindbladErrorgen::stochastic(basis, &[("X", 0.01), ("Z", 0.09)], NonHamMode::Squared, Evotype::DensityMx)
            .unwrap();
        let composite = model.operator_as_mut::<ComposedErrorgen>("Gx").unwrap();
        composite.append(vec![Box::new(sto)]).unwrap();

        let v = model.to_vector().unwrap();
        assert_eq!(v.len(), 5);
        assert_abs_diff_eq!(v[3], 0.1, epsilon = 1e-15);
        assert_abs_diff_eq!(v[4], 0.3, epsilon = 1e-15);

        let coeffs = model
            .operator_as::<ComposedErrorgen>("Gx")
            .unwrap()
            .coefficients(false)
            .unwrap();
        assert_abs_diff_eq!(coeffs[&LindbladTermKey::stochastic("Z")].re, 0.09, epsilon = 1e-12);
    }
}
