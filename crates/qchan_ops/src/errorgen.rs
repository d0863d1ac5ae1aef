//! The error-generator contract
//!
//! Gantree: L1_Operators → ErrorGenerator
//!
//! An error generator is an operator whose value is the generator `L` of a
//! channel `exp(L)`, a sum of Lindblad terms. Its parameters are read and
//! written through a coefficient dictionary keyed by [`LindbladTermKey`].
//!
//! All physical content of an error generator sits at Taylor order 0 of the
//! enclosing operator's expansion; asking for any other order is a caller
//! bug and panics.

use crate::operator::LinearOperator;
use ndarray::{Array1, Array2};
use qchan_core::{
    Basis, CoefficientAction, LindbladCoefficients, LindbladTermKey, QchanResult,
};
use std::sync::Arc;

/// Panic unless `order` is 0
pub(crate) fn assert_order_zero(kind: &str, order: usize) {
    assert!(
        order == 0,
        "{} only has order-0 Taylor terms (requested order {})",
        kind,
        order
    );
}

/// A sum of Lindblad terms with dictionary-addressable coefficients
/// Gantree: ErrorGenerator // trait : LinearOperator
pub trait ErrorGenerator: LinearOperator {
    /// Coefficient of every term, keyed by term. With `logscale_nonham`,
    /// stochastic coefficients `c` are reported as rates `(1 - exp(-d²c))/d²`.
    fn coefficients(&self, logscale_nonham: bool) -> QchanResult<LindbladCoefficients>;

    /// Basis the coefficient labels refer to, if any
    fn coefficient_basis(&self) -> QchanResult<Option<Arc<Basis>>>;

    /// Basis the superoperator matrix is expressed in, if any. Generators
    /// summed together must share it.
    fn matrix_basis(&self) -> Option<Arc<Basis>>;

    /// Coefficients together with their basis
    fn coefficients_with_basis(
        &self,
        logscale_nonham: bool,
    ) -> QchanResult<(LindbladCoefficients, Option<Arc<Basis>>)> {
        Ok((self.coefficients(logscale_nonham)?, self.coefficient_basis()?))
    }

    /// Term keys in coefficient-array order
    fn coefficient_keys(&self) -> Vec<LindbladTermKey>;

    /// Real coefficients in coefficient-array order
    fn coefficients_array(&self) -> Array1<f64>;

    /// Jacobian of [`ErrorGenerator::coefficients_array`] w.r.t. the local
    /// parameters, shape `(num_coeffs, num_params)`
    fn coefficients_array_deriv_wrt_params(&self) -> QchanResult<Array2<f64>>;

    /// Write coefficients for the given keys
    fn set_coefficients(
        &mut self,
        coefficients: &LindbladCoefficients,
        action: CoefficientAction,
        logscale_nonham: bool,
    ) -> QchanResult<()>;

    /// Coefficients reported as error rates
    fn error_rates(&self) -> QchanResult<LindbladCoefficients> {
        self.coefficients(true)
    }

    /// Write coefficients given as error rates
    fn set_error_rates(
        &mut self,
        rates: &LindbladCoefficients,
        action: CoefficientAction,
    ) -> QchanResult<()> {
        self.set_coefficients(rates, action, true)
    }

    /// Upper bound on the induced 1-norm of the generator
    fn onenorm_upperbound(&self) -> QchanResult<f64>;
}
