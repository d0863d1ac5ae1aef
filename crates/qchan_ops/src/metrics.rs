//! Distance metrics between superoperators
//!
//! Gantree: L1_Operators → Metrics
//!
//! Frobenius and Jamiołkowski trace distances are always available. The
//! diamond distance needs a convex-optimization backend, modeled as the
//! [`DiamondNormSolver`] capability.

use crate::transform::Similarity;
use nalgebra::{Complex, DMatrix};
use ndarray::Array2;
use qchan_core::linalg::kron;
use qchan_core::{Basis, QchanError, QchanResult, C64};

// ============================================================================
// Diamond-norm Capability
// ============================================================================

/// Backend able to evaluate the diamond norm of a superoperator
/// Gantree: DiamondNormSolver // 다이아몬드 노름
pub trait DiamondNormSolver {
    /// Solver name, for messages
    fn name(&self) -> &str;

    /// Whether the backend can be used
    fn is_available(&self) -> bool;

    /// `‖m‖◇` for the superoperator `m` expressed in `basis`
    fn diamond_norm(&self, m: &Array2<f64>, basis: &Basis) -> QchanResult<f64>;
}

/// Placeholder used when no optimization backend is linked in
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiamondSolver;

impl DiamondNormSolver for NoDiamondSolver {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn diamond_norm(&self, _m: &Array2<f64>, _basis: &Basis) -> QchanResult<f64> {
        Err(QchanError::CapabilityUnavailable(
            "diamond norm requires a convex-optimization backend".to_string(),
        ))
    }
}

// ============================================================================
// Distances
// ============================================================================

fn check_shapes(a: &Array2<f64>, b: &Array2<f64>) -> QchanResult<()> {
    if a.dim() != b.dim() {
        return Err(QchanError::ShapeMismatch {
            expected: a.dim(),
            got: b.dim(),
        });
    }
    Ok(())
}

/// `a` after the optional similarity transform
pub fn transformed(a: &Array2<f64>, transform: Option<&Similarity>) -> QchanResult<Array2<f64>> {
    match transform {
        Some(s) => s.apply(a),
        None => Ok(a.clone()),
    }
}

/// Squared Frobenius distance
pub fn frobeniusdist_squared(a: &Array2<f64>, b: &Array2<f64>) -> QchanResult<f64> {
    check_shapes(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum())
}

/// Frobenius distance
pub fn frobeniusdist(a: &Array2<f64>, b: &Array2<f64>) -> QchanResult<f64> {
    Ok(frobeniusdist_squared(a, b)?.sqrt())
}

/// Choi matrix of the superoperator `m` expressed in `basis`
///
/// `J = (1/d) Σ_ab m[a,b] B_a ⊗ conj(B_b)`, unit trace for trace-preserving maps.
pub fn jamiolkowski(m: &Array2<f64>, basis: &Basis) -> QchanResult<Array2<C64>> {
    let n = basis.size();
    if m.dim() != (n, n) {
        return Err(QchanError::BasisSizeMismatch {
            basis: basis.name().to_string(),
            size: n,
            dim: m.nrows(),
        });
    }
    let d = basis.hilbert_dim();
    let elements = basis.elements();
    let conj: Vec<Array2<C64>> = elements.iter().map(|e| e.mapv(|z| z.conj())).collect();
    let mut choi = Array2::<C64>::zeros((d * d, d * d));
    for a in 0..n {
        for b in 0..n {
            let w = m[[a, b]];
            if w != 0.0 {
                choi.scaled_add(C64::new(w / d as f64, 0.0), &kron(&elements[a], &conj[b]));
            }
        }
    }
    Ok(choi)
}

/// Eigenvalues of a Hermitian matrix
pub fn hermitian_eigenvalues(h: &Array2<C64>) -> Vec<f64> {
    let n = h.nrows();
    let m = DMatrix::<Complex<f64>>::from_fn(n, n, |i, j| {
        // symmetrize away round-off
        (h[[i, j]] + h[[j, i]].conj()) * 0.5
    });
    m.symmetric_eigenvalues().iter().copied().collect()
}

/// Jamiołkowski trace distance `½ ‖J(a) - J(b)‖₁`
pub fn jtracedist(a: &Array2<f64>, b: &Array2<f64>, basis: &Basis) -> QchanResult<f64> {
    check_shapes(a, b)?;
    let diff = jamiolkowski(a, basis)? - jamiolkowski(b, basis)?;
    Ok(0.5 * hermitian_eigenvalues(&diff).iter().map(|x| x.abs()).sum::<f64>())
}

/// Half the diamond norm of `a - b`
pub fn diamonddist(
    a: &Array2<f64>,
    b: &Array2<f64>,
    basis: &Basis,
    solver: &dyn DiamondNormSolver,
) -> QchanResult<f64> {
    check_shapes(a, b)?;
    if !solver.is_available() {
        log::warn!(
            "diamond distance unavailable: solver '{}' is not installed",
            solver.name()
        );
        return Err(QchanError::CapabilityUnavailable(format!(
            "diamond-norm solver '{}'",
            solver.name()
        )));
    }
    Ok(0.5 * solver.diamond_norm(&(a - b), basis)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_frobenius() {
        let a = Array2::eye(2);
        let b = array![[1.0, 0.0], [0.0, 0.5]];
        assert_abs_diff_eq!(frobeniusdist(&a, &b).unwrap(), 0.5);
        assert!(frobeniusdist(&a, &Array2::eye(3)).is_err());
    }

    #[test]
    fn test_choi_of_identity_has_unit_trace() {
        let basis = Basis::pauli_product(1);
        let choi = jamiolkowski(&Array2::eye(4), &basis).unwrap();
        let tr: C64 = choi.diag().sum();
        assert_abs_diff_eq!(tr.re, 1.0, epsilon = 1e-12);
        // maximally entangled projector has a single unit eigenvalue
        let mut eig = hermitian_eigenvalues(&choi);
        eig.sort_by(|x, y| y.total_cmp(x));
        assert_abs_diff_eq!(eig[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(eig[1], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_jtracedist_depolarizing() {
        let basis = Basis::pauli_product(1);
        let a = Array2::eye(4);
        let b = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0]
        ];
        // identity vs. complete depolarization
        assert_abs_diff_eq!(jtracedist(&a, &b, &basis).unwrap(), 0.75, epsilon = 1e-10);
        assert_abs_diff_eq!(jtracedist(&a, &a, &basis).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diamond_unavailable_is_soft() {
        let basis = Basis::pauli_product(1);
        let a = Array2::eye(4);
        let err = diamonddist(&a, &a, &basis, &NoDiamondSolver).unwrap_err();
        assert!(err.is_capability_gap());
    }
}
