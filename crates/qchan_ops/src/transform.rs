//! Similarity transforms and parameter projection
//!
//! Gantree: L1_Operators → Similarity
//!
//! A gauge-group element `S` acts on superoperators as `O -> S⁻¹ O S`.
//! Operators whose parameterization is not every matrix element bring the
//! transformed matrix back to parameters by least-squares projection onto
//! their generating superoperators.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use qchan_core::linalg::frobenius_norm_real;
use qchan_core::{tolerance, QchanError, QchanResult};

/// ndarray → nalgebra
pub(crate) fn to_dmatrix(m: &Array2<f64>) -> DMatrix<f64> {
    let (r, c) = m.dim();
    DMatrix::from_fn(r, c, |i, j| m[[i, j]])
}

/// nalgebra → ndarray
pub(crate) fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Invertible similarity transform
/// Gantree: Similarity // S, S⁻¹
#[derive(Debug, Clone, PartialEq)]
pub struct Similarity {
    s: Array2<f64>,
    s_inv: Array2<f64>,
}

impl Similarity {
    /// Transform for the square matrix `s`; fails when `s` is singular
    pub fn new(s: Array2<f64>) -> QchanResult<Self> {
        if s.nrows() != s.ncols() {
            return Err(QchanError::ShapeMismatch {
                expected: (s.nrows(), s.nrows()),
                got: s.dim(),
            });
        }
        let inv = to_dmatrix(&s)
            .try_inverse()
            .ok_or_else(|| QchanError::SingularMatrix("similarity transform".to_string()))?;
        Ok(Self {
            s_inv: from_dmatrix(&inv),
            s,
        })
    }

    /// Identity transform of size `dim`
    pub fn identity(dim: usize) -> Self {
        Self {
            s: Array2::eye(dim),
            s_inv: Array2::eye(dim),
        }
    }

    /// `S`
    pub fn s(&self) -> &Array2<f64> {
        &self.s
    }

    /// `S⁻¹`
    pub fn s_inv(&self) -> &Array2<f64> {
        &self.s_inv
    }

    /// Matrix size
    pub fn dim(&self) -> usize {
        self.s.nrows()
    }

    /// Whether `S` is the identity
    pub fn is_identity(&self) -> bool {
        frobenius_norm_real(&(&self.s - &Array2::<f64>::eye(self.dim()))) < tolerance::IDENTITY
    }

    /// `S⁻¹ op S`
    pub fn apply(&self, op: &Array2<f64>) -> QchanResult<Array2<f64>> {
        if op.dim() != self.s.dim() {
            return Err(QchanError::ShapeMismatch {
                expected: self.s.dim(),
                got: op.dim(),
            });
        }
        Ok(self.s_inv.dot(op).dot(&self.s))
    }
}

/// Least-squares coefficients `x` minimizing `|target - Σ x_i components_i|`
/// and the Frobenius norm of the remaining residual
pub fn project_onto(
    target: &Array2<f64>,
    components: &[Array2<f64>],
) -> QchanResult<(Array1<f64>, f64)> {
    let n = components.len();
    if n == 0 {
        return Ok((Array1::zeros(0), frobenius_norm_real(target)));
    }
    let cols = target.len();
    let mut a = DMatrix::<f64>::zeros(cols, n);
    for (j, comp) in components.iter().enumerate() {
        if comp.dim() != target.dim() {
            return Err(QchanError::ShapeMismatch {
                expected: target.dim(),
                got: comp.dim(),
            });
        }
        for (i, &x) in comp.iter().enumerate() {
            a[(i, j)] = x;
        }
    }
    let b = DMatrix::from_iterator(cols, 1, target.iter().copied());
    let x = a
        .clone()
        .svd(true, true)
        .solve(&b, 1e-12)
        .map_err(|e| QchanError::SingularMatrix(e.to_string()))?;

    let fitted = &a * &x;
    let residual = (&b - &fitted).norm();
    Ok((Array1::from_iter(x.iter().copied()), residual))
}

/// [`project_onto`], failing with `TransformNotSupported` when the residual
/// exceeds the transform tolerance
pub fn project_exact(
    target: &Array2<f64>,
    components: &[Array2<f64>],
    what: &str,
) -> QchanResult<Array1<f64>> {
    let (x, residual) = project_onto(target, components)?;
    if residual > tolerance::TRANSFORM {
        return Err(QchanError::TransformNotSupported(format!(
            "{} cannot represent the transformed map (residual {:e})",
            what, residual
        )));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_similarity_inverse() {
        let s = Similarity::new(array![[2.0, 0.0], [1.0, 1.0]]).unwrap();
        let prod = s.s().dot(s.s_inv());
        assert_abs_diff_eq!(prod[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(prod[[1, 0]], 0.0, epsilon = 1e-12);
        assert!(!s.is_identity());
        assert!(Similarity::identity(3).is_identity());
    }

    #[test]
    fn test_singular_rejected() {
        let err = Similarity::new(array![[1.0, 2.0], [2.0, 4.0]]).unwrap_err();
        assert!(matches!(err, QchanError::SingularMatrix(_)));
    }

    #[test]
    fn test_apply_conjugates() {
        let s = Similarity::new(array![[1.0, 1.0], [0.0, 1.0]]).unwrap();
        let op = Array2::eye(2);
        let out = s.apply(&op).unwrap();
        assert_abs_diff_eq!(out[[0, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[1, 1]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projection() {
        let c1 = array![[1.0, 0.0], [0.0, 0.0]];
        let c2 = array![[0.0, 0.0], [0.0, 1.0]];
        let target = array![[0.5, 0.0], [0.0, -2.0]];
        let x = project_exact(&target, &[c1.clone(), c2.clone()], "diag").unwrap();
        assert_abs_diff_eq!(x[0], 0.5, epsilon = 1e-10);
        assert_abs_diff_eq!(x[1], -2.0, epsilon = 1e-10);

        let off = array![[0.0, 1.0], [0.0, 0.0]];
        let err = project_exact(&off, &[c1, c2], "diag").unwrap_err();
        assert!(err.is_unsupported());
    }
}
