//! Small dense linear-algebra helpers over ndarray

use num_complex::Complex64 as C64;
use ndarray::{Array1, Array2};

/// Kronecker product `a ⊗ b`
pub fn kron(a: &Array2<C64>, b: &Array2<C64>) -> Array2<C64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(i, j)| {
        a[[i / br, j / bc]] * b[[i % br, j % bc]]
    })
}

/// Conjugate transpose
pub fn dagger(m: &Array2<C64>) -> Array2<C64> {
    m.t().mapv(|z| z.conj())
}

/// Matrix trace
pub fn trace(m: &Array2<C64>) -> C64 {
    m.diag().sum()
}

/// Identity matrix of size `n`
pub fn identity(n: usize) -> Array2<C64> {
    Array2::from_shape_fn((n, n), |(i, j)| if i == j { C64::new(1.0, 0.0) } else { C64::new(0.0, 0.0) })
}

/// Frobenius norm of a complex matrix
pub fn frobenius_norm(m: &Array2<C64>) -> f64 {
    m.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt()
}

/// Frobenius norm of a real matrix
pub fn frobenius_norm_real(m: &Array2<f64>) -> f64 {
    m.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Induced 1-norm (maximum absolute column sum)
pub fn onenorm(m: &Array2<f64>) -> f64 {
    m.columns()
        .into_iter()
        .map(|c| c.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Row-major flattening of a matrix
pub fn flatten(m: &Array2<f64>) -> Array1<f64> {
    m.iter().copied().collect()
}
