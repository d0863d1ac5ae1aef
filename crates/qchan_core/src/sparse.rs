//! Compressed sparse row matrices
//!
//! Gantree: L0_Foundation → SparseMatrix

use crate::error::{QchanError, QchanResult};
use ndarray::Array2;

/// Real CSR matrix
/// Gantree: SparseMatrix // CSR
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    shape: (usize, usize),
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Compress `dense`, dropping entries with `|x| <= tol`
    pub fn from_dense(dense: &Array2<f64>, tol: f64) -> Self {
        let shape = dense.dim();
        let mut indptr = Vec::with_capacity(shape.0 + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for row in dense.rows() {
            for (j, &x) in row.iter().enumerate() {
                if x.abs() > tol {
                    indices.push(j);
                    data.push(x);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            shape,
            indptr,
            indices,
            data,
        }
    }

    /// `n x n` identity
    pub fn identity(n: usize) -> Self {
        Self {
            shape: (n, n),
            indptr: (0..=n).collect(),
            indices: (0..n).collect(),
            data: vec![1.0; n],
        }
    }

    /// Expand to a dense matrix
    pub fn to_dense(&self) -> Array2<f64> {
        let mut out = Array2::zeros(self.shape);
        for r in 0..self.shape.0 {
            for k in self.indptr[r]..self.indptr[r + 1] {
                out[[r, self.indices[k]]] = self.data[k];
            }
        }
        out
    }

    /// Matrix shape
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Row pointer array
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// Column indices of stored entries
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Stored values
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Entry at `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.shape.0 {
            return 0.0;
        }
        let span = self.indptr[row]..self.indptr[row + 1];
        self.indices[span.clone()]
            .binary_search(&col)
            .map(|k| self.data[span.start + k])
            .unwrap_or(0.0)
    }

    /// Elementwise sum
    pub fn add(&self, other: &SparseMatrix) -> QchanResult<SparseMatrix> {
        if self.shape != other.shape {
            return Err(QchanError::ShapeMismatch {
                expected: self.shape,
                got: other.shape,
            });
        }
        let mut indptr = Vec::with_capacity(self.shape.0 + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for r in 0..self.shape.0 {
            let (mut a, a_end) = (self.indptr[r], self.indptr[r + 1]);
            let (mut b, b_end) = (other.indptr[r], other.indptr[r + 1]);
            while a < a_end || b < b_end {
                let ca = if a < a_end { self.indices[a] } else { usize::MAX };
                let cb = if b < b_end { other.indices[b] } else { usize::MAX };
                let (col, val) = match ca.cmp(&cb) {
                    std::cmp::Ordering::Less => {
                        a += 1;
                        (ca, self.data[a - 1])
                    }
                    std::cmp::Ordering::Greater => {
                        b += 1;
                        (cb, other.data[b - 1])
                    }
                    std::cmp::Ordering::Equal => {
                        a += 1;
                        b += 1;
                        (ca, self.data[a - 1] + other.data[b - 1])
                    }
                };
                if val != 0.0 {
                    indices.push(col);
                    data.push(val);
                }
            }
            indptr.push(indices.len());
        }
        Ok(SparseMatrix {
            shape: self.shape,
            indptr,
            indices,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dense_roundtrip() {
        let m = array![[1.0, 0.0, 0.0], [0.0, 0.0, -2.0], [0.5, 0.0, 0.0]];
        let s = SparseMatrix::from_dense(&m, 0.0);
        assert_eq!(s.nnz(), 3);
        assert_eq!(s.indptr(), &[0, 1, 2, 3]);
        assert_eq!(s.get(1, 2), -2.0);
        assert_eq!(s.get(1, 1), 0.0);
        assert_eq!(s.to_dense(), m);
    }

    #[test]
    fn test_add_cancels() {
        let a = SparseMatrix::identity(2);
        let b = SparseMatrix::from_dense(&array![[-1.0, 3.0], [0.0, 1.0]], 0.0);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.to_dense(), array![[0.0, 3.0], [0.0, 2.0]]);
        assert_eq!(sum.nnz(), 2);
    }

    #[test]
    fn test_add_shape_mismatch() {
        let err = SparseMatrix::identity(2).add(&SparseMatrix::identity(3)).unwrap_err();
        assert!(err.is_index_error());
    }
}
