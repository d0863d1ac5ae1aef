//! Dense operators
//!
//! Gantree: L1_Operators → DenseOperator
//!
//! Density-matrix superoperators stored as full matrices, either static
//! (no parameters) or fully parameterized (every element a parameter),
//! plus a static unitary for the state-vector evolution type.

use crate::operator::{filter_deriv, LinearOperator, MemberState};
use crate::rep::OpRep;
use crate::transform::Similarity;
use ndarray::{Array1, Array2, ArrayView1};
use qchan_core::linalg::frobenius_norm_real;
use qchan_core::{tolerance, Evotype, QchanError, QchanResult, C64};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// How a dense operator's matrix maps to parameters
/// Gantree: DenseParameterization // static/full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenseParameterization {
    /// No parameters
    Static,
    /// One parameter per matrix element, row-major
    Full,
}

/// Dense density-matrix superoperator
/// Gantree: DenseOperator // densitymx
#[derive(Debug, Clone)]
pub struct DenseOperator {
    matrix: Array2<f64>,
    parameterization: DenseParameterization,
    member: MemberState,
}

impl DenseOperator {
    /// Operator with the given matrix and parameterization
    pub fn new(matrix: Array2<f64>, parameterization: DenseParameterization) -> QchanResult<Self> {
        if matrix.nrows() != matrix.ncols() {
            return Err(QchanError::ShapeMismatch {
                expected: (matrix.nrows(), matrix.nrows()),
                got: matrix.dim(),
            });
        }
        Ok(Self {
            matrix,
            parameterization,
            member: MemberState::new(),
        })
    }

    /// Static operator
    pub fn new_static(matrix: Array2<f64>) -> QchanResult<Self> {
        Self::new(matrix, DenseParameterization::Static)
    }

    /// Fully parameterized operator
    pub fn new_full(matrix: Array2<f64>) -> QchanResult<Self> {
        Self::new(matrix, DenseParameterization::Full)
    }

    /// Identity of dimension `dim`
    pub fn identity(dim: usize, parameterization: DenseParameterization) -> Self {
        Self {
            matrix: Array2::eye(dim),
            parameterization,
            member: MemberState::new(),
        }
    }

    /// Parameterization
    pub fn parameterization(&self) -> DenseParameterization {
        self.parameterization
    }

    /// Current matrix
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

impl LinearOperator for DenseOperator {
    fn kind(&self) -> &'static str {
        match self.parameterization {
            DenseParameterization::Static => "StaticDenseOp",
            DenseParameterization::Full => "FullDenseOp",
        }
    }

    fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn evotype(&self) -> Evotype {
        Evotype::DensityMx
    }

    fn member(&self) -> &MemberState {
        &self.member
    }

    fn member_mut(&mut self) -> &mut MemberState {
        &mut self.member
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn num_params(&self) -> usize {
        match self.parameterization {
            DenseParameterization::Static => 0,
            DenseParameterization::Full => self.matrix.len(),
        }
    }

    fn to_vector(&self) -> Array1<f64> {
        match self.parameterization {
            DenseParameterization::Static => Array1::zeros(0),
            DenseParameterization::Full => self.matrix.iter().copied().collect(),
        }
    }

    fn from_vector(&mut self, v: ArrayView1<f64>, dirty: bool) -> QchanResult<()> {
        if v.len() != self.num_params() {
            return Err(QchanError::ParamLengthMismatch {
                expected: self.num_params(),
                got: v.len(),
            });
        }
        if self.parameterization == DenseParameterization::Full {
            self.matrix.iter_mut().zip(v.iter()).for_each(|(m, x)| *m = *x);
        }
        self.set_dirty(dirty);
        Ok(())
    }

    fn parameter_labels(&self) -> Vec<String> {
        match self.parameterization {
            DenseParameterization::Static => Vec::new(),
            DenseParameterization::Full => {
                let d = self.dim();
                (0..d * d)
                    .map(|k| format!("MxElement {},{}", k / d, k % d))
                    .collect()
            }
        }
    }

    fn rep(&self) -> QchanResult<OpRep> {
        Ok(OpRep::DensityMx(self.matrix.clone()))
    }

    fn set_dense(&mut self, m: &Array2<f64>) -> QchanResult<()> {
        if self.parameterization == DenseParameterization::Static {
            return Err(QchanError::CannotSetDense(self.kind().to_string()));
        }
        if m.dim() != self.matrix.dim() {
            return Err(QchanError::ShapeMismatch {
                expected: self.matrix.dim(),
                got: m.dim(),
            });
        }
        self.matrix.assign(m);
        self.set_dirty(true);
        Ok(())
    }

    fn transform_inplace(&mut self, s: &Similarity) -> QchanResult<()> {
        match self.parameterization {
            DenseParameterization::Static => {
                let moved = s.apply(&self.matrix)?;
                if frobenius_norm_real(&(&moved - &self.matrix)) > tolerance::TRANSFORM {
                    return Err(QchanError::TransformNotSupported(format!(
                        "{} cannot change under a similarity transform",
                        self.kind()
                    )));
                }
                Ok(())
            }
            DenseParameterization::Full => {
                self.matrix = s.apply(&self.matrix)?;
                self.set_dirty(true);
                Ok(())
            }
        }
    }

    fn deriv_wrt_params(&self, wrt_filter: Option<&[usize]>) -> QchanResult<Array2<f64>> {
        let n = self.num_params();
        let deriv = match self.parameterization {
            DenseParameterization::Static => Array2::zeros((self.size(), 0)),
            DenseParameterization::Full => Array2::eye(n),
        };
        filter_deriv(deriv, wrt_filter)
    }

    fn has_nonzero_hessian(&self) -> bool {
        false
    }
}

impl fmt::Display for DenseOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} with shape {:?}", self.kind(), self.matrix.dim())?;
        write!(f, "{:.4}", self.matrix)
    }
}

// ============================================================================
// Static Unitary
// ============================================================================

/// Static unitary on state vectors
/// Gantree: StaticUnitaryOp // statevec
#[derive(Debug, Clone)]
pub struct StaticUnitaryOp {
    unitary: Array2<C64>,
    member: MemberState,
}

impl StaticUnitaryOp {
    /// Operator for the square matrix `unitary`
    pub fn new(unitary: Array2<C64>) -> QchanResult<Self> {
        if unitary.nrows() != unitary.ncols() {
            return Err(QchanError::ShapeMismatch {
                expected: (unitary.nrows(), unitary.nrows()),
                got: unitary.dim(),
            });
        }
        Ok(Self {
            unitary,
            member: MemberState::new(),
        })
    }

    /// The unitary
    pub fn unitary(&self) -> &Array2<C64> {
        &self.unitary
    }
}

impl LinearOperator for StaticUnitaryOp {
    fn kind(&self) -> &'static str {
        "StaticUnitaryOp"
    }

    fn dim(&self) -> usize {
        self.unitary.nrows()
    }

    fn evotype(&self) -> Evotype {
        Evotype::StateVec
    }

    fn member(&self) -> &MemberState {
        &self.member
    }

    fn member_mut(&mut self) -> &mut MemberState {
        &mut self.member
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn num_params(&self) -> usize {
        0
    }

    fn to_vector(&self) -> Array1<f64> {
        Array1::zeros(0)
    }

    fn from_vector(&mut self, v: ArrayView1<f64>, dirty: bool) -> QchanResult<()> {
        if !v.is_empty() {
            return Err(QchanError::ParamLengthMismatch {
                expected: 0,
                got: v.len(),
            });
        }
        self.set_dirty(dirty);
        Ok(())
    }

    fn rep(&self) -> QchanResult<OpRep> {
        Ok(OpRep::StateVec(self.unitary.clone()))
    }

    fn has_nonzero_hessian(&self) -> bool {
        false
    }
}
