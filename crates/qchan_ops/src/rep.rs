//! Evolution-type representations
//!
//! Gantree: L1_Operators → OpRep
//!
//! One variant per evolution type an operator can materialize as. Each
//! variant answers the same capability set (`act`, `to_dense`, `to_sparse`,
//! `compose_sum`) and reports `NotImplemented` where the kind has no
//! meaningful answer.

use crate::chp::ChpRep;
use ndarray::{Array1, Array2};
use qchan_core::{Evotype, QchanError, QchanResult, SparseMatrix, C64};

/// State a representation acts on
/// Gantree: StateRep // 상태 표현
#[derive(Debug, Clone, PartialEq)]
pub enum StateRep {
    /// Vectorized density matrix in the operator's basis
    DensityMx(Array1<f64>),
    /// Pure state vector
    StateVec(Array1<C64>),
}

impl StateRep {
    /// Evolution type of the state
    pub fn evotype(&self) -> Evotype {
        match self {
            StateRep::DensityMx(_) => Evotype::DensityMx,
            StateRep::StateVec(_) => Evotype::StateVec,
        }
    }
}

/// Operator representation
/// Gantree: OpRep // densitymx/statevec/chp/term
#[derive(Debug, Clone, PartialEq)]
pub enum OpRep {
    /// Real superoperator on vectorized density matrices
    DensityMx(Array2<f64>),
    /// Unitary on state vectors
    StateVec(Array2<C64>),
    /// CHP primitive-op program
    Chp(ChpRep),
    /// Perturbative-only operator of dimension `dim`
    Term {
        /// Superoperator dimension
        dim: usize,
    },
}

impl OpRep {
    /// Evolution type of the representation
    pub fn evotype(&self) -> Evotype {
        match self {
            OpRep::DensityMx(_) => Evotype::DensityMx,
            OpRep::StateVec(_) => Evotype::StateVec,
            OpRep::Chp(_) => Evotype::Chp,
            OpRep::Term { .. } => Evotype::Term,
        }
    }

    /// Apply to `state`
    pub fn act(&self, state: &StateRep) -> QchanResult<StateRep> {
        match (self, state) {
            (OpRep::DensityMx(m), StateRep::DensityMx(v)) => Ok(StateRep::DensityMx(m.dot(v))),
            (OpRep::StateVec(u), StateRep::StateVec(psi)) => Ok(StateRep::StateVec(u.dot(psi))),
            (OpRep::DensityMx(_), _) | (OpRep::StateVec(_), _) => Err(QchanError::EvotypeMismatch {
                expected: self.evotype().to_string(),
                got: state.evotype().to_string(),
            }),
            _ => Err(QchanError::NotImplemented(format!(
                "acting with a {} representation",
                self.evotype()
            ))),
        }
    }

    /// Real dense matrix
    pub fn to_dense(&self) -> QchanResult<Array2<f64>> {
        match self {
            OpRep::DensityMx(m) => Ok(m.clone()),
            _ => Err(QchanError::NotImplemented(format!(
                "to_dense for the {} evolution type",
                self.evotype()
            ))),
        }
    }

    /// Sparse matrix
    pub fn to_sparse(&self) -> QchanResult<SparseMatrix> {
        match self {
            OpRep::DensityMx(m) => Ok(SparseMatrix::from_dense(m, 0.0)),
            _ => Err(QchanError::NotImplemented(format!(
                "to_sparse for the {} evolution type",
                self.evotype()
            ))),
        }
    }

    /// Sum of representations of one evolution type; an empty sum is the
    /// zero map of dimension `dim`
    pub fn compose_sum(reps: Vec<OpRep>, evotype: Evotype, dim: usize) -> QchanResult<OpRep> {
        let mut acc = match evotype {
            Evotype::DensityMx => OpRep::DensityMx(Array2::zeros((dim, dim))),
            Evotype::Term => OpRep::Term { dim },
            other => {
                return Err(QchanError::NotImplemented(format!(
                    "summing {} representations",
                    other
                )))
            }
        };
        for rep in reps {
            match (&mut acc, rep) {
                (OpRep::DensityMx(total), OpRep::DensityMx(m)) => {
                    if m.dim() != total.dim() {
                        return Err(QchanError::DimensionMismatch {
                            expected: dim,
                            got: m.nrows(),
                        });
                    }
                    *total += &m;
                }
                (OpRep::Term { dim: d }, OpRep::Term { dim: d2 }) => {
                    if *d != d2 {
                        return Err(QchanError::DimensionMismatch {
                            expected: *d,
                            got: d2,
                        });
                    }
                }
                (_, other) => {
                    return Err(QchanError::EvotypeMismatch {
                        expected: evotype.to_string(),
                        got: other.evotype().to_string(),
                    })
                }
            }
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_densitymx_act() {
        let rep = OpRep::DensityMx(array![[1.0, 0.0], [0.0, 0.5]]);
        let out = rep.act(&StateRep::DensityMx(array![1.0, 1.0])).unwrap();
        assert_eq!(out, StateRep::DensityMx(array![1.0, 0.5]));
    }

    #[test]
    fn test_act_evotype_mismatch() {
        let rep = OpRep::DensityMx(Array2::eye(2));
        let psi = StateRep::StateVec(array![C64::new(1.0, 0.0), C64::new(0.0, 0.0)]);
        assert!(rep.act(&psi).unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_term_has_no_dense() {
        let rep = OpRep::Term { dim: 4 };
        assert!(rep.to_dense().unwrap_err().is_unsupported());
        assert!(rep.to_sparse().unwrap_err().is_unsupported());
    }

    #[test]
    fn test_compose_sum() {
        let a = OpRep::DensityMx(Array2::eye(2));
        let b = OpRep::DensityMx(array![[0.0, 1.0], [0.0, 0.0]]);
        let sum = OpRep::compose_sum(vec![a, b], Evotype::DensityMx, 2).unwrap();
        assert_eq!(sum.to_dense().unwrap(), array![[1.0, 1.0], [0.0, 1.0]]);

        let empty = OpRep::compose_sum(vec![], Evotype::DensityMx, 3).unwrap();
        assert_eq!(empty.to_dense().unwrap(), Array2::<f64>::zeros((3, 3)));

        let mixed = OpRep::compose_sum(vec![OpRep::Term { dim: 2 }], Evotype::DensityMx, 2);
        assert!(mixed.is_err());
    }
}
