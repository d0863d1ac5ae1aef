//! Operator bases
//!
//! Gantree: L0_Foundation → Basis
//!
//! A minimal orthonormal matrix basis: an ordered list of labeled
//! Hilbert-space matrices whose first element is (proportional to) the
//! identity. Superoperators built on a basis act on vectors of
//! coefficients in that basis.

use crate::error::{QchanError, QchanResult};
use crate::linalg::{dagger, frobenius_norm, identity, kron, trace};
use ndarray::{array, Array2};
use num_complex::Complex64 as C64;
use std::fmt;

/// Labeled orthonormal matrix basis
/// Gantree: Basis // 기저
#[derive(Debug, Clone)]
pub struct Basis {
    name: String,
    labels: Vec<String>,
    elements: Vec<Array2<C64>>,
}

impl Basis {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Normalized Pauli-product basis on `nqubits` qubits
    ///
    /// Elements are `P / sqrt(2^n)` so the basis is orthonormal under the
    /// Hilbert-Schmidt inner product; labels read `I X Y Z` per qubit.
    pub fn pauli_product(nqubits: usize) -> Self {
        let zero = C64::new(0.0, 0.0);
        let one = C64::new(1.0, 0.0);
        let i = C64::new(0.0, 1.0);
        let paulis: [(char, Array2<C64>); 4] = [
            ('I', identity(2)),
            ('X', array![[zero, one], [one, zero]]),
            ('Y', array![[zero, -i], [i, zero]]),
            ('Z', array![[one, zero], [zero, -one]]),
        ];

        let mut labels = vec![String::new()];
        let mut elements = vec![identity(1)];
        for _ in 0..nqubits {
            let mut next_labels = Vec::with_capacity(labels.len() * 4);
            let mut next_elements = Vec::with_capacity(elements.len() * 4);
            for (lbl, el) in labels.iter().zip(&elements) {
                for (c, p) in &paulis {
                    next_labels.push(format!("{}{}", lbl, c));
                    next_elements.push(kron(el, p));
                }
            }
            labels = next_labels;
            elements = next_elements;
        }

        let norm = (1usize << nqubits) as f64;
        let scale = C64::new(1.0 / norm.sqrt(), 0.0);
        Self {
            name: "pp".to_string(),
            labels,
            elements: elements.into_iter().map(|e| e * scale).collect(),
        }
    }

    /// Build a named basis of superoperator dimension `dim`
    pub fn from_name(name: &str, dim: usize) -> QchanResult<Self> {
        match name {
            "pp" => {
                let nqubits = nqubits_for_superop_dim(dim).ok_or_else(|| {
                    QchanError::InvalidBasis(format!(
                        "'pp' basis requires a power of 4 dimension, got {}",
                        dim
                    ))
                })?;
                Ok(Self::pauli_product(nqubits))
            }
            other => Err(QchanError::InvalidBasis(format!(
                "no instructions to create basis '{}' of dimension {}",
                other, dim
            ))),
        }
    }

    /// Basis from explicit matrices
    ///
    /// All elements must be square and of one size, labels must be unique.
    pub fn explicit(
        name: impl Into<String>,
        labels: Vec<String>,
        elements: Vec<Array2<C64>>,
    ) -> QchanResult<Self> {
        let name = name.into();
        if labels.len() != elements.len() {
            return Err(QchanError::InvalidBasis(format!(
                "{} labels for {} elements",
                labels.len(),
                elements.len()
            )));
        }
        if let Some(first) = elements.first() {
            let shape = first.dim();
            if shape.0 != shape.1 || elements.iter().any(|e| e.dim() != shape) {
                return Err(QchanError::InvalidBasis(
                    "elements must be square matrices of equal size".to_string(),
                ));
            }
        }
        for (k, lbl) in labels.iter().enumerate() {
            if labels[..k].contains(lbl) {
                return Err(QchanError::InvalidBasis(format!("duplicate label '{}'", lbl)));
            }
        }
        Ok(Self {
            name,
            labels,
            elements,
        })
    }

    /// Basis with no elements
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            labels: Vec::new(),
            elements: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Basis name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Whether the basis has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Superoperator dimension spanned by the basis
    pub fn dim(&self) -> usize {
        self.size()
    }

    /// Side length of each element
    pub fn hilbert_dim(&self) -> usize {
        self.elements.first().map_or(0, |e| e.nrows())
    }

    /// Element labels
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Element matrices
    pub fn elements(&self) -> &[Array2<C64>] {
        &self.elements
    }

    /// Position of `label`
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Element for `label`
    pub fn element(&self, label: &str) -> Option<&Array2<C64>> {
        self.index_of(label).map(|k| &self.elements[k])
    }

    /// Whether element 0 is proportional to the identity
    pub fn first_is_identity(&self) -> bool {
        let Some(first) = self.elements.first() else {
            return false;
        };
        let d = first.nrows();
        let scale = trace(first) / C64::new(d as f64, 0.0);
        if scale.norm() < 1e-12 {
            return false;
        }
        frobenius_norm(&(first - &(identity(d) * scale))) < 1e-10
    }

    /// Whether `other` has the same elements in the same order, whatever
    /// their name and labels
    pub fn same_matrices(&self, other: &Basis) -> bool {
        self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(a, b)| a.dim() == b.dim() && frobenius_norm(&(a - b)) < 1e-12)
    }

    /// Whether the elements are orthonormal under `Tr(A† B)`
    pub fn is_orthonormal(&self) -> bool {
        for (a, ea) in self.elements.iter().enumerate() {
            for (b, eb) in self.elements.iter().enumerate() {
                let ip = trace(&dagger(ea).dot(eb));
                let expected = if a == b { 1.0 } else { 0.0 };
                if (ip - C64::new(expected, 0.0)).norm() > 1e-10 {
                    return false;
                }
            }
        }
        true
    }
}

impl PartialEq for Basis {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.labels == other.labels && self.same_matrices(other)
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Basis : {}", self.name, self.labels.join(", "))
    }
}

/// Number of qubits whose superoperator dimension is `dim` (`dim = 4^n`)
pub fn nqubits_for_superop_dim(dim: usize) -> Option<usize> {
    let mut n = 0;
    let mut d = 1;
    while d < dim {
        d *= 4;
        n += 1;
    }
    (d == dim).then_some(n)
}

/// Number of qubits whose state dimension is `dim` (`dim = 2^n`)
pub fn nqubits_for_state_dim(dim: usize) -> Option<usize> {
    (dim.is_power_of_two()).then(|| dim.trailing_zeros() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_qubit_pp() {
        let b = Basis::pauli_product(1);
        assert_eq!(b.size(), 4);
        assert_eq!(b.hilbert_dim(), 2);
        assert_eq!(b.labels(), &["I", "X", "Y", "Z"]);
        assert!(b.first_is_identity());
        assert!(b.is_orthonormal());
    }

    #[test]
    fn test_two_qubit_labels() {
        let b = Basis::pauli_product(2);
        assert_eq!(b.size(), 16);
        assert_eq!(b.labels()[1], "IX");
        assert_eq!(b.labels()[4], "XI");
        assert!(b.is_orthonormal());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Basis::from_name("pp", 4).unwrap(), Basis::pauli_product(1));
        assert!(Basis::from_name("pp", 8).is_err());
        assert!(Basis::from_name("qt", 9).unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_explicit_validation() {
        let pp = Basis::pauli_product(1);
        let ok = Basis::explicit("mine", pp.labels().to_vec(), pp.elements().to_vec());
        assert!(ok.is_ok());

        let dup = Basis::explicit(
            "dup",
            vec!["I".into(), "I".into()],
            pp.elements()[..2].to_vec(),
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_same_matrices_ignores_labels() {
        let pp = Basis::pauli_product(1);
        let renamed = Basis::explicit(
            "renamed",
            vec!["I".into(), "A".into(), "B".into(), "C".into()],
            pp.elements().to_vec(),
        )
        .unwrap();
        assert!(pp.same_matrices(&renamed));
        assert_ne!(pp, renamed);

        let mut swapped = pp.elements().to_vec();
        swapped.swap(1, 3);
        let reordered = Basis::explicit("swapped", pp.labels().to_vec(), swapped).unwrap();
        assert!(!pp.same_matrices(&reordered));
    }

    #[test]
    fn test_dimension_helpers() {
        assert_eq!(nqubits_for_superop_dim(16), Some(2));
        assert_eq!(nqubits_for_superop_dim(8), None);
        assert_eq!(nqubits_for_state_dim(4), Some(2));
        assert_eq!(nqubits_for_state_dim(3), None);
    }
}
