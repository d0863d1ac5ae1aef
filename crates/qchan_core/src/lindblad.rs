//! Lindblad term keys and superoperator builders
//!
//! Gantree: L0_Foundation → Lindblad
//!
//! Term keys follow the tuple format shared with coefficient consumers:
//! `(kind, label1)` for `H` and `A`, `(kind, label1[, label2])` for `S`.
//! Superoperators are expressed in an orthonormal basis as
//! `M[a,b] = Tr(B_a† f(B_b))`.

use crate::basis::Basis;
use crate::constants::tolerance;
use crate::error::{QchanError, QchanResult};
use crate::linalg::{dagger, trace};
use ndarray::Array2;
use num_complex::Complex64 as C64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Term Keys
// ============================================================================

/// Kind of a Lindblad generator term
/// Gantree: TermKind // H/S/A
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TermKind {
    /// Hamiltonian
    H,
    /// Stochastic
    S,
    /// Affine
    A,
}

impl TermKind {
    /// Single-character tag
    pub fn tag(&self) -> &'static str {
        match self {
            TermKind::H => "H",
            TermKind::S => "S",
            TermKind::A => "A",
        }
    }

    fn parse(tag: &str) -> QchanResult<Self> {
        match tag {
            "H" => Ok(TermKind::H),
            "S" => Ok(TermKind::S),
            "A" => Ok(TermKind::A),
            other => Err(QchanError::InvalidTermKey(format!("unknown kind '{}'", other))),
        }
    }
}

/// Key of one Lindblad term
/// Gantree: LindbladTermKey // (kind, label1[, label2])
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct LindbladTermKey {
    kind: TermKind,
    label1: String,
    label2: Option<String>,
}

impl LindbladTermKey {
    /// Hamiltonian term on `label`
    pub fn ham(label: impl Into<String>) -> Self {
        Self {
            kind: TermKind::H,
            label1: label.into(),
            label2: None,
        }
    }

    /// Diagonal stochastic term on `label`
    pub fn stochastic(label: impl Into<String>) -> Self {
        Self {
            kind: TermKind::S,
            label1: label.into(),
            label2: None,
        }
    }

    /// Off-diagonal stochastic term on `(label1, label2)`
    pub fn stochastic_offdiag(label1: impl Into<String>, label2: impl Into<String>) -> Self {
        Self {
            kind: TermKind::S,
            label1: label1.into(),
            label2: Some(label2.into()),
        }
    }

    /// Affine term on `label`
    pub fn affine(label: impl Into<String>) -> Self {
        Self {
            kind: TermKind::A,
            label1: label.into(),
            label2: None,
        }
    }

    /// Key from a kind and its labels, enforcing the per-kind arity
    pub fn new(kind: TermKind, labels: &[&str]) -> QchanResult<Self> {
        match (kind, labels) {
            (TermKind::S, [a, b]) => Ok(Self::stochastic_offdiag(*a, *b)),
            (_, [a]) => Ok(Self {
                kind,
                label1: a.to_string(),
                label2: None,
            }),
            _ => Err(QchanError::InvalidTermKey(format!(
                "{} terms take {} basis label(s), got {}",
                kind.tag(),
                if kind == TermKind::S { "one or two" } else { "one" },
                labels.len()
            ))),
        }
    }

    /// Term kind
    pub fn kind(&self) -> TermKind {
        self.kind
    }

    /// First basis label
    pub fn label1(&self) -> &str {
        &self.label1
    }

    /// Second basis label of an off-diagonal stochastic term
    pub fn label2(&self) -> Option<&str> {
        self.label2.as_deref()
    }

    /// All basis labels referenced by the key
    pub fn labels(&self) -> Vec<&str> {
        std::iter::once(self.label1.as_str())
            .chain(self.label2.as_deref())
            .collect()
    }

    /// Whether this is an off-diagonal stochastic key
    pub fn is_offdiag(&self) -> bool {
        self.label2.is_some()
    }

    /// Whether the term is non-Hamiltonian (S or A)
    pub fn is_nonham(&self) -> bool {
        self.kind != TermKind::H
    }
}

impl fmt::Display for LindbladTermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}','{}'", self.kind.tag(), self.label1)?;
        if let Some(l2) = &self.label2 {
            write!(f, ",'{}'", l2)?;
        }
        write!(f, ")")
    }
}

impl From<LindbladTermKey> for Vec<String> {
    fn from(key: LindbladTermKey) -> Self {
        let mut v = vec![key.kind.tag().to_string(), key.label1];
        v.extend(key.label2);
        v
    }
}

impl TryFrom<Vec<String>> for LindbladTermKey {
    type Error = QchanError;

    fn try_from(parts: Vec<String>) -> QchanResult<Self> {
        let (kind, labels) = parts
            .split_first()
            .ok_or_else(|| QchanError::InvalidTermKey("empty key".to_string()))?;
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        Self::new(TermKind::parse(kind)?, &labels)
    }
}

/// Coefficient dictionary keyed by term
pub type LindbladCoefficients = BTreeMap<LindbladTermKey, C64>;

/// How `set_coefficients` combines new values with existing ones
/// Gantree: CoefficientAction // update/add/reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoefficientAction {
    /// Overwrite the given keys, keep the rest
    #[default]
    Update,
    /// Add to the current values of the given keys
    Add,
    /// Zero every coefficient, then set the given keys
    Reset,
}

// ============================================================================
// Log-scaled Rates
// ============================================================================

/// Error rate reported for a non-Hamiltonian coefficient `c` when
/// coefficients are log-scaled: `(1 - exp(-d2 * c)) / d2`
pub fn logscale_rate(coeff: f64, d2: f64) -> f64 {
    (1.0 - (-d2 * coeff).exp()) / d2
}

/// Inverse of [`logscale_rate`]
pub fn coeff_from_logscale_rate(rate: f64, d2: f64) -> QchanResult<f64> {
    let arg = 1.0 - d2 * rate;
    if arg <= 0.0 {
        return Err(QchanError::InvalidCoefficient {
            term: "log-scaled rate".to_string(),
            value: rate,
        });
    }
    Ok(-arg.ln() / d2)
}

// ============================================================================
// Superoperators
// ============================================================================

/// Matrix of the map `f` in `basis`, `M[a,b] = Re Tr(B_a† f(B_b))`
///
/// Fails when an entry carries an imaginary part the basis cannot absorb.
pub fn superop_in_basis<F>(basis: &Basis, f: F) -> QchanResult<Array2<f64>>
where
    F: Fn(&Array2<C64>) -> Array2<C64>,
{
    let elements = basis.elements();
    let n = elements.len();
    let images: Vec<Array2<C64>> = elements.iter().map(|b| f(b)).collect();
    let daggers: Vec<Array2<C64>> = elements.iter().map(dagger).collect();

    let mut m = Array2::zeros((n, n));
    for a in 0..n {
        for b in 0..n {
            let z = trace(&daggers[a].dot(&images[b]));
            if z.im.abs() > tolerance::SUPEROP_IMAG {
                return Err(QchanError::InvalidBasis(format!(
                    "superoperator entry ({}, {}) has imaginary part {:e} in basis '{}'",
                    a,
                    b,
                    z.im,
                    basis.name()
                )));
            }
            m[[a, b]] = z.re;
        }
    }
    Ok(m)
}

/// Hamiltonian generator `rho -> -i [b, rho]`
pub fn ham_superop(basis: &Basis, b: &Array2<C64>) -> QchanResult<Array2<f64>> {
    let minus_i = C64::new(0.0, -1.0);
    superop_in_basis(basis, |rho| (b.dot(rho) - rho.dot(b)) * minus_i)
}

/// Non-Hamiltonian generator `rho -> a rho b† - 1/2 {b† a, rho}`
pub fn nonham_superop(basis: &Basis, a: &Array2<C64>, b: &Array2<C64>) -> QchanResult<Array2<f64>> {
    let bd = dagger(b);
    let bda = bd.dot(a);
    let half = C64::new(0.5, 0.0);
    superop_in_basis(basis, |rho| {
        a.dot(rho).dot(&bd) - (bda.dot(rho) + rho.dot(&bda)) * half
    })
}

/// Affine generator `rho -> Tr(rho) b`
pub fn affine_superop(basis: &Basis, b: &Array2<C64>) -> QchanResult<Array2<f64>> {
    superop_in_basis(basis, |rho| b * trace(rho))
}

/// Generator superoperator for `key` in `basis`
pub fn term_superop(basis: &Basis, key: &LindbladTermKey) -> QchanResult<Array2<f64>> {
    let lookup = |label: &str| {
        basis.element(label).ok_or_else(|| {
            QchanError::InvalidTermKey(format!("{}: no label '{}' in basis '{}'", key, label, basis.name()))
        })
    };
    let b1 = lookup(key.label1())?;
    match (key.kind(), key.label2()) {
        (TermKind::H, _) => ham_superop(basis, b1),
        (TermKind::S, None) => nonham_superop(basis, b1, b1),
        (TermKind::S, Some(l2)) => nonham_superop(basis, b1, lookup(l2)?),
        (TermKind::A, _) => affine_superop(basis, b1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_key_display() {
        assert_eq!(LindbladTermKey::ham("X").to_string(), "('H','X')");
        assert_eq!(
            LindbladTermKey::stochastic_offdiag("X", "Y").to_string(),
            "('S','X','Y')"
        );
    }

    #[test]
    fn test_key_arity() {
        assert!(LindbladTermKey::new(TermKind::H, &["X", "Y"]).is_err());
        assert!(LindbladTermKey::new(TermKind::A, &[]).is_err());
        assert!(LindbladTermKey::new(TermKind::S, &["X", "Y"]).unwrap().is_offdiag());
    }

    #[test]
    fn test_key_serde_tuple() {
        let key = LindbladTermKey::stochastic("Z");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"["S","Z"]"#);
        let back: LindbladTermKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<LindbladTermKey>(r#"["Q","Z"]"#).is_err());
    }

    #[test]
    fn test_stochastic_generator_single_qubit() {
        let basis = Basis::pauli_product(1);
        let x = basis.element("X").unwrap().clone();
        let m = nonham_superop(&basis, &x, &x).unwrap();
        // Pauli-X dephasing damps the Y and Z components
        let expected = [0.0, 0.0, -1.0, -1.0];
        for k in 0..4 {
            assert_abs_diff_eq!(m[[k, k]], expected[k], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(m.sum() - m.diag().sum(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ham_generator_antisymmetric() {
        let basis = Basis::pauli_product(1);
        let key = LindbladTermKey::ham("Z");
        let m = term_superop(&basis, &key).unwrap();
        for a in 0..4 {
            for b in 0..4 {
                assert_abs_diff_eq!(m[[a, b]], -m[[b, a]], epsilon = 1e-12);
            }
        }
        assert!(m[[1, 2]].abs() > 0.5);
    }

    #[test]
    fn test_unknown_label() {
        let basis = Basis::pauli_product(1);
        let err = term_superop(&basis, &LindbladTermKey::ham("Q")).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_logscale_inverse() {
        let d2 = 4.0;
        let c = 0.03;
        let r = logscale_rate(c, d2);
        assert_abs_diff_eq!(coeff_from_logscale_rate(r, d2).unwrap(), c, epsilon = 1e-12);
        assert!(coeff_from_logscale_rate(0.3, d2).is_err());
    }
}
