//! Sparse polynomials over parameter-vector variables
//!
//! Gantree: L0_Foundation → Polynomial
//!
//! A polynomial maps sorted variable-index multisets (monomials) to complex
//! coefficients; `[0, 0, 3]` is `x0² x3` and `[]` is the constant term.
//! Variable indices are bounded by `max_num_vars`.

use crate::error::{QchanError, QchanResult};
use num_complex::Complex64 as C64;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg};

/// Sparse complex polynomial
/// Gantree: Polynomial // 다항식
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    terms: BTreeMap<Vec<usize>, C64>,
    max_num_vars: usize,
}

impl Polynomial {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// The zero polynomial
    pub fn zero(max_num_vars: usize) -> Self {
        Self {
            terms: BTreeMap::new(),
            max_num_vars,
        }
    }

    /// Constant polynomial
    pub fn constant(value: C64, max_num_vars: usize) -> Self {
        let mut p = Self::zero(max_num_vars);
        if value != C64::new(0.0, 0.0) {
            p.terms.insert(Vec::new(), value);
        }
        p
    }

    /// Polynomial from `(monomial, coefficient)` pairs; repeated monomials add
    pub fn from_terms<I>(terms: I, max_num_vars: usize) -> QchanResult<Self>
    where
        I: IntoIterator<Item = (Vec<usize>, C64)>,
    {
        let mut p = Self::zero(max_num_vars);
        for (mut vars, coeff) in terms {
            if let Some(&bad) = vars.iter().find(|&&v| v >= max_num_vars) {
                return Err(QchanError::TooManyPolynomialVars {
                    index: bad,
                    max: max_num_vars,
                });
            }
            vars.sort_unstable();
            *p.terms.entry(vars).or_insert(C64::new(0.0, 0.0)) += coeff;
        }
        Ok(p)
    }

    /// `coeff * x_var²`
    pub fn square(var: usize, coeff: C64, max_num_vars: usize) -> QchanResult<Self> {
        Self::from_terms([(vec![var, var], coeff)], max_num_vars)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Monomials and their coefficients, in monomial order
    pub fn terms(&self) -> impl Iterator<Item = (&[usize], C64)> + '_ {
        self.terms.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    /// Coefficient of `monomial` (sorted)
    pub fn coeff(&self, monomial: &[usize]) -> C64 {
        self.terms.get(monomial).copied().unwrap_or_default()
    }

    /// Number of stored monomials
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Whether the polynomial has no monomials
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Bound on variable indices
    pub fn max_num_vars(&self) -> usize {
        self.max_num_vars
    }

    /// Highest total degree
    pub fn degree(&self) -> usize {
        self.terms.keys().map(Vec::len).max().unwrap_or(0)
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Value at `params`; variables past the end of `params` read as zero
    pub fn evaluate(&self, params: &[f64]) -> C64 {
        self.terms
            .iter()
            .map(|(vars, c)| {
                vars.iter()
                    .map(|&v| params.get(v).copied().unwrap_or(0.0))
                    .product::<f64>()
                    * *c
            })
            .sum()
    }

    /// Sum of absolute coefficient values times absolute monomial values
    pub fn abs_evaluate(&self, params: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(vars, c)| {
                vars.iter()
                    .map(|&v| params.get(v).copied().unwrap_or(0.0).abs())
                    .product::<f64>()
                    * c.norm()
            })
            .sum()
    }

    /// Polynomial with every variable index passed through `f`
    pub fn map_indices<F>(&self, f: F) -> QchanResult<Self>
    where
        F: Fn(usize) -> usize,
    {
        Self::from_terms(
            self.terms
                .iter()
                .map(|(vars, c)| (vars.iter().map(|&v| f(v)).collect(), *c)),
            self.max_num_vars,
        )
    }

    /// Partial derivative with respect to variable `wrt`
    pub fn deriv(&self, wrt: usize) -> Self {
        let mut out = Self::zero(self.max_num_vars);
        for (vars, c) in &self.terms {
            let power = vars.iter().filter(|&&v| v == wrt).count();
            if power == 0 {
                continue;
            }
            let mut reduced = vars.clone();
            if let Some(pos) = reduced.iter().position(|&v| v == wrt) {
                reduced.remove(pos);
            }
            *out.terms.entry(reduced).or_insert(C64::new(0.0, 0.0)) += *c * power as f64;
        }
        out
    }

    /// Polynomial scaled by `s`
    pub fn scale(&self, s: C64) -> Self {
        let mut out = self.clone();
        out.terms.values_mut().for_each(|c| *c *= s);
        out
    }

    /// Tape form of this polynomial
    pub fn compact(&self) -> CompactPolynomial {
        let mut vtape = Vec::with_capacity(1 + self.terms.len() * 2);
        let mut ctape = Vec::with_capacity(self.terms.len());
        vtape.push(self.terms.len());
        for (vars, c) in &self.terms {
            vtape.push(vars.len());
            vtape.extend_from_slice(vars);
            ctape.push(*c);
        }
        CompactPolynomial { vtape, ctape }
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let mut out = self.clone();
        out.max_num_vars = self.max_num_vars.max(rhs.max_num_vars);
        for (vars, c) in &rhs.terms {
            *out.terms.entry(vars.clone()).or_insert(C64::new(0.0, 0.0)) += *c;
        }
        out
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        let mut out = Polynomial::zero(self.max_num_vars.max(rhs.max_num_vars));
        for (va, ca) in &self.terms {
            for (vb, cb) in &rhs.terms {
                let mut vars: Vec<usize> = va.iter().chain(vb).copied().collect();
                vars.sort_unstable();
                *out.terms.entry(vars).or_insert(C64::new(0.0, 0.0)) += *ca * *cb;
            }
        }
        out
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(C64::new(-1.0, 0.0))
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|(vars, c)| {
                let mono: Vec<String> = vars.iter().map(|v| format!("x{}", v)).collect();
                if mono.is_empty() {
                    format!("{}", c)
                } else {
                    format!("{}{}", c, mono.join(""))
                }
            })
            .collect();
        write!(f, "{}", parts.join(" + "))
    }
}

// ============================================================================
// Compact Tapes
// ============================================================================

/// One or more polynomials flattened into a variable tape and a coefficient tape
///
/// The variable tape holds, per polynomial, the number of monomials followed
/// by `(nvars, var...)` for each monomial. The coefficient tape holds one
/// entry per monomial.
/// Gantree: CompactPolynomial // (vtape, ctape)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactPolynomial {
    /// Variable tape
    pub vtape: Vec<usize>,
    /// Coefficient tape
    pub ctape: Vec<C64>,
}

impl CompactPolynomial {
    /// Concatenate tapes in order
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a CompactPolynomial>) -> Self {
        let mut out = Self::default();
        for p in parts {
            out.vtape.extend_from_slice(&p.vtape);
            out.ctape.extend_from_slice(&p.ctape);
        }
        out
    }

    /// Whether the tapes hold no polynomial
    pub fn is_empty(&self) -> bool {
        self.vtape.is_empty()
    }

    /// Evaluate every polynomial on the tapes at `params`
    pub fn bulk_evaluate(&self, params: &[f64]) -> QchanResult<Vec<C64>> {
        let malformed = || QchanError::IndexOutOfRange {
            index: self.vtape.len(),
            len: self.vtape.len(),
        };
        let mut out = Vec::new();
        let (mut iv, mut ic) = (0, 0);
        while iv < self.vtape.len() {
            let nterms = self.vtape[iv];
            iv += 1;
            let mut value = C64::new(0.0, 0.0);
            for _ in 0..nterms {
                let nvars = *self.vtape.get(iv).ok_or_else(malformed)?;
                iv += 1;
                let vars = self.vtape.get(iv..iv + nvars).ok_or_else(malformed)?;
                iv += nvars;
                let c = *self.ctape.get(ic).ok_or_else(malformed)?;
                ic += 1;
                let mut m = c;
                for &v in vars {
                    m *= *params.get(v).ok_or(QchanError::IndexOutOfRange {
                        index: v,
                        len: params.len(),
                    })?;
                }
                value += m;
            }
            out.push(value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn c(re: f64) -> C64 {
        C64::new(re, 0.0)
    }

    #[test]
    fn test_evaluate_and_sorting() {
        let p = Polynomial::from_terms(
            [(vec![], c(1.0)), (vec![1, 0], c(2.0)), (vec![0, 1], c(1.0))],
            10,
        )
        .unwrap();
        assert_eq!(p.num_terms(), 2);
        assert_eq!(p.coeff(&[0, 1]), c(3.0));
        assert_abs_diff_eq!(p.evaluate(&[2.0, 0.5]).re, 4.0);
    }

    #[test]
    fn test_max_vars_enforced() {
        let err = Polynomial::from_terms([(vec![3], c(1.0))], 3).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_map_indices() {
        let p = Polynomial::square(1, c(1.0), 10).unwrap();
        let q = p.map_indices(|v| v + 5).unwrap();
        assert_eq!(q.coeff(&[6, 6]), c(1.0));
        assert!(p.map_indices(|v| v + 20).is_err());
    }

    #[test]
    fn test_deriv() {
        let p = Polynomial::from_terms([(vec![2, 2], c(3.0)), (vec![1], c(1.0))], 10).unwrap();
        let d = p.deriv(2);
        assert_eq!(d.coeff(&[2]), c(6.0));
        assert_eq!(d.num_terms(), 1);
    }

    #[test]
    fn test_arithmetic() {
        let one = Polynomial::constant(c(1.0), 10);
        let x = Polynomial::from_terms([(vec![0], c(1.0))], 10).unwrap();
        let sq = &(&one + &x) * &(&one + &x);
        assert_eq!(sq.coeff(&[0]), c(2.0));
        assert_eq!(sq.coeff(&[0, 0]), c(1.0));
        assert_eq!(sq.degree(), 2);
        assert_eq!((-&x).coeff(&[0]), c(-1.0));
    }

    #[test]
    fn test_compact_bulk_evaluate() {
        let p = Polynomial::from_terms([(vec![], c(1.0)), (vec![0, 0], c(-1.0))], 10).unwrap();
        let q = Polynomial::square(1, c(1.0), 10).unwrap();
        let tapes = CompactPolynomial::concat([&p.compact(), &q.compact()]);
        assert_eq!(tapes.vtape, vec![2, 0, 2, 0, 0, 1, 2, 1, 1]);
        let vals = tapes.bulk_evaluate(&[0.1, 0.2]).unwrap();
        assert_abs_diff_eq!(vals[0].re, 0.99, epsilon = 1e-12);
        assert_abs_diff_eq!(vals[1].re, 0.04, epsilon = 1e-12);
    }
}
