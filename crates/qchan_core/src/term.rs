//! Rank-one Taylor terms
//!
//! Gantree: L0_Foundation → RankOneTerm
//!
//! A term is the map `rho -> c(x) · A rho B` with a polynomial coefficient
//! `c` over parameter-vector variables. A missing factor is the identity.

use crate::error::QchanResult;
use crate::evotype::Evotype;
use crate::polynomial::Polynomial;
use ndarray::Array2;
use num_complex::Complex64 as C64;

/// Rank-one perturbative term
/// Gantree: RankOneTerm // rho -> c·A·rho·B
#[derive(Debug, Clone, PartialEq)]
pub struct RankOneTerm {
    coeff: Polynomial,
    pre: Option<Array2<C64>>,
    post: Option<Array2<C64>>,
    evotype: Evotype,
    magnitude: f64,
}

impl RankOneTerm {
    /// Term with unset (zero) magnitude
    pub fn new(
        coeff: Polynomial,
        pre: Option<Array2<C64>>,
        post: Option<Array2<C64>>,
        evotype: Evotype,
    ) -> Self {
        Self {
            coeff,
            pre,
            post,
            evotype,
            magnitude: 0.0,
        }
    }

    /// Polynomial coefficient
    pub fn coeff(&self) -> &Polynomial {
        &self.coeff
    }

    /// Left factor
    pub fn pre(&self) -> Option<&Array2<C64>> {
        self.pre.as_ref()
    }

    /// Right factor
    pub fn post(&self) -> Option<&Array2<C64>> {
        self.post.as_ref()
    }

    /// Evolution type the term was built for
    pub fn evotype(&self) -> Evotype {
        self.evotype
    }

    /// Magnitude recorded at the last evaluation
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Copy carrying `magnitude`
    pub fn with_magnitude(mut self, magnitude: f64) -> Self {
        self.magnitude = magnitude;
        self
    }

    /// Copy whose coefficient variables are passed through `f`
    pub fn map_indices<F>(&self, f: F) -> QchanResult<Self>
    where
        F: Fn(usize) -> usize,
    {
        Ok(Self {
            coeff: self.coeff.map_indices(f)?,
            ..self.clone()
        })
    }

    /// Coefficient value at `params`
    pub fn evaluate_coeff(&self, params: &[f64]) -> C64 {
        self.coeff.evaluate(params)
    }

    /// `A rho B`, without the coefficient
    pub fn apply(&self, rho: &Array2<C64>) -> Array2<C64> {
        let left = match &self.pre {
            Some(a) => a.dot(rho),
            None => rho.clone(),
        };
        match &self.post {
            Some(b) => left.dot(b),
            None => left,
        }
    }

    /// `c(params) · A rho B`
    pub fn apply_scaled(&self, rho: &Array2<C64>, params: &[f64]) -> Array2<C64> {
        self.apply(rho) * self.evaluate_coeff(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::identity;
    use ndarray::array;

    fn c(re: f64) -> C64 {
        C64::new(re, 0.0)
    }

    #[test]
    fn test_identity_term() {
        let coeff = Polynomial::constant(c(0.5), 10);
        let t = RankOneTerm::new(coeff, None, None, Evotype::DensityMx);
        let rho = identity(2);
        assert_eq!(t.apply(&rho), rho);
        assert_eq!(t.apply_scaled(&rho, &[])[[0, 0]], c(0.5));
        assert_eq!(t.magnitude(), 0.0);
        assert_eq!(t.with_magnitude(0.5).magnitude(), 0.5);
    }

    #[test]
    fn test_pre_post() {
        let x = array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]];
        let rho = array![[c(1.0), c(0.0)], [c(0.0), c(0.0)]];
        let coeff = Polynomial::square(0, c(1.0), 10).unwrap();
        let t = RankOneTerm::new(coeff, Some(x.clone()), Some(x), Evotype::Term);
        let out = t.apply(&rho);
        assert_eq!(out[[1, 1]], c(1.0));
        assert_eq!(out[[0, 0]], c(0.0));
        assert_eq!(t.evaluate_coeff(&[0.3]).re, 0.09);
    }

    #[test]
    fn test_map_indices() {
        let coeff = Polynomial::square(0, c(1.0), 10).unwrap();
        let t = RankOneTerm::new(coeff, None, None, Evotype::Term).with_magnitude(1.0);
        let mapped = t.map_indices(|v| v + 4).unwrap();
        assert_eq!(mapped.coeff().coeff(&[4, 4]), c(1.0));
        assert_eq!(mapped.magnitude(), 1.0);
    }
}
