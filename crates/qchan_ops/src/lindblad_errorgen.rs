//! Lindblad error generators
//!
//! Gantree: L1_Operators → LindbladErrorgen
//!
//! A generator `L = Σ_k c_k(p) G_k` over a fixed list of Hamiltonian,
//! diagonal stochastic and affine terms in one basis. Hamiltonian and
//! affine coefficients are their parameters; stochastic coefficients are
//! either parameters squared (non-negative by construction) or the
//! parameters themselves.

use crate::errorgen::{assert_order_zero, ErrorGenerator};
use crate::operator::{
    compact_coeffs, filter_deriv, filter_hessian, globalize_terms, HighMagnitudeTerms,
    LinearOperator, MemberState, TaylorTerms, TermCache,
};
use crate::rep::OpRep;
use crate::transform::{project_exact, Similarity};
use ndarray::{Array1, Array2, Array3, ArrayView1};
use qchan_core::lindblad::{coeff_from_logscale_rate, logscale_rate, term_superop};
use qchan_core::linalg::{dagger, flatten, onenorm};
use qchan_core::{
    Basis, CoefficientAction, Evotype, LindbladCoefficients, LindbladTermKey, Polynomial,
    QchanError, QchanResult, RankOneTerm, TermExpansionConfig, TermKind, C64,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// How stochastic coefficients relate to parameters
/// Gantree: NonHamMode // squared/unconstrained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NonHamMode {
    /// `c = p²`
    #[default]
    Squared,
    /// `c = p`
    Unconstrained,
}

/// Lindblad error generator
/// Gantree: LindbladErrorgen // H + S(diag) + A terms
#[derive(Debug, Clone)]
pub struct LindbladErrorgen {
    basis: Arc<Basis>,
    evotype: Evotype,
    mode: NonHamMode,
    keys: Vec<LindbladTermKey>,
    superops: Vec<Array2<f64>>,
    params: Array1<f64>,
    member: MemberState,
    term_cache: TermCache,
}

impl LindbladErrorgen {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Generator with the terms and initial values in `coefficients`
    pub fn new(
        basis: Arc<Basis>,
        coefficients: &LindbladCoefficients,
        mode: NonHamMode,
        evotype: Evotype,
    ) -> QchanResult<Self> {
        if !matches!(evotype, Evotype::DensityMx | Evotype::Term) {
            return Err(QchanError::UnsupportedEvotype {
                evotype: evotype.to_string(),
                operator: "LindbladErrorgen".to_string(),
            });
        }
        if !basis.first_is_identity() {
            return Err(QchanError::InvalidBasis(format!(
                "first element of '{}' must be the identity",
                basis.name()
            )));
        }

        let mut keys = Vec::with_capacity(coefficients.len());
        let mut superops = Vec::with_capacity(coefficients.len());
        let mut params = Vec::with_capacity(coefficients.len());
        for (key, value) in coefficients {
            if key.is_offdiag() {
                return Err(QchanError::InvalidTermKey(format!(
                    "{}: off-diagonal stochastic terms are not supported",
                    key
                )));
            }
            superops.push(term_superop(&basis, key)?);
            params.push(param_from_coeff(key, *value, mode)?);
            keys.push(key.clone());
        }

        log::debug!(
            "LindbladErrorgen: {} terms on {} basis (dim {})",
            keys.len(),
            basis.name(),
            basis.size()
        );
        Ok(Self {
            basis,
            evotype,
            mode,
            keys,
            superops,
            params: Array1::from_vec(params),
            member: MemberState::new(),
            term_cache: TermCache::new(),
        })
    }

    /// Hamiltonian-only generator from `(label, coefficient)` pairs
    pub fn hamiltonian(basis: Arc<Basis>, terms: &[(&str, f64)], evotype: Evotype) -> QchanResult<Self> {
        let coeffs: LindbladCoefficients = terms
            .iter()
            .map(|(l, c)| (LindbladTermKey::ham(*l), C64::new(*c, 0.0)))
            .collect();
        Self::new(basis, &coeffs, NonHamMode::Squared, evotype)
    }

    /// Stochastic-only generator from `(label, coefficient)` pairs
    pub fn stochastic(
        basis: Arc<Basis>,
        terms: &[(&str, f64)],
        mode: NonHamMode,
        evotype: Evotype,
    ) -> QchanResult<Self> {
        let coeffs: LindbladCoefficients = terms
            .iter()
            .map(|(l, c)| (LindbladTermKey::stochastic(*l), C64::new(*c, 0.0)))
            .collect();
        Self::new(basis, &coeffs, mode, evotype)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Basis the terms are built on
    pub fn basis(&self) -> &Arc<Basis> {
        &self.basis
    }

    /// Stochastic-coefficient mode
    pub fn mode(&self) -> NonHamMode {
        self.mode
    }

    /// Generator matrix at the current parameters, whatever the evolution type
    pub fn generator(&self) -> Array2<f64> {
        let d = self.basis.size();
        let mut gen = Array2::zeros((d, d));
        for (k, op) in self.superops.iter().enumerate() {
            gen.scaled_add(self.coeff(k), op);
        }
        gen
    }

    fn d2(&self) -> f64 {
        self.basis.size() as f64
    }

    fn squared(&self, k: usize) -> bool {
        self.mode == NonHamMode::Squared && self.keys[k].kind() == TermKind::S
    }

    /// Whether term `k` has a rank-one expansion
    fn expands(&self, k: usize) -> bool {
        self.keys[k].kind() != TermKind::A
    }

    fn coeff(&self, k: usize) -> f64 {
        let p = self.params[k];
        if self.squared(k) {
            p * p
        } else {
            p
        }
    }

    fn dcoeff(&self, k: usize) -> f64 {
        if self.squared(k) {
            2.0 * self.params[k]
        } else {
            1.0
        }
    }

    fn local_terms(&self, max_polynomial_vars: usize) -> QchanResult<Vec<RankOneTerm>> {
        let one = C64::new(1.0, 0.0);
        let mut terms = Vec::new();
        for (k, key) in self.keys.iter().enumerate() {
            let b = self
                .basis
                .element(key.label1())
                .ok_or_else(|| QchanError::InvalidTermKey(key.to_string()))?
                .clone();
            let c = if self.squared(k) {
                Polynomial::square(k, one, max_polynomial_vars)?
            } else {
                Polynomial::from_terms([(vec![k], one)], max_polynomial_vars)?
            };
            match key.kind() {
                TermKind::H => {
                    // -i[B, rho] = -i B rho + i rho B
                    let minus_i = c.scale(C64::new(0.0, -1.0));
                    let plus_i = c.scale(C64::new(0.0, 1.0));
                    terms.push(RankOneTerm::new(minus_i, Some(b.clone()), None, self.evotype));
                    terms.push(RankOneTerm::new(plus_i, None, Some(b), self.evotype));
                }
                TermKind::S => {
                    let bd = dagger(&b);
                    let bdb = bd.dot(&b);
                    let half = c.scale(C64::new(-0.5, 0.0));
                    terms.push(RankOneTerm::new(c, Some(b), Some(bd), self.evotype));
                    terms.push(RankOneTerm::new(half.clone(), Some(bdb.clone()), None, self.evotype));
                    terms.push(RankOneTerm::new(half, None, Some(bdb), self.evotype));
                }
                TermKind::A => {
                    return Err(QchanError::NotImplemented(format!(
                        "Taylor terms for affine term {}",
                        key
                    )))
                }
            }
        }
        Ok(terms)
    }
}

fn param_from_coeff(key: &LindbladTermKey, value: C64, mode: NonHamMode) -> QchanResult<f64> {
    if value.im.abs() > qchan_core::tolerance::SUPEROP_IMAG {
        return Err(QchanError::InvalidCoefficient {
            term: key.to_string(),
            value: value.im,
        });
    }
    let c = value.re;
    if key.kind() == TermKind::S && mode == NonHamMode::Squared {
        if c < 0.0 {
            return Err(QchanError::InvalidCoefficient {
                term: key.to_string(),
                value: c,
            });
        }
        return Ok(c.sqrt());
    }
    Ok(c)
}

// ============================================================================
// LinearOperator
// ============================================================================

impl LinearOperator for LindbladErrorgen {
    fn kind(&self) -> &'static str {
        "LindbladErrorgen"
    }

    fn dim(&self) -> usize {
        self.basis.size()
    }

    fn evotype(&self) -> Evotype {
        self.evotype
    }

    fn member(&self) -> &MemberState {
        &self.member
    }

    fn member_mut(&mut self) -> &mut MemberState {
        &mut self.member
    }

    fn invalidate_term_cache(&mut self) {
        self.term_cache.invalidate();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn num_params(&self) -> usize {
        self.params.len()
    }

    fn to_vector(&self) -> Array1<f64> {
        self.params.clone()
    }

    fn from_vector(&mut self, v: ArrayView1<f64>, dirty: bool) -> QchanResult<()> {
        if v.len() != self.params.len() {
            return Err(QchanError::ParamLengthMismatch {
                expected: self.params.len(),
                got: v.len(),
            });
        }
        self.params.assign(&v);
        self.term_cache.invalidate();
        self.set_dirty(dirty);
        Ok(())
    }

    fn parameter_labels(&self) -> Vec<String> {
        self.keys
            .iter()
            .enumerate()
            .map(|(k, key)| {
                let what = match key.kind() {
                    TermKind::H => "Hamiltonian",
                    TermKind::S => "stochastic",
                    TermKind::A => "affine",
                };
                if self.squared(k) {
                    format!("sqrt({} {} coefficient)", key.label1(), what)
                } else {
                    format!("{} {} coefficient", key.label1(), what)
                }
            })
            .collect()
    }

    fn rep(&self) -> QchanResult<OpRep> {
        match self.evotype {
            Evotype::DensityMx => Ok(OpRep::DensityMx(self.generator())),
            _ => Ok(OpRep::Term { dim: self.dim() }),
        }
    }

    fn transform_inplace(&mut self, s: &Similarity) -> QchanResult<()> {
        if self.evotype != Evotype::DensityMx {
            return Err(QchanError::NotImplemented(format!(
                "transform_inplace for the {} evolution type",
                self.evotype
            )));
        }
        let target = s.apply(&self.generator())?;
        let coeffs = project_exact(&target, &self.superops, self.kind())?;
        let mut params = Array1::zeros(coeffs.len());
        for (k, c) in coeffs.iter().enumerate() {
            params[k] = param_from_coeff(&self.keys[k], C64::new(*c, 0.0), self.mode).map_err(
                |_| {
                    QchanError::TransformNotSupported(format!(
                        "{} would need a negative rate",
                        self.keys[k]
                    ))
                },
            )?;
        }
        self.from_vector(params.view(), true)
    }

    fn deriv_wrt_params(&self, wrt_filter: Option<&[usize]>) -> QchanResult<Array2<f64>> {
        let mut deriv = Array2::zeros((self.size(), self.num_params()));
        for (k, op) in self.superops.iter().enumerate() {
            let col = flatten(op) * self.dcoeff(k);
            deriv.column_mut(k).assign(&col);
        }
        filter_deriv(deriv, wrt_filter)
    }

    fn has_nonzero_hessian(&self) -> bool {
        (0..self.keys.len()).any(|k| self.squared(k))
    }

    fn hessian_wrt_params(
        &self,
        wrt_filter1: Option<&[usize]>,
        wrt_filter2: Option<&[usize]>,
    ) -> QchanResult<Array3<f64>> {
        let n = self.num_params();
        let mut hess = Array3::zeros((self.size(), n, n));
        for (k, op) in self.superops.iter().enumerate() {
            if self.squared(k) {
                for (row, x) in op.iter().enumerate() {
                    hess[[row, k, k]] = 2.0 * x;
                }
            }
        }
        filter_hessian(hess, wrt_filter1, wrt_filter2)
    }

    fn taylor_order_terms(
        &mut self,
        order: usize,
        max_polynomial_vars: usize,
        return_coeff_polys: bool,
    ) -> QchanResult<TaylorTerms> {
        assert_order_zero(self.kind(), order);
        if !self.term_cache.is_cached(order) {
            let local = self.local_terms(max_polynomial_vars)?;
            self.term_cache.insert(order, local);
        }
        let local = self.term_cache.get(order).unwrap_or(&[]);
        Ok(TaylorTerms {
            terms: globalize_terms(local, self.member.gpindices())?,
            local_coeffs: return_coeff_polys.then(|| compact_coeffs(local)),
        })
    }

    fn highmagnitude_terms(
        &mut self,
        _config: &TermExpansionConfig,
    ) -> QchanResult<HighMagnitudeTerms> {
        Err(QchanError::NotImplemented(
            "highmagnitude_terms for LindbladErrorgen; expand the enclosing operator".to_string(),
        ))
    }

    fn total_term_magnitude(&self) -> QchanResult<f64> {
        // each H and S term expands into pieces whose weights sum to 2|c|;
        // affine terms have no expansion
        Ok((0..self.keys.len())
            .filter(|&k| self.expands(k))
            .map(|k| 2.0 * self.coeff(k).abs())
            .sum())
    }

    fn total_term_magnitude_deriv(&self) -> QchanResult<Array1<f64>> {
        Ok((0..self.keys.len())
            .map(|k| {
                let c = self.coeff(k);
                if !self.expands(k) || c == 0.0 {
                    return 0.0;
                }
                2.0 * c.signum() * self.dcoeff(k)
            })
            .collect())
    }
}

// ============================================================================
// ErrorGenerator
// ============================================================================

impl ErrorGenerator for LindbladErrorgen {
    fn coefficients(&self, logscale_nonham: bool) -> QchanResult<LindbladCoefficients> {
        let d2 = self.d2();
        Ok(self
            .keys
            .iter()
            .enumerate()
            .map(|(k, key)| {
                let c = self.coeff(k);
                let value = if logscale_nonham && key.kind() == TermKind::S {
                    logscale_rate(c, d2)
                } else {
                    c
                };
                (key.clone(), C64::new(value, 0.0))
            })
            .collect())
    }

    fn coefficient_basis(&self) -> QchanResult<Option<Arc<Basis>>> {
        Ok(Some(Arc::clone(&self.basis)))
    }

    fn matrix_basis(&self) -> Option<Arc<Basis>> {
        Some(Arc::clone(&self.basis))
    }

    fn coefficient_keys(&self) -> Vec<LindbladTermKey> {
        self.keys.clone()
    }

    fn coefficients_array(&self) -> Array1<f64> {
        (0..self.keys.len()).map(|k| self.coeff(k)).collect()
    }

    fn coefficients_array_deriv_wrt_params(&self) -> QchanResult<Array2<f64>> {
        let n = self.keys.len();
        let mut d = Array2::zeros((n, n));
        for k in 0..n {
            d[[k, k]] = self.dcoeff(k);
        }
        Ok(d)
    }

    fn set_coefficients(
        &mut self,
        coefficients: &LindbladCoefficients,
        action: CoefficientAction,
        logscale_nonham: bool,
    ) -> QchanResult<()> {
        let known: BTreeSet<&LindbladTermKey> = self.keys.iter().collect();
        let unknown: Vec<String> = coefficients
            .keys()
            .filter(|k| !known.contains(k))
            .map(ToString::to_string)
            .collect();
        if !unknown.is_empty() {
            return Err(QchanError::UnknownTermKeys(unknown));
        }

        let d2 = self.d2();
        let mut current = self.coefficients(logscale_nonham)?;
        if action == CoefficientAction::Reset {
            current.values_mut().for_each(|v| *v = C64::new(0.0, 0.0));
        }
        for (key, value) in coefficients {
            let slot = current.entry(key.clone()).or_default();
            match action {
                CoefficientAction::Add => *slot += *value,
                CoefficientAction::Update | CoefficientAction::Reset => *slot = *value,
            }
        }

        let mut params = Array1::zeros(self.keys.len());
        for (k, key) in self.keys.iter().enumerate() {
            let mut value = current.get(key).copied().unwrap_or_default();
            if logscale_nonham && key.kind() == TermKind::S {
                value = C64::new(coeff_from_logscale_rate(value.re, d2)?, value.im);
            }
            params[k] = param_from_coeff(key, value, self.mode)?;
        }
        self.from_vector(params.view(), true)
    }

    fn onenorm_upperbound(&self) -> QchanResult<f64> {
        Ok(self
            .superops
            .iter()
            .enumerate()
            .map(|(k, op)| self.coeff(k).abs() * onenorm(op))
            .sum())
    }
}

impl fmt::Display for LindbladErrorgen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Lindblad error generator with dim = {}, num params = {}",
            self.dim(),
            self.num_params()
        )?;
        for (k, key) in self.keys.iter().enumerate() {
            writeln!(f, "  {} : {:.6}", key, self.coeff(k))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pp1() -> Arc<Basis> {
        Arc::new(Basis::pauli_product(1))
    }

    #[test]
    fn test_coefficients_roundtrip() {
        let gen = LindbladErrorgen::hamiltonian(pp1(), &[("X", 0.01), ("Z", -0.02)], Evotype::DensityMx)
            .unwrap();
        let coeffs = gen.coefficients(false).unwrap();
        assert_abs_diff_eq!(coeffs[&LindbladTermKey::ham("Z")].re, -0.02);

        let mut copy = LindbladErrorgen::hamiltonian(pp1(), &[("X", 0.0), ("Z", 0.0)], Evotype::DensityMx)
            .unwrap();
        copy.set_coefficients(&coeffs, CoefficientAction::Update, false).unwrap();
        assert_eq!(copy.to_vector(), gen.to_vector());
    }

    #[test]
    fn test_rejects_bad_terms() {
        let mut coeffs = LindbladCoefficients::new();
        coeffs.insert(LindbladTermKey::stochastic_offdiag("X", "Y"), C64::new(0.1, 0.0));
        let err = LindbladErrorgen::new(pp1(), &coeffs, NonHamMode::Squared, Evotype::DensityMx)
            .unwrap_err();
        assert!(err.is_configuration_error());

        let err = LindbladErrorgen::stochastic(pp1(), &[("X", -0.1)], NonHamMode::Squared, Evotype::DensityMx)
            .unwrap_err();
        assert!(matches!(err, QchanError::InvalidCoefficient { .. }));

        let err = LindbladErrorgen::hamiltonian(pp1(), &[("X", 0.1)], Evotype::Chp).unwrap_err();
        assert!(matches!(err, QchanError::UnsupportedEvotype { .. }));
    }

    #[test]
    fn test_stochastic_dense() {
        let gen = LindbladErrorgen::stochastic(pp1(), &[("X", 0.1)], NonHamMode::Squared, Evotype::DensityMx)
            .unwrap();
        let dense = gen.to_dense().unwrap();
        assert_abs_diff_eq!(dense[[2, 2]], -0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(dense[[1, 1]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(gen.to_vector()[0], 0.1f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_set_coefficients_actions() {
        let mut gen = LindbladErrorgen::stochastic(
            pp1(),
            &[("X", 0.1), ("Y", 0.2)],
            NonHamMode::Squared,
            Evotype::DensityMx,
        )
        .unwrap();
        let mut delta = LindbladCoefficients::new();
        delta.insert(LindbladTermKey::stochastic("X"), C64::new(0.05, 0.0));

        gen.set_coefficients(&delta, CoefficientAction::Add, false).unwrap();
        assert_abs_diff_eq!(gen.coefficients_array()[0], 0.15, epsilon = 1e-12);

        gen.set_coefficients(&delta, CoefficientAction::Reset, false).unwrap();
        assert_abs_diff_eq!(gen.coefficients_array()[0], 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(gen.coefficients_array()[1], 0.0, epsilon = 1e-12);

        let mut bad = LindbladCoefficients::new();
        bad.insert(LindbladTermKey::ham("X"), C64::new(0.05, 0.0));
        bad.insert(LindbladTermKey::stochastic("Z"), C64::new(0.05, 0.0));
        match gen.set_coefficients(&bad, CoefficientAction::Update, false) {
            Err(QchanError::UnknownTermKeys(keys)) => assert_eq!(keys.len(), 2),
            other => panic!("expected UnknownTermKeys, got {:?}", other),
        }
    }

    #[test]
    fn test_error_rates_logscale() {
        let mut gen = LindbladErrorgen::stochastic(pp1(), &[("Z", 0.0)], NonHamMode::Squared, Evotype::DensityMx)
            .unwrap();
        let mut rates = LindbladCoefficients::new();
        rates.insert(LindbladTermKey::stochastic("Z"), C64::new(0.01, 0.0));
        gen.set_error_rates(&rates, CoefficientAction::Update).unwrap();

        let back = gen.error_rates().unwrap();
        assert_abs_diff_eq!(back[&LindbladTermKey::stochastic("Z")].re, 0.01, epsilon = 1e-12);
        // the raw coefficient is slightly larger than the rate
        assert!(gen.coefficients_array()[0] > 0.01);
    }

    #[test]
    fn test_deriv_matches_finite_difference() {
        let mut gen = LindbladErrorgen::new(
            pp1(),
            &[
                (LindbladTermKey::ham("Y"), C64::new(0.03, 0.0)),
                (LindbladTermKey::stochastic("X"), C64::new(0.02, 0.0)),
            ]
            .into_iter()
            .collect(),
            NonHamMode::Squared,
            Evotype::DensityMx,
        )
        .unwrap();
        let deriv = gen.deriv_wrt_params(None).unwrap();
        let v0 = gen.to_vector();
        let base = flatten(&gen.to_dense().unwrap());
        let eps = 1e-7;
        for k in 0..v0.len() {
            let mut v = v0.clone();
            v[k] += eps;
            gen.from_vector(v.view(), true).unwrap();
            let fd = (flatten(&gen.to_dense().unwrap()) - &base) / eps;
            for row in 0..fd.len() {
                assert_abs_diff_eq!(fd[row], deriv[[row, k]], epsilon = 1e-6);
            }
        }
        assert!(gen.has_nonzero_hessian());
        let hess = gen.hessian_wrt_params(None, None).unwrap();
        assert_abs_diff_eq!(hess[[10, 1, 1]], 2.0 * deriv[[10, 1]] / (2.0 * v0[1]), epsilon = 1e-12);
    }

    #[test]
    fn test_order_zero_terms_reproduce_generator() {
        let basis = pp1();
        let mut gen = LindbladErrorgen::new(
            Arc::clone(&basis),
            &[
                (LindbladTermKey::ham("Z"), C64::new(0.03, 0.0)),
                (LindbladTermKey::stochastic("X"), C64::new(0.02, 0.0)),
            ]
            .into_iter()
            .collect(),
            NonHamMode::Squared,
            Evotype::Term,
        )
        .unwrap();
        let found = gen.taylor_order_terms(0, 100, true).unwrap();
        assert_eq!(found.terms.len(), 5);
        assert!(found.local_coeffs.is_some());

        // sum of the terms applied to each basis element equals the generator
        let params = gen.to_vector().to_vec();
        let dense = gen.generator();
        for (b, el) in basis.elements().iter().enumerate() {
            let mut image = Array2::<C64>::zeros((2, 2));
            for t in &found.terms {
                image = image + t.apply_scaled(el, &params);
            }
            for (a, ea) in basis.elements().iter().enumerate() {
                let entry: C64 = (dagger(ea).dot(&image)).diag().sum();
                assert_abs_diff_eq!(entry.re, dense[[a, b]], epsilon = 1e-12);
            }
        }
        assert!(gen.to_dense().unwrap_err().is_unsupported());
    }

    #[test]
    #[should_panic(expected = "only has order-0")]
    fn test_nonzero_order_panics() {
        let mut gen = LindbladErrorgen::hamiltonian(pp1(), &[("X", 0.01)], Evotype::Term).unwrap();
        let _ = gen.taylor_order_terms(2, 100, false);
    }

    #[test]
    fn test_transform_projection() {
        let mut gen = LindbladErrorgen::stochastic(
            pp1(),
            &[("X", 0.1), ("Y", 0.1), ("Z", 0.1)],
            NonHamMode::Squared,
            Evotype::DensityMx,
        )
        .unwrap();
        // depolarizing generator commutes with a unital scaling of the
        // non-identity block
        let mut s = Array2::eye(4);
        s[[1, 1]] = 2.0;
        s[[2, 2]] = 2.0;
        s[[3, 3]] = 2.0;
        gen.transform_inplace(&Similarity::new(s).unwrap()).unwrap();
        assert_abs_diff_eq!(gen.coefficients_array()[0], 0.1, epsilon = 1e-10);

        let mut rot = Array2::eye(4);
        rot[[0, 1]] = 0.3;
        let err = gen.transform_inplace(&Similarity::new(rot).unwrap()).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_term_magnitude() {
        let gen = LindbladErrorgen::stochastic(pp1(), &[("X", 0.04)], NonHamMode::Squared, Evotype::Term)
            .unwrap();
        assert_abs_diff_eq!(gen.total_term_magnitude().unwrap(), 0.08, epsilon = 1e-12);
        // d(2 p²)/dp = 4p
        assert_abs_diff_eq!(gen.total_term_magnitude_deriv().unwrap()[0], 0.8, epsilon = 1e-12);
        assert!(gen.onenorm_upperbound().unwrap() > 0.0);
    }

    #[test]
    fn test_affine_terms_carry_no_magnitude() {
        let coeffs: LindbladCoefficients = [
            (LindbladTermKey::ham("X"), C64::new(0.1, 0.0)),
            (LindbladTermKey::affine("Z"), C64::new(0.3, 0.0)),
        ]
        .into_iter()
        .collect();
        let gen = LindbladErrorgen::new(pp1(), &coeffs, NonHamMode::Squared, Evotype::Term).unwrap();
        let affine = gen
            .coefficient_keys()
            .iter()
            .position(|k| k.kind() == TermKind::A)
            .unwrap();

        assert_abs_diff_eq!(gen.total_term_magnitude().unwrap(), 0.2, epsilon = 1e-12);
        let d = gen.total_term_magnitude_deriv().unwrap();
        assert_eq!(d[affine], 0.0);
        assert_abs_diff_eq!(d[1 - affine], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_highmagnitude_terms_unsupported() {
        let mut gen = LindbladErrorgen::hamiltonian(pp1(), &[("Z", 0.01)], Evotype::Term).unwrap();
        let err = gen.highmagnitude_terms(&TermExpansionConfig::new()).unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(gen.taylor_order_terms(0, 100, true).unwrap().terms.len(), 2);
    }
}
