//! Stochastic noise operator
//!
//! Gantree: L1_Operators → StochasticNoiseOp
//!
//! Noise diagonal in a basis: `rho -> rho + Σ_i r_i S_i(rho)` with one
//! stochastic generator `S_i` per non-identity basis element and rates
//! `r_i = p_i²`, so rates are non-negative for every parameter vector.
//! With the `chp` evolution type the operator is sampled instead: each
//! invocation draws one basis element (or none) and emits its CHP program.

use crate::chp::ChpRep;
use crate::operator::{
    compact_coeffs, filter_deriv, filter_hessian, globalize_terms, LinearOperator, MemberState,
    TaylorTerms, TermCache,
};
use crate::rep::OpRep;
use crate::transform::{project_exact, Similarity};
use ndarray::{Array1, Array2, Array3, ArrayView1};
use qchan_core::basis::nqubits_for_state_dim;
use qchan_core::lindblad::nonham_superop;
use qchan_core::linalg::{dagger, flatten};
use qchan_core::{tolerance, Basis, Evotype, Polynomial, QchanError, QchanResult, RankOneTerm, C64};
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A basis or the name of one
/// Gantree: BasisSpec // name | Basis
#[derive(Debug, Clone)]
pub enum BasisSpec {
    /// Built from its name and the operator dimension
    Named(String),
    /// Used as given
    Given(Arc<Basis>),
}

impl From<&str> for BasisSpec {
    fn from(name: &str) -> Self {
        BasisSpec::Named(name.to_string())
    }
}

impl From<Arc<Basis>> for BasisSpec {
    fn from(basis: Arc<Basis>) -> Self {
        BasisSpec::Given(basis)
    }
}

impl BasisSpec {
    fn name(&self) -> &str {
        match self {
            BasisSpec::Named(n) => n,
            BasisSpec::Given(b) => b.name(),
        }
    }
}

/// Stochastic (basis-diagonal) noise
/// Gantree: StochasticNoiseOp // rates = params²
#[derive(Debug, Clone)]
pub struct StochasticNoiseOp {
    dim: usize,
    basis: Arc<Basis>,
    evotype: Evotype,
    params: Array1<f64>,
    superops: Vec<Array2<f64>>,
    chp_ops: Vec<ChpRep>,
    errormap: Array2<f64>,
    rng: ChaCha8Rng,
    member: MemberState,
    term_cache: TermCache,
}

impl StochasticNoiseOp {
    /// Noise on `basis` with the given initial rates (all zero when `None`)
    ///
    /// For `densitymx` and `term` the basis size must equal `dim`. For `chp`
    /// the basis must be `pp` and `dim` is the Hilbert-space dimension.
    /// `seed` makes CHP sampling reproducible.
    pub fn new(
        dim: usize,
        basis: impl Into<BasisSpec>,
        evotype: Evotype,
        initial_rates: Option<&[f64]>,
        seed: Option<u64>,
    ) -> QchanResult<Self> {
        let spec = basis.into();
        let (basis, superops, chp_ops) = match evotype {
            Evotype::DensityMx | Evotype::Term => {
                let basis = match spec {
                    BasisSpec::Named(name) => Arc::new(Basis::from_name(&name, dim)?),
                    BasisSpec::Given(b) => b,
                };
                if basis.size() != dim {
                    return Err(QchanError::BasisSizeMismatch {
                        basis: basis.name().to_string(),
                        size: basis.size(),
                        dim,
                    });
                }
                if !basis.first_is_identity() {
                    return Err(QchanError::InvalidBasis(format!(
                        "first element of '{}' must be the identity",
                        basis.name()
                    )));
                }
                let superops = basis.elements()[1..]
                    .iter()
                    .map(|b| nonham_superop(&basis, b, b))
                    .collect::<QchanResult<Vec<_>>>()?;
                (basis, superops, Vec::new())
            }
            Evotype::Chp => {
                if spec.name() != "pp" {
                    return Err(QchanError::InvalidBasis(format!(
                        "only the 'pp' basis is allowed with the chp evolution type, got '{}'",
                        spec.name()
                    )));
                }
                let nqubits = nqubits_for_state_dim(dim).ok_or_else(|| {
                    QchanError::InvalidBasis(format!(
                        "chp requires a power of 2 dimension, got {}",
                        dim
                    ))
                })?;
                let basis = Arc::new(Basis::pauli_product(nqubits));
                let chp_ops = basis.labels()[1..]
                    .iter()
                    .map(|label| ChpRep::pauli(label))
                    .collect::<QchanResult<Vec<_>>>()?;
                (basis, Vec::new(), chp_ops)
            }
            other => {
                return Err(QchanError::UnsupportedEvotype {
                    evotype: other.to_string(),
                    operator: "StochasticNoiseOp".to_string(),
                })
            }
        };

        let nrates = basis.size().saturating_sub(1);
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut op = Self {
            dim,
            basis,
            evotype,
            params: Array1::zeros(nrates),
            superops,
            chp_ops,
            errormap: Array2::eye(dim),
            rng,
            member: MemberState::new(),
            term_cache: TermCache::new(),
        };
        if let Some(rates) = initial_rates {
            op.set_rates(rates)?;
        }
        op.set_dirty(false);
        log::debug!(
            "StochasticNoiseOp: {} rates on {} basis ({})",
            nrates,
            op.basis.name(),
            evotype
        );
        Ok(op)
    }

    // ========================================================================
    // Rates
    // ========================================================================

    /// Current rates `p_i²`
    pub fn rates(&self) -> Array1<f64> {
        self.params.mapv(|p| p * p)
    }

    /// Set the rates; each must be non-negative
    pub fn set_rates(&mut self, rates: &[f64]) -> QchanResult<()> {
        if rates.len() != self.params.len() {
            return Err(QchanError::ParamLengthMismatch {
                expected: self.params.len(),
                got: rates.len(),
            });
        }
        if let Some((i, &r)) = rates.iter().enumerate().find(|(_, r)| **r < 0.0) {
            return Err(QchanError::InvalidCoefficient {
                term: format!("{} error rate", self.basis.labels()[i + 1]),
                value: r,
            });
        }
        let total: f64 = rates.iter().sum();
        if total > 1.0 {
            log::warn!("StochasticNoiseOp rates sum to {} > 1", total);
        }
        let params: Array1<f64> = rates.iter().map(|r| r.sqrt()).collect();
        self.from_vector(params.view(), true)
    }

    /// Basis the noise is diagonal in
    pub fn basis(&self) -> &Arc<Basis> {
        &self.basis
    }

    /// Restart the sampler from `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    fn update_rep(&mut self) {
        if self.evotype != Evotype::DensityMx {
            return;
        }
        let mut errormap = Array2::eye(self.dim);
        for (p, ss) in self.params.iter().zip(&self.superops) {
            errormap.scaled_add(p * p, ss);
        }
        self.errormap = errormap;
    }

    fn local_terms(&self, order: usize, max_polynomial_vars: usize) -> QchanResult<Vec<RankOneTerm>> {
        let one = C64::new(1.0, 0.0);
        match order {
            0 => {
                // 1 - Σ p_i²
                let monomials = std::iter::once((Vec::new(), one))
                    .chain((0..self.params.len()).map(|i| (vec![i, i], -one)));
                let coeff = Polynomial::from_terms(monomials, max_polynomial_vars)?;
                Ok(vec![RankOneTerm::new(coeff, None, None, self.evotype)])
            }
            1 => self.basis.elements()[1..]
                .iter()
                .enumerate()
                .map(|(i, b)| -> QchanResult<RankOneTerm> {
                    let coeff = Polynomial::square(i, one, max_polynomial_vars)?;
                    Ok(RankOneTerm::new(
                        coeff,
                        Some(b.clone()),
                        Some(dagger(b)),
                        self.evotype,
                    ))
                })
                .collect(),
            _ => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// LinearOperator
// ============================================================================

impl LinearOperator for StochasticNoiseOp {
    fn kind(&self) -> &'static str {
        "StochasticNoiseOp"
    }

    fn dim(&self) -> usize {
        self.dim
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
        self.update_rep();
        self.term_cache.invalidate();
        self.set_dirty(dirty);
        Ok(())
    }

    fn parameter_labels(&self) -> Vec<String> {
        self.basis.labels()[1..]
            .iter()
            .map(|l| format!("sqrt({} error rate)", l))
            .collect()
    }

    fn rep(&self) -> QchanResult<OpRep> {
        match self.evotype {
            Evotype::DensityMx => Ok(OpRep::DensityMx(self.errormap.clone())),
            Evotype::Term => Ok(OpRep::Term { dim: self.dim }),
            other => Err(QchanError::NotImplemented(format!(
                "a fixed representation of a sampled {} operator",
                other
            ))),
        }
    }

    fn transform_inplace(&mut self, s: &Similarity) -> QchanResult<()> {
        if self.evotype != Evotype::DensityMx {
            return Err(QchanError::NotImplemented(format!(
                "transform_inplace for the {} evolution type",
                self.evotype
            )));
        }
        let moved = s.apply(&self.errormap)? - Array2::<f64>::eye(self.dim);
        let rates = project_exact(&moved, &self.superops, self.kind())?;
        if let Some(r) = rates.iter().find(|r| **r < -tolerance::TRANSFORM) {
            return Err(QchanError::TransformNotSupported(format!(
                "{} would need a negative rate {:e}",
                self.kind(),
                r
            )));
        }
        let params: Array1<f64> = rates.mapv(|r| r.max(0.0).sqrt());
        self.from_vector(params.view(), true)
    }

    fn deriv_wrt_params(&self, wrt_filter: Option<&[usize]>) -> QchanResult<Array2<f64>> {
        if self.evotype == Evotype::Chp {
            return Err(QchanError::NotImplemented(
                "deriv_wrt_params for a sampled chp operator".to_string(),
            ));
        }
        let mut deriv = Array2::zeros((self.size(), self.num_params()));
        for (i, ss) in self.superops.iter().enumerate() {
            deriv.column_mut(i).assign(&(flatten(ss) * (2.0 * self.params[i])));
        }
        filter_deriv(deriv, wrt_filter)
    }

    fn hessian_wrt_params(
        &self,
        wrt_filter1: Option<&[usize]>,
        wrt_filter2: Option<&[usize]>,
    ) -> QchanResult<Array3<f64>> {
        if self.evotype == Evotype::Chp {
            return Err(QchanError::NotImplemented(
                "hessian_wrt_params for a sampled chp operator".to_string(),
            ));
        }
        let n = self.num_params();
        let mut hess = Array3::zeros((self.size(), n, n));
        for (i, ss) in self.superops.iter().enumerate() {
            for (row, x) in ss.iter().enumerate() {
                hess[[row, i, i]] = 2.0 * x;
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
        if !self.term_cache.is_cached(order) {
            let local = self.local_terms(order, max_polynomial_vars)?;
            self.term_cache.insert(order, local);
        }
        let local = self.term_cache.get(order).unwrap_or(&[]);
        Ok(TaylorTerms {
            terms: globalize_terms(local, self.member.gpindices())?,
            local_coeffs: return_coeff_polys.then(|| compact_coeffs(local)),
        })
    }

    fn total_term_magnitude(&self) -> QchanResult<f64> {
        Ok(self.rates().iter().map(|r| r.abs()).sum())
    }

    fn total_term_magnitude_deriv(&self) -> QchanResult<Array1<f64>> {
        Ok(&self.params * 2.0)
    }

    /// Draw one outcome and return its CHP program; no error gives `""`
    fn chp_str(&mut self, targets: Option<&[usize]>) -> QchanResult<String> {
        if self.evotype != Evotype::Chp {
            return Err(QchanError::NotImplemented(format!(
                "chp_str for the {} evolution type",
                self.evotype
            )));
        }
        let mut weights = self.rates().to_vec();
        let mut rest = 1.0 - weights.iter().sum::<f64>();
        if rest < 0.0 && rest > -tolerance::PROBABILITY {
            rest = 0.0;
        }
        weights.push(rest);
        if let Some(&bad) = weights.iter().find(|w| **w < 0.0 || !w.is_finite()) {
            return Err(QchanError::InvalidProbability(bad));
        }
        let dist = WeightedIndex::new(&weights)
            .map_err(|_| QchanError::InvalidProbability(rest))?;
        let index = dist.sample(&mut self.rng);
        log::trace!("StochasticNoiseOp sampled outcome {} of {}", index, weights.len());

        match self.chp_ops.get(index) {
            Some(program) => program.render(targets),
            None => Ok(String::new()),
        }
    }
}

impl fmt::Display for StochasticNoiseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Stochastic noise operation map with dim = {}, num params = {}",
            self.dim,
            self.num_params()
        )?;
        write!(f, "Rates: {:.6}", self.rates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::DenseOperator;
    use approx::assert_abs_diff_eq;
    use qchan_core::{ParamIndices, TermExpansionConfig};

    fn pp_op(rates: &[f64]) -> StochasticNoiseOp {
        StochasticNoiseOp::new(4, "pp", Evotype::DensityMx, Some(rates), None).unwrap()
    }

    #[test]
    fn test_single_x_rate() {
        let op = pp_op(&[0.1, 0.0, 0.0]);
        let dense = op.to_dense().unwrap();
        assert_eq!(dense[[0, 0]], 1.0);
        assert_abs_diff_eq!(dense[[1, 1]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(dense[[2, 2]], 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(dense[[3, 3]], 0.9, epsilon = 1e-12);

        let ident = DenseOperator::new_static(Array2::eye(4)).unwrap();
        let dist = op.frobeniusdist(&ident, None).unwrap();
        assert_abs_diff_eq!(dist, (2.0 * 0.1f64 * 0.1).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_identity_at_zero_and_positive_rates() {
        let mut op = pp_op(&[0.0, 0.0, 0.0]);
        assert_eq!(op.to_dense().unwrap(), Array2::<f64>::eye(4));

        op.from_vector(Array1::from(vec![-0.3, 0.2, -0.1]).view(), true).unwrap();
        assert!(op.rates().iter().all(|r| *r >= 0.0));
        assert_abs_diff_eq!(op.rates()[0], 0.09, epsilon = 1e-15);
    }

    #[test]
    fn test_roundtrip() {
        let mut op = pp_op(&[0.01, 0.02, 0.03]);
        let before = op.to_dense().unwrap();
        let v = op.to_vector();
        op.from_vector(v.view(), true).unwrap();
        assert_eq!(op.to_dense().unwrap(), before);
        assert_eq!(op.parameter_labels()[2], "sqrt(Z error rate)");
    }

    #[test]
    fn test_construction_errors() {
        let err = StochasticNoiseOp::new(8, "pp", Evotype::DensityMx, None, None).unwrap_err();
        assert!(err.is_configuration_error());

        let b = Arc::new(Basis::pauli_product(1));
        let err = StochasticNoiseOp::new(16, b, Evotype::DensityMx, None, None).unwrap_err();
        assert!(matches!(err, QchanError::BasisSizeMismatch { size: 4, dim: 16, .. }));

        let err = StochasticNoiseOp::new(4, "pp", Evotype::StateVec, None, None).unwrap_err();
        assert!(matches!(err, QchanError::UnsupportedEvotype { .. }));

        let err = StochasticNoiseOp::new(4, "gm", Evotype::Chp, None, None).unwrap_err();
        assert!(err.is_configuration_error());

        let err = StochasticNoiseOp::new(4, "pp", Evotype::DensityMx, Some(&[0.1]), None).unwrap_err();
        assert!(matches!(err, QchanError::ParamLengthMismatch { expected: 3, got: 1 }));

        let err =
            StochasticNoiseOp::new(4, "pp", Evotype::DensityMx, Some(&[0.1, -0.2, 0.0]), None).unwrap_err();
        assert!(matches!(err, QchanError::InvalidCoefficient { .. }));
    }

    #[test]
    fn test_taylor_terms() {
        let mut op = StochasticNoiseOp::new(4, "pp", Evotype::Term, Some(&[0.01, 0.04, 0.0]), None).unwrap();
        let v = op.to_vector().to_vec();

        let t0 = op.taylor_order_terms(0, 100, true).unwrap();
        assert_eq!(t0.terms.len(), 1);
        assert!(t0.terms[0].pre().is_none());
        assert_abs_diff_eq!(t0.terms[0].evaluate_coeff(&v).re, 0.95, epsilon = 1e-12);

        let t1 = op.taylor_order_terms(1, 100, true).unwrap();
        assert_eq!(t1.terms.len(), 3);
        assert_abs_diff_eq!(t1.terms[1].evaluate_coeff(&v).re, 0.04, epsilon = 1e-12);
        let coeffs = t1.local_coeffs.unwrap().bulk_evaluate(&v).unwrap();
        assert_abs_diff_eq!(coeffs[0].re, 0.01, epsilon = 1e-12);

        assert!(op.taylor_order_terms(2, 100, false).unwrap().terms.is_empty());

        op.set_gpindices(Some(ParamIndices::slice(5, 3))).unwrap();
        let shifted = op.taylor_order_terms(1, 100, false).unwrap();
        assert_eq!(shifted.terms[2].coeff().coeff(&[7, 7]), C64::new(1.0, 0.0));

        let err = op.taylor_order_terms(0, 2, false).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_highmagnitude_terms() {
        let mut op = StochasticNoiseOp::new(4, "pp", Evotype::Term, Some(&[0.1, 0.0, 0.0]), None).unwrap();

        let all = op
            .highmagnitude_terms(&TermExpansionConfig::new().with_min_term_mag(0.0))
            .unwrap();
        assert_eq!(all.terms.len(), 4);
        assert_eq!(all.first_order_indices, vec![1, 2, 3]);
        assert_abs_diff_eq!(all.terms[0].magnitude(), 0.9, epsilon = 1e-12);
        assert!(all.terms.windows(2).all(|w| w[0].magnitude() >= w[1].magnitude()));

        // forced first order keeps zero-magnitude terms
        let forced = op
            .highmagnitude_terms(&TermExpansionConfig::new().with_min_term_mag(0.05))
            .unwrap();
        assert_eq!(forced.terms.len(), 4);

        let pruned = op
            .highmagnitude_terms(
                &TermExpansionConfig::new()
                    .with_min_term_mag(0.05)
                    .with_force_first_order(false),
            )
            .unwrap();
        assert_eq!(pruned.terms.len(), 2);
        assert_eq!(pruned.first_order_indices, vec![1]);

        let total = op.total_term_magnitude().unwrap();
        let first_order: f64 = pruned
            .first_order_indices
            .iter()
            .map(|&i| pruned.terms[i].magnitude())
            .sum();
        assert!(total >= first_order);
    }

    #[test]
    fn test_term_magnitude_deriv() {
        let op = pp_op(&[0.04, 0.09, 0.0]);
        assert_abs_diff_eq!(op.total_term_magnitude().unwrap(), 0.13, epsilon = 1e-12);
        let d = op.total_term_magnitude_deriv().unwrap();
        assert_abs_diff_eq!(d[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(d[1], 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_deriv_matches_finite_difference() {
        let mut op = pp_op(&[0.01, 0.02, 0.03]);
        let deriv = op.deriv_wrt_params(None).unwrap();
        let v0 = op.to_vector();
        let base = flatten(&op.to_dense().unwrap());
        let eps = 1e-7;
        for k in 0..3 {
            let mut v = v0.clone();
            v[k] += eps;
            op.from_vector(v.view(), true).unwrap();
            let fd = (flatten(&op.to_dense().unwrap()) - &base) / eps;
            for row in 0..16 {
                assert_abs_diff_eq!(fd[row], deriv[[row, k]], epsilon = 1e-6);
            }
        }
        let hess = op.hessian_wrt_params(Some(&[1]), Some(&[1])).unwrap();
        assert_eq!(hess.dim(), (16, 1, 1));
        assert_abs_diff_eq!(hess[[5, 0, 0]], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transform() {
        let mut op = pp_op(&[0.05, 0.05, 0.05]);
        let mut s = Array2::eye(4);
        for k in 1..4 {
            s[[k, k]] = 3.0;
        }
        op.transform_inplace(&Similarity::new(s).unwrap()).unwrap();
        assert_abs_diff_eq!(op.rates()[1], 0.05, epsilon = 1e-10);

        let mut skew = Array2::eye(4);
        skew[[0, 3]] = 0.2;
        assert!(op
            .transform_inplace(&Similarity::new(skew).unwrap())
            .unwrap_err()
            .is_unsupported());
    }

    #[test]
    fn test_chp_sampling() {
        let mut quiet = StochasticNoiseOp::new(2, "pp", Evotype::Chp, None, Some(3)).unwrap();
        for _ in 0..20 {
            assert_eq!(quiet.chp_str(None).unwrap(), "");
        }
        assert!(quiet.to_dense().unwrap_err().is_unsupported());

        let mut always_x = StochasticNoiseOp::new(2, "pp", Evotype::Chp, Some(&[1.0, 0.0, 0.0]), Some(3)).unwrap();
        assert_eq!(always_x.chp_str(None).unwrap(), "h 0\np 0\np 0\nh 0\n");
        assert_eq!(always_x.chp_str(Some(&[4])).unwrap(), "h 4\np 4\np 4\nh 4\n");
        assert!(matches!(
            always_x.chp_str(Some(&[1, 2])),
            Err(QchanError::TargetCountMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_seeded_sampling_is_deterministic() {
        let rates = [0.2, 0.3, 0.1];
        let mut a = StochasticNoiseOp::new(2, "pp", Evotype::Chp, Some(&rates), Some(42)).unwrap();
        let mut b = StochasticNoiseOp::new(2, "pp", Evotype::Chp, Some(&rates), Some(42)).unwrap();
        let draws_a: Vec<String> = (0..50).map(|_| a.chp_str(None).unwrap()).collect();
        let draws_b: Vec<String> = (0..50).map(|_| b.chp_str(None).unwrap()).collect();
        assert_eq!(draws_a, draws_b);
        assert!(draws_a.iter().any(|s| s.is_empty()));
        assert!(draws_a.iter().any(|s| !s.is_empty()));

        a.reseed(7);
        b.reseed(7);
        assert_eq!(a.chp_str(None).unwrap(), b.chp_str(None).unwrap());
    }

    #[test]
    fn test_overfull_rates_cannot_be_sampled() {
        let mut op = StochasticNoiseOp::new(2, "pp", Evotype::Chp, Some(&[0.6, 0.6, 0.0]), Some(1)).unwrap();
        assert!(matches!(op.chp_str(None), Err(QchanError::InvalidProbability(_))));
    }
}
