//! The linear-operator contract
//!
//! Gantree: L1_Operators → LinearOperator
//!
//! Every operator kind implements [`LinearOperator`]: parameter access
//! through its slice of the parent's vector, materialization through its
//! evolution-type representation, similarity transforms, distances,
//! derivatives and the Taylor-term expansion. Default methods carry the
//! behavior shared by all kinds; kinds override what they can do better.

use crate::metrics::{self, DiamondNormSolver};
use crate::rep::{OpRep, StateRep};
use crate::transform::Similarity;
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use qchan_core::constants::expansion::MAX_CACHED_TERM_ORDER;
use qchan_core::{
    Basis, CompactPolynomial, Evotype, ParamIndices, ParentLink, QchanError, QchanResult,
    RankOneTerm, SparseMatrix, TermExpansionConfig,
};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Member State
// ============================================================================

/// Bookkeeping every operator carries as a member of a parent
/// Gantree: MemberState // gpindices + dirty + parent
#[derive(Debug, Clone, Default)]
pub struct MemberState {
    gpindices: Option<ParamIndices>,
    dirty: bool,
    parent: Option<ParentLink>,
}

impl MemberState {
    /// Unattached, clean state
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices into the parent's vector, if attached
    pub fn gpindices(&self) -> Option<&ParamIndices> {
        self.gpindices.as_ref()
    }

    /// Replace the indices into the parent's vector
    pub fn set_gpindices(&mut self, gpindices: Option<ParamIndices>) {
        self.gpindices = gpindices;
    }

    /// Whether parameters changed since the cached representation was built
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set the dirty flag
    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Link to the owning parent
    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// Replace the link to the owning parent
    pub fn set_parent(&mut self, parent: Option<ParentLink>) {
        self.parent = parent;
    }

    /// Ask the parent to re-layout its parameter vector
    pub fn notify_parent(&self) {
        if let Some(link) = &self.parent {
            link.mark_for_rebuild();
        }
    }
}

// ============================================================================
// Term Results
// ============================================================================

/// Terms at one Taylor order
/// Gantree: TaylorTerms // terms + local coeff tapes
#[derive(Debug, Clone, Default)]
pub struct TaylorTerms {
    /// Terms with coefficients over the parent's parameter indices
    pub terms: Vec<RankOneTerm>,
    /// The same coefficients over the operator's local indices, when requested
    pub local_coeffs: Option<CompactPolynomial>,
}

/// Result of [`LinearOperator::highmagnitude_terms`]
#[derive(Debug, Clone, Default)]
pub struct HighMagnitudeTerms {
    /// Terms sorted by descending magnitude
    pub terms: Vec<RankOneTerm>,
    /// Positions of first-order terms within `terms`
    pub first_order_indices: Vec<usize>,
}

/// Per-order cache of local Taylor terms, invalidated whenever parameters
/// or indices change
/// Gantree: TermCache // order -> (terms, dirty)
#[derive(Debug, Clone, Default)]
pub struct TermCache {
    entries: BTreeMap<usize, (Vec<RankOneTerm>, bool)>,
}

impl TermCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Clean cached terms for `order`
    pub fn get(&self, order: usize) -> Option<&[RankOneTerm]> {
        match self.entries.get(&order) {
            Some((terms, false)) => Some(terms),
            _ => None,
        }
    }

    /// Store terms for `order`
    pub fn insert(&mut self, order: usize, terms: Vec<RankOneTerm>) {
        log::trace!("caching {} terms at order {}", terms.len(), order);
        self.entries.insert(order, (terms, false));
    }

    /// Mark every order stale
    pub fn invalidate(&mut self) {
        self.entries.values_mut().for_each(|(_, dirty)| *dirty = true);
    }

    /// Whether `order` holds clean terms
    pub fn is_cached(&self, order: usize) -> bool {
        self.get(order).is_some()
    }
}

/// Rewrite local coefficient variables as parent indices through `gpindices`;
/// without indices the local indices are used as they are
pub fn globalize_terms(
    terms: &[RankOneTerm],
    gpindices: Option<&ParamIndices>,
) -> QchanResult<Vec<RankOneTerm>> {
    let Some(gp) = gpindices else {
        return Ok(terms.to_vec());
    };
    let lookup = gp.to_vec();
    terms
        .iter()
        .map(|t| {
            if let Some(&bad) = t
                .coeff()
                .terms()
                .flat_map(|(vars, _)| vars.iter())
                .find(|&&v| v >= lookup.len())
            {
                return Err(QchanError::IndexOutOfRange {
                    index: bad,
                    len: lookup.len(),
                });
            }
            t.map_indices(|v| lookup[v])
        })
        .collect()
}

/// Compact tapes of the terms' (local) coefficients
pub fn compact_coeffs(terms: &[RankOneTerm]) -> CompactPolynomial {
    let tapes: Vec<CompactPolynomial> = terms.iter().map(|t| t.coeff().compact()).collect();
    CompactPolynomial::concat(&tapes)
}

/// Attach to each term the magnitude of its local coefficient at `local_params`
pub fn with_magnitudes(found: TaylorTerms, local_params: &[f64]) -> QchanResult<Vec<RankOneTerm>> {
    let tapes = found.local_coeffs.ok_or_else(|| {
        QchanError::NotImplemented("terms without local coefficient tapes".to_string())
    })?;
    let coeffs = tapes.bulk_evaluate(local_params)?;
    if coeffs.len() != found.terms.len() {
        return Err(QchanError::ParamLengthMismatch {
            expected: found.terms.len(),
            got: coeffs.len(),
        });
    }
    Ok(found
        .terms
        .into_iter()
        .zip(coeffs)
        .map(|(t, c)| t.with_magnitude(c.norm()))
        .collect())
}

// ============================================================================
// Derivative Helpers
// ============================================================================

fn check_filter(filter: &[usize], n: usize) -> QchanResult<()> {
    match filter.iter().find(|&&i| i >= n) {
        Some(&i) => Err(QchanError::IndexOutOfRange { index: i, len: n }),
        None => Ok(()),
    }
}

/// Keep only the derivative columns in `filter`
pub fn filter_deriv(deriv: Array2<f64>, filter: Option<&[usize]>) -> QchanResult<Array2<f64>> {
    match filter {
        Some(f) => {
            check_filter(f, deriv.ncols())?;
            Ok(deriv.select(Axis(1), f))
        }
        None => Ok(deriv),
    }
}

/// Keep only the Hessian slices in `filter1` × `filter2`
pub fn filter_hessian(
    hess: Array3<f64>,
    filter1: Option<&[usize]>,
    filter2: Option<&[usize]>,
) -> QchanResult<Array3<f64>> {
    let n = hess.len_of(Axis(1));
    let hess = match filter1 {
        Some(f) => {
            check_filter(f, n)?;
            hess.select(Axis(1), f)
        }
        None => hess,
    };
    match filter2 {
        Some(f) => {
            check_filter(f, n)?;
            Ok(hess.select(Axis(2), f))
        }
        None => Ok(hess),
    }
}

fn filtered_len(filter: Option<&[usize]>, n: usize) -> usize {
    filter.map_or(n, <[usize]>::len)
}

// ============================================================================
// LinearOperator
// ============================================================================

/// A parameterized linear (super-)operator
/// Gantree: LinearOperator // trait
pub trait LinearOperator: fmt::Debug {
    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    /// Operator kind, for messages
    fn kind(&self) -> &'static str;

    /// Superoperator dimension
    fn dim(&self) -> usize;

    /// Number of matrix elements
    fn size(&self) -> usize {
        self.dim() * self.dim()
    }

    /// Evolution type
    fn evotype(&self) -> Evotype;

    /// Member bookkeeping
    fn member(&self) -> &MemberState;

    /// Mutable member bookkeeping
    fn member_mut(&mut self) -> &mut MemberState;

    /// Indices into the parent's vector
    fn gpindices(&self) -> Option<&ParamIndices> {
        self.member().gpindices()
    }

    /// Assign indices into the parent's vector
    fn set_gpindices(&mut self, gpindices: Option<ParamIndices>) -> QchanResult<()> {
        if let Some(gp) = &gpindices {
            if gp.len() != self.num_params() {
                return Err(QchanError::ParamLengthMismatch {
                    expected: self.num_params(),
                    got: gp.len(),
                });
            }
        }
        self.member_mut().set_gpindices(gpindices);
        self.invalidate_term_cache();
        Ok(())
    }

    /// Link to the owning parent
    fn set_parent(&mut self, parent: Option<ParentLink>) {
        self.member_mut().set_parent(parent);
    }

    /// Whether parameters changed since the representation was last read
    fn is_dirty(&self) -> bool {
        self.member().is_dirty()
    }

    /// Set the dirty flag
    fn set_dirty(&mut self, dirty: bool) {
        self.member_mut().set_dirty(dirty);
    }

    /// Drop cached Taylor terms
    fn invalidate_term_cache(&mut self) {}

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;

    // ------------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------------

    /// Size of the local parameter vector
    fn num_params(&self) -> usize;

    /// Local parameter vector
    fn to_vector(&self) -> Array1<f64>;

    /// Set the local parameter vector; `dirty` marks cached state stale
    fn from_vector(&mut self, v: ArrayView1<f64>, dirty: bool) -> QchanResult<()>;

    /// One label per parameter
    fn parameter_labels(&self) -> Vec<String> {
        (0..self.num_params())
            .map(|i| format!("{} param {}", self.kind(), i))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------------

    /// Evolution-type representation at the current parameters
    fn rep(&self) -> QchanResult<OpRep>;

    /// Dense `dim × dim` matrix
    fn to_dense(&self) -> QchanResult<Array2<f64>> {
        self.rep()?.to_dense()
    }

    /// Sparse `dim × dim` matrix
    fn to_sparse(&self) -> QchanResult<SparseMatrix> {
        self.rep()?.to_sparse()
    }

    /// Apply to `state`
    fn acton(&self, state: &StateRep) -> QchanResult<StateRep> {
        self.rep()?.act(state)
    }

    /// Set the dense value directly
    fn set_dense(&mut self, _m: &Array2<f64>) -> QchanResult<()> {
        Err(QchanError::CannotSetDense(self.kind().to_string()))
    }

    /// Follow the operator with uniform depolarization of strength `amount`
    fn depolarize(&mut self, amount: f64) -> QchanResult<()> {
        let d = self.dim();
        let mut depol = Array2::<f64>::eye(d);
        for k in 1..d {
            depol[[k, k]] = 1.0 - amount;
        }
        let composed = depol.dot(&self.to_dense()?);
        self.set_dense(&composed)
    }

    /// Replace this operator by `self · other`
    fn compose(&mut self, other: &dyn LinearOperator) -> QchanResult<()> {
        if other.dim() != self.dim() {
            return Err(QchanError::DimensionMismatch {
                expected: self.dim(),
                got: other.dim(),
            });
        }
        let product = self.to_dense()?.dot(&other.to_dense()?);
        self.set_dense(&product)
    }

    /// Apply `O -> S⁻¹ O S` by updating parameters
    fn transform_inplace(&mut self, _s: &Similarity) -> QchanResult<()> {
        Err(QchanError::NotImplemented(format!(
            "transform_inplace for {} ({})",
            self.kind(),
            self.evotype()
        )))
    }

    // ------------------------------------------------------------------------
    // Distances
    // ------------------------------------------------------------------------

    /// Dense matrix after an optional similarity transform
    fn transformed_dense(&self, transform: Option<&Similarity>) -> QchanResult<Array2<f64>> {
        metrics::transformed(&self.to_dense()?, transform)
    }

    /// Squared Frobenius distance to `other`
    fn frobeniusdist_squared(
        &self,
        other: &dyn LinearOperator,
        transform: Option<&Similarity>,
    ) -> QchanResult<f64> {
        metrics::frobeniusdist_squared(&self.transformed_dense(transform)?, &other.to_dense()?)
    }

    /// Frobenius distance to `other`
    fn frobeniusdist(
        &self,
        other: &dyn LinearOperator,
        transform: Option<&Similarity>,
    ) -> QchanResult<f64> {
        Ok(self.frobeniusdist_squared(other, transform)?.sqrt())
    }

    /// Elementwise differences to `other`, flattened row-major
    fn residuals(
        &self,
        other: &dyn LinearOperator,
        transform: Option<&Similarity>,
    ) -> QchanResult<Array1<f64>> {
        let a = self.transformed_dense(transform)?;
        let b = other.to_dense()?;
        if a.dim() != b.dim() {
            return Err(QchanError::ShapeMismatch {
                expected: a.dim(),
                got: b.dim(),
            });
        }
        Ok((a - b).iter().copied().collect())
    }

    /// Jamiołkowski trace distance to `other` in `basis`
    fn jtracedist(
        &self,
        other: &dyn LinearOperator,
        basis: &Basis,
        transform: Option<&Similarity>,
    ) -> QchanResult<f64> {
        metrics::jtracedist(&self.transformed_dense(transform)?, &other.to_dense()?, basis)
    }

    /// Half diamond distance to `other`; `CapabilityUnavailable` without a solver
    fn diamonddist(
        &self,
        other: &dyn LinearOperator,
        basis: &Basis,
        transform: Option<&Similarity>,
        solver: &dyn DiamondNormSolver,
    ) -> QchanResult<f64> {
        metrics::diamonddist(
            &self.transformed_dense(transform)?,
            &other.to_dense()?,
            basis,
            solver,
        )
    }

    // ------------------------------------------------------------------------
    // Derivatives
    // ------------------------------------------------------------------------

    /// Derivative of the flattened dense matrix with respect to the local
    /// parameters, shape `(dim², n)`, restricted to `wrt_filter`
    fn deriv_wrt_params(&self, wrt_filter: Option<&[usize]>) -> QchanResult<Array2<f64>> {
        if self.num_params() == 0 {
            check_filter(wrt_filter.unwrap_or(&[]), 0)?;
            return Ok(Array2::zeros((self.size(), 0)));
        }
        Err(QchanError::NotImplemented(format!(
            "deriv_wrt_params for {}",
            self.kind()
        )))
    }

    /// Whether the Hessian can be non-zero
    fn has_nonzero_hessian(&self) -> bool {
        true
    }

    /// Hessian of the flattened dense matrix, shape `(dim², n1, n2)`
    fn hessian_wrt_params(
        &self,
        wrt_filter1: Option<&[usize]>,
        wrt_filter2: Option<&[usize]>,
    ) -> QchanResult<Array3<f64>> {
        let n = self.num_params();
        if n == 0 || !self.has_nonzero_hessian() {
            check_filter(wrt_filter1.unwrap_or(&[]), n)?;
            check_filter(wrt_filter2.unwrap_or(&[]), n)?;
            return Ok(Array3::zeros((
                self.size(),
                filtered_len(wrt_filter1, n),
                filtered_len(wrt_filter2, n),
            )));
        }
        Err(QchanError::NotImplemented(format!(
            "hessian_wrt_params for {}",
            self.kind()
        )))
    }

    // ------------------------------------------------------------------------
    // Taylor Terms
    // ------------------------------------------------------------------------

    /// Rank-one terms at Taylor `order`, coefficients over parent indices
    fn taylor_order_terms(
        &mut self,
        _order: usize,
        _max_polynomial_vars: usize,
        _return_coeff_polys: bool,
    ) -> QchanResult<TaylorTerms> {
        Err(QchanError::NotImplemented(format!(
            "taylor_order_terms for {}",
            self.kind()
        )))
    }

    /// Terms at `order` whose magnitude is at least `min_term_mag`
    fn taylor_order_terms_above_mag(
        &mut self,
        order: usize,
        max_polynomial_vars: usize,
        min_term_mag: f64,
    ) -> QchanResult<Vec<RankOneTerm>> {
        let v = self.to_vector().to_vec();
        let found = self.taylor_order_terms(order, max_polynomial_vars, true)?;
        Ok(with_magnitudes(found, &v)?
            .into_iter()
            .filter(|t| t.magnitude() >= min_term_mag)
            .collect())
    }

    /// Terms of increasing order whose magnitude reaches `min_term_mag`
    ///
    /// Orders are explored until one adds nothing, `max_taylor_order` is
    /// passed, or `first_order_magmax^order` drops below `min_term_mag`.
    /// With `force_first_order` every first-order term is kept.
    ///
    /// The "adds nothing" check compares against the previous order at every
    /// order, including orders 2 and up. An order past 1 that contributes no
    /// term therefore ends the search even when a later order would.
    fn highmagnitude_terms(
        &mut self,
        config: &TermExpansionConfig,
    ) -> QchanResult<HighMagnitudeTerms> {
        config.validate()?;
        let v = self.to_vector().to_vec();
        let max_vars = config.max_polynomial_vars;
        let min_mag = config.min_term_mag;

        let mut found: Vec<(usize, RankOneTerm)> = Vec::new();
        let mut last_len: Option<usize> = None;
        let mut first_order_magmax = 1.0_f64;
        let mut order = 0;

        while last_len.map_or(true, |l| found.len() > l) || (order == 1 && config.force_first_order)
        {
            if order > 1 && first_order_magmax.powi(order as i32) < min_mag {
                break;
            }
            last_len = Some(found.len());

            if order <= MAX_CACHED_TERM_ORDER {
                let at_order = with_magnitudes(self.taylor_order_terms(order, max_vars, true)?, &v)?;
                if order == 1 {
                    first_order_magmax = at_order.iter().map(RankOneTerm::magnitude).fold(0.0, f64::max);
                }
                let keep_all = order == 1 && config.force_first_order;
                found.extend(
                    at_order
                        .into_iter()
                        .filter(|t| keep_all || t.magnitude() >= min_mag)
                        .map(|t| (order, t)),
                );
            } else {
                let above = self.taylor_order_terms_above_mag(order, max_vars, min_mag)?;
                found.extend(above.into_iter().map(|t| (order, t)));
            }
            log::trace!(
                "{}: order {} kept {} terms ({} total)",
                self.kind(),
                order,
                found.len() - last_len.unwrap_or(0),
                found.len()
            );

            order += 1;
            if order > config.max_taylor_order {
                break;
            }
        }

        found.sort_by(|a, b| b.1.magnitude().total_cmp(&a.1.magnitude()));
        let first_order_indices = found
            .iter()
            .enumerate()
            .filter(|(_, (o, _))| *o == 1)
            .map(|(i, _)| i)
            .collect();
        Ok(HighMagnitudeTerms {
            terms: found.into_iter().map(|(_, t)| t).collect(),
            first_order_indices,
        })
    }

    /// Sum of the magnitudes of all terms
    fn total_term_magnitude(&self) -> QchanResult<f64> {
        Err(QchanError::NotImplemented(format!(
            "total_term_magnitude for {}",
            self.kind()
        )))
    }

    /// Derivative of [`LinearOperator::total_term_magnitude`] w.r.t. local parameters
    fn total_term_magnitude_deriv(&self) -> QchanResult<Array1<f64>> {
        Err(QchanError::NotImplemented(format!(
            "total_term_magnitude_deriv for {}",
            self.kind()
        )))
    }

    // ------------------------------------------------------------------------
    // Sampling
    // ------------------------------------------------------------------------

    /// CHP program text for one invocation, optionally retargeted
    fn chp_str(&mut self, targets: Option<&[usize]>) -> QchanResult<String> {
        match self.rep()? {
            OpRep::Chp(chp) => chp.render(targets),
            other => Err(QchanError::NotImplemented(format!(
                "chp_str for the {} evolution type",
                other.evotype()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qchan_core::{Polynomial, RebuildHook, C64};

    fn term(vars: Vec<usize>) -> RankOneTerm {
        let coeff = Polynomial::from_terms([(vars, C64::new(1.0, 0.0))], 100).unwrap();
        RankOneTerm::new(coeff, None, None, Evotype::Term)
    }

    #[test]
    fn test_member_notifies_parent() {
        let hook = RebuildHook::new();
        let mut member = MemberState::new();
        member.notify_parent();
        assert!(!hook.is_pending());

        member.set_parent(Some(ParentLink::new(hook.clone(), "Gx")));
        member.notify_parent();
        assert_eq!(hook.take_pending(), vec!["Gx".to_string()]);
    }

    #[test]
    fn test_term_cache_invalidation() {
        let mut cache = TermCache::new();
        assert!(cache.get(0).is_none());
        cache.insert(0, vec![term(vec![])]);
        assert!(cache.is_cached(0));
        cache.invalidate();
        assert!(!cache.is_cached(0));
        cache.insert(0, vec![]);
        assert_eq!(cache.get(0).map(<[RankOneTerm]>::len), Some(0));
    }

    #[test]
    fn test_globalize_terms() {
        let gp = ParamIndices::slice(5, 2);
        let out = globalize_terms(&[term(vec![1, 1])], Some(&gp)).unwrap();
        assert_eq!(out[0].coeff().coeff(&[6, 6]), C64::new(1.0, 0.0));

        let unattached = globalize_terms(&[term(vec![1])], None).unwrap();
        assert_eq!(unattached[0].coeff().coeff(&[1]), C64::new(1.0, 0.0));

        let err = globalize_terms(&[term(vec![2])], Some(&gp)).unwrap_err();
        assert!(err.is_index_error());
    }

    #[test]
    fn test_with_magnitudes() {
        let terms = vec![term(vec![0, 0]), term(vec![])];
        let found = TaylorTerms {
            local_coeffs: Some(compact_coeffs(&terms)),
            terms,
        };
        let out = with_magnitudes(found, &[-0.5]).unwrap();
        assert!((out[0].magnitude() - 0.25).abs() < 1e-12);
        assert!((out[1].magnitude() - 1.0).abs() < 1e-12);

        let bare = TaylorTerms {
            terms: vec![term(vec![])],
            local_coeffs: None,
        };
        assert!(with_magnitudes(bare, &[]).is_err());
    }

    #[test]
    fn test_filters() {
        let d = Array2::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f64);
        let f = filter_deriv(d, Some(&[2, 0])).unwrap();
        assert_eq!(f[[1, 0]], 5.0);
        assert_eq!(f[[1, 1]], 3.0);
        assert!(filter_deriv(Array2::zeros((2, 3)), Some(&[3])).is_err());

        let h = Array3::<f64>::zeros((4, 3, 3));
        let hf = filter_hessian(h, Some(&[1]), None).unwrap();
        assert_eq!(hf.dim(), (4, 1, 3));
    }
}
