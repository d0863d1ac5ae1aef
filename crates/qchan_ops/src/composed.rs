//! Sums of error generators
//!
//! Gantree: L1_Operators → ComposedErrorgen
//!
//! `L = Σ_f L_f`. Each factor owns a contiguous slice of the composite's
//! local parameter vector, laid out in factor order; the composite in turn
//! owns a slice of its parent's vector. Coefficient dictionaries, arrays,
//! derivatives and terms are assembled from the factors through those
//! slices.

use crate::errorgen::{assert_order_zero, ErrorGenerator};
use crate::operator::{
    filter_deriv, filter_hessian, globalize_terms, HighMagnitudeTerms, LinearOperator,
    MemberState, TaylorTerms,
};
use crate::rep::OpRep;
use crate::transform::Similarity;
use ndarray::{s, Array1, Array2, Array3, ArrayView1};
use qchan_core::linalg::frobenius_norm;
use qchan_core::{
    tolerance, Basis, CoefficientAction, Evotype, LindbladCoefficients, LindbladTermKey,
    ParamIndices, QchanError, QchanResult, RankOneTerm, TermExpansionConfig,
};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Slice of the composite's vector owned by `factor`
fn slot(factor: &dyn ErrorGenerator) -> QchanResult<&ParamIndices> {
    factor.gpindices().ok_or_else(|| {
        QchanError::ConfigError(format!("{} factor has no parameter slice", factor.kind()))
    })
}

/// Sum of error generators sharing one dimension and evolution type
/// Gantree: ComposedErrorgen // Σ factors
#[derive(Debug)]
pub struct ComposedErrorgen {
    factors: Vec<Box<dyn ErrorGenerator>>,
    dim: usize,
    evotype: Evotype,
    member: MemberState,
}

impl ComposedErrorgen {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Composite of `factors`
    ///
    /// `dim` and `evotype` default to the first factor's and are required
    /// when `factors` is empty.
    pub fn new(
        factors: Vec<Box<dyn ErrorGenerator>>,
        dim: Option<usize>,
        evotype: Option<Evotype>,
    ) -> QchanResult<Self> {
        let first = factors.first();
        let dim = match (dim, first) {
            (Some(d), _) => d,
            (None, Some(f)) => f.dim(),
            (None, None) => {
                return Err(QchanError::EmptyComposite(
                    "dimension must be given when there are no factors".to_string(),
                ))
            }
        };
        let evotype = match (evotype, first) {
            (Some(e), _) => e,
            (None, Some(f)) => f.evotype(),
            (None, None) => {
                return Err(QchanError::EmptyComposite(
                    "evolution type must be given when there are no factors".to_string(),
                ))
            }
        };

        let mut composed = Self {
            factors: Vec::with_capacity(factors.len()),
            dim,
            evotype,
            member: MemberState::new(),
        };
        composed.check_factors(&factors)?;
        composed.factors = factors;
        composed.layout()?;
        Ok(composed)
    }

    /// Factors must match the composite's dimension, evolution type and
    /// matrix basis
    fn check_factors(&self, factors: &[Box<dyn ErrorGenerator>]) -> QchanResult<()> {
        let mut reference = self.matrix_basis();
        for factor in factors {
            if factor.dim() != self.dim {
                return Err(QchanError::DimensionMismatch {
                    expected: self.dim,
                    got: factor.dim(),
                });
            }
            if factor.evotype() != self.evotype {
                return Err(QchanError::EvotypeMismatch {
                    expected: self.evotype.to_string(),
                    got: factor.evotype().to_string(),
                });
            }
            let Some(basis) = factor.matrix_basis() else {
                continue;
            };
            match reference {
                Some(ref r) if Arc::ptr_eq(r, &basis) || r.same_matrices(&basis) => {}
                Some(ref r) => {
                    return Err(QchanError::MatrixBasisMismatch {
                        expected: r.name().to_string(),
                        got: basis.name().to_string(),
                    })
                }
                None => reference = Some(basis),
            }
        }
        Ok(())
    }

    /// Give every factor its slice of the local vector, in factor order
    fn layout(&mut self) -> QchanResult<()> {
        let mut offset = 0;
        for f in &mut self.factors {
            let n = f.num_params();
            f.set_gpindices(Some(ParamIndices::slice(offset, n)))?;
            offset += n;
        }
        log::debug!(
            "ComposedErrorgen: {} factors over {} params",
            self.factors.len(),
            offset
        );
        Ok(())
    }

    // ========================================================================
    // Factor List
    // ========================================================================

    /// Factors in order
    pub fn factors(&self) -> &[Box<dyn ErrorGenerator>] {
        &self.factors
    }

    /// Factor `i`
    pub fn factor(&self, i: usize) -> Option<&dyn ErrorGenerator> {
        self.factors.get(i).map(|f| f.as_ref())
    }

    /// Mutable factor `i`
    pub fn factor_mut(&mut self, i: usize) -> Option<&mut Box<dyn ErrorGenerator>> {
        self.factors.get_mut(i)
    }

    /// Number of factors
    pub fn num_factors(&self) -> usize {
        self.factors.len()
    }

    /// Append factors; the parent is asked to re-layout its vector
    pub fn append(&mut self, factors: Vec<Box<dyn ErrorGenerator>>) -> QchanResult<()> {
        self.check_factors(&factors)?;
        self.factors.extend(factors);
        self.layout()?;
        self.set_dirty(true);
        self.member.notify_parent();
        Ok(())
    }

    /// Remove the factors at `indices`, returned in ascending index order;
    /// the parent is asked to re-layout its vector
    pub fn remove(&mut self, indices: &[usize]) -> QchanResult<Vec<Box<dyn ErrorGenerator>>> {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        for (k, &i) in sorted.iter().enumerate() {
            if i >= self.factors.len() {
                return Err(QchanError::IndexOutOfRange {
                    index: i,
                    len: self.factors.len(),
                });
            }
            if k > 0 && sorted[k - 1] == i {
                return Err(QchanError::DuplicateIndex(i));
            }
        }

        let mut removed: Vec<Box<dyn ErrorGenerator>> =
            sorted.iter().rev().map(|&i| self.factors.remove(i)).collect();
        removed.reverse();
        for f in &mut removed {
            f.set_gpindices(None)?;
        }
        self.layout()?;
        self.set_dirty(true);
        self.member.notify_parent();
        Ok(removed)
    }
}

// ============================================================================
// LinearOperator
// ============================================================================

impl LinearOperator for ComposedErrorgen {
    fn kind(&self) -> &'static str {
        "ComposedErrorgen"
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

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn num_params(&self) -> usize {
        self.factors.iter().map(|f| f.num_params()).sum()
    }

    fn to_vector(&self) -> Array1<f64> {
        self.factors.iter().flat_map(|f| f.to_vector().to_vec()).collect()
    }

    fn from_vector(&mut self, v: ArrayView1<f64>, dirty: bool) -> QchanResult<()> {
        if v.len() != self.num_params() {
            return Err(QchanError::ParamLengthMismatch {
                expected: self.num_params(),
                got: v.len(),
            });
        }
        for f in &mut self.factors {
            let local = slot(f.as_ref())?.gather(v)?;
            f.from_vector(local.view(), dirty)?;
        }
        self.set_dirty(dirty);
        Ok(())
    }

    fn parameter_labels(&self) -> Vec<String> {
        self.factors
            .iter()
            .flat_map(|f| f.parameter_labels())
            .collect()
    }

    fn rep(&self) -> QchanResult<OpRep> {
        let reps = self
            .factors
            .iter()
            .map(|f| f.rep())
            .collect::<QchanResult<Vec<_>>>()?;
        OpRep::compose_sum(reps, self.evotype, self.dim)
    }

    fn transform_inplace(&mut self, s: &Similarity) -> QchanResult<()> {
        for f in &mut self.factors {
            f.transform_inplace(s)?;
        }
        self.set_dirty(true);
        Ok(())
    }

    fn deriv_wrt_params(&self, wrt_filter: Option<&[usize]>) -> QchanResult<Array2<f64>> {
        let mut deriv = Array2::zeros((self.size(), self.num_params()));
        for f in &self.factors {
            let local = f.deriv_wrt_params(None)?;
            for (j, col) in slot(f.as_ref())?.iter().enumerate() {
                deriv.column_mut(col).assign(&local.column(j));
            }
        }
        filter_deriv(deriv, wrt_filter)
    }

    fn has_nonzero_hessian(&self) -> bool {
        self.factors.iter().any(|f| f.has_nonzero_hessian())
    }

    fn hessian_wrt_params(
        &self,
        wrt_filter1: Option<&[usize]>,
        wrt_filter2: Option<&[usize]>,
    ) -> QchanResult<Array3<f64>> {
        let n = self.num_params();
        let mut hess = Array3::zeros((self.size(), n, n));
        for f in self.factors.iter().filter(|f| f.has_nonzero_hessian()) {
            let local = f.hessian_wrt_params(None, None)?;
            let idx = slot(f.as_ref())?.to_vec();
            for (a, &ia) in idx.iter().enumerate() {
                for (b, &ib) in idx.iter().enumerate() {
                    hess.slice_mut(s![.., ia, ib])
                        .assign(&local.slice(s![.., a, b]));
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
        assert!(
            !return_coeff_polys,
            "ComposedErrorgen does not return coefficient polynomials"
        );
        let mut local = Vec::new();
        for f in &mut self.factors {
            local.extend(f.taylor_order_terms(0, max_polynomial_vars, false)?.terms);
        }
        Ok(TaylorTerms {
            terms: globalize_terms(&local, self.member.gpindices())?,
            local_coeffs: None,
        })
    }

    fn taylor_order_terms_above_mag(
        &mut self,
        _order: usize,
        _max_polynomial_vars: usize,
        _min_term_mag: f64,
    ) -> QchanResult<Vec<RankOneTerm>> {
        Err(QchanError::NotImplemented(
            "term magnitudes for ComposedErrorgen; expand the enclosing operator".to_string(),
        ))
    }

    fn highmagnitude_terms(
        &mut self,
        _config: &TermExpansionConfig,
    ) -> QchanResult<HighMagnitudeTerms> {
        Err(QchanError::NotImplemented(
            "highmagnitude_terms for ComposedErrorgen; expand the enclosing operator".to_string(),
        ))
    }

    fn total_term_magnitude(&self) -> QchanResult<f64> {
        self.factors.iter().map(|f| f.total_term_magnitude()).sum()
    }

    fn total_term_magnitude_deriv(&self) -> QchanResult<Array1<f64>> {
        let mut deriv = Array1::zeros(self.num_params());
        for f in &self.factors {
            slot(f.as_ref())?.scatter(f.total_term_magnitude_deriv()?.view(), deriv.view_mut())?;
        }
        Ok(deriv)
    }
}

// ============================================================================
// ErrorGenerator
// ============================================================================

impl ComposedErrorgen {
    /// Single basis covering every factor's labels
    fn merged_basis(bases: Vec<Arc<Basis>>) -> QchanResult<Option<Arc<Basis>>> {
        let Some(first) = bases.first() else {
            return Ok(None);
        };
        if bases.iter().all(|b| Arc::ptr_eq(b, first) || **b == **first) {
            return Ok(Some(Arc::clone(first)));
        }

        let mut labels = vec!["I".to_string()];
        let mut elements = vec![first.elements()[0].clone()];
        for basis in &bases {
            for (label, el) in basis.labels().iter().zip(basis.elements()).skip(1) {
                match labels.iter().position(|l| l == label) {
                    Some(k) => {
                        if frobenius_norm(&(&elements[k] - el)) > tolerance::BASIS_LABEL {
                            return Err(QchanError::AmbiguousBasisLabel(label.clone()));
                        }
                    }
                    None => {
                        labels.push(label.clone());
                        elements.push(el.clone());
                    }
                }
            }
        }
        log::debug!("merged {} factor bases into {} labels", bases.len(), labels.len());
        Ok(Some(Arc::new(Basis::explicit("union", labels, elements)?)))
    }
}

impl ErrorGenerator for ComposedErrorgen {
    fn coefficients(&self, logscale_nonham: bool) -> QchanResult<LindbladCoefficients> {
        let mut merged = LindbladCoefficients::new();
        for f in &self.factors {
            for (key, value) in f.coefficients(logscale_nonham)? {
                *merged.entry(key).or_default() += value;
            }
        }
        Ok(merged)
    }

    fn coefficient_basis(&self) -> QchanResult<Option<Arc<Basis>>> {
        let mut bases = Vec::new();
        for f in &self.factors {
            if let Some(b) = f.coefficient_basis()? {
                if !b.is_empty() {
                    bases.push(b);
                }
            }
        }
        Self::merged_basis(bases)
    }

    fn matrix_basis(&self) -> Option<Arc<Basis>> {
        self.factors.iter().find_map(|f| f.matrix_basis())
    }

    fn coefficient_keys(&self) -> Vec<LindbladTermKey> {
        self.factors
            .iter()
            .flat_map(|f| f.coefficient_keys())
            .collect()
    }

    fn coefficients_array(&self) -> Array1<f64> {
        self.factors
            .iter()
            .flat_map(|f| f.coefficients_array().to_vec())
            .collect()
    }

    fn coefficients_array_deriv_wrt_params(&self) -> QchanResult<Array2<f64>> {
        let nrows: usize = self.factors.iter().map(|f| f.coefficient_keys().len()).sum();
        let mut deriv = Array2::zeros((nrows, self.num_params()));
        let mut row = 0;
        for f in &self.factors {
            let local = f.coefficients_array_deriv_wrt_params()?;
            for (j, col) in slot(f.as_ref())?.iter().enumerate() {
                deriv
                    .slice_mut(s![row..row + local.nrows(), col])
                    .assign(&local.column(j));
            }
            row += local.nrows();
        }
        Ok(deriv)
    }

    /// Each key goes to the first factor that has it
    fn set_coefficients(
        &mut self,
        coefficients: &LindbladCoefficients,
        action: CoefficientAction,
        logscale_nonham: bool,
    ) -> QchanResult<()> {
        let factor_keys: Vec<BTreeSet<LindbladTermKey>> = self
            .factors
            .iter()
            .map(|f| f.coefficient_keys().into_iter().collect())
            .collect();

        let mut routed = vec![LindbladCoefficients::new(); self.factors.len()];
        let mut unknown = Vec::new();
        for (key, value) in coefficients {
            match factor_keys.iter().position(|keys| keys.contains(key)) {
                Some(k) => {
                    routed[k].insert(key.clone(), *value);
                }
                None => unknown.push(key.to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(QchanError::UnknownTermKeys(unknown));
        }

        for (f, sub) in self.factors.iter_mut().zip(&routed) {
            if !sub.is_empty() || action == CoefficientAction::Reset {
                f.set_coefficients(sub, action, logscale_nonham)?;
            }
        }
        self.set_dirty(true);
        Ok(())
    }

    fn onenorm_upperbound(&self) -> QchanResult<f64> {
        self.factors.iter().map(|f| f.onenorm_upperbound()).sum()
    }
}

impl fmt::Display for ComposedErrorgen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Composed error generator of {} factors with dim = {}, num params = {}",
            self.factors.len(),
            self.dim,
            self.num_params()
        )?;
        for (i, factor) in self.factors.iter().enumerate() {
            writeln!(f, "  factor {}: {} ({} params)", i, factor.kind(), factor.num_params())?;
        }
        Ok(())
    }
}
