//! Parent model
//!
//! Gantree: L2_Model → OpModel
//!
//! Owns the flat global parameter vector. Every top-level operator gets a
//! contiguous slice of it and a [`ParentLink`] through which it can ask for
//! the layout to be rebuilt when its parameter count changes. Requests are
//! queued and processed lazily, on the next vector access.

use ndarray::{Array1, ArrayView1};
use qchan_core::{
    locate, Evotype, ParamIndices, ParentLink, QchanError, QchanResult, RebuildHook,
    TermExpansionConfig,
};
use qchan_ops::{HighMagnitudeTerms, LinearOperator};
use std::fmt;

/// Labeled operators sharing one global parameter vector
/// Gantree: OpModel // params + members + hook
#[derive(Debug)]
pub struct OpModel {
    dim: usize,
    evotype: Evotype,
    members: Vec<(String, Box<dyn LinearOperator>)>,
    params: Array1<f64>,
    hook: RebuildHook,
    term_config: TermExpansionConfig,
}

impl OpModel {
    /// Empty model for operators of dimension `dim` and evolution type `evotype`
    pub fn new(dim: usize, evotype: Evotype) -> Self {
        Self {
            dim,
            evotype,
            members: Vec::new(),
            params: Array1::zeros(0),
            hook: RebuildHook::new(),
            term_config: TermExpansionConfig::default(),
        }
    }

    /// Use `config` for term expansions
    pub fn with_term_config(mut self, config: TermExpansionConfig) -> QchanResult<Self> {
        config.validate()?;
        self.term_config = config;
        Ok(self)
    }

    /// Operator dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Evolution type
    pub fn evotype(&self) -> Evotype {
        self.evotype
    }

    /// Term-expansion settings
    pub fn term_config(&self) -> &TermExpansionConfig {
        &self.term_config
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Add `op` under `label` at the end of the parameter vector
    pub fn add_operator(&mut self, label: &str, mut op: Box<dyn LinearOperator>) -> QchanResult<()> {
        if self.members.iter().any(|(l, _)| l == label) {
            return Err(QchanError::ConfigError(format!(
                "operator label '{}' already in use",
                label
            )));
        }
        if op.dim() != self.dim {
            return Err(QchanError::DimensionMismatch {
                expected: self.dim,
                got: op.dim(),
            });
        }
        if op.evotype() != self.evotype {
            return Err(QchanError::EvotypeMismatch {
                expected: self.evotype.to_string(),
                got: op.evotype().to_string(),
            });
        }
        self.process_pending()?;

        let offset = self.params.len();
        let local = op.to_vector();
        op.set_gpindices(Some(ParamIndices::slice(offset, local.len())))?;
        op.set_parent(Some(ParentLink::new(self.hook.clone(), label)));
        op.set_dirty(false);

        let mut params = self.params.to_vec();
        params.extend(local.iter());
        self.params = Array1::from_vec(params);
        self.members.push((label.to_string(), op));
        log::debug!(
            "OpModel: added '{}' at [{}, {})",
            label,
            offset,
            self.params.len()
        );
        Ok(())
    }

    /// Detach and return the operator under `label`
    pub fn remove_operator(&mut self, label: &str) -> QchanResult<Box<dyn LinearOperator>> {
        let pos = self.position(label)?;
        let (_, mut op) = self.members.remove(pos);
        op.set_parent(None);
        op.set_gpindices(None)?;
        self.rebuild()?;
        Ok(op)
    }

    /// Member labels in layout order
    pub fn labels(&self) -> Vec<&str> {
        self.members.iter().map(|(l, _)| l.as_str()).collect()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the model has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Operator under `label`
    pub fn operator(&self, label: &str) -> Option<&dyn LinearOperator> {
        self.members
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, op)| op.as_ref())
    }

    /// Mutable operator under `label`
    pub fn operator_mut(&mut self, label: &str) -> Option<&mut (dyn LinearOperator + 'static)> {
        self.members
            .iter_mut()
            .find(|(l, _)| l == label)
            .map(|(_, op)| op.as_mut())
    }

    /// Operator under `label` as its concrete type
    pub fn operator_as<T: 'static>(&self, label: &str) -> Option<&T> {
        self.operator(label)?.as_any().downcast_ref::<T>()
    }

    /// Mutable operator under `label` as its concrete type
    pub fn operator_as_mut<T: 'static>(&mut self, label: &str) -> Option<&mut T> {
        self.operator_mut(label)?.as_any_mut().downcast_mut::<T>()
    }

    fn position(&self, label: &str) -> QchanResult<usize> {
        self.members
            .iter()
            .position(|(l, _)| l == label)
            .ok_or_else(|| QchanError::ConfigError(format!("no operator labeled '{}'", label)))
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Whether a member has asked for a layout rebuild
    pub fn needs_rebuild(&self) -> bool {
        self.hook.is_pending()
    }

    fn process_pending(&mut self) -> QchanResult<()> {
        if !self.hook.is_pending() {
            return Ok(());
        }
        let requested = self.hook.take_pending();
        log::debug!("OpModel: rebuilding layout for {:?}", requested);
        self.rebuild()
    }

    /// Re-allocate every member's slice from its current local vector
    fn rebuild(&mut self) -> QchanResult<()> {
        let mut params = Vec::new();
        for (_, op) in &mut self.members {
            let local = op.to_vector();
            op.set_gpindices(Some(ParamIndices::slice(params.len(), local.len())))?;
            op.set_dirty(false);
            params.extend(local.iter());
        }
        self.params = Array1::from_vec(params);
        Ok(())
    }

    /// Pull values of members changed since the last read
    fn sync_dirty(&mut self) -> QchanResult<()> {
        for (label, op) in &mut self.members {
            if !op.is_dirty() {
                continue;
            }
            let gp = op.gpindices().cloned().ok_or_else(|| {
                QchanError::ConfigError(format!("operator '{}' has no parameter slice", label))
            })?;
            gp.scatter(op.to_vector().view(), self.params.view_mut())?;
            op.set_dirty(false);
        }
        Ok(())
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Size of the global vector
    pub fn num_params(&mut self) -> QchanResult<usize> {
        self.process_pending()?;
        Ok(self.params.len())
    }

    /// The global vector
    pub fn to_vector(&mut self) -> QchanResult<Array1<f64>> {
        self.process_pending()?;
        self.sync_dirty()?;
        Ok(self.params.clone())
    }

    /// Set the global vector and push each slice to its member
    pub fn from_vector(&mut self, v: ArrayView1<f64>) -> QchanResult<()> {
        self.process_pending()?;
        if v.len() != self.params.len() {
            return Err(QchanError::ParamLengthMismatch {
                expected: self.params.len(),
                got: v.len(),
            });
        }
        for (label, op) in &mut self.members {
            let gp = op.gpindices().cloned().ok_or_else(|| {
                QchanError::ConfigError(format!("operator '{}' has no parameter slice", label))
            })?;
            let local = gp.gather(v)?;
            op.from_vector(local.view(), false)?;
        }
        self.params.assign(&v);
        Ok(())
    }

    /// `"<label>: <parameter label>"` for every global parameter
    pub fn parameter_labels(&mut self) -> QchanResult<Vec<String>> {
        self.process_pending()?;
        Ok(self
            .members
            .iter()
            .flat_map(|(label, op)| {
                op.parameter_labels()
                    .into_iter()
                    .map(move |p| format!("{}: {}", label, p))
            })
            .collect())
    }

    /// Positions within member `label`'s local vector of the global indices
    /// in `absolute`
    pub fn member_local_positions(
        &mut self,
        label: &str,
        absolute: &ParamIndices,
    ) -> QchanResult<Vec<usize>> {
        self.process_pending()?;
        let pos = self.position(label)?;
        let gp = self.members[pos].1.gpindices().ok_or_else(|| {
            QchanError::ConfigError(format!("operator '{}' has no parameter slice", label))
        })?;
        locate(gp, absolute)
    }

    // ========================================================================
    // Term Expansion
    // ========================================================================

    /// Sum of the total term magnitudes of members that expand into terms
    pub fn total_term_magnitude(&self) -> QchanResult<f64> {
        let mut total = 0.0;
        for (label, op) in &self.members {
            match op.total_term_magnitude() {
                Ok(m) => total += m,
                Err(e) if e.is_unsupported() => {
                    log::trace!("OpModel: '{}' has no term expansion", label);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// High-magnitude terms of member `label`, over global indices
    ///
    /// Error generators only contribute order-0 terms to an enclosing
    /// operator and report `NotImplemented` here.
    pub fn highmagnitude_terms(&mut self, label: &str) -> QchanResult<HighMagnitudeTerms> {
        self.process_pending()?;
        let config = self.term_config.clone();
        let pos = self.position(label)?;
        self.members[pos].1.highmagnitude_terms(&config)
    }
}

impl fmt::Display for OpModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "OpModel ({}, dim = {}) with {} operators and {} params",
            self.evotype,
            self.dim,
            self.members.len(),
            self.params.len()
        )?;
        for (label, op) in &self.members {
            let slot = op
                .gpindices()
                .map(|gp| gp.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(f, "  {} : {} {}", label, op.kind(), slot)?;
        }
        Ok(())
    }
}
