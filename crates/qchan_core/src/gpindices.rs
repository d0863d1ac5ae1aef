//! Parameter index mapping
//!
//! Gantree: L0_Foundation → ParameterIndexMapping
//!
//! Every operator addresses its parameters through an index set resolved
//! relative to its immediate parent's local vector. A top-level operator's
//! parent is the model, so its indices address the global vector directly.
//! Two pure functions move between the levels:
//!
//! - [`compose`]: child-relative indices → parent's-parent indices
//! - [`decompose`]: child-relative indices → positions within the parent
//!
//! [`locate`] inverts [`compose`] for callers holding absolute indices.

use crate::error::{QchanError, QchanResult};
use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::rc::Rc;

// ============================================================================
// ParamIndices
// ============================================================================

/// Index set of an operator's parameters within its parent's vector
/// Gantree: ParamIndices // slice descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamIndices {
    /// Contiguous run `start..start + len`
    Slice { start: usize, len: usize },
    /// Explicit, repetition-free index list
    List(Vec<usize>),
}

impl ParamIndices {
    /// Contiguous index set
    pub fn slice(start: usize, len: usize) -> Self {
        ParamIndices::Slice { start, len }
    }

    /// Explicit index set; fails on repeated indices
    pub fn from_list(indices: Vec<usize>) -> QchanResult<Self> {
        let mut seen = HashSet::with_capacity(indices.len());
        for &i in &indices {
            if !seen.insert(i) {
                return Err(QchanError::DuplicateIndex(i));
            }
        }
        Ok(ParamIndices::List(indices))
    }

    /// Number of addressed parameters
    pub fn len(&self) -> usize {
        match self {
            ParamIndices::Slice { len, .. } => *len,
            ParamIndices::List(v) => v.len(),
        }
    }

    /// Whether no parameters are addressed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k`-th addressed index
    pub fn get(&self, k: usize) -> Option<usize> {
        match self {
            ParamIndices::Slice { start, len } => (k < *len).then(|| start + k),
            ParamIndices::List(v) => v.get(k).copied(),
        }
    }

    /// Addressed indices in order
    pub fn iter(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match self {
            ParamIndices::Slice { start, len } => Box::new(*start..start + len),
            ParamIndices::List(v) => Box::new(v.iter().copied()),
        }
    }

    /// Addressed indices as a vector
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Whether `index` is addressed
    pub fn contains(&self, index: usize) -> bool {
        match self {
            ParamIndices::Slice { start, len } => index >= *start && index < start + len,
            ParamIndices::List(v) => v.contains(&index),
        }
    }

    /// Largest addressed index
    pub fn max_index(&self) -> Option<usize> {
        match self {
            ParamIndices::Slice { start, len } => (*len > 0).then(|| start + len - 1),
            ParamIndices::List(v) => v.iter().copied().max(),
        }
    }

    /// Copy every addressed entry of `source` into a new vector
    pub fn gather(&self, source: ArrayView1<f64>) -> QchanResult<Array1<f64>> {
        self.check_within(source.len())?;
        Ok(self.iter().map(|i| source[i]).collect())
    }

    /// Write `values` into the addressed entries of `target`
    pub fn scatter(&self, values: ArrayView1<f64>, mut target: ArrayViewMut1<f64>) -> QchanResult<()> {
        if values.len() != self.len() {
            return Err(QchanError::ParamLengthMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        self.check_within(target.len())?;
        for (k, i) in self.iter().enumerate() {
            target[i] = values[k];
        }
        Ok(())
    }

    /// Fail with an index error unless every addressed index is `< len`
    pub fn check_within(&self, len: usize) -> QchanResult<()> {
        match self.max_index() {
            Some(max) if max >= len => Err(QchanError::IndexOutOfRange { index: max, len }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ParamIndices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamIndices::Slice { start, len } => write!(f, "{}..{}", start, start + len),
            ParamIndices::List(v) => write!(f, "{:?}", v),
        }
    }
}

// ============================================================================
// Index Arithmetic
// ============================================================================

/// Absolute indices addressed by `inner`, where `inner` indexes the local
/// vector described by `outer`
/// Gantree: compose(outer,inner) -> ParamIndices // 절대 인덱스
pub fn compose(outer: &ParamIndices, inner: &ParamIndices) -> QchanResult<ParamIndices> {
    inner.check_within(outer.len())?;
    match (outer, inner) {
        (ParamIndices::Slice { start: o, .. }, ParamIndices::Slice { start: i, len }) => {
            Ok(ParamIndices::slice(o + i, *len))
        }
        _ => {
            // entries exist: check_within passed
            let mapped = inner.iter().filter_map(|k| outer.get(k)).collect();
            Ok(ParamIndices::List(mapped))
        }
    }
}

/// Positions within `outer`'s local vector that `inner` occupies
/// Gantree: decompose(outer,inner) -> Vec<usize> // 상대 위치
pub fn decompose(outer: &ParamIndices, inner: &ParamIndices) -> QchanResult<Vec<usize>> {
    inner.check_within(outer.len())?;
    Ok(inner.to_vec())
}

/// Positions within `outer` of the absolute indices in `absolute`
pub fn locate(outer: &ParamIndices, absolute: &ParamIndices) -> QchanResult<Vec<usize>> {
    absolute
        .iter()
        .map(|a| match outer {
            ParamIndices::Slice { start, len } if a >= *start && a < start + len => Ok(a - start),
            ParamIndices::Slice { .. } => Err(QchanError::IndexNotFound(a)),
            ParamIndices::List(v) => v
                .iter()
                .position(|&x| x == a)
                .ok_or(QchanError::IndexNotFound(a)),
        })
        .collect()
}

/// Whether `parts` cover `0..len` exactly once
pub fn is_partition<'a>(parts: impl IntoIterator<Item = &'a ParamIndices>, len: usize) -> bool {
    let mut seen = vec![false; len];
    for part in parts {
        for i in part.iter() {
            if i >= len || seen[i] {
                return false;
            }
            seen[i] = true;
        }
    }
    seen.into_iter().all(|s| s)
}

// ============================================================================
// Parent Notification
// ============================================================================

/// Shared request queue a parent hands to its members so they can ask
/// for a layout rebuild when their parameter count changes
/// Gantree: RebuildHook // 재구성 요청
#[derive(Debug, Clone, Default)]
pub struct RebuildHook {
    pending: Rc<RefCell<BTreeSet<String>>>,
}

impl RebuildHook {
    /// Create an empty hook
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a rebuild on behalf of `label`
    pub fn mark_for_rebuild(&self, label: &str) {
        self.pending.borrow_mut().insert(label.to_string());
    }

    /// Whether any rebuild is pending
    pub fn is_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Drain and return the pending member labels
    pub fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.borrow_mut())
            .into_iter()
            .collect()
    }
}

/// A member's link back to its owning parent
#[derive(Debug, Clone)]
pub struct ParentLink {
    hook: RebuildHook,
    label: String,
}

impl ParentLink {
    /// Link to `hook` under the member label `label`
    pub fn new(hook: RebuildHook, label: impl Into<String>) -> Self {
        Self {
            hook,
            label: label.into(),
        }
    }

    /// Label the member is registered under
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Tell the parent this member's parameter count may have changed
    pub fn mark_for_rebuild(&self) {
        log::debug!("member '{}' requested a parameter layout rebuild", self.label);
        self.hook.mark_for_rebuild(&self.label);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_compose_slices() {
        let outer = ParamIndices::slice(10, 5);
        let inner = ParamIndices::slice(2, 3);
        assert_eq!(compose(&outer, &inner).unwrap(), ParamIndices::slice(12, 3));
    }

    #[test]
    fn test_compose_list() {
        let outer = ParamIndices::from_list(vec![7, 3, 9, 1]).unwrap();
        let inner = ParamIndices::from_list(vec![3, 0]).unwrap();
        assert_eq!(compose(&outer, &inner).unwrap().to_vec(), vec![1, 7]);
    }

    #[test]
    fn test_compose_out_of_range() {
        let outer = ParamIndices::slice(0, 3);
        let inner = ParamIndices::slice(2, 2);
        let err = compose(&outer, &inner).unwrap_err();
        assert!(err.is_index_error());
        assert!(decompose(&outer, &inner).is_err());
    }

    #[test]
    fn test_locate_inverts_compose() {
        let outer = ParamIndices::from_list(vec![4, 8, 15, 16, 23, 42]).unwrap();
        let inner = ParamIndices::from_list(vec![5, 1, 2]).unwrap();
        let absolute = compose(&outer, &inner).unwrap();
        assert_eq!(
            locate(&outer, &absolute).unwrap(),
            decompose(&outer, &inner).unwrap()
        );
    }

    #[test]
    fn test_locate_missing() {
        let outer = ParamIndices::slice(0, 4);
        let absolute = ParamIndices::from_list(vec![2, 9]).unwrap();
        assert_eq!(locate(&outer, &absolute), Err(QchanError::IndexNotFound(9)));
    }

    #[test]
    fn test_duplicate_rejected() {
        assert_eq!(
            ParamIndices::from_list(vec![1, 2, 1]),
            Err(QchanError::DuplicateIndex(1))
        );
    }

    #[test]
    fn test_gather_scatter_roundtrip() {
        let idx = ParamIndices::from_list(vec![3, 0]).unwrap();
        let mut global = array![1.0, 2.0, 3.0, 4.0];
        let local = idx.gather(global.view()).unwrap();
        assert_eq!(local, array![4.0, 1.0]);

        idx.scatter(array![-1.0, -4.0].view(), global.view_mut()).unwrap();
        assert_eq!(global, array![-4.0, 2.0, 3.0, -1.0]);
    }

    #[test]
    fn test_partition() {
        let a = ParamIndices::slice(0, 3);
        let b = ParamIndices::from_list(vec![4, 3]).unwrap();
        assert!(is_partition([&a, &b], 5));
        assert!(!is_partition([&a], 5));
        assert!(!is_partition([&a, &ParamIndices::slice(2, 3)], 5));
    }

    #[test]
    fn test_rebuild_hook() {
        let hook = RebuildHook::new();
        let link = ParentLink::new(hook.clone(), "Gx");
        assert!(!hook.is_pending());
        link.mark_for_rebuild();
        assert!(hook.is_pending());
        assert_eq!(hook.take_pending(), vec!["Gx".to_string()]);
        assert!(!hook.is_pending());
    }
}
