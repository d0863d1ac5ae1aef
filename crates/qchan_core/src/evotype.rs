//! Evolution types
//!
//! Gantree: L0_Foundation → Evotype
//!
//! The closed set of representations an operator can materialize as.

use crate::error::{QchanError, QchanResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Evolution type of an operator
/// Gantree: Evotype // 진화 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evotype {
    /// Dense superoperator acting on vectorized density matrices
    DensityMx,
    /// Unitary acting on state vectors
    StateVec,
    /// Stabilizer-frame evolution
    Stabilizer,
    /// Perturbative expansion into rank-one terms
    Term,
    /// Sampled CHP primitive operations
    Chp,
}

impl Evotype {
    /// Every evolution type, in declaration order
    pub const ALL: [Evotype; 5] = [
        Evotype::DensityMx,
        Evotype::StateVec,
        Evotype::Stabilizer,
        Evotype::Term,
        Evotype::Chp,
    ];

    /// Canonical tag
    pub fn name(&self) -> &'static str {
        match self {
            Evotype::DensityMx => "densitymx",
            Evotype::StateVec => "statevec",
            Evotype::Stabilizer => "stabilizer",
            Evotype::Term => "term",
            Evotype::Chp => "chp",
        }
    }

    /// Whether operators of this type can be materialized as a real dense matrix
    pub fn supports_dense(&self) -> bool {
        matches!(self, Evotype::DensityMx)
    }

    /// Whether this is the perturbative term-based type
    pub fn is_term(&self) -> bool {
        matches!(self, Evotype::Term)
    }

    /// Whether operators of this type are evaluated by sampling
    pub fn is_sampling(&self) -> bool {
        matches!(self, Evotype::Chp)
    }
}

impl fmt::Display for Evotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Evotype {
    type Err = QchanError;

    fn from_str(s: &str) -> QchanResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "densitymx" => Ok(Evotype::DensityMx),
            "statevec" => Ok(Evotype::StateVec),
            "stabilizer" => Ok(Evotype::Stabilizer),
            "term" | "svterm" | "cterm" => Ok(Evotype::Term),
            "chp" => Ok(Evotype::Chp),
            other => Err(QchanError::InvalidEvotype(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for evo in Evotype::ALL {
            assert_eq!(evo.name().parse::<Evotype>().unwrap(), evo);
        }
    }

    #[test]
    fn test_term_aliases() {
        assert_eq!("svterm".parse::<Evotype>().unwrap(), Evotype::Term);
        assert_eq!("cterm".parse::<Evotype>().unwrap(), Evotype::Term);
    }

    #[test]
    fn test_invalid() {
        let err = "qudit".parse::<Evotype>().unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_capabilities() {
        assert!(Evotype::DensityMx.supports_dense());
        assert!(!Evotype::Term.supports_dense());
        assert!(Evotype::Term.is_term());
        assert!(Evotype::Chp.is_sampling());
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&Evotype::DensityMx).unwrap();
        assert_eq!(json, "\"densitymx\"");
    }
}
