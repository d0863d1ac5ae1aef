//! CHP primitive-operation representations
//!
//! Gantree: L1_Operators → ChpRep
//!
//! CHP programs are lists of `h q` / `p q` / `c q r` / `m q` lines with
//! single-character qubit indices. Gate programs are written against
//! qubit `0` and retargeted by character substitution.

use qchan_core::{QchanError, QchanResult};
use std::collections::HashMap;

/// CHP program of a standard single-qubit gate
/// Gantree: standard_chp_conversion(name) -> Option<ops>
pub fn standard_chp_conversion(gate: &str) -> Option<&'static [&'static str]> {
    match gate {
        "Gi" => Some(&[]),
        "Gxpi" => Some(&["h 0", "p 0", "p 0", "h 0"]),
        "Gypi" => Some(&["p 0", "h 0", "p 0", "p 0", "h 0", "p 0", "p 0", "p 0"]),
        "Gzpi" => Some(&["p 0", "p 0"]),
        _ => None,
    }
}

/// CHP program applying the Pauli product `label` (e.g. `"XIZ"`), with
/// character `i` of the label acting on qubit `i`
pub fn pauli_chp_ops(label: &str) -> QchanResult<Vec<String>> {
    let mut ops = Vec::new();
    for (i, pauli) in label.chars().enumerate() {
        let name = match pauli {
            'I' => "Gi".to_string(),
            p => format!("G{}pi", p.to_ascii_lowercase()),
        };
        let program = standard_chp_conversion(&name).ok_or_else(|| {
            QchanError::InvalidBasis(format!("no CHP conversion for '{}' in label '{}'", pauli, label))
        })?;
        let target = i.to_string();
        ops.extend(program.iter().map(|op| op.replace('0', &target)));
    }
    Ok(ops)
}

/// CHP representation: a primitive-op program on `nqubits` qubits
/// Gantree: ChpRep // chp_ops + nqubits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChpRep {
    ops: Vec<String>,
    nqubits: usize,
}

impl ChpRep {
    /// Program `ops` on `nqubits` qubits
    pub fn new(ops: Vec<String>, nqubits: usize) -> Self {
        Self { ops, nqubits }
    }

    /// Pauli-product program for `label`
    pub fn pauli(label: &str) -> QchanResult<Self> {
        Ok(Self::new(pauli_chp_ops(label)?, label.chars().count()))
    }

    /// Primitive ops
    pub fn ops(&self) -> &[String] {
        &self.ops
    }

    /// Number of qubits acted on
    pub fn nqubits(&self) -> usize {
        self.nqubits
    }

    /// Newline-terminated program text, optionally retargeted so that local
    /// qubit `i` becomes `targets[i]`
    pub fn render(&self, targets: Option<&[usize]>) -> QchanResult<String> {
        let target_map: Option<HashMap<char, String>> = match targets {
            Some(t) if t.len() != self.nqubits => {
                return Err(QchanError::TargetCountMismatch {
                    expected: self.nqubits,
                    got: t.len(),
                })
            }
            Some(t) => Some(
                t.iter()
                    .enumerate()
                    .filter_map(|(i, q)| {
                        char::from_digit(i as u32, 10).map(|c| (c, q.to_string()))
                    })
                    .collect(),
            ),
            None => None,
        };

        let mut s = String::new();
        for op in &self.ops {
            match &target_map {
                Some(map) => {
                    for c in op.chars() {
                        match map.get(&c) {
                            Some(q) => s.push_str(q),
                            None => s.push(c),
                        }
                    }
                }
                None => s.push_str(op),
            }
            s.push('\n');
        }
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_conversions() {
        assert_eq!(standard_chp_conversion("Gi").unwrap().len(), 0);
        assert_eq!(standard_chp_conversion("Gzpi").unwrap(), &["p 0", "p 0"]);
        assert!(standard_chp_conversion("Gcnot").is_none());
    }

    #[test]
    fn test_pauli_ops_targeted() {
        let ops = pauli_chp_ops("IZ").unwrap();
        assert_eq!(ops, vec!["p 1".to_string(), "p 1".to_string()]);
        assert!(pauli_chp_ops("Q").is_err());
    }

    #[test]
    fn test_render_retarget() {
        let rep = ChpRep::pauli("Z").unwrap();
        assert_eq!(rep.render(None).unwrap(), "p 0\np 0\n");
        assert_eq!(rep.render(Some(&[3])).unwrap(), "p 3\np 3\n");
    }

    #[test]
    fn test_render_target_count() {
        let rep = ChpRep::pauli("XY").unwrap();
        assert_eq!(rep.nqubits(), 2);
        assert_eq!(
            rep.render(Some(&[0])),
            Err(QchanError::TargetCountMismatch { expected: 2, got: 1 })
        );
    }
}
