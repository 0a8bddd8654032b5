//! IQP circuit compilation.
//!
//! A polynomial `p` in `N` variables becomes the circuit
//!
//! ```text
//! H^⊗N · D_p · H^⊗N,    D_p |x⟩ = (−1)^{p(x)} |x⟩
//! ```
//!
//! where `D_p` is a product of one diagonal gate per monomial: `Z` for degree
//! 1, `CZ` for degree 2 and `CCZ` for degree 3.  Diagonal gates commute, so the
//! emission order of the middle layer does not matter.  Started from `|0…0⟩`,
//! the amplitude of `|0…0⟩` at the end is `gap(p) / 2^N`.
//!
//! Gate sets without a native `CCZ` receive `H(a) · CCX(b, c → a) · H(a)`
//! instead, since conjugating the target of a Toffoli by Hadamards turns the
//! controlled bit flip into a controlled phase flip.

use crate::{GapError, Monomial, Polynomial, Result};
use std::fmt;

/// A single gate on numbered qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// Hadamard on one qubit.
    Hadamard(usize),
    /// Phase flip on one qubit.
    Z(usize),
    /// Controlled phase flip on two qubits.
    Cz(usize, usize),
    /// Controlled-controlled phase flip on three qubits.
    Ccz(usize, usize, usize),
    /// Controlled-controlled bit flip.
    Toffoli {
        /// The two control qubits.
        controls: (usize, usize),
        /// The qubit that is flipped.
        target: usize,
    },
}

impl Gate {
    /// Qubits touched by the gate.
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            Gate::Hadamard(q) | Gate::Z(q) => vec![q],
            Gate::Cz(a, b) => vec![a, b],
            Gate::Ccz(a, b, c) => vec![a, b, c],
            Gate::Toffoli {
                controls: (a, b),
                target,
            } => vec![a, b, target],
        }
    }

    /// Returns `true` for gates that are diagonal in the computational basis.
    pub fn is_diagonal(&self) -> bool {
        matches!(self, Gate::Z(_) | Gate::Cz(..) | Gate::Ccz(..))
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Gate::Hadamard(q) => write!(f, "H({q})"),
            Gate::Z(q) => write!(f, "Z({q})"),
            Gate::Cz(a, b) => write!(f, "CZ({a}, {b})"),
            Gate::Ccz(a, b, c) => write!(f, "CCZ({a}, {b}, {c})"),
            Gate::Toffoli {
                controls: (a, b),
                target,
            } => write!(f, "CCX({a}, {b} -> {target})"),
        }
    }
}

/// Gate families a backend can realize natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateSet {
    /// Every [`Gate`], including a native `CCZ`.
    Native,
    /// No native `CCZ`; three-variable monomials go through a Toffoli.
    ToffoliDecomposed,
    /// Single- and two-qubit gates only.
    TwoQubit,
}

impl GateSet {
    /// Returns `true` if `gate` can be executed without rewriting.
    pub fn supports(&self, gate: &Gate) -> bool {
        match (self, gate) {
            (GateSet::Native, _) => true,
            (GateSet::ToffoliDecomposed, Gate::Ccz(..)) => false,
            (GateSet::ToffoliDecomposed, _) => true,
            (GateSet::TwoQubit, Gate::Ccz(..) | Gate::Toffoli { .. }) => false,
            (GateSet::TwoQubit, _) => true,
        }
    }

    /// Short identifier used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            GateSet::Native => "native",
            GateSet::ToffoliDecomposed => "toffoli-decomposed",
            GateSet::TwoQubit => "two-qubit",
        }
    }
}

/// An ordered gate list over a fixed number of qubits.
///
/// Circuits are produced by [`compile`] / [`compile_for`] or by
/// [`Circuit::lower`] and are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    num_qubits: usize,
    gates: Vec<Gate>,
}

impl Circuit {
    fn with_capacity(num_qubits: usize, capacity: usize) -> Self {
        Self {
            num_qubits,
            gates: Vec::with_capacity(capacity),
        }
    }

    /// Number of qubits the circuit acts on.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Gates in execution order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Returns `true` if the circuit has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Rewrites the circuit into `gate_set`.
    ///
    /// `CCZ` gates become the Hadamard/Toffoli conjugation for
    /// [`GateSet::ToffoliDecomposed`].  Any other unsupported gate fails with
    /// [`GapError::UnsupportedGate`], attributed to `backend`.
    pub fn lower(&self, gate_set: GateSet, backend: &str) -> Result<Circuit> {
        let mut lowered = Circuit::with_capacity(self.num_qubits, self.gates.len());
        for gate in &self.gates {
            if gate_set.supports(gate) {
                lowered.gates.push(*gate);
                continue;
            }
            match (gate_set, *gate) {
                (GateSet::ToffoliDecomposed, Gate::Ccz(a, b, c)) => {
                    lowered.push_decomposed_ccz(a, b, c)
                }
                _ => {
                    return Err(GapError::UnsupportedGate {
                        backend: backend.to_string(),
                        gate: gate.to_string(),
                    })
                }
            }
        }
        Ok(lowered)
    }

    fn push_hadamard_layer(&mut self) {
        self.gates.extend((0..self.num_qubits).map(Gate::Hadamard));
    }

    fn push_decomposed_ccz(&mut self, a: usize, b: usize, c: usize) {
        self.gates.push(Gate::Hadamard(a));
        self.gates.push(Gate::Toffoli {
            controls: (b, c),
            target: a,
        });
        self.gates.push(Gate::Hadamard(a));
    }

    fn push_monomial(&mut self, monomial: &Monomial, gate_set: GateSet) -> Result<()> {
        match monomial.variables().as_slice() {
            &[a] => self.gates.push(Gate::Z(a)),
            &[a, b] => self.gates.push(Gate::Cz(a, b)),
            &[a, b, c] => match gate_set {
                GateSet::Native => self.gates.push(Gate::Ccz(a, b, c)),
                GateSet::ToffoliDecomposed => self.push_decomposed_ccz(a, b, c),
                GateSet::TwoQubit => {
                    return Err(GapError::UnsupportedGate {
                        backend: gate_set.name().to_string(),
                        gate: Gate::Ccz(a, b, c).to_string(),
                    })
                }
            },
            _ => {
                return Err(GapError::UnsupportedMonomial {
                    monomial: monomial.to_string(),
                })
            }
        }
        Ok(())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circuit[{} qubits]:", self.num_qubits)?;
        for gate in &self.gates {
            write!(f, " {gate}")?;
        }
        Ok(())
    }
}

/// Compiles `poly` into an IQP circuit using a native `CCZ`.
///
/// Fails with [`GapError::UnsupportedMonomial`] if `poly` contains the
/// constant monomial or a monomial of degree greater than 3.
pub fn compile(poly: &Polynomial) -> Result<Circuit> {
    compile_for(poly, GateSet::Native)
}

/// Compiles `poly` into an IQP circuit expressed in `gate_set`.
pub fn compile_for(poly: &Polynomial, gate_set: GateSet) -> Result<Circuit> {
    let n = poly.num_vars();
    let mut circuit = Circuit::with_capacity(n, 2 * n + 3 * poly.len());
    circuit.push_hadamard_layer();
    for monomial in poly.monomials() {
        circuit.push_monomial(monomial, gate_set)?;
    }
    circuit.push_hadamard_layer();
    Ok(circuit)
}
