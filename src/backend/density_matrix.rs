//! Mixed-state simulation without a native `CCZ`.
//!
//! The density matrix `ρ` of an `N`-qubit register is stored row-major in a
//! `2^{2N}` buffer, so entry `(r, c)` sits at index `r · 2^N + c`.  Column
//! bits are the low `N` bits of that index and row bits the high `N`.  A gate
//! `U` evolves `ρ ↦ U ρ Uᵀ` (all gates here are real): applying the amplitude
//! kernel to the column bits computes `ρ Uᵀ`, and applying it to the row bits
//! then multiplies by `U` on the left.

use super::{kernel, prepare, Backend};
use crate::{Circuit, GateSet, Result};
use tracing::{debug, instrument};

pub(super) const NAME: &str = "density-matrix";
const TWO_QUBIT_NAME: &str = "density-matrix-2q";

/// Default qubit limit; the buffer holds `4^N` doubles.
pub const DEFAULT_DENSITY_MATRIX_QUBITS: usize = 12;

/// Largest limit for which `1 << 2N` fits in a `usize`.
pub const MAX_DENSITY_MATRIX_QUBITS: usize = (usize::BITS as usize - 1) / 2;

/// Simulates the circuit on a density matrix and returns `ρ₀₀`.
///
/// Three-variable monomials are lowered to `H · CCX · H`.  The
/// [`two_qubit`](Self::two_qubit) variant has no three-qubit gate at all and
/// reports [`GapError::UnsupportedGate`](crate::GapError::UnsupportedGate) for
/// cubic polynomials.
#[derive(Debug, Clone)]
pub struct DensityMatrixBackend {
    gate_set: GateSet,
    max_qubits: usize,
}

impl DensityMatrixBackend {
    /// Creates a backend that decomposes `CCZ` through a Toffoli.
    pub fn new() -> Self {
        Self {
            gate_set: GateSet::ToffoliDecomposed,
            max_qubits: DEFAULT_DENSITY_MATRIX_QUBITS,
        }
    }

    /// Creates a backend restricted to one- and two-qubit gates.
    pub fn two_qubit() -> Self {
        Self {
            gate_set: GateSet::TwoQubit,
            max_qubits: DEFAULT_DENSITY_MATRIX_QUBITS,
        }
    }

    /// Overrides the qubit limit, clamped to [`MAX_DENSITY_MATRIX_QUBITS`].
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits.min(MAX_DENSITY_MATRIX_QUBITS);
        self
    }
}

impl Default for DensityMatrixBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for DensityMatrixBackend {
    fn name(&self) -> &str {
        match self.gate_set {
            GateSet::TwoQubit => TWO_QUBIT_NAME,
            _ => NAME,
        }
    }

    fn gate_set(&self) -> GateSet {
        self.gate_set
    }

    fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    #[instrument(skip_all, name = "density_matrix::execute", fields(qubits = circuit.num_qubits()))]
    fn execute(&self, circuit: &Circuit) -> Result<f64> {
        let circuit = prepare(self, circuit)?;
        let n = circuit.num_qubits();
        let mut rho = vec![0.0f64; 1usize << (2 * n)];
        rho[0] = 1.0;
        for gate in circuit.gates() {
            kernel::apply_gate(&mut rho, gate, 0);
            kernel::apply_gate(&mut rho, gate, n);
        }
        let probability = rho[0].clamp(0.0, 1.0);
        debug!(gates = circuit.len(), probability, "density matrix simulated");
        Ok(probability)
    }
}
