//! Pure-state simulation with a native `CCZ`.

use super::{kernel, prepare, Backend};
use crate::{Circuit, GateSet, Result};
use tracing::{debug, instrument};

pub(super) const NAME: &str = "state-vector";

/// Default qubit limit; the amplitude buffer holds `2^N` doubles.
pub const DEFAULT_STATE_VECTOR_QUBITS: usize = 26;

/// Largest limit for which `1 << N` fits in a `usize`.
pub const MAX_STATE_VECTOR_QUBITS: usize = usize::BITS as usize - 1;

/// Simulates the circuit on a `2^N` amplitude vector and returns `|⟨0|ψ⟩|²`.
#[derive(Debug, Clone)]
pub struct StateVectorBackend {
    max_qubits: usize,
}

impl StateVectorBackend {
    /// Creates a backend limited to [`DEFAULT_STATE_VECTOR_QUBITS`].
    pub fn new() -> Self {
        Self {
            max_qubits: DEFAULT_STATE_VECTOR_QUBITS,
        }
    }

    /// Overrides the qubit limit, clamped to [`MAX_STATE_VECTOR_QUBITS`].
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits.min(MAX_STATE_VECTOR_QUBITS);
        self
    }
}

impl Default for StateVectorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for StateVectorBackend {
    fn name(&self) -> &str {
        NAME
    }

    fn gate_set(&self) -> GateSet {
        GateSet::Native
    }

    fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    #[instrument(skip_all, name = "state_vector::execute", fields(qubits = circuit.num_qubits()))]
    fn execute(&self, circuit: &Circuit) -> Result<f64> {
        let circuit = prepare(self, circuit)?;
        let mut amplitudes = vec![0.0f64; 1usize << circuit.num_qubits()];
        amplitudes[0] = 1.0;
        for gate in circuit.gates() {
            kernel::apply_gate(&mut amplitudes, gate, 0);
        }
        let probability = (amplitudes[0] * amplitudes[0]).clamp(0.0, 1.0);
        debug!(gates = circuit.len(), probability, "state vector simulated");
        Ok(probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(StateVectorBackend::new().max_qubits(), DEFAULT_STATE_VECTOR_QUBITS);
        assert_eq!(DEFAULT_STATE_VECTOR_QUBITS, 26);
        let backend = StateVectorBackend::new().with_max_qubits(usize::MAX);
        assert_eq!(backend.max_qubits(), MAX_STATE_VECTOR_QUBITS);
        assert_eq!(StateVectorBackend::new().with_max_qubits(5).max_qubits(), 5);
    }
}
