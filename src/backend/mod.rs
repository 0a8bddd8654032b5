//! Simulation backends.
//!
//! A [`Backend`] turns a compiled [`Circuit`] into the probability of
//! measuring `|0…0⟩` after running it from `|0…0⟩`.  Backends may support a
//! restricted [`GateSet`]; they lower the circuit themselves, so callers always
//! hand over the output of [`compile`](crate::compile).  Backends hold only
//! configuration and keep no state between executions.

mod density_matrix;
mod kernel;
mod state_vector;

pub use density_matrix::{
    DensityMatrixBackend, DEFAULT_DENSITY_MATRIX_QUBITS, MAX_DENSITY_MATRIX_QUBITS,
};
pub use state_vector::{
    StateVectorBackend, DEFAULT_STATE_VECTOR_QUBITS, MAX_STATE_VECTOR_QUBITS,
};

use crate::{compile, Circuit, GapError, GateSet, Polynomial, Result};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Capability contract of a simulation engine.
pub trait Backend: Send + Sync {
    /// Identifier used in reports, logs and errors.
    fn name(&self) -> &str;

    /// Gates the engine executes without rewriting.
    fn gate_set(&self) -> GateSet;

    /// Widest circuit the engine accepts.
    fn max_qubits(&self) -> usize;

    /// Runs `circuit` from `|0…0⟩` and returns the probability of `|0…0⟩`.
    ///
    /// The number of qubits is taken from [`Circuit::num_qubits`].
    fn execute(&self, circuit: &Circuit) -> Result<f64>;
}

/// Checks capacity and lowers `circuit` into the gate set of `backend`.
///
/// Borrows the circuit when no rewriting is needed.
pub(crate) fn prepare<'a, B>(backend: &B, circuit: &'a Circuit) -> Result<Cow<'a, Circuit>>
where
    B: Backend + ?Sized,
{
    if circuit.num_qubits() > backend.max_qubits() {
        return Err(GapError::CapacityExceeded {
            backend: backend.name().to_string(),
            qubits: circuit.num_qubits(),
            limit: backend.max_qubits(),
        });
    }
    let gate_set = backend.gate_set();
    if circuit.gates().iter().all(|gate| gate_set.supports(gate)) {
        Ok(Cow::Borrowed(circuit))
    } else {
        circuit.lower(gate_set, backend.name()).map(Cow::Owned)
    }
}

/// Compiles `poly` and runs it on `backend`.
pub fn evaluate_gap(backend: &dyn Backend, poly: &Polynomial) -> Result<f64> {
    let circuit = compile(poly)?;
    backend.execute(&circuit)
}

/// Backends selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// [`StateVectorBackend`] with default limits.
    StateVector,
    /// [`DensityMatrixBackend`] with default limits.
    DensityMatrix,
}

impl BackendKind {
    /// Every selectable backend, in reporting order.
    pub const ALL: [BackendKind; 2] = [BackendKind::StateVector, BackendKind::DensityMatrix];

    /// Instantiates the backend with its default configuration.
    pub fn build(&self) -> Box<dyn Backend> {
        match self {
            BackendKind::StateVector => Box::new(StateVectorBackend::new()),
            BackendKind::DensityMatrix => Box::new(DensityMatrixBackend::new()),
        }
    }

    /// Name shared with [`Backend::name`].
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::StateVector => state_vector::NAME,
            BackendKind::DensityMatrix => density_matrix::NAME,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = GapError;

    fn from_str(s: &str) -> Result<Self> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                GapError::Config(format!(
                    "unknown backend {s:?} (expected one of: {})",
                    BackendKind::ALL.map(|k| k.as_str()).join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::random_polynomial_bounded;
    use crate::{compile_for, oracle};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn backends() -> Vec<Box<dyn Backend>> {
        BackendKind::ALL.iter().map(BackendKind::build).collect()
    }

    #[test]
    fn test_scenario_a_on_every_backend() {
        let poly =
            Polynomial::new(3, [vec![0usize, 1, 2], vec![0, 2], vec![1, 2], vec![0]]).unwrap();
        for backend in backends() {
            let p = evaluate_gap(backend.as_ref(), &poly).unwrap();
            assert!((p - 0.0625).abs() < 1e-9, "{}: {p}", backend.name());
        }
    }

    #[test]
    fn test_scenario_b_on_every_backend() {
        let poly = Polynomial::new(4, [vec![0usize, 1], vec![0, 2], vec![1, 2], vec![0]]).unwrap();
        for backend in backends() {
            let p = evaluate_gap(backend.as_ref(), &poly).unwrap();
            assert!((p - 0.25).abs() < 1e-9, "{}: {p}", backend.name());
        }
    }

    #[test]
    fn test_capacity_exceeded() {
        let backend = StateVectorBackend::new().with_max_qubits(3);
        let poly = Polynomial::zero(4).unwrap();
        match evaluate_gap(&backend, &poly).unwrap_err() {
            GapError::CapacityExceeded {
                qubits, limit, ..
            } => {
                assert_eq!(qubits, 4);
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_two_qubit_density_backend_rejects_ccz() {
        let backend = DensityMatrixBackend::two_qubit();
        let poly = Polynomial::new(3, [vec![0usize, 1, 2]]).unwrap();
        match evaluate_gap(&backend, &poly).unwrap_err() {
            GapError::UnsupportedGate { backend: name, .. } => {
                assert_eq!(name, backend.name())
            }
            other => panic!("unexpected error: {other}"),
        }
        let quadratic = Polynomial::new(3, [vec![0usize, 1], vec![2]]).unwrap();
        let p = evaluate_gap(&backend, &quadratic).unwrap();
        assert!((p - oracle::zero_probability(&quadratic)).abs() < 1e-9);
    }

    #[test]
    fn test_backend_accepts_predecomposed_circuit() {
        let poly = Polynomial::new(3, [vec![0usize, 1, 2], vec![1]]).unwrap();
        let circuit = compile_for(&poly, GateSet::ToffoliDecomposed).unwrap();
        let expected = oracle::zero_probability(&poly);
        for backend in backends() {
            let p = backend.execute(&circuit).unwrap();
            assert!((p - expected).abs() < 1e-9, "{}: {p}", backend.name());
        }
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!(
            "state-vector".parse::<BackendKind>().unwrap(),
            BackendKind::StateVector
        );
        assert_eq!(
            "Density-Matrix".parse::<BackendKind>().unwrap(),
            BackendKind::DensityMatrix
        );
        assert!("qpu".parse::<BackendKind>().is_err());
        for kind in BackendKind::ALL {
            assert_eq!(kind.build().name(), kind.as_str());
        }
    }

    #[test]
    fn test_repeated_execution_is_stable() {
        let mut rng = StdRng::seed_from_u64(11);
        let poly = random_polynomial_bounded(&mut rng, 8, 12, 3).unwrap();
        let circuit = compile(&poly).unwrap();
        for backend in backends() {
            let first = backend.execute(&circuit).unwrap();
            for _ in 0..3 {
                assert_eq!(backend.execute(&circuit).unwrap(), first);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_compiler_oracle_equivalence(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let poly = random_polynomial_bounded(&mut rng, 7, 16, 3).unwrap();
            let expected = oracle::zero_probability(&poly);
            for backend in backends() {
                let p = evaluate_gap(backend.as_ref(), &poly).unwrap();
                prop_assert!(
                    (p - expected).abs() < 1e-5,
                    "{} on {}: {} vs {}", backend.name(), poly, p, expected
                );
            }
        }
    }
}
