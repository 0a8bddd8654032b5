//! Error taxonomy shared by every stage of the gap pipeline.
//!
//! Nothing in this crate recovers from an error on its own: the harness
//! annotates failures with the instance (and backend) they came from and
//! hands them back to the caller, which is expected to abort the batch.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = GapError> = std::result::Result<T, E>;

/// Errors raised while building, compiling, simulating or verifying polynomials.
#[derive(Debug, Error)]
pub enum GapError {
    #[error("invalid monomial {monomial}: {reason}")]
    /// A monomial was malformed or referenced a variable outside the polynomial.
    InvalidMonomial {
        /// Rendering of the offending monomial.
        monomial: String,
        /// What was wrong with it.
        reason: String,
    },
    #[error("invalid variable count {num_vars} (supported range 1..={max})")]
    /// The declared number of variables is zero or too large to enumerate.
    InvalidVariableCount {
        /// Requested variable count.
        num_vars: usize,
        /// Largest supported variable count.
        max: usize,
    },
    #[error("unsupported monomial: {monomial}")]
    /// A monomial of degree 0 or greater than 3 reached the compiler.
    UnsupportedMonomial {
        /// Rendering of the offending monomial.
        monomial: String,
    },
    #[error("backend {backend} cannot realize gate {gate}")]
    /// A backend was handed a gate it cannot express and cannot decompose.
    UnsupportedGate {
        /// Name of the backend (or gate set) that refused the gate.
        backend: String,
        /// Rendering of the gate.
        gate: String,
    },
    #[error("backend {backend} is limited to {limit} qubits, circuit needs {qubits}")]
    /// The circuit is wider than the backend is configured to simulate.
    CapacityExceeded {
        /// Name of the backend.
        backend: String,
        /// Qubits required by the circuit.
        qubits: usize,
        /// Configured limit of the backend.
        limit: usize,
    },
    #[error(
        "{backend} disagrees with {against}: expected {expected}, got {actual} (tolerance {tolerance})"
    )]
    /// Two estimates of the same probability differ beyond tolerance.
    ConsistencyMismatch {
        /// Backend whose result was being checked.
        backend: String,
        /// What it was compared with (`oracle`, another backend, or a repeat).
        against: String,
        /// Reference value.
        expected: f64,
        /// Value produced by the backend.
        actual: f64,
        /// Tolerance that was exceeded.
        tolerance: f64,
    },
    #[error("instance {index} ({polynomial}) failed")]
    /// Failure of a single harness instance, wrapping the underlying cause.
    Instance {
        /// Zero-based position of the instance in the batch.
        index: usize,
        /// Rendering of the polynomial.
        polynomial: String,
        /// Underlying error.
        #[source]
        source: Box<GapError>,
    },
    #[error("parse error at line {line}: {message}")]
    /// Malformed instance or result text.
    Parse {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
    #[error("invalid configuration: {0}")]
    /// Harness configuration rejected by validation.
    Config(String),
    #[error(transparent)]
    /// Underlying filesystem failure.
    Io(#[from] std::io::Error),
    #[error(transparent)]
    /// Configuration decoding failure.
    Json(#[from] serde_json::Error),
}

impl GapError {
    /// Wraps `self` with the identity of the instance it occurred on.
    pub fn for_instance(self, index: usize, polynomial: impl ToString) -> Self {
        GapError::Instance {
            index,
            polynomial: polynomial.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through instance annotations.
    pub fn root(&self) -> &GapError {
        match self {
            GapError::Instance { source, .. } => source.root(),
            other => other,
        }
    }
}
