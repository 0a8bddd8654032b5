#![deny(missing_docs)]

//! # iqp_gap
//!
//! **iqp_gap** estimates the *gap* of a polynomial over GF(2), the number of
//! zeros minus the number of ones over the Boolean hypercube, by simulating
//! an IQP circuit and cross-checking the simulation against brute force.
//!
//! For a polynomial `p` of degree at most 3 in `N` variables, the circuit
//!
//! ```text
//! H^⊗N · ∏_{m ∈ p} gate(m) · H^⊗N
//! ```
//!
//! with `Z`, `CZ` and `CCZ` for monomials of degree 1, 2 and 3 returns to
//! `|0…0⟩` with probability `(gap(p) / 2^N)^2`.
//!
//! ## Features
//!
//! * **Polynomial model**: [`Monomial`] and [`Polynomial`] are immutable value
//!   types; repeated monomials cancel on construction.
//! * **Brute-force oracle**: [`oracle::gap`] enumerates all `2^N` assignments,
//!   in parallel for large `N`.
//! * **Circuit compiler**: [`compile`] emits the gate list; gate sets without a
//!   native `CCZ` receive it as `H · Toffoli · H`.
//! * **Backends**: a state-vector and a density-matrix simulator behind the
//!   [`Backend`] trait, selectable by [`BackendKind`].
//! * **Harness**: [`Harness`] repeats, times and cross-checks backends against
//!   the oracle and each other, skipping instances above a variable ceiling.
//! * **Files and generation**: the [`instances`] text formats, the seedable
//!   [`generator`] and the timing [`summary`].
//!
//! ## Usage
//!
//! ```rust
//! use iqp_gap::{evaluate_gap, oracle, Polynomial, StateVectorBackend};
//!
//! // x0·x1·x2 + x0·x2 + x1·x2 + x0
//! let poly = Polynomial::new(3, [vec![0usize, 1, 2], vec![0, 2], vec![1, 2], vec![0]]).unwrap();
//! assert_eq!(oracle::gap(&poly), 2);
//!
//! let p = evaluate_gap(&StateVectorBackend::new(), &poly).unwrap();
//! assert!((p - 0.0625).abs() < 1e-9);
//! ```

pub mod backend;
mod circuit;
mod error;
pub mod generator;
pub mod harness;
pub mod instances;
pub mod oracle;
mod polynomial;
pub mod summary;

pub use backend::{evaluate_gap, Backend, BackendKind, DensityMatrixBackend, StateVectorBackend};
pub use circuit::{compile, compile_for, Circuit, Gate, GateSet};
pub use error::{GapError, Result};
pub use generator::{random_polynomial, GeneratorConfig};
pub use harness::{BenchmarkRecord, Harness, HarnessConfig, InstanceReport};
pub use polynomial::{Monomial, Polynomial, MAX_VARIABLES};
