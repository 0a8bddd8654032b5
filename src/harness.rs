//! Consistency and benchmark harness.
//!
//! The harness compiles each polynomial once, runs it on every registered
//! [`Backend`] a configurable number of times and cross-checks the estimates:
//!
//! * every repeat must stay within `stability_tolerance` of the first one;
//! * every backend must agree with the brute-force oracle (when enabled);
//! * every backend must agree with the first registered backend.
//!
//! Instances wider than `max_variables` are skipped without calling the
//! oracle or any backend.  The first failure aborts the batch, wrapped in
//! [`GapError::Instance`] so the caller knows which polynomial caused it.

use crate::backend::Backend;
use crate::{compile, oracle, Circuit, GapError, Polynomial, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Knobs of a harness run, loadable from JSON.
///
/// Missing fields take their [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Instances with more variables are skipped; `None` runs everything.
    pub max_variables: Option<usize>,
    /// Largest accepted difference between a backend and the oracle or the
    /// first backend.
    pub tolerance: f64,
    /// Largest accepted difference between repeats of one backend.
    pub stability_tolerance: f64,
    /// Executions per backend and instance.
    pub repetitions: u32,
    /// Whether to compare against the brute-force oracle.
    pub check_oracle: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_variables: None,
            tolerance: 1e-5,
            stability_tolerance: 1e-5,
            repetitions: 4,
            check_oracle: true,
        }
    }
}

impl HarnessConfig {
    /// Decodes a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Rejects non-positive tolerances and zero repetitions.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tolerance", self.tolerance),
            ("stability_tolerance", self.stability_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GapError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.repetitions == 0 {
            return Err(GapError::Config(
                "repetitions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one backend on one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BenchmarkRecord {
    /// The instance exceeded the variable ceiling.
    Skipped,
    /// The instance ran.
    Measured {
        /// Estimated probability of the all-zero outcome.
        probability: f64,
        /// Mean wall-clock time of one execution.
        elapsed: Duration,
    },
}

impl BenchmarkRecord {
    /// Measured probability, if any.
    pub fn probability(&self) -> Option<f64> {
        match self {
            BenchmarkRecord::Skipped => None,
            BenchmarkRecord::Measured { probability, .. } => Some(*probability),
        }
    }

    /// Mean execution time, if any.
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            BenchmarkRecord::Skipped => None,
            BenchmarkRecord::Measured { elapsed, .. } => Some(*elapsed),
        }
    }
}

impl fmt::Display for BenchmarkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkRecord::Skipped => f.write_str("skipped"),
            BenchmarkRecord::Measured {
                probability,
                elapsed,
            } => write!(f, "{probability} {}", elapsed.as_nanos()),
        }
    }
}

impl FromStr for BenchmarkRecord {
    type Err = GapError;

    /// Parses `skipped` or `<probability> <nanoseconds>`.
    ///
    /// The probability must lie in `[0, 1]` (so `NaN` and infinities are
    /// rejected).  Fractional nanoseconds are accepted and rounded.  Errors report line 1;
    /// file readers substitute the real line number.
    fn from_str(s: &str) -> Result<Self> {
        let bad = |message: String| GapError::Parse { line: 1, message };
        let s = s.trim();
        if s == "skipped" {
            return Ok(BenchmarkRecord::Skipped);
        }
        let (probability, nanos) = s
            .split_once(char::is_whitespace)
            .ok_or_else(|| bad(format!("expected `skipped` or `<probability> <ns>`, got {s:?}")))?;
        let probability: f64 = probability
            .parse()
            .map_err(|err| bad(format!("bad probability {probability:?}: {err}")))?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(bad(format!("probability must lie in [0, 1], got {probability}")));
        }
        let nanos: f64 = nanos
            .trim()
            .parse()
            .map_err(|err| bad(format!("bad duration {nanos:?}: {err}")))?;
        if !(nanos.is_finite() && nanos >= 0.0) {
            return Err(bad(format!("duration must be non-negative, got {nanos}")));
        }
        Ok(BenchmarkRecord::Measured {
            probability,
            elapsed: Duration::from_nanos(nanos.round() as u64),
        })
    }
}

/// Everything measured for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceReport {
    /// Zero-based position in the batch.
    pub index: usize,
    /// Variable count of the polynomial.
    pub num_vars: usize,
    /// Oracle gap, when the oracle ran.
    pub gap: Option<i64>,
    /// One record per backend, in registration order.
    pub records: Vec<(String, BenchmarkRecord)>,
}

impl InstanceReport {
    /// Record produced by the backend called `backend`.
    pub fn record_for(&self, backend: &str) -> Option<&BenchmarkRecord> {
        self.records
            .iter()
            .find(|(name, _)| name == backend)
            .map(|(_, record)| record)
    }
}

/// Runs instances against a set of backends.
pub struct Harness {
    config: HarnessConfig,
    backends: Vec<Box<dyn Backend>>,
}

impl Harness {
    /// Creates a harness with no backends.
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            backends: Vec::new(),
        }
    }

    /// Registers a backend; the first one registered is the reference for
    /// cross-backend checks.
    pub fn with_backend(mut self, backend: Box<dyn Backend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Names of the registered backends, in registration order.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    /// Measures one instance.
    #[instrument(skip_all, fields(index = index, num_vars = poly.num_vars()))]
    pub fn run_instance(&self, index: usize, poly: &Polynomial) -> Result<InstanceReport> {
        self.config.validate()?;
        if let Some(max) = self.config.max_variables {
            if poly.num_vars() > max {
                info!(index, num_vars = poly.num_vars(), max, "skipping instance");
                return Ok(InstanceReport {
                    index,
                    num_vars: poly.num_vars(),
                    gap: None,
                    records: self
                        .backends
                        .iter()
                        .map(|backend| (backend.name().to_string(), BenchmarkRecord::Skipped))
                        .collect(),
                });
            }
        }
        self.measure(index, poly)
            .map_err(|err| err.for_instance(index, poly))
    }

    /// Measures every instance, stopping at the first failure.
    pub fn run(&self, polys: &[Polynomial]) -> Result<Vec<InstanceReport>> {
        let mut reports = Vec::with_capacity(polys.len());
        self.run_streaming(polys, |report| {
            reports.push(report);
            Ok(())
        })?;
        Ok(reports)
    }

    /// Measures every instance, handing each report to `on_report` as soon as
    /// it is available.
    pub fn run_streaming<F>(&self, polys: &[Polynomial], mut on_report: F) -> Result<()>
    where
        F: FnMut(InstanceReport) -> Result<()>,
    {
        for (index, poly) in polys.iter().enumerate() {
            on_report(self.run_instance(index, poly)?)?;
        }
        Ok(())
    }

    fn measure(&self, index: usize, poly: &Polynomial) -> Result<InstanceReport> {
        let circuit = compile(poly)?;
        for backend in &self.backends {
            if circuit.num_qubits() > backend.max_qubits() {
                return Err(GapError::CapacityExceeded {
                    backend: backend.name().to_string(),
                    qubits: circuit.num_qubits(),
                    limit: backend.max_qubits(),
                });
            }
        }
        let gap = self.config.check_oracle.then(|| oracle::gap(poly));
        let expected = gap.map(|gap| oracle::probability_from_gap(gap, poly.num_vars()));
        let mut reference: Option<(&str, f64)> = None;
        let mut records = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            let (probability, elapsed) = self.time_backend(backend.as_ref(), &circuit)?;
            if let Some(expected) = expected {
                check(backend.name(), "oracle", expected, probability, self.config.tolerance)?;
            }
            match reference {
                Some((name, first)) => {
                    check(backend.name(), name, first, probability, self.config.tolerance)?
                }
                None => reference = Some((backend.name(), probability)),
            }
            debug!(
                index,
                backend = backend.name(),
                probability,
                elapsed_ns = elapsed.as_nanos() as u64,
                "measured"
            );
            records.push((
                backend.name().to_string(),
                BenchmarkRecord::Measured {
                    probability,
                    elapsed,
                },
            ));
        }
        Ok(InstanceReport {
            index,
            num_vars: poly.num_vars(),
            gap,
            records,
        })
    }

    fn time_backend(&self, backend: &dyn Backend, circuit: &Circuit) -> Result<(f64, Duration)> {
        let mut first = None;
        let mut total = Duration::ZERO;
        for _ in 0..self.config.repetitions {
            let start = Instant::now();
            let probability = backend.execute(circuit)?;
            total += start.elapsed();
            match first {
                Some(first) => check(
                    backend.name(),
                    "repeat",
                    first,
                    probability,
                    self.config.stability_tolerance,
                )?,
                None => first = Some(probability),
            }
        }
        let probability = first.ok_or_else(|| {
            GapError::Config("repetitions must be at least 1".to_string())
        })?;
        Ok((probability, total / self.config.repetitions))
    }
}

fn check(backend: &str, against: &str, expected: f64, actual: f64, tolerance: f64) -> Result<()> {
    if (actual - expected).abs() < tolerance {
        Ok(())
    } else {
        Err(GapError::ConsistencyMismatch {
            backend: backend.to_string(),
            against: against.to_string(),
            expected,
            actual,
            tolerance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::GateSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns scripted probabilities and counts its calls.
    struct ScriptedBackend {
        name: &'static str,
        values: Vec<f64>,
        calls: Arc<AtomicUsize>,
        max_qubits: usize,
    }

    impl ScriptedBackend {
        fn new(name: &'static str, values: Vec<f64>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let backend = Self {
                name,
                values,
                calls: Arc::clone(&calls),
                max_qubits: crate::MAX_VARIABLES,
            };
            (backend, calls)
        }

        fn limited(mut self, max_qubits: usize) -> Self {
            self.max_qubits = max_qubits;
            self
        }
    }

    impl Backend for ScriptedBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn gate_set(&self) -> GateSet {
            GateSet::Native
        }

        fn max_qubits(&self) -> usize {
            self.max_qubits
        }

        fn execute(&self, _circuit: &Circuit) -> Result<f64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.values[call % self.values.len()])
        }
    }

    fn scenario_a() -> Polynomial {
        Polynomial::new(3, [vec![0usize, 1, 2], vec![0, 2], vec![1, 2], vec![0]]).unwrap()
    }

    fn full_harness(config: HarnessConfig) -> Harness {
        BackendKind::ALL
            .iter()
            .fold(Harness::new(config), |harness, kind| {
                harness.with_backend(kind.build())
            })
    }

    fn mismatch_against(err: &GapError) -> &str {
        match err.root() {
            GapError::ConsistencyMismatch { against, .. } => against,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scenario_a_report() {
        let report = full_harness(HarnessConfig::default())
            .run_instance(0, &scenario_a())
            .unwrap();
        assert_eq!(report.gap, Some(2));
        assert_eq!(report.records.len(), 2);
        for kind in BackendKind::ALL {
            let p = report.record_for(kind.as_str()).unwrap().probability().unwrap();
            assert!((p - 0.0625).abs() < 1e-9);
        }
    }

    #[test]
    fn test_skip_above_ceiling() {
        let (backend, calls) = ScriptedBackend::new("scripted", vec![1.0]);
        let harness = Harness::new(HarnessConfig {
            max_variables: Some(5),
            ..HarnessConfig::default()
        })
        .with_backend(Box::new(backend));
        let poly = Polynomial::new(6, [vec![0usize, 5]]).unwrap();
        let report = harness.run_instance(3, &poly).unwrap();
        assert_eq!(report.gap, None);
        assert_eq!(report.record_for("scripted"), Some(&BenchmarkRecord::Skipped));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let small = Polynomial::zero(5).unwrap();
        harness.run_instance(4, &small).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_oracle_mismatch_is_reported() {
        let (backend, _) = ScriptedBackend::new("faulty", vec![0.5]);
        let harness = Harness::new(HarnessConfig::default()).with_backend(Box::new(backend));
        let err = harness.run_instance(7, &scenario_a()).unwrap_err();
        match &err {
            GapError::Instance { index, polynomial, .. } => {
                assert_eq!(*index, 7);
                assert_eq!(polynomial, &scenario_a().to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mismatch_against(&err), "oracle");
    }

    #[test]
    fn test_unstable_repeats_are_reported() {
        let (backend, _) = ScriptedBackend::new("flaky", vec![0.0625, 0.07]);
        let harness = Harness::new(HarnessConfig::default()).with_backend(Box::new(backend));
        let err = harness.run_instance(0, &scenario_a()).unwrap_err();
        assert_eq!(mismatch_against(&err), "repeat");
    }

    #[test]
    fn test_backends_must_agree_without_oracle() {
        let (first, _) = ScriptedBackend::new("first", vec![0.25]);
        let (second, _) = ScriptedBackend::new("second", vec![0.5]);
        let harness = Harness::new(HarnessConfig {
            check_oracle: false,
            ..HarnessConfig::default()
        })
        .with_backend(Box::new(first))
        .with_backend(Box::new(second));
        let err = harness.run_instance(0, &scenario_a()).unwrap_err();
        assert_eq!(mismatch_against(&err), "first");
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let (backend, _) = ScriptedBackend::new("constant", vec![1.0]);
        let harness = Harness::new(HarnessConfig::default()).with_backend(Box::new(backend));
        let polys = vec![Polynomial::zero(2).unwrap(), scenario_a(), Polynomial::zero(3).unwrap()];
        let mut seen = Vec::new();
        let err = harness
            .run_streaming(&polys, |report| {
                seen.push(report.index);
                Ok(())
            })
            .unwrap_err();
        assert_eq!(seen, vec![0]);
        assert!(matches!(err, GapError::Instance { index: 1, .. }));
    }

    #[test]
    fn test_unsupported_degree_is_wrapped() {
        let harness = full_harness(HarnessConfig::default());
        let poly = Polynomial::new(4, [vec![0usize, 1, 2, 3]]).unwrap();
        let err = harness.run(&[poly]).unwrap_err();
        assert!(matches!(err.root(), GapError::UnsupportedMonomial { .. }));
    }

    #[test]
    fn test_capacity_checked_before_oracle() {
        let (backend, calls) = ScriptedBackend::new("small", vec![1.0]);
        let harness =
            Harness::new(HarnessConfig::default()).with_backend(Box::new(backend.limited(4)));
        // Enumerating 2^40 assignments would not finish; the capacity check must come first.
        let poly = Polynomial::new(40, [vec![0usize, 39]]).unwrap();
        let err = harness.run_instance(0, &poly).unwrap_err();
        match err.root() {
            GapError::CapacityExceeded {
                backend,
                qubits,
                limit,
            } => {
                assert_eq!(backend, "small");
                assert_eq!(*qubits, 40);
                assert_eq!(*limit, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_config_defaults_from_json() {
        assert_eq!(HarnessConfig::from_json_str("{}").unwrap(), HarnessConfig::default());
        let config = HarnessConfig::from_json_str(r#"{"max_variables": 12, "repetitions": 2}"#)
            .unwrap();
        assert_eq!(config.max_variables, Some(12));
        assert_eq!(config.repetitions, 2);
        assert_eq!(config.tolerance, 1e-5);
        assert!(matches!(
            HarnessConfig::from_json_str(r#"{"repetitions": 0}"#),
            Err(GapError::Config(_))
        ));
        assert!(matches!(
            HarnessConfig::from_json_str(r#"{"tolerance": -1.0}"#),
            Err(GapError::Config(_))
        ));
        assert!(matches!(
            HarnessConfig::from_json_str("{"),
            Err(GapError::Json(_))
        ));
    }

    #[test]
    fn test_record_text_form() {
        let record = BenchmarkRecord::Measured {
            probability: 0.25,
            elapsed: Duration::from_nanos(42),
        };
        assert_eq!(record.to_string(), "0.25 42");
        assert_eq!("0.25 42".parse::<BenchmarkRecord>().unwrap(), record);
        assert_eq!(
            "0.25 41.6".parse::<BenchmarkRecord>().unwrap(),
            record
        );
        assert_eq!(
            " skipped ".parse::<BenchmarkRecord>().unwrap(),
            BenchmarkRecord::Skipped
        );
        assert!("0.25".parse::<BenchmarkRecord>().is_err());
        assert!("0.25 -3".parse::<BenchmarkRecord>().is_err());
        for bad in ["NaN 5", "inf 5", "-inf 5", "1.5 5", "-0.1 5"] {
            assert!(
                matches!(bad.parse::<BenchmarkRecord>(), Err(GapError::Parse { .. })),
                "{bad:?} accepted"
            );
        }
        assert!("1 5".parse::<BenchmarkRecord>().is_ok());
        assert!("0 5".parse::<BenchmarkRecord>().is_ok());
    }
}
