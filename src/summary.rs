//! Cross-file consistency check and timing summary.
//!
//! Result files written by separate `benchmark` runs are compared instance by
//! instance, then the mean execution time of every run is grouped by the
//! variable count of the instances.

use crate::harness::BenchmarkRecord;
use crate::{GapError, Polynomial, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Default agreement threshold between result files.
pub const SUMMARY_TOLERANCE: f64 = 1.5e-5;

/// Mean execution time per variable count, one column per labelled run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Run labels, in input order.
    pub labels: Vec<String>,
    /// Variable count mapped to the mean seconds of each run (`None` when the
    /// run skipped every instance of that size).
    pub rows: BTreeMap<usize, Vec<Option<f64>>>,
}

/// Checks that every labelled result list agrees and summarizes its timings.
///
/// For each instance the first available probability is the reference; any
/// other run differing by `tolerance` or more fails with
/// [`GapError::ConsistencyMismatch`] wrapped in [`GapError::Instance`].
pub fn summarize(
    instances: &[Polynomial],
    results: &[(String, Vec<BenchmarkRecord>)],
    tolerance: f64,
) -> Result<Summary> {
    for (label, records) in results {
        if records.len() != instances.len() {
            return Err(GapError::Config(format!(
                "{label} has {} results for {} instances",
                records.len(),
                instances.len()
            )));
        }
    }

    for (index, poly) in instances.iter().enumerate() {
        let mut reference: Option<(&str, f64)> = None;
        for (label, records) in results {
            let Some(probability) = records[index].probability() else {
                continue;
            };
            match reference {
                None => reference = Some((label.as_str(), probability)),
                Some((against, expected)) if !((probability - expected).abs() < tolerance) => {
                    return Err(GapError::ConsistencyMismatch {
                        backend: label.clone(),
                        against: against.to_string(),
                        expected,
                        actual: probability,
                        tolerance,
                    }
                    .for_instance(index, poly));
                }
                Some(_) => {}
            }
        }
    }

    let mut sums: BTreeMap<usize, Vec<(f64, usize)>> = BTreeMap::new();
    for (index, poly) in instances.iter().enumerate() {
        let row = sums
            .entry(poly.num_vars())
            .or_insert_with(|| vec![(0.0, 0); results.len()]);
        for (column, (_, records)) in results.iter().enumerate() {
            if let Some(elapsed) = records[index].elapsed() {
                row[column].0 += elapsed.as_secs_f64();
                row[column].1 += 1;
            }
        }
    }
    let rows = sums
        .into_iter()
        .map(|(num_vars, columns)| {
            let means = columns
                .into_iter()
                .map(|(total, count)| (count > 0).then(|| total / count as f64))
                .collect();
            (num_vars, means)
        })
        .collect();

    Ok(Summary {
        labels: results.iter().map(|(label, _)| label.clone()).collect(),
        rows,
    })
}

/// Renders a summary as CSV with a `variables` column followed by one column
/// per run; missing means are left empty.
pub fn render_csv(summary: &Summary) -> String {
    let mut out = String::from("variables");
    for label in &summary.labels {
        out.push(',');
        out.push_str(label);
    }
    out.push('\n');
    for (num_vars, means) in &summary.rows {
        let _ = write!(out, "{num_vars}");
        for mean in means {
            out.push(',');
            if let Some(mean) = mean {
                let _ = write!(out, "{mean:e}");
            }
        }
        out.push('\n');
    }
    out
}
