//! Command-line front end for the gap benchmark.
//!
//! `benchmark` times one backend over an instance file, `verify` cross-checks
//! every backend against the oracle, `generate` writes a random instance
//! suite and `summarize` merges result files into a CSV of mean timings.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use iqp_gap::instances::{self, ResultWriter};
use iqp_gap::summary::{self, SUMMARY_TOLERANCE};
use iqp_gap::{generator, BackendKind, Harness, HarnessConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "iqp-gap", version, about = "Estimate polynomial gaps with IQP circuits")]
struct Cli {
    /// Raise the log level (-v for debug, -vv for trace); RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Time one backend over an instance file and write one result per line.
    ///
    /// The oracle check is off unless a `--config` file is given, in which
    /// case its `check_oracle` value (default `true`) applies.
    Benchmark {
        /// Instance file to read.
        source: PathBuf,
        /// Result file to write.
        target: PathBuf,
        /// Skip instances with more variables.
        #[arg(long)]
        variables: Option<usize>,
        /// Backend to run.
        #[arg(long, default_value = "state-vector")]
        backend: BackendKind,
        /// JSON harness configuration.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check every backend against the brute-force oracle.
    Verify {
        /// Instance file to read.
        source: PathBuf,
        /// Skip instances with more variables.
        #[arg(long)]
        variables: Option<usize>,
        /// JSON harness configuration.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write a random instance suite.
    Generate {
        /// Instance file to write.
        target: PathBuf,
        /// Seed of the generator.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Smallest variable count.
        #[arg(long, default_value_t = 2)]
        min_variables: usize,
        /// Largest variable count.
        #[arg(long, default_value_t = 29)]
        max_variables: usize,
        /// Polynomials per variable count.
        #[arg(long, default_value_t = 8)]
        per_size: usize,
    },
    /// Check that result files agree and tabulate mean seconds per size.
    Summarize {
        /// Instance file the results were produced from.
        instances: PathBuf,
        /// Result files as `label:path`.
        #[arg(required = true)]
        results: Vec<String>,
        /// CSV file to write.
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_config(path: Option<&Path>) -> Result<Option<HarnessConfig>> {
    path.map(|path| {
        HarnessConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))
    })
    .transpose()
}

fn with_variables(mut config: HarnessConfig, variables: Option<usize>) -> HarnessConfig {
    if variables.is_some() {
        config.max_variables = variables;
    }
    config
}

fn benchmark_config(file: Option<HarnessConfig>, variables: Option<usize>) -> HarnessConfig {
    let config = file.unwrap_or(HarnessConfig {
        check_oracle: false,
        ..HarnessConfig::default()
    });
    with_variables(config, variables)
}

fn read_instances(path: &Path) -> Result<Vec<iqp_gap::Polynomial>> {
    instances::read_instances(path)
        .with_context(|| format!("failed to read instances from {}", path.display()))
}

fn benchmark(
    source: &Path,
    target: &Path,
    variables: Option<usize>,
    backend: BackendKind,
    config: Option<&Path>,
) -> Result<()> {
    let config = benchmark_config(read_config(config)?, variables);
    let polys = read_instances(source)?;
    let harness = Harness::new(config).with_backend(backend.build());
    let mut writer = ResultWriter::create(target)
        .with_context(|| format!("failed to create {}", target.display()))?;
    info!(instances = polys.len(), %backend, "benchmark started");
    harness.run_streaming(&polys, |report| {
        let record = report
            .record_for(backend.as_str())
            .copied()
            .unwrap_or(iqp_gap::BenchmarkRecord::Skipped);
        writer.push(&record)
    })?;
    info!(target = %target.display(), "benchmark finished");
    Ok(())
}

fn verify(source: &Path, variables: Option<usize>, config: Option<&Path>) -> Result<()> {
    let config = with_variables(read_config(config)?.unwrap_or_default(), variables);
    let polys = read_instances(source)?;
    let harness = BackendKind::ALL
        .iter()
        .fold(Harness::new(config), |harness, kind| {
            harness.with_backend(kind.build())
        });
    harness.run_streaming(&polys, |report| {
        match report.gap {
            Some(gap) => {
                let probabilities = report
                    .records
                    .iter()
                    .map(|(name, record)| format!("{name}={record}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "{} N={} gap={gap} {probabilities}",
                    report.index, report.num_vars
                );
            }
            None => println!("{} N={} skipped", report.index, report.num_vars),
        }
        Ok(())
    })?;
    Ok(())
}

fn generate(
    target: &Path,
    seed: u64,
    min_variables: usize,
    max_variables: usize,
    per_size: usize,
) -> Result<()> {
    if min_variables == 0 || min_variables > max_variables {
        bail!("invalid variable range {min_variables}..={max_variables}");
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let blocks = generator::instance_suite(&mut rng, min_variables..=max_variables, per_size)?;
    instances::write_instances(target, &blocks)
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(
        blocks = blocks.len(),
        target = %target.display(),
        "instances written"
    );
    Ok(())
}

fn summarize(instances_path: &Path, results: &[String], output: &Path) -> Result<()> {
    let polys = read_instances(instances_path)?;
    let mut labelled = Vec::with_capacity(results.len());
    for entry in results {
        let Some((label, path)) = entry.split_once(':') else {
            bail!("expected label:path, got {entry:?}");
        };
        let records = instances::read_results(path)
            .with_context(|| format!("failed to read results from {path}"))?;
        labelled.push((label.to_string(), records));
    }
    let summary = summary::summarize(&polys, &labelled, SUMMARY_TOLERANCE)?;
    fs::write(output, summary::render_csv(&summary))
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(sizes = summary.rows.len(), output = %output.display(), "summary written");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Benchmark {
            source,
            target,
            variables,
            backend,
            config,
        } => benchmark(&source, &target, variables, backend, config.as_deref()),
        Command::Verify {
            source,
            variables,
            config,
        } => verify(&source, variables, config.as_deref()),
        Command::Generate {
            target,
            seed,
            min_variables,
            max_variables,
            per_size,
        } => generate(&target, seed, min_variables, max_variables, per_size),
        Command::Summarize {
            instances,
            results,
            output,
        } => summarize(&instances, &results, &output),
    }
}
