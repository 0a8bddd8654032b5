//! Plain-text instance and result files.
//!
//! Instance files group polynomials under comment headers:
//!
//! ```text
//! # length: 3, variables: 4
//! x0 * x1 + x2 + x1 * x2 * x3
//! x3 + x0 * x2 + x1
//! ```
//!
//! Blank lines are ignored and every `#` line is a comment; a comment that
//! mentions `variables: <N>` sets the variable count for the polynomial lines
//! that follow it.  The literal `0` denotes the zero polynomial and `1` the
//! constant monomial.
//!
//! Result files carry one [`BenchmarkRecord`] per instance, in instance order.

use crate::harness::BenchmarkRecord;
use crate::{GapError, Monomial, Polynomial, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Polynomials sharing a generator header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceBlock {
    /// Requested number of monomials per polynomial.
    pub length: usize,
    /// Number of variables of every polynomial in the block.
    pub num_vars: usize,
    /// The polynomials themselves.
    pub polynomials: Vec<Polynomial>,
}

fn parse_error(line: usize, message: impl Into<String>) -> GapError {
    GapError::Parse {
        line,
        message: message.into(),
    }
}

fn declared_variables(comment: &str, line: usize) -> Result<Option<usize>> {
    let Some((_, rest)) = comment.split_once("variables:") else {
        return Ok(None);
    };
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return Err(parse_error(line, "variables: must be followed by a count"));
    }
    digits
        .parse()
        .map(Some)
        .map_err(|err| parse_error(line, format!("bad variable count {digits}: {err}")))
}

fn parse_factor(factor: &str, line: usize) -> Result<usize> {
    factor
        .strip_prefix('x')
        .and_then(|index| index.parse().ok())
        .ok_or_else(|| parse_error(line, format!("malformed factor {factor:?}")))
}

fn parse_monomial(term: &str, line: usize) -> Result<Monomial> {
    if term == "1" {
        return Ok(Monomial::one());
    }
    let variables = term
        .split('*')
        .map(|factor| parse_factor(factor.trim(), line))
        .collect::<Result<Vec<_>>>()?;
    Monomial::new(&variables).map_err(|err| parse_error(line, err.to_string()))
}

/// Parses a single polynomial line over `num_vars` variables.
pub fn parse_polynomial(text: &str, num_vars: usize, line: usize) -> Result<Polynomial> {
    let text = text.trim();
    let built = if text == "0" {
        Polynomial::zero(num_vars)
    } else {
        let monomials = text
            .split('+')
            .map(|term| parse_monomial(term.trim(), line))
            .collect::<Result<Vec<_>>>()?;
        Polynomial::with_constant(num_vars, monomials)
    };
    built.map_err(|err| parse_error(line, err.to_string()))
}

/// Parses the contents of an instance file.
pub fn parse_instances(contents: &str) -> Result<Vec<Polynomial>> {
    let mut num_vars = None;
    let mut polynomials = Vec::new();
    for (index, raw) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if let Some(n) = declared_variables(comment, line_no)? {
                num_vars = Some(n);
            }
            continue;
        }
        let n = num_vars.ok_or_else(|| {
            parse_error(line_no, "polynomial appears before any variables: declaration")
        })?;
        polynomials.push(parse_polynomial(line, n, line_no)?);
    }
    Ok(polynomials)
}

/// Reads and parses an instance file.
pub fn read_instances(path: impl AsRef<Path>) -> Result<Vec<Polynomial>> {
    parse_instances(&fs::read_to_string(path)?)
}

/// Renders a block as its header line followed by one line per polynomial.
pub fn format_instance_block(block: &InstanceBlock) -> Vec<String> {
    let mut lines = Vec::with_capacity(block.polynomials.len() + 1);
    lines.push(format!(
        "# length: {}, variables: {}",
        block.length, block.num_vars
    ));
    lines.extend(block.polynomials.iter().map(Polynomial::to_string));
    lines
}

/// Writes `blocks` to `path`, replacing any existing file.
pub fn write_instances(path: impl AsRef<Path>, blocks: &[InstanceBlock]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for block in blocks {
        for line in format_instance_block(block) {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Parses a result file into one record per non-blank line.
pub fn parse_results(contents: &str) -> Result<Vec<BenchmarkRecord>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.parse::<BenchmarkRecord>().map_err(|err| match err {
                GapError::Parse { message, .. } => parse_error(index + 1, message),
                other => other,
            })
        })
        .collect()
}

/// Reads and parses a result file.
pub fn read_results(path: impl AsRef<Path>) -> Result<Vec<BenchmarkRecord>> {
    parse_results(&fs::read_to_string(path)?)
}

/// Writes `records` to `path`, one line each.
pub fn write_results(path: impl AsRef<Path>, records: &[BenchmarkRecord]) -> Result<()> {
    let mut writer = ResultWriter::create(path)?;
    for record in records {
        writer.push(record)?;
    }
    Ok(())
}

/// Appends records to a result file as they are produced.
///
/// Each record is flushed immediately so a long benchmark leaves a usable
/// prefix behind if it is interrupted.
#[derive(Debug)]
pub struct ResultWriter {
    writer: BufWriter<File>,
}

impl ResultWriter {
    /// Creates (or truncates) the result file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }

    /// Writes one record line and flushes it.
    pub fn push(&mut self, record: &BenchmarkRecord) -> Result<()> {
        writeln!(self.writer, "{record}")?;
        self.writer.flush()?;
        Ok(())
    }
}
