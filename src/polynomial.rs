//! Multilinear polynomials over GF(2).
//!
//! A polynomial is stored as a set of monomials, each monomial being a set of
//! variable indices packed into a `u64` bitmask.  Boolean assignments use the
//! same little-endian packing: variable `x_i` is bit `i` of the assignment, so
//! a monomial evaluates to 1 exactly when its mask is contained in the
//! assignment.  Addition is XOR, which is why the constructors fold repeated
//! monomials instead of keeping multiplicities.

use crate::{GapError, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Largest supported number of variables.
///
/// Gaps lie in `[-2^N, 2^N]` and are reported as `i64`.
pub const MAX_VARIABLES: usize = 62;

/// A product of distinct boolean variables.
///
/// Monomials are value objects: two monomials built from the same indices in
/// any order compare equal.  The empty monomial is the constant `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Monomial {
    mask: u64,
}

impl Monomial {
    /// Builds a monomial from a list of variable indices.
    ///
    /// Fails with [`GapError::InvalidMonomial`] if an index repeats or is not
    /// below [`MAX_VARIABLES`].  An empty list yields the constant monomial;
    /// [`Polynomial::new`] is the place that rejects it.
    pub fn new(variables: &[usize]) -> Result<Self> {
        let mut mask = 0u64;
        for &var in variables {
            if var >= MAX_VARIABLES {
                return Err(GapError::InvalidMonomial {
                    monomial: render_indices(variables),
                    reason: format!("variable x{var} exceeds the supported range"),
                });
            }
            let bit = 1u64 << var;
            if mask & bit != 0 {
                return Err(GapError::InvalidMonomial {
                    monomial: render_indices(variables),
                    reason: format!("variable x{var} appears more than once"),
                });
            }
            mask |= bit;
        }
        Ok(Self { mask })
    }

    /// The constant monomial `1`.
    pub fn one() -> Self {
        Self { mask: 0 }
    }

    /// Number of variables in the product.
    pub fn degree(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Returns `true` for the constant monomial.
    pub fn is_constant(&self) -> bool {
        self.mask == 0
    }

    /// Bitmask of the variables in the product.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Variable indices in ascending order.
    pub fn variables(&self) -> Vec<usize> {
        (0..MAX_VARIABLES)
            .filter(|&i| (self.mask >> i) & 1 == 1)
            .collect()
    }

    /// Largest variable index, or `None` for the constant.
    pub fn max_variable(&self) -> Option<usize> {
        if self.mask == 0 {
            None
        } else {
            Some(63 - self.mask.leading_zeros() as usize)
        }
    }

    /// Evaluates the product at a packed assignment.
    #[inline]
    pub fn evaluate_bits(&self, bits: u64) -> bool {
        bits & self.mask == self.mask
    }
}

impl Ord for Monomial {
    /// Orders by degree first, then by the variable indices read low to high.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.degree()
            .cmp(&other.degree())
            .then_with(|| self.mask.reverse_bits().cmp(&other.mask.reverse_bits()).reverse())
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            return f.write_str("1");
        }
        f.write_str(&render_indices(&self.variables()))
    }
}

fn render_indices(variables: &[usize]) -> String {
    if variables.is_empty() {
        return "1".to_string();
    }
    variables
        .iter()
        .map(|v| format!("x{v}"))
        .collect::<Vec<_>>()
        .join(" * ")
}

/// A multilinear polynomial over GF(2) in `num_vars` boolean variables.
///
/// Instances are immutable.  Monomials are kept in a deterministic order
/// (degree, then indices), which keeps compiled circuits and rendered text
/// stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Polynomial {
    num_vars: usize,
    monomials: BTreeSet<Monomial>,
}

impl Polynomial {
    /// Builds a polynomial from lists of variable indices.
    ///
    /// Duplicated monomials cancel in pairs.  Fails with
    /// [`GapError::InvalidMonomial`] on an empty monomial, a repeated index
    /// inside a monomial, or an index `>= num_vars`, and with
    /// [`GapError::InvalidVariableCount`] unless `1 <= num_vars <= 62`.
    pub fn new<I, M>(num_vars: usize, monomials: I) -> Result<Self>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<[usize]>,
    {
        let built = monomials
            .into_iter()
            .map(|m| Monomial::new(m.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_monomials(num_vars, built)
    }

    /// Builds a polynomial from already constructed monomials.
    ///
    /// Applies the same validation and folding as [`Polynomial::new`].
    pub fn from_monomials<I>(num_vars: usize, monomials: I) -> Result<Self>
    where
        I: IntoIterator<Item = Monomial>,
    {
        Self::build(num_vars, monomials, false)
    }

    /// Builds a polynomial that may carry the constant term `1`.
    ///
    /// The oracle evaluates such polynomials normally; the compiler rejects
    /// the constant with [`GapError::UnsupportedMonomial`].
    pub fn with_constant<I>(num_vars: usize, monomials: I) -> Result<Self>
    where
        I: IntoIterator<Item = Monomial>,
    {
        Self::build(num_vars, monomials, true)
    }

    /// The polynomial with no monomials.
    pub fn zero(num_vars: usize) -> Result<Self> {
        Self::from_monomials(num_vars, std::iter::empty())
    }

    fn build<I>(num_vars: usize, monomials: I, allow_constant: bool) -> Result<Self>
    where
        I: IntoIterator<Item = Monomial>,
    {
        if num_vars == 0 || num_vars > MAX_VARIABLES {
            return Err(GapError::InvalidVariableCount {
                num_vars,
                max: MAX_VARIABLES,
            });
        }
        let mut set = BTreeSet::new();
        for monomial in monomials {
            if monomial.is_constant() && !allow_constant {
                return Err(GapError::InvalidMonomial {
                    monomial: monomial.to_string(),
                    reason: "the constant monomial is not allowed".to_string(),
                });
            }
            if let Some(max) = monomial.max_variable() {
                if max >= num_vars {
                    return Err(GapError::InvalidMonomial {
                        monomial: monomial.to_string(),
                        reason: format!("polynomial only has {num_vars} variables"),
                    });
                }
            }
            if !set.insert(monomial) {
                set.remove(&monomial);
            }
        }
        Ok(Self {
            num_vars,
            monomials: set,
        })
    }

    /// Returns the number of variables.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Iterates over the monomials in canonical order.
    pub fn monomials(&self) -> impl Iterator<Item = &Monomial> + '_ {
        self.monomials.iter()
    }

    /// Number of monomials.
    pub fn len(&self) -> usize {
        self.monomials.len()
    }

    /// Returns `true` for the zero polynomial.
    pub fn is_empty(&self) -> bool {
        self.monomials.is_empty()
    }

    /// Largest monomial degree (0 for the zero polynomial).
    pub fn degree(&self) -> usize {
        self.monomials.iter().map(Monomial::degree).max().unwrap_or(0)
    }

    /// Evaluates the polynomial at a packed boolean assignment.
    pub fn evaluate_bits(&self, bits: u64) -> bool {
        self.monomials
            .iter()
            .fold(false, |acc, m| acc ^ m.evaluate_bits(bits))
    }

    /// Evaluates the polynomial at a boolean assignment.
    ///
    /// # Panics
    ///
    /// Panics if `assignment` does not hold exactly `num_vars` entries.
    pub fn evaluate(&self, assignment: &[bool]) -> bool {
        assert_eq!(
            assignment.len(),
            self.num_vars,
            "boolean assignment length mismatch"
        );
        let bits = assignment
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << i));
        self.evaluate_bits(bits)
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.monomials.is_empty() {
            return f.write_str("0");
        }
        for (i, monomial) in self.monomials.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{monomial}")?;
        }
        Ok(())
    }
}
