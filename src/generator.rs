//! Seedable random instance generation.
//!
//! Generators take any [`rand::Rng`], so benchmarks reproduce from a seed
//! (`StdRng::seed_from_u64`) and property tests can drive them from their own
//! seeds.

use crate::instances::InstanceBlock;
use crate::{GapError, Monomial, Polynomial, Result};
use rand::seq::index;
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Shape of a polynomial drawn by [`random_polynomial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Number of variables `N`.
    pub num_vars: usize,
    /// Exact number of distinct monomials.
    pub num_monomials: usize,
    /// Largest monomial degree (clipped to `N`).
    pub max_degree: usize,
}

/// Number of distinct monomials of degree `1..=max_degree` in `num_vars` variables.
pub fn monomial_count(num_vars: usize, max_degree: usize) -> u128 {
    let mut total = 0u128;
    let mut binomial = 1u128;
    for k in 1..=max_degree.min(num_vars) {
        binomial = binomial * (num_vars + 1 - k) as u128 / k as u128;
        total = total.saturating_add(binomial);
    }
    total
}

fn random_monomial<R: Rng + ?Sized>(rng: &mut R, num_vars: usize, max_degree: usize) -> Result<Monomial> {
    let degree = rng.gen_range(1..=max_degree.min(num_vars));
    Monomial::new(&index::sample(rng, num_vars, degree).into_vec())
}

/// Draws a polynomial with exactly `config.num_monomials` distinct monomials.
///
/// Degrees are uniform in `1..=min(max_degree, N)` and variables are drawn
/// without replacement.  Fails with [`GapError::Config`] if fewer distinct
/// monomials exist than requested or if `max_degree` is zero.
pub fn random_polynomial<R: Rng + ?Sized>(rng: &mut R, config: &GeneratorConfig) -> Result<Polynomial> {
    if config.max_degree == 0 {
        return Err(GapError::Config("max_degree must be at least 1".to_string()));
    }
    if (config.num_monomials as u128) > monomial_count(config.num_vars, config.max_degree) {
        return Err(GapError::Config(format!(
            "cannot draw {} distinct monomials of degree <= {} in {} variables",
            config.num_monomials, config.max_degree, config.num_vars
        )));
    }
    let mut seen = HashSet::with_capacity(config.num_monomials);
    let mut monomials = Vec::with_capacity(config.num_monomials);
    while monomials.len() < config.num_monomials {
        let monomial = random_monomial(rng, config.num_vars, config.max_degree)?;
        if seen.insert(monomial) {
            monomials.push(monomial);
        }
    }
    Polynomial::from_monomials(config.num_vars, monomials)
}

/// Draws a polynomial with a random shape.
///
/// `N` is uniform in `1..=max_vars` and the number of drawn monomials uniform
/// in `0..max_monomials`; drawn duplicates cancel, so the result may be
/// shorter.  Fails with [`GapError::Config`] on zero bounds.
pub fn random_polynomial_bounded<R: Rng + ?Sized>(
    rng: &mut R,
    max_vars: usize,
    max_monomials: usize,
    max_degree: usize,
) -> Result<Polynomial> {
    if max_vars == 0 || max_monomials == 0 || max_degree == 0 {
        return Err(GapError::Config(
            "random polynomial bounds must be positive".to_string(),
        ));
    }
    let num_vars = rng.gen_range(1..=max_vars);
    let length = rng.gen_range(0..max_monomials);
    let monomials = (0..length)
        .map(|_| random_monomial(rng, num_vars, max_degree))
        .collect::<Result<Vec<_>>>()?;
    Polynomial::from_monomials(num_vars, monomials)
}

/// Builds the benchmark suite: for each `N` in `variables`, `per_size`
/// polynomials with `N` distinct monomials of degree at most 3.
///
/// Sizes with fewer available monomials than `N` are left out.
pub fn instance_suite<R: Rng + ?Sized>(
    rng: &mut R,
    variables: RangeInclusive<usize>,
    per_size: usize,
) -> Result<Vec<InstanceBlock>> {
    let mut blocks = Vec::new();
    for num_vars in variables {
        let length = num_vars;
        if monomial_count(num_vars, 3) < length as u128 {
            continue;
        }
        let config = GeneratorConfig {
            num_vars,
            num_monomials: length,
            max_degree: 3,
        };
        let polynomials = (0..per_size)
            .map(|_| random_polynomial(rng, &config))
            .collect::<Result<Vec<_>>>()?;
        blocks.push(InstanceBlock {
            length,
            num_vars,
            polynomials,
        });
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_monomial_count() {
        assert_eq!(monomial_count(3, 3), 7);
        assert_eq!(monomial_count(4, 2), 10);
        assert_eq!(monomial_count(2, 3), 3);
        assert_eq!(monomial_count(5, 0), 0);
    }

    #[test]
    fn test_exact_length_and_degree() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = GeneratorConfig {
            num_vars: 6,
            num_monomials: 20,
            max_degree: 2,
        };
        let poly = random_polynomial(&mut rng, &config).unwrap();
        assert_eq!(poly.len(), 20);
        assert_eq!(poly.num_vars(), 6);
        assert!(poly.monomials().all(|m| (1..=2).contains(&m.degree())));
    }

    #[test]
    fn test_exhaustive_request_terminates() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = GeneratorConfig {
            num_vars: 3,
            num_monomials: 7,
            max_degree: 3,
        };
        assert_eq!(random_polynomial(&mut rng, &config).unwrap().len(), 7);
    }

    #[test]
    fn test_impossible_request_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = GeneratorConfig {
            num_vars: 3,
            num_monomials: 8,
            max_degree: 3,
        };
        assert!(matches!(
            random_polynomial(&mut rng, &config),
            Err(GapError::Config(_))
        ));
    }

    #[test]
    fn test_same_seed_same_polynomial() {
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            random_polynomial_bounded(&mut rng, 12, 20, 3).unwrap()
        };
        assert_eq!(draw(42), draw(42));
    }

    #[test]
    fn test_bounded_respects_limits() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let poly = random_polynomial_bounded(&mut rng, 5, 8, 3).unwrap();
            assert!((1..=5).contains(&poly.num_vars()));
            assert!(poly.len() < 8);
            assert!(poly.degree() <= 3);
        }
    }

    #[test]
    fn test_instance_suite_shape() {
        let mut rng = StdRng::seed_from_u64(9);
        let blocks = instance_suite(&mut rng, 2..=6, 3).unwrap();
        assert_eq!(blocks.len(), 5);
        for block in &blocks {
            assert_eq!(block.length, block.num_vars);
            assert_eq!(block.polynomials.len(), 3);
            assert!(block.polynomials.iter().all(|p| p.len() == block.length));
        }
    }
}
