//! Brute-force gap oracle.
//!
//! The gap of `p` is `#{x : p(x) = 0} − #{x : p(x) = 1}`, i.e. the sum of
//! `(−1)^{p(x)}` over the Boolean hypercube.  The oracle enumerates every
//! packed assignment, so its cost is `Θ(2^N · |p|)`; it is the ground truth
//! against which circuit-based estimates are checked and is only practical
//! for small `N`.

use crate::Polynomial;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use tracing::instrument;

/// Hypercube size from which enumeration is split across the rayon pool.
const PARALLEL_THRESHOLD: u64 = 1 << 16;

#[inline]
fn signed_value(poly: &Polynomial, bits: u64) -> i64 {
    if poly.evaluate_bits(bits) {
        -1
    } else {
        1
    }
}

/// Computes the gap of `poly` by evaluating it at all `2^N` assignments.
///
/// The result lies in `[-2^N, 2^N]` and has the parity of `2^N`.
#[instrument(skip_all, fields(num_vars = poly.num_vars(), monomials = poly.len()))]
pub fn gap(poly: &Polynomial) -> i64 {
    let size = 1u64 << poly.num_vars();
    let use_parallel = {
        #[cfg(not(target_arch = "wasm32"))]
        {
            size >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1
        }
        #[cfg(target_arch = "wasm32")]
        {
            false
        }
    };
    if use_parallel {
        #[cfg(not(target_arch = "wasm32"))]
        {
            return (0..size)
                .into_par_iter()
                .map(|bits| signed_value(poly, bits))
                .sum();
        }
    }
    (0..size).map(|bits| signed_value(poly, bits)).sum()
}

/// Probability of observing the all-zero outcome on the compiled circuit,
/// `(gap / 2^N)^2`.
pub fn zero_probability(poly: &Polynomial) -> f64 {
    probability_from_gap(gap(poly), poly.num_vars())
}

/// Converts a gap over `num_vars` variables into the zero-outcome probability.
pub fn probability_from_gap(gap: i64, num_vars: usize) -> f64 {
    let amplitude = gap as f64 / (num_vars as f64).exp2();
    amplitude * amplitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{random_polynomial, random_polynomial_bounded, GeneratorConfig};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scenario_a() -> Polynomial {
        Polynomial::new(3, [vec![0usize, 1, 2], vec![0, 2], vec![1, 2], vec![0]]).unwrap()
    }

    #[test]
    fn test_scenario_a_gap() {
        assert_eq!(gap(&scenario_a()), 2);
        assert!((zero_probability(&scenario_a()) - 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_scenario_b_gap() {
        let poly = Polynomial::new(4, [vec![0usize, 1], vec![0, 2], vec![1, 2], vec![0]]).unwrap();
        assert_eq!(gap(&poly), 8);
        assert!((zero_probability(&poly) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_polynomial_gap() {
        for n in 1..=10 {
            let poly = Polynomial::zero(n).unwrap();
            assert_eq!(gap(&poly), 1i64 << n);
            assert_eq!(zero_probability(&poly), 1.0);
        }
    }

    #[test]
    fn test_single_variable_is_balanced() {
        let poly = Polynomial::new(1, [vec![0usize]]).unwrap();
        assert_eq!(gap(&poly), 0);
        let cancelled = Polynomial::new(1, [vec![0usize], vec![0], vec![0], vec![0]]).unwrap();
        assert_eq!(gap(&cancelled), 2);
    }

    #[test]
    fn test_constant_flips_sign() {
        let base = Polynomial::new(2, [vec![0usize, 1]]).unwrap();
        let with_one = Polynomial::with_constant(
            2,
            base.monomials().copied().chain([crate::Monomial::one()]),
        )
        .unwrap();
        assert_eq!(gap(&with_one), -gap(&base));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = GeneratorConfig {
            num_vars: 17,
            num_monomials: 40,
            max_degree: 3,
        };
        let poly = random_polynomial(&mut rng, &config).unwrap();
        let serial: i64 = (0..1u64 << 17).map(|bits| signed_value(&poly, bits)).sum();
        assert_eq!(gap(&poly), serial);
    }

    proptest! {
        #[test]
        fn test_gap_parity_and_range(seed in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let poly = random_polynomial_bounded(&mut rng, 10, 16, 3).unwrap();
            let n = poly.num_vars();
            let g = gap(&poly);
            let bound = 1i64 << n;
            prop_assert!(-bound <= g && g <= bound);
            prop_assert_eq!(g.rem_euclid(2), bound.rem_euclid(2));
        }
    }
}
