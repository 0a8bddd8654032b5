//! In-place gate kernels over real amplitude vectors.
//!
//! Every gate of the IQP gate set (H, Z, CZ, CCZ, CCX) has real matrix
//! entries, so amplitudes and density-matrix entries stay real and a plain
//! `f64` buffer suffices.  Bit `q` of an index is the basis value of qubit `q`.

use crate::Gate;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use std::f64::consts::FRAC_1_SQRT_2;

/// Buffer length from which kernels run on the rayon pool.
const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Chunk length used by kernels that have no natural pairing structure.
const FLAT_BLOCK: usize = 1 << 12;

fn for_each_block<F>(data: &mut [f64], block: usize, f: F)
where
    F: Fn(usize, &mut [f64]) + Send + Sync,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if data.len() >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1 {
            data.par_chunks_mut(block)
                .enumerate()
                .for_each(|(index, chunk)| f(index, chunk));
            return;
        }
    }
    data.chunks_mut(block)
        .enumerate()
        .for_each(|(index, chunk)| f(index, chunk));
}

/// Hadamard butterfly on `qubit`.
pub(crate) fn hadamard(data: &mut [f64], qubit: usize) {
    let half = 1usize << qubit;
    for_each_block(data, half << 1, |_, chunk| {
        let (lo, hi) = chunk.split_at_mut(half);
        for (a, b) in lo.iter_mut().zip(hi.iter_mut()) {
            let (x, y) = (*a, *b);
            *a = (x + y) * FRAC_1_SQRT_2;
            *b = (x - y) * FRAC_1_SQRT_2;
        }
    });
}

/// Negates every entry whose index contains all bits of `mask`.
pub(crate) fn phase_flip(data: &mut [f64], mask: usize) {
    let block = FLAT_BLOCK.min(data.len());
    for_each_block(data, block, |index, chunk| {
        let base = index * block;
        for (offset, value) in chunk.iter_mut().enumerate() {
            if (base + offset) & mask == mask {
                *value = -*value;
            }
        }
    });
}

/// Swaps the `target = 0` and `target = 1` entries wherever all `controls` bits are set.
pub(crate) fn controlled_flip(data: &mut [f64], controls: usize, target: usize) {
    let half = 1usize << target;
    for_each_block(data, half << 1, |index, chunk| {
        let base = index * (half << 1);
        let (lo, hi) = chunk.split_at_mut(half);
        for (offset, (a, b)) in lo.iter_mut().zip(hi.iter_mut()).enumerate() {
            if (base + offset) & controls == controls {
                std::mem::swap(a, b);
            }
        }
    });
}

/// Applies `gate` to the qubits of `data` shifted up by `offset`.
///
/// A non-zero offset addresses the row half of a vectorized density matrix.
pub(crate) fn apply_gate(data: &mut [f64], gate: &Gate, offset: usize) {
    let bit = |q: usize| 1usize << (q + offset);
    match *gate {
        Gate::Hadamard(q) => hadamard(data, q + offset),
        Gate::Z(q) => phase_flip(data, bit(q)),
        Gate::Cz(a, b) => phase_flip(data, bit(a) | bit(b)),
        Gate::Ccz(a, b, c) => phase_flip(data, bit(a) | bit(b) | bit(c)),
        Gate::Toffoli {
            controls: (a, b),
            target,
        } => controlled_flip(data, bit(a) | bit(b), target + offset),
    }
}
