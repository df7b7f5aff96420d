//! Random basis-state pairs for gap sweeps.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use crate::error::{SimError, SimResult};

/// Draw `count` distinct ordered pairs `(a, b)` with `a != b` from `0..dimension`.
///
/// Pairs are drawn uniformly by rejection; the sequence depends only on
/// `seed`.
pub fn sample_state_pairs(dimension: usize, count: usize, seed: u64) -> SimResult<Vec<(usize, usize)>> {
    let available = dimension.saturating_mul(dimension.saturating_sub(1));
    if count > available {
        return Err(SimError::TooManyPairs {
            requested: count,
            available,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(count);
    let mut pairs = Vec::with_capacity(count);

    while pairs.len() < count {
        let a = rng.gen_range(0..dimension);
        let mut b = rng.gen_range(0..dimension);
        while b == a {
            b = rng.gen_range(0..dimension);
        }
        if seen.insert((a, b)) {
            pairs.push((a, b));
        }
    }

    Ok(pairs)
}
