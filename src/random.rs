//! Seeded generator construction.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates a generator from `seed`, or from fresh entropy when `None`.
pub fn create_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random))
}

/// Uniform sample in `[low, high]`. Degenerate ranges return `low`.
pub fn uniform<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high <= low {
        return low;
    }
    low + rng.random::<f64>() * (high - low)
}
