//! Random number generators.
//!
//! Thin wrappers around the `rand_mt` Mersenne Twister used by the Monte
//! Carlo kernel.  Every option gets its own generator seeded from the
//! option's position in the portfolio, so a price never depends on which
//! device simulated it.

use mcm_core::Real;
use rand_mt::Mt19937GenRand64;

/// A uniform pseudo-random number generator based on MT19937-64.
pub struct MersenneTwisterUniformRng {
    rng: Mt19937GenRand64,
}

impl MersenneTwisterUniformRng {
    /// Create a new generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mt19937GenRand64::new(seed),
        }
    }

    /// Generate the next uniform deviate in `[0, 1)`.
    pub fn next_real(&mut self) -> Real {
        let u: u64 = self.rng.next_u64();
        u as f64 / (u64::MAX as f64 + 1.0)
    }
}

/// A standard-normal generator: uniform Mersenne Twister deviates pushed
/// through the inverse normal CDF.
pub struct InverseCumulativeNormalRng {
    inner: MersenneTwisterUniformRng,
}

impl InverseCumulativeNormalRng {
    /// Create a new generator backed by a Mersenne Twister with the given
    /// seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: MersenneTwisterUniformRng::new(seed),
        }
    }

    /// Generate the next standard-normal deviate.
    pub fn next_real(&mut self) -> Real {
        // exact 0 would map to -inf
        let u = loop {
            let u = self.inner.next_real();
            if u > 0.0 && u < 1.0 {
                break u;
            }
        };
        crate::distributions::normal::acklam_inverse(u)
    }
}

/// Derive an independent stream seed for `index` from a base seed.
///
/// SplitMix64 finaliser: neighbouring indices give uncorrelated seeds.
pub fn stream_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
