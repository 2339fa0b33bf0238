//! The Monte Carlo sampling kernel.
//!
//! A trial draws a point uniformly from the unit square `[0, 1) x [0, 1)` and
//! counts as a *hit* when it lands inside the quarter circle of radius one
//! centred at the origin. The fraction of hits approaches `π / 4`.
//!
//! The kernel never touches ambient random state. Callers pass the generator
//! explicitly, either directly to [`sample`] or through a [`Sampler`] that owns
//! one. Concurrent callers must each own their generator.

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Runs `n` trials against `rng` and returns how many landed inside the
/// quarter circle. The result is always in `0..=n`.
pub fn sample<R>(rng: &mut R, n: u64) -> u64
where
    R: Rng + ?Sized,
{
    let mut hits = 0;
    for _ in 0..n {
        let x: f64 = rng.random();
        let y: f64 = rng.random();
        if x * x + y * y <= 1.0 {
            hits += 1;
        }
    }
    hits
}

/// Derives the seed of stream `index` under the base `seed`.
///
/// Both halves go through a SplitMix64 finalizer, so stream `k` of base `s`
/// and stream `0` of base `s + k` start from unrelated seeds.
pub const fn stream_seed(seed: u64, index: u64) -> u64 {
    splitmix64(splitmix64(seed) ^ index)
}

const fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A sampling kernel bound to its own random generator.
///
/// A `Sampler` is meant to be owned by exactly one thread of execution (a
/// worker thread, a single call). It is `Send` so it can be moved onto the
/// thread that will use it, but it is never shared.
#[derive(Clone, Debug)]
pub struct Sampler<R = SmallRng> {
    rng: R,
}

impl Sampler<SmallRng> {
    /// Creates a sampler with a deterministic stream. Two samplers built from
    /// the same seed produce identical hit counts for identical requests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Creates the sampler for stream `index` of the base `seed`. Workers,
    /// calls and sampler threads sharing one base each take their own index.
    pub fn stream(seed: u64, index: u64) -> Self {
        Self::seeded(stream_seed(seed, index))
    }

    /// Creates a sampler whose generator is seeded from the calling thread's
    /// entropy source, independent of every other sampler.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_rng(&mut rand::rng()),
        }
    }
}

impl<R> Sampler<R>
where
    R: Rng,
{
    /// Wraps an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Runs `n` trials and returns the hit count.
    pub fn sample(&mut self, n: u64) -> u64 {
        sample(&mut self.rng, n)
    }
}
