//! Single-octave noise primitives.
//!
//! The pipeline treats the underlying gradient noise as an opaque,
//! deterministic function of two coordinates. [`NoiseSource`] is that
//! seam: [`SimplexNoise`] wraps OpenSimplex from the `noise` crate, and
//! any `Fn(f64, f64) -> f64` closure also qualifies, which keeps tests
//! free of real noise.

use ::noise::{NoiseFn, OpenSimplex};

/// A deterministic 2D noise function, nominally returning values in `[-1, 1]`.
///
/// Implementations must be pure after construction: the same input pair
/// always yields the same output. `Send + Sync` lets field sampling fan
/// out across threads.
pub trait NoiseSource: Send + Sync {
    /// Evaluate the noise at `(x, y)`.
    fn noise(&self, x: f64, y: f64) -> f64;
}

impl<F> NoiseSource for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn noise(&self, x: f64, y: f64) -> f64 {
        self(x, y)
    }
}

/// Seeded OpenSimplex noise.
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    seed: u32,
    inner: OpenSimplex,
}

impl SimplexNoise {
    /// Create a noise source with the given seed.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            inner: OpenSimplex::new(seed),
        }
    }

    /// Create a noise source with a fresh random seed.
    ///
    /// Every generation request is expected to use a new seed, so this is
    /// the usual constructor outside of tests and reproducible runs.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this source was built from.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }
}

impl NoiseSource for SimplexNoise {
    fn noise(&self, x: f64, y: f64) -> f64 {
        self.inner.get([x, y])
    }
}
