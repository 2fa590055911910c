//! Fractal (multi-octave) sampling over a single-octave noise primitive.
//!
//! Each octave doubles the frequency and scales the amplitude by the
//! persistence. The weighted sum is divided by the total amplitude so the
//! output stays inside the primitive's own range no matter how many
//! octaves are layered.

use crate::noise::NoiseSource;
use crate::types::{PipelineError, validate_fractal};

/// Layered noise evaluator.
///
/// Construction validates the parameters, so [`sample`](Self::sample)
/// never divides by a zero amplitude sum.
#[derive(Debug, Clone)]
pub struct FractalSampler<N> {
    noise: N,
    octaves: u32,
    persistence: f64,
    base_scale: f64,
    amplitude_sum: f64,
}

impl<N: NoiseSource> FractalSampler<N> {
    /// Create a sampler over `noise`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `octaves` is zero,
    /// `persistence` is not in `(0, 1]`, or `base_scale` is not a finite
    /// positive number.
    pub fn new(
        noise: N,
        octaves: u32,
        persistence: f64,
        base_scale: f64,
    ) -> Result<Self, PipelineError> {
        validate_fractal(octaves, persistence, base_scale)?;

        let mut amplitude_sum = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..octaves {
            amplitude_sum += amplitude;
            amplitude *= persistence;
        }

        Ok(Self {
            noise,
            octaves,
            persistence,
            base_scale,
            amplitude_sum,
        })
    }

    /// Evaluate the normalized fractal sum at `(x, y)`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.base_scale;
        let mut amplitude = 1.0;

        for _ in 0..self.octaves {
            total += self.noise.noise(x * frequency, y * frequency) * amplitude;
            amplitude *= self.persistence;
            frequency *= 2.0;
        }

        total / self.amplitude_sum
    }

    /// Number of octaves summed per sample.
    #[must_use]
    pub const fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Amplitude ratio between consecutive octaves.
    #[must_use]
    pub const fn persistence(&self) -> f64 {
        self.persistence
    }

    /// Frequency of the first octave.
    #[must_use]
    pub const fn base_scale(&self) -> f64 {
        self.base_scale
    }

    /// The underlying noise primitive.
    #[must_use]
    pub const fn noise(&self) -> &N {
        &self.noise
    }
}
