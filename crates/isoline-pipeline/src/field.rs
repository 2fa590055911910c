//! Scalar field construction.
//!
//! A [`ScalarField`] holds one fractal-noise sample per grid point. It is
//! built once per generation request, fully materialized before any
//! contour tracing reads it, and never mutated afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::fractal::FractalSampler;
use crate::noise::NoiseSource;
use crate::types::{Dimensions, PipelineError};

/// Grid cells per unit of noise space.
///
/// Grid point `(i, j)` is sampled at `(i / 100, j / 100)`, which decouples
/// the sample resolution from the size of noise features.
pub const COORDINATE_DIVISOR: f64 = 100.0;

/// Shared cancellation flag for a generation request.
///
/// Cloning yields a handle to the same flag, so one clone can be handed
/// to another thread and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of sampling a field under a [`CancelToken`].
#[derive(Debug, Clone)]
pub enum SampleOutcome {
    /// Every sample was computed.
    Complete(ScalarField),
    /// Cancellation was observed between rows; the partial field is dropped.
    Cancelled,
}

/// Summary statistics over all samples of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
    /// Arithmetic mean of all samples.
    pub mean: f64,
}

/// A 2D grid of scalar samples, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    dimensions: Dimensions,
    values: Vec<f64>,
}

impl ScalarField {
    /// Sample `sampler` at every grid point of `dimensions`.
    ///
    /// Rows are evaluated in parallel. `cancel` is checked once per row;
    /// if it fires, the work already done is discarded and
    /// [`SampleOutcome::Cancelled`] is returned.
    ///
    /// `dimensions` must already be bounded by
    /// [`ContourConfig::validate`](crate::ContourConfig::validate).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sample<N: NoiseSource>(
        sampler: &FractalSampler<N>,
        dimensions: Dimensions,
        cancel: &CancelToken,
    ) -> SampleOutcome {
        let width = dimensions.width as usize;
        let height = dimensions.height as usize;
        let mut values = vec![0.0; width * height];

        if width > 0 {
            values
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(j, row)| {
                    if cancel.is_cancelled() {
                        return;
                    }
                    let y = j as f64 / COORDINATE_DIVISOR;
                    for (i, value) in row.iter_mut().enumerate() {
                        let x = i as f64 / COORDINATE_DIVISOR;
                        *value = sampler.sample(x, y);
                    }
                });
        }

        if cancel.is_cancelled() {
            return SampleOutcome::Cancelled;
        }

        SampleOutcome::Complete(Self { dimensions, values })
    }

    /// Build a field by evaluating `f(x, y)` at every grid point.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, f: impl Fn(usize, usize) -> f64) -> Self {
        let w = width as usize;
        let h = height as usize;
        let mut values = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                values.push(f(x, y));
            }
        }
        Self {
            dimensions: Dimensions { width, height },
            values,
        }
    }

    /// Build a field from column-major data: `columns[x][y]`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the columns have
    /// different lengths or the grid is too large to address.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, PipelineError> {
        let height = columns.first().map_or(0, Vec::len);
        if let Some((x, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != height) {
            return Err(PipelineError::InvalidConfig(format!(
                "column {x} has {} samples, expected {height}",
                col.len(),
            )));
        }
        let width = u32::try_from(columns.len())
            .map_err(|_| PipelineError::InvalidConfig("field too wide".to_string()))?;
        let height_u32 = u32::try_from(height)
            .map_err(|_| PipelineError::InvalidConfig("field too tall".to_string()))?;

        Ok(Self::from_fn(width, height_u32, |x, y| columns[x][y]))
    }

    /// Field dimensions in samples.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Width in samples.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.dimensions.width as usize
    }

    /// Height in samples.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.dimensions.height as usize
    }

    /// Sample at `(x, y)`, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.values.get(y * self.width() + x).copied()
    }

    /// All samples in row-major order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Minimum, maximum and mean over all samples.
    ///
    /// An empty field reports zeros.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> FieldStats {
        if self.values.is_empty() {
            return FieldStats {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        let (min, max, sum) = self.values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );
        FieldStats {
            min,
            max,
            mean: sum / self.values.len() as f64,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn complete(outcome: SampleOutcome) -> ScalarField {
        match outcome {
            SampleOutcome::Complete(field) => field,
            SampleOutcome::Cancelled => panic!("sampling was unexpectedly cancelled"),
        }
    }

    #[test]
    fn sample_compresses_coordinates() {
        let sampler = FractalSampler::new(|x: f64, y: f64| x + 10.0 * y, 1, 0.5, 1.0).unwrap();
        let dims = Dimensions {
            width: 5,
            height: 3,
        };
        let field = complete(ScalarField::sample(&sampler, dims, &CancelToken::new()));
        assert_eq!(field.dimensions(), dims);
        assert_eq!(field.values().len(), 15);
        for y in 0..3 {
            for x in 0..5 {
                let expected = (x as f64) / 100.0 + 10.0 * (y as f64) / 100.0;
                assert_relative_eq!(field.get(x, y).unwrap(), expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn sample_matches_sequential_evaluation() {
        let sampler =
            FractalSampler::new(crate::noise::SimplexNoise::new(3), 4, 0.5, 2.0).unwrap();
        let dims = Dimensions {
            width: 40,
            height: 30,
        };
        let field = complete(ScalarField::sample(&sampler, dims, &CancelToken::new()));
        for y in 0..30_u32 {
            for x in 0..40_u32 {
                let expected = sampler.sample(f64::from(x) / 100.0, f64::from(y) / 100.0);
                let actual = field.get(x as usize, y as usize).unwrap();
                assert!((expected - actual).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn cancelled_token_aborts_sampling() {
        let sampler = FractalSampler::new(|x: f64, _y: f64| x, 1, 0.5, 1.0).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = ScalarField::sample(
            &sampler,
            Dimensions {
                width: 8,
                height: 8,
            },
            &cancel,
        );
        assert!(matches!(outcome, SampleOutcome::Cancelled));
    }

    #[test]
    fn cancellation_mid_build_skips_remaining_rows() {
        use std::sync::atomic::AtomicUsize;

        let cancel = CancelToken::new();
        let evaluations = AtomicUsize::new(0);
        let noise = |x: f64, _y: f64| {
            if evaluations.fetch_add(1, Ordering::Relaxed) == 100 {
                cancel.cancel();
            }
            x
        };
        let sampler = FractalSampler::new(noise, 1, 0.5, 1.0).unwrap();
        let dims = Dimensions {
            width: 16,
            height: 4096,
        };

        let outcome = ScalarField::sample(&sampler, dims, &cancel);
        assert!(matches!(outcome, SampleOutcome::Cancelled));
        let total = usize::try_from(dims.sample_count()).unwrap();
        assert!(evaluations.load(Ordering::Relaxed) < total);
    }

    #[test]
    fn cancel_token_clones_share_state() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn from_columns_indexes_x_then_y() {
        let field = ScalarField::from_columns(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(field.width(), 2);
        assert_eq!(field.height(), 3);
        assert_eq!(field.get(0, 2), Some(3.0));
        assert_eq!(field.get(1, 0), Some(4.0));
        assert_eq!(field.get(2, 0), None);
        assert_eq!(field.get(0, 3), None);
    }

    #[test]
    fn from_columns_rejects_ragged_input() {
        let result = ScalarField::from_columns(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn stats_summarize_samples() {
        let field = ScalarField::from_fn(2, 2, |x, y| (x + 2 * y) as f64);
        let stats = field.stats();
        assert_relative_eq!(stats.min, 0.0);
        assert_relative_eq!(stats.max, 3.0);
        assert_relative_eq!(stats.mean, 1.5);
    }

    #[test]
    fn stats_of_empty_field_are_zero() {
        let field = ScalarField::from_fn(0, 0, |_, _| 1.0);
        let stats = field.stats();
        assert_relative_eq!(stats.min, 0.0);
        assert_relative_eq!(stats.max, 0.0);
    }
}
