//! isoline-pipeline: Fractal-noise contour generation (sans-IO).
//!
//! Produces line segments approximating a threshold contour of a
//! fractal-noise field through:
//! noise primitive -> fractal sampling -> scalar field ->
//! marching-squares case lookup -> segments.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! values and returns structured data. Timing, seeding from the command
//! line and file output live in `isoline-bench`.

pub mod cases;
pub mod contour;
pub mod diagnostics;
pub mod field;
pub mod fractal;
pub mod noise;
pub mod pipeline;
pub mod types;

use tracing::{info, warn};

pub use cases::{CaseEntry, CaseIndex, Edge};
pub use contour::{CellRegion, EdgeResolver, EdgeResolverKind, TraceStats};
pub use diagnostics::{Clock, PipelineDiagnostics};
pub use field::{CancelToken, FieldStats, ScalarField};
pub use fractal::FractalSampler;
pub use noise::{NoiseSource, SimplexNoise};
pub use pipeline::Pipeline;
pub use types::{
    ContourConfig, ContourResult, Dimensions, GenerationStatus, PipelineError, Point, Segment,
};

/// Generate the contour segments for `config` over `noise`.
///
/// Samples a `width x height` fractal field, then traces the
/// `config.threshold` contour over every cell at least
/// `config.border_margin` samples from the top and left edges.
///
/// # Pipeline steps
///
/// 1. Validate the configuration
/// 2. Sample the fractal field (parallel over rows)
/// 3. Trace marching-squares cells (parallel over columns, merged in order)
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the configuration is out
/// of range (for example zero octaves, which would make the fractal
/// normalization divide by zero).
pub fn generate<N: NoiseSource>(
    config: &ContourConfig,
    noise: N,
) -> Result<ContourResult, PipelineError> {
    generate_cancellable(config, noise, &CancelToken::new())
}

/// Like [`generate`], but abandons the run when `cancel` fires.
///
/// A cancelled run is not an error: it returns a [`ContourResult`] with
/// [`GenerationStatus::Cancelled`] and no segments.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the configuration is out
/// of range.
pub fn generate_cancellable<N: NoiseSource>(
    config: &ContourConfig,
    noise: N,
    cancel: &CancelToken,
) -> Result<ContourResult, PipelineError> {
    let result = Pipeline::new(config.clone(), noise)
        .sample_field(cancel)?
        .trace()
        .into_result();

    if result.is_cancelled() {
        warn!(
            width = config.width,
            height = config.height,
            "contour generation cancelled"
        );
    } else {
        info!(
            width = config.width,
            height = config.height,
            threshold = config.threshold,
            segments = result.segments.len(),
            "contour generation complete"
        );
    }

    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ContourConfig {
        ContourConfig {
            width: 200,
            height: 150,
            border_margin: 8,
            ..ContourConfig::default()
        }
    }

    #[test]
    fn generate_produces_segments() {
        let result = generate(&config(), SimplexNoise::new(42)).unwrap();
        assert_eq!(result.status, GenerationStatus::Complete);
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 200,
                height: 150
            }
        );
        assert!(!result.segments.is_empty());
    }

    #[test]
    fn zero_octaves_is_invalid() {
        let bad = ContourConfig {
            octaves: 0,
            ..config()
        };
        let result = generate(&bad, SimplexNoise::new(1));
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn cancelled_run_returns_empty_result() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = generate_cancellable(&config(), SimplexNoise::new(1), &cancel).unwrap();
        assert_eq!(result.status, GenerationStatus::Cancelled);
        assert!(result.segments.is_empty());
    }

    #[test]
    fn threshold_above_field_range_yields_nothing() {
        let high = ContourConfig {
            threshold: 5.0,
            ..config()
        };
        let result = generate(&high, SimplexNoise::new(9)).unwrap();
        assert!(result.segments.is_empty());
        assert!(!result.is_cancelled());
    }

    #[test]
    fn closure_noise_is_accepted() {
        let result = generate(&config(), |x: f64, y: f64| (x * 5.0).sin() - y).unwrap();
        assert!(!result.segments.is_empty());
    }
}
