//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::generate`] which runs everything in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use isoline_pipeline::{CancelToken, ContourConfig, Pipeline, PipelineError};
//! # fn run() -> Result<(), PipelineError> {
//! let config = ContourConfig {
//!     width: 64,
//!     height: 64,
//!     border_margin: 0,
//!     ..ContourConfig::default()
//! };
//! let sampled = Pipeline::new(config, |x: f64, y: f64| (x * 7.0).sin() * (y * 5.0).cos())
//!     .sample_field(&CancelToken::new())?;
//! let field_stats = sampled.field_stats();
//! let result = sampled.trace().into_result();
//! # let _ = (field_stats, result);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages). The sampled field is dropped once
//! tracing finishes; only the segments survive into the result.

use tracing::debug;

use crate::contour::{CellRegion, TraceStats};
use crate::field::{CancelToken, FieldStats, SampleOutcome, ScalarField};
use crate::fractal::FractalSampler;
use crate::noise::NoiseSource;
use crate::types::{
    ContourConfig, ContourResult, Dimensions, GenerationStatus, PipelineError, Segment,
};

/// Entry point for staged execution.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline for `config` over the noise primitive `noise`.
    pub const fn new<N: NoiseSource>(config: ContourConfig, noise: N) -> Pending<N> {
        Pending { config, noise }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any sampling has occurred.
///
/// Call [`sample_field`](Self::sample_field) to advance.
#[must_use = "pipeline stages are consumed by advancing — call .sample_field() to continue"]
pub struct Pending<N> {
    config: ContourConfig,
    noise: N,
}

impl<N: NoiseSource> Pending<N> {
    /// The configuration this pipeline will run with.
    #[must_use]
    pub const fn config(&self) -> &ContourConfig {
        &self.config
    }

    /// Validate the config and sample the fractal field.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the configuration is
    /// out of range. Cancellation is not an error: it yields a
    /// [`Sampled`] stage with no field.
    pub fn sample_field(self, cancel: &CancelToken) -> Result<Sampled, PipelineError> {
        self.config.validate()?;
        let sampler = FractalSampler::new(
            self.noise,
            self.config.octaves,
            self.config.persistence,
            self.config.scale,
        )?;

        let field = match ScalarField::sample(&sampler, self.config.dimensions(), cancel) {
            SampleOutcome::Complete(field) => Some(field),
            SampleOutcome::Cancelled => None,
        };
        debug!(
            width = self.config.width,
            height = self.config.height,
            octaves = self.config.octaves,
            cancelled = field.is_none(),
            "sampled field"
        );

        Ok(Sampled {
            config: self.config,
            field,
        })
    }
}

// ───────────────────────── Stage 1: Sampled ──────────────────────────

/// Pipeline state after field sampling.
///
/// Holds the fully materialized field, or nothing if sampling was
/// cancelled. Call [`trace`](Self::trace) to advance.
#[must_use = "pipeline stages are consumed by advancing — call .trace() to continue"]
pub struct Sampled {
    config: ContourConfig,
    field: Option<ScalarField>,
}

impl Sampled {
    /// The sampled field, or `None` if sampling was cancelled.
    #[must_use]
    pub const fn field(&self) -> Option<&ScalarField> {
        self.field.as_ref()
    }

    /// Returns `true` if sampling was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.field.is_none()
    }

    /// Summary statistics of the field, if it was sampled.
    #[must_use]
    pub fn field_stats(&self) -> Option<FieldStats> {
        self.field.as_ref().map(ScalarField::stats)
    }

    /// Trace the threshold contour inside the configured border margin.
    ///
    /// A cancelled stage traces nothing and carries the cancelled status
    /// forward.
    pub fn trace(self) -> Traced {
        let dimensions = self.config.dimensions();
        let Some(field) = self.field else {
            return Traced {
                config: self.config,
                dimensions,
                segments: Vec::new(),
                stats: TraceStats::default(),
                status: GenerationStatus::Cancelled,
            };
        };

        let region = CellRegion::with_margin(dimensions, self.config.border_margin);
        let (segments, stats) = crate::contour::trace_with_stats(
            &field,
            self.config.threshold,
            &region,
            &self.config.edge_resolver,
        );

        Traced {
            config: self.config,
            dimensions,
            segments,
            stats,
            status: GenerationStatus::Complete,
        }
    }
}

// ───────────────────────── Stage 2: Traced ───────────────────────────

/// Pipeline state after contour tracing. Terminal.
#[must_use = "call .into_result() to obtain the traced segments"]
pub struct Traced {
    config: ContourConfig,
    dimensions: Dimensions,
    segments: Vec<Segment>,
    stats: TraceStats,
    status: GenerationStatus,
}

impl Traced {
    /// The traced segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Counts gathered while tracing.
    #[must_use]
    pub const fn stats(&self) -> TraceStats {
        self.stats
    }

    /// Whether the run completed or was cancelled.
    #[must_use]
    pub const fn status(&self) -> GenerationStatus {
        self.status
    }

    /// Consume the stage and return the final result.
    #[must_use]
    pub fn into_result(self) -> ContourResult {
        ContourResult {
            segments: self.segments,
            dimensions: self.dimensions,
            threshold: self.config.threshold,
            status: self.status,
        }
    }
}
