//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are intended for parameter experimentation. Calling
//! [`generate_with_diagnostics`] runs the staged [`Pipeline`] and collects
//! diagnostics alongside the result.
//!
//! Timestamps come from a caller-supplied [`Clock`], so this crate never
//! reads the system time itself. Duration measurements use
//! [`std::time::Duration`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::contour::TraceStats;
use crate::field::{CancelToken, FieldStats};
use crate::noise::NoiseSource;
use crate::pipeline::Pipeline;
use crate::types::{ContourConfig, ContourResult, PipelineError};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps.
///
/// Native callers wrap `std::time::Instant` (or `web_time::Instant`);
/// tests can supply a fake clock that advances deterministically.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Capture the current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `start`.
    fn elapsed(&self, start: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: fractal field sampling.
    pub field_sampling: StageDiagnostics,
    /// Stage 2: contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Field sampling metrics.
    FieldSampling {
        /// Field width in samples.
        width: u32,
        /// Field height in samples.
        height: u32,
        /// Total sample count (`width * height`).
        sample_count: u64,
        /// Octaves summed per sample.
        octaves: u32,
        /// Smallest sample value.
        min: f64,
        /// Largest sample value.
        max: f64,
        /// Mean sample value.
        mean: f64,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Threshold the field was traced at.
        threshold: f64,
        /// Cells examined.
        cells_visited: usize,
        /// Cells with at least one segment.
        crossing_cells: usize,
        /// Cells resolved as saddles.
        saddle_cells: usize,
        /// Segments emitted.
        segment_count: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Field width in samples.
    pub width: u32,
    /// Field height in samples.
    pub height: u32,
    /// Total sample count.
    pub sample_count: u64,
    /// Segments in the result.
    pub segment_count: usize,
    /// Total length of all segments, in grid units.
    pub total_length: f64,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Field: {}x{} ({} samples)",
            self.summary.width, self.summary.height, self.summary.sample_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Field Sampling", &self.field_sampling),
            ("Contour Tracing", &self.contour_tracing),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Segments: {}  |  Total length: {:.1}",
            self.summary.segment_count, self.summary.total_length,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::FieldSampling {
            width,
            height,
            octaves,
            min,
            max,
            mean,
            ..
        } => {
            format!("{width}x{height} octaves={octaves} range=[{min:.3}, {max:.3}] mean={mean:.3}")
        }
        StageMetrics::ContourTracing {
            threshold,
            cells_visited,
            crossing_cells,
            saddle_cells,
            segment_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *cells_visited > 0 {
                *crossing_cells as f64 / *cells_visited as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "t={threshold:.3} {crossing_cells}/{cells_visited} cells ({density:.1}%) saddles={saddle_cells} segments={segment_count}",
            )
        }
    }
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the configuration is out
/// of range.
pub fn generate_with_diagnostics<N: NoiseSource, C: Clock>(
    config: &ContourConfig,
    noise: N,
    clock: &C,
) -> Result<(ContourResult, PipelineDiagnostics), PipelineError> {
    let dims = config.dimensions();
    let pipeline_start = clock.now();

    let stage_start = clock.now();
    let sampled = Pipeline::new(config.clone(), noise).sample_field(&CancelToken::new())?;
    let field_stats = sampled.field_stats().unwrap_or(FieldStats {
        min: 0.0,
        max: 0.0,
        mean: 0.0,
    });
    let field_sampling = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::FieldSampling {
            width: dims.width,
            height: dims.height,
            sample_count: dims.sample_count(),
            octaves: config.octaves,
            min: field_stats.min,
            max: field_stats.max,
            mean: field_stats.mean,
        },
    };

    let stage_start = clock.now();
    let traced = sampled.trace();
    let stats: TraceStats = traced.stats();
    let contour_tracing = StageDiagnostics {
        duration: clock.elapsed(&stage_start),
        metrics: StageMetrics::ContourTracing {
            threshold: config.threshold,
            cells_visited: stats.cells_visited,
            crossing_cells: stats.crossing_cells,
            saddle_cells: stats.saddle_cells,
            segment_count: stats.segment_count,
        },
    };

    let result = traced.into_result();
    let total_duration = clock.elapsed(&pipeline_start);

    let diagnostics = PipelineDiagnostics {
        field_sampling,
        contour_tracing,
        total_duration,
        summary: PipelineSummary {
            width: dims.width,
            height: dims.height,
            sample_count: dims.sample_count(),
            segment_count: result.segments.len(),
            total_length: result.segments.iter().map(crate::types::Segment::length).sum(),
        },
    };

    Ok((result, diagnostics))
}
