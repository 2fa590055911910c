//! Shared types for the isoline contour pipeline.

use serde::{Deserialize, Serialize};

use crate::contour::EdgeResolverKind;

/// A 2D point in grid coordinates.
///
/// Grid coordinates are not scaled to any physical canvas: one unit is
/// the spacing between two adjacent field samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (samples from the left edge).
    pub x: f64,
    /// Vertical position (samples from the top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// One piece of a traced contour, local to a single grid cell.
///
/// Segments from different cells are independent: no adjacency or
/// ordering between them is implied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First endpoint.
    pub p1: Point,
    /// Second endpoint.
    pub p2: Point,
}

impl Segment {
    /// Create a new segment.
    #[must_use]
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }

    /// Both endpoints, in emission order.
    #[must_use]
    pub const fn points(&self) -> [Point; 2] {
        [self.p1, self.p2]
    }
}

/// Grid dimensions in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of samples along x.
    pub width: u32,
    /// Number of samples along y.
    pub height: u32,
}

impl Dimensions {
    /// Total number of samples (`width * height`).
    #[must_use]
    pub const fn sample_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Configuration for one contour generation request.
///
/// Every tunable is carried here; nothing in the pipeline reads global
/// state. Construct with struct-update syntax over [`Default`] and call
/// [`validate`](Self::validate) (the pipeline entry points do this for
/// you).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Field width in samples. Must be at least 2 for any cell to exist.
    pub width: u32,

    /// Field height in samples. Must be at least 2 for any cell to exist.
    pub height: u32,

    /// Number of noise layers summed by the fractal sampler.
    pub octaves: u32,

    /// Amplitude multiplier between consecutive octaves, in `(0, 1]`.
    pub persistence: f64,

    /// Frequency of the first octave. Each later octave doubles it.
    pub scale: f64,

    /// Iso-level to trace. Samples strictly below it count as "below".
    pub threshold: f64,

    /// Cells closer than this to the top/left edge are not traced.
    pub border_margin: u32,

    /// How named cell edges are turned into points.
    pub edge_resolver: EdgeResolverKind,
}

impl ContourConfig {
    /// Default field width.
    pub const DEFAULT_WIDTH: u32 = 1200;
    /// Default field height.
    pub const DEFAULT_HEIGHT: u32 = 1600;
    /// Default octave count.
    pub const DEFAULT_OCTAVES: u32 = 4;
    /// Default persistence.
    pub const DEFAULT_PERSISTENCE: f64 = 0.5;
    /// Default base frequency.
    pub const DEFAULT_SCALE: f64 = 1.0;
    /// Default iso-level.
    pub const DEFAULT_THRESHOLD: f64 = 0.0;
    /// Default border margin in cells.
    pub const DEFAULT_BORDER_MARGIN: u32 = 80;
    /// Largest field, in samples, whose buffer can be addressed.
    pub const MAX_SAMPLE_COUNT: u64 =
        (isize::MAX.unsigned_abs() / std::mem::size_of::<f64>()) as u64;

    /// Field dimensions described by this config.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Check every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first field
    /// that is out of range. `octaves == 0` is rejected here because the
    /// fractal sampler would otherwise divide by a zero amplitude sum.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.width < 2 || self.height < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "field must be at least 2x2 samples, got {}x{}",
                self.width, self.height,
            )));
        }
        let samples = self.dimensions().sample_count();
        if samples > Self::MAX_SAMPLE_COUNT {
            return Err(PipelineError::InvalidConfig(format!(
                "field of {}x{} samples is too large to allocate",
                self.width, self.height,
            )));
        }
        validate_fractal(self.octaves, self.persistence, self.scale)?;
        if !self.threshold.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold,
            )));
        }
        Ok(())
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            octaves: Self::DEFAULT_OCTAVES,
            persistence: Self::DEFAULT_PERSISTENCE,
            scale: Self::DEFAULT_SCALE,
            threshold: Self::DEFAULT_THRESHOLD,
            border_margin: Self::DEFAULT_BORDER_MARGIN,
            edge_resolver: EdgeResolverKind::default(),
        }
    }
}

/// Validate the fractal sampler parameters.
///
/// Shared by [`ContourConfig::validate`] and
/// [`FractalSampler::new`](crate::fractal::FractalSampler::new).
pub(crate) fn validate_fractal(
    octaves: u32,
    persistence: f64,
    scale: f64,
) -> Result<(), PipelineError> {
    if octaves == 0 {
        return Err(PipelineError::InvalidConfig(
            "octaves must be at least 1".to_string(),
        ));
    }
    if !persistence.is_finite() || persistence <= 0.0 || persistence > 1.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "persistence must be in (0, 1], got {persistence}",
        )));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PipelineError::InvalidConfig(format!(
            "scale must be finite and positive, got {scale}",
        )));
    }
    Ok(())
}

/// Whether a generation request ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenerationStatus {
    /// The field was fully sampled and traced.
    #[default]
    Complete,
    /// A [`CancelToken`](crate::field::CancelToken) fired during field
    /// sampling; no segments were produced.
    Cancelled,
}

/// Result of one contour generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourResult {
    /// Traced segments in cell iteration order (x outer, y inner).
    pub segments: Vec<Segment>,

    /// Dimensions of the sampled field.
    pub dimensions: Dimensions,

    /// The iso-level that was traced.
    pub threshold: f64,

    /// Whether the run completed or was cancelled.
    pub status: GenerationStatus,
}

impl ContourResult {
    /// An empty result marking a cancelled run.
    #[must_use]
    pub const fn cancelled(dimensions: Dimensions, threshold: f64) -> Self {
        Self {
            segments: Vec::new(),
            dimensions,
            threshold,
            status: GenerationStatus::Cancelled,
        }
    }

    /// Returns `true` if the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status == GenerationStatus::Cancelled
    }
}

/// Errors that can occur during contour generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Configuration is out of range.
    #[error("invalid contour configuration: {0}")]
    InvalidConfig(String),

    /// A marching-squares case index outside `0..=15`.
    #[error("invalid marching-squares case index {0} (expected 0..=15)")]
    InvalidCase(u8),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn segment_length_and_points() {
        let s = Segment::new(Point::new(1.0, 1.0), Point::new(1.0, 3.5));
        assert!((s.length() - 2.5).abs() < f64::EPSILON);
        assert_eq!(s.points(), [Point::new(1.0, 1.0), Point::new(1.0, 3.5)]);
    }

    #[test]
    fn dimensions_sample_count() {
        let d = Dimensions {
            width: 1200,
            height: 1600,
        };
        assert_eq!(d.sample_count(), 1_920_000);
    }

    // --- ContourConfig tests ---

    #[test]
    fn config_defaults() {
        let config = ContourConfig::default();
        assert_eq!(config.width, 1200);
        assert_eq!(config.height, 1600);
        assert_eq!(config.octaves, 4);
        assert!((config.persistence - 0.5).abs() < f64::EPSILON);
        assert!((config.scale - 1.0).abs() < f64::EPSILON);
        assert!(config.threshold.abs() < f64::EPSILON);
        assert_eq!(config.border_margin, 80);
        assert_eq!(config.edge_resolver, EdgeResolverKind::Midpoint);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_unaddressable_field() {
        let config = ContourConfig {
            width: u32::MAX,
            height: u32::MAX,
            ..ContourConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(ref msg)) if msg.contains("too large")
        ));
        let result = crate::generate(&config, |_x: f64, _y: f64| 0.0);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn config_rejects_zero_octaves() {
        let config = ContourConfig {
            octaves: 0,
            ..ContourConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(ref msg)) if msg.contains("octaves")
        ));
    }

    #[test]
    fn config_rejects_bad_persistence() {
        for persistence in [0.0, -0.5, 1.5, f64::NAN] {
            let config = ContourConfig {
                persistence,
                ..ContourConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(PipelineError::InvalidConfig(_))),
                "persistence {persistence} should be rejected",
            );
        }
    }

    #[test]
    fn config_accepts_persistence_of_one() {
        let config = ContourConfig {
            persistence: 1.0,
            ..ContourConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_bad_scale() {
        for scale in [0.0, -1.0, f64::INFINITY] {
            let config = ContourConfig {
                scale,
                ..ContourConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PipelineError::InvalidConfig(ref msg)) if msg.contains("scale")
            ));
        }
    }

    #[test]
    fn config_rejects_non_finite_threshold() {
        let config = ContourConfig {
            threshold: f64::NAN,
            ..ContourConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(ref msg)) if msg.contains("threshold")
        ));
    }

    #[test]
    fn config_rejects_degenerate_grid() {
        let config = ContourConfig {
            width: 1,
            ..ContourConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_serde_fills_missing_fields_with_defaults() {
        let config: ContourConfig = serde_json::from_str(r#"{"octaves": 6}"#).unwrap();
        assert_eq!(config.octaves, 6);
        assert_eq!(config.width, ContourConfig::DEFAULT_WIDTH);
        assert_eq!(config.border_margin, ContourConfig::DEFAULT_BORDER_MARGIN);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_display() {
        let err = PipelineError::InvalidConfig("octaves must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "invalid contour configuration: octaves must be at least 1",
        );
        assert_eq!(
            PipelineError::InvalidCase(16).to_string(),
            "invalid marching-squares case index 16 (expected 0..=15)",
        );
    }

    #[test]
    fn cancelled_result_is_empty() {
        let dims = Dimensions {
            width: 4,
            height: 4,
        };
        let result = ContourResult::cancelled(dims, 0.25);
        assert!(result.is_cancelled());
        assert!(result.segments.is_empty());
        assert_eq!(result.dimensions, dims);
    }
}
