//! Contour tracing: marching squares over a scalar field.
//!
//! This module defines the [`EdgeResolver`] trait for pluggable
//! edge-to-point resolution and the [`EdgeResolverKind`] enum for
//! selecting which resolver to use at runtime.
//!
//! # Strategy pattern
//!
//! The case table says *which* named edges a contour crosses; the
//! resolver says *where* on that edge the crossing lies. Keeping the two
//! apart means an interpolating resolver can be added as another
//! [`EdgeResolverKind`] variant without touching the case table or the
//! cell iteration.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cases::{Edge, case_index};
use crate::field::ScalarField;
use crate::types::{Dimensions, Point, Segment};

/// One marching-squares cell: its origin and four corner samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Column of the cell origin.
    pub x: usize,
    /// Row of the cell origin.
    pub y: usize,
    /// Corner samples `[(x, y), (x+1, y), (x+1, y+1), (x, y+1)]`.
    pub corners: [f64; 4],
}

impl Cell {
    /// Read the cell whose origin is `(x, y)`, or `None` if any corner
    /// falls outside the field.
    #[must_use]
    pub fn read(field: &ScalarField, x: usize, y: usize) -> Option<Self> {
        Some(Self {
            x,
            y,
            corners: [
                field.get(x, y)?,
                field.get(x + 1, y)?,
                field.get(x + 1, y + 1)?,
                field.get(x, y + 1)?,
            ],
        })
    }

    /// Mean of the four corners, used to resolve saddle cases.
    #[must_use]
    pub fn center_value(&self) -> f64 {
        self.corners.iter().sum::<f64>() / 4.0
    }
}

/// Selects how named edges become points.
///
/// Ships with [`Midpoint`](Self::Midpoint) only. A linearly
/// interpolating variant can be added without changing
/// [`ContourConfig`](crate::ContourConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeResolverKind {
    /// Fixed offsets from the cell origin, ignoring corner values.
    #[default]
    Midpoint,
}

/// Trait for edge-to-point resolution strategies.
pub trait EdgeResolver {
    /// Locate `edge` of `cell` in grid coordinates.
    fn resolve(&self, edge: Edge, cell: &Cell, threshold: f64) -> Point;
}

impl EdgeResolver for EdgeResolverKind {
    fn resolve(&self, edge: Edge, cell: &Cell, _threshold: f64) -> Point {
        match *self {
            Self::Midpoint => resolve_midpoint(edge, cell),
        }
    }
}

/// Fixed-offset edge positions relative to the cell origin.
#[allow(clippy::cast_precision_loss)]
fn resolve_midpoint(edge: Edge, cell: &Cell) -> Point {
    let x = cell.x as f64;
    let y = cell.y as f64;
    let (dx, dy) = match edge {
        Edge::Left => (0.0, 0.5),
        Edge::Right => (1.0, 0.5),
        Edge::Bottom => (0.5, 1.0),
        Edge::Top | Edge::TopRight => (0.5, -0.5),
        Edge::TopLeft => (-0.5, -0.5),
        Edge::BottomLeft => (-0.5, 0.5),
        Edge::BottomRight => (0.5, 0.5),
        Edge::Center => (0.0, 0.0),
    };
    Point::new(x + dx, y + dy)
}

/// Rectangle of cell origins to visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRegion {
    /// Columns of cell origins.
    pub x: Range<usize>,
    /// Rows of cell origins.
    pub y: Range<usize>,
}

impl CellRegion {
    /// Every cell of a field with the given dimensions.
    #[must_use]
    pub fn full(dimensions: Dimensions) -> Self {
        Self::with_margin(dimensions, 0)
    }

    /// Every cell whose origin is at least `margin` from the top and left
    /// edges: `[margin, width - 1) x [margin, height - 1)`.
    #[must_use]
    pub fn with_margin(dimensions: Dimensions, margin: u32) -> Self {
        let margin = margin as usize;
        let cols = (dimensions.width as usize).saturating_sub(1);
        let rows = (dimensions.height as usize).saturating_sub(1);
        Self {
            x: margin..cols.max(margin),
            y: margin..rows.max(margin),
        }
    }

    /// Shrink the region so every cell's corners lie inside `dimensions`.
    #[must_use]
    pub fn clamp_to(&self, dimensions: Dimensions) -> Self {
        let bound = Self::full(dimensions);
        let clamp = |r: &Range<usize>, b: &Range<usize>| {
            let end = r.end.min(b.end);
            r.start.min(end)..end
        };
        Self {
            x: clamp(&self.x, &bound.x),
            y: clamp(&self.y, &bound.y),
        }
    }

    /// Number of cells in the region.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.x.len() * self.y.len()
    }
}

/// Counts gathered while tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Cells examined.
    pub cells_visited: usize,
    /// Cells whose case produced at least one segment.
    pub crossing_cells: usize,
    /// Crossing cells that were saddles (cases 5 and 10).
    pub saddle_cells: usize,
    /// Segments emitted.
    pub segment_count: usize,
}

impl TraceStats {
    fn merge(&mut self, other: &Self) {
        self.cells_visited += other.cells_visited;
        self.crossing_cells += other.crossing_cells;
        self.saddle_cells += other.saddle_cells;
        self.segment_count += other.segment_count;
    }
}

/// Trace the `threshold` contour of `field` inside `region`.
///
/// Returns one segment per consecutive edge pair of each cell's case,
/// in cell order: x outer, y inner. No stitching or deduplication is
/// done across cells.
#[must_use]
pub fn trace<R: EdgeResolver + Sync>(
    field: &ScalarField,
    threshold: f64,
    region: &CellRegion,
    resolver: &R,
) -> Vec<Segment> {
    trace_with_stats(field, threshold, region, resolver).0
}

/// Like [`trace`], also returning [`TraceStats`].
///
/// The region is clamped to the field first, so no sample outside the
/// field is ever read. Columns are traced in parallel and merged in
/// column order, so the output is identical to a sequential walk.
#[must_use]
pub fn trace_with_stats<R: EdgeResolver + Sync>(
    field: &ScalarField,
    threshold: f64,
    region: &CellRegion,
    resolver: &R,
) -> (Vec<Segment>, TraceStats) {
    let region = region.clamp_to(field.dimensions());

    let columns: Vec<(Vec<Segment>, TraceStats)> = region
        .x
        .clone()
        .into_par_iter()
        .map(|x| trace_column(field, threshold, x, region.y.clone(), resolver))
        .collect();

    let mut stats = TraceStats::default();
    let mut segments = Vec::with_capacity(columns.iter().map(|(s, _)| s.len()).sum());
    for (column, column_stats) in columns {
        segments.extend(column);
        stats.merge(&column_stats);
    }

    debug!(
        threshold,
        cells = stats.cells_visited,
        crossing = stats.crossing_cells,
        saddles = stats.saddle_cells,
        segments = stats.segment_count,
        "traced contour"
    );

    (segments, stats)
}

/// Trace every cell of one column.
fn trace_column<R: EdgeResolver>(
    field: &ScalarField,
    threshold: f64,
    x: usize,
    rows: Range<usize>,
    resolver: &R,
) -> (Vec<Segment>, TraceStats) {
    let mut segments = Vec::new();
    let mut stats = TraceStats::default();

    for y in rows {
        let Some(cell) = Cell::read(field, x, y) else {
            continue;
        };
        stats.cells_visited += 1;

        let case = case_index(cell.corners, threshold);
        let edges = case.entry().edges(cell.center_value() < threshold);
        if edges.is_empty() {
            continue;
        }
        stats.crossing_cells += 1;
        if case.is_saddle() {
            stats.saddle_cells += 1;
        }

        for pair in edges.chunks_exact(2) {
            let p1 = resolver.resolve(pair[0], &cell, threshold);
            let p2 = resolver.resolve(pair[1], &cell, threshold);
            segments.push(Segment::new(p1, p2));
        }
    }

    stats.segment_count = segments.len();
    (segments, stats)
}
