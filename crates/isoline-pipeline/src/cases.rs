//! Marching-squares case classification and the edge lookup table.
//!
//! A cell's four corners are compared against the threshold; each corner
//! strictly below it sets one bit of the [`CaseIndex`]:
//!
//! ```text
//!   bit 0 (x, y) ──────── bit 1 (x+1, y)
//!        │                      │
//!        │                      │
//!   bit 3 (x, y+1) ────── bit 2 (x+1, y+1)
//! ```
//!
//! [`CASE_TABLE`] maps each of the 16 cases to the named [`Edge`]s to
//! connect, consumed in consecutive pairs (one segment per pair).
//!
//! # Saddles
//!
//! Cases 5 and 10 have diagonally opposite corners on the same side of
//! the threshold, so the corners alone do not determine the topology.
//! They are resolved by the cell center, taken as the mean of the four
//! corners and classified with the same polarity as the corners. When the
//! center is below, the below corners are connected through the cell and
//! the two above corners are cut off; otherwise the below corners are cut
//! off individually.
//!
//! Case 5 is resolved by the center rather than by a fixed `topRight`
//! pairing, so no entry of [`CASE_TABLE`] references [`Edge::TopRight`].
//! The variant stays in [`Edge`] so resolvers and listings cover every
//! named edge.

use std::fmt;

use crate::types::PipelineError;

/// A named point on or around a grid cell.
///
/// Resolved to coordinates by an
/// [`EdgeResolver`](crate::contour::EdgeResolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Midpoint of the left side.
    Left,
    /// Midpoint of the right side.
    Right,
    /// Midpoint of the bottom side.
    Bottom,
    /// Above the top side.
    Top,
    /// Diagonally up and left of the cell origin.
    TopLeft,
    /// Up and right of the cell origin.
    TopRight,
    /// Down and left of the cell origin.
    BottomLeft,
    /// Cell interior, half a step from the origin on both axes.
    BottomRight,
    /// The cell origin.
    Center,
}

impl Edge {
    /// Every edge, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Left,
        Self::Right,
        Self::Bottom,
        Self::Top,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Center,
    ];

    /// The edge's name as used in case-table listings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Top => "top",
            Self::TopLeft => "topLeft",
            Self::TopRight => "topRight",
            Self::BottomLeft => "bottomLeft",
            Self::BottomRight => "bottomRight",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 4-bit marching-squares case, always in `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaseIndex(u8);

impl CaseIndex {
    /// Number of distinct cases.
    pub const COUNT: usize = 16;

    /// Wrap a raw case value.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidCase`] if `value > 15`.
    pub const fn new(value: u8) -> Result<Self, PipelineError> {
        if value as usize >= Self::COUNT {
            return Err(PipelineError::InvalidCase(value));
        }
        Ok(Self(value))
    }

    /// The raw 4-bit value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The table entry for this case.
    #[must_use]
    pub fn entry(self) -> &'static CaseEntry {
        &CASE_TABLE[self.0 as usize]
    }

    /// Returns `true` for the two ambiguous diagonal cases (5 and 10).
    #[must_use]
    pub fn is_saddle(self) -> bool {
        matches!(self.entry(), CaseEntry::Saddle { .. })
    }
}

/// Classify a cell's corners against `threshold`.
///
/// `corners` is ordered `[(x, y), (x+1, y), (x+1, y+1), (x, y+1)]`; a
/// corner strictly below the threshold sets its bit.
#[must_use]
pub fn case_index(corners: [f64; 4], threshold: f64) -> CaseIndex {
    let bits = corners
        .iter()
        .enumerate()
        .fold(0_u8, |acc, (bit, &v)| acc | (u8::from(v < threshold) << bit));
    CaseIndex(bits)
}

/// The edges to connect for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseEntry {
    /// No contour crosses the cell.
    Empty,
    /// One segment.
    Single([Edge; 2]),
    /// Two segments whose pairing depends on the cell center.
    Saddle {
        /// Pairs used when the center value is below the threshold.
        center_below: [Edge; 4],
        /// Pairs used when the center value is at or above the threshold.
        center_above: [Edge; 4],
    },
}

impl CaseEntry {
    /// The edge list for this case, consumed in consecutive pairs.
    ///
    /// `center_below` only matters for saddle cases. The returned slice
    /// always has an even length: 0, 2 or 4.
    #[must_use]
    pub const fn edges(&self, center_below: bool) -> &[Edge] {
        match self {
            Self::Empty => &[],
            Self::Single(edges) => edges.as_slice(),
            Self::Saddle {
                center_below: below,
                center_above: above,
            } => {
                if center_below {
                    below.as_slice()
                } else {
                    above.as_slice()
                }
            }
        }
    }
}

/// The fixed 16-entry marching-squares lookup table.
pub static CASE_TABLE: [CaseEntry; CaseIndex::COUNT] = {
    use CaseEntry::{Empty, Saddle, Single};
    use Edge::{Bottom, BottomLeft, BottomRight, Center, Left, Right, Top, TopLeft};

    [
        Empty,
        Single([BottomLeft, Left]),
        Single([BottomRight, Bottom]),
        Single([Left, Bottom]),
        Single([TopLeft, Top]),
        Saddle {
            center_below: [Top, Right, Bottom, Left],
            center_above: [Top, Left, Right, Bottom],
        },
        Single([Right, Top]),
        Single([Bottom, Left]),
        Single([Bottom, Right]),
        Single([Left, Top]),
        Saddle {
            center_below: [Top, Left, Right, Bottom],
            center_above: [Top, Right, Bottom, Left],
        },
        Single([Top, Left]),
        Single([Top, Right]),
        Single([Bottom, Center]),
        Single([Top, Center]),
        Empty,
    ]
};
