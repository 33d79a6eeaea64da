//! Integer bounding-box geometry for OCR ensembles.
//!
//! OCR engines report fragments as axis-aligned pixel rectangles. Coordinates
//! are inclusive on both ends, so a box with `left == right` is one pixel wide,
//! matching how the engines' CSV output is interpreted throughout the pipeline.
//!
//! Derived quantities are computed in `i64`, so no pair of `i32` edges can
//! overflow them.

use crate::core::constants::MAX_COORDINATE;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in image pixel space.
///
/// A well-formed box has `left <= right` and `top <= bottom`. Use
/// [`BoundingBox::try_new`] at ingestion boundaries to reject anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (inclusive).
    pub left: i32,
    /// Top edge (inclusive).
    pub top: i32,
    /// Right edge (inclusive).
    pub right: i32,
    /// Bottom edge (inclusive).
    pub bottom: i32,
}

impl BoundingBox {
    /// Creates a bounding box without checking its orientation.
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a bounding box, returning `None` when `right < left` or
    /// `bottom < top`.
    pub fn try_new(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        (left <= right && top <= bottom).then_some(Self::new(left, top, right, bottom))
    }

    /// Creates a bounding box from floating-point coordinates, rounding each
    /// edge to the nearest pixel.
    ///
    /// Returns `None` for non-finite coordinates, coordinates beyond
    /// [`MAX_COORDINATE`] or a negative extent.
    pub fn from_coords(left: f64, top: f64, right: f64, bottom: f64) -> Option<Self> {
        let coords = [left, top, right, bottom];
        if coords
            .iter()
            .any(|c| !c.is_finite() || c.round().abs() > MAX_COORDINATE as f64)
        {
            return None;
        }
        Self::try_new(
            left.round() as i32,
            top.round() as i32,
            right.round() as i32,
            bottom.round() as i32,
        )
    }

    /// Width in pixels, `right - left + 1`, saturating at `i32::MAX`.
    #[inline]
    pub fn width(&self) -> i32 {
        saturate(self.wide_width())
    }

    /// Height in pixels, `bottom - top + 1`, saturating at `i32::MAX`.
    #[inline]
    pub fn height(&self) -> i32 {
        saturate(self.bottom as i64 - self.top as i64 + 1)
    }

    /// Area in pixels.
    #[inline]
    pub fn area(&self) -> i64 {
        let width = self.wide_width().max(0);
        let height = (self.bottom as i64 - self.top as i64 + 1).max(0);
        width.saturating_mul(height)
    }

    /// Vertical center line, `(top + bottom) // 2` rounded toward negative
    /// infinity.
    #[inline]
    pub fn center_y(&self) -> i32 {
        // The floored mean of two i32 values is itself an i32.
        (self.top as i64 + self.bottom as i64).div_euclid(2) as i32
    }

    #[inline]
    fn wide_width(&self) -> i64 {
        self.right as i64 - self.left as i64 + 1
    }

    /// The overlapping region of two boxes, if any.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        BoundingBox::try_new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        )
    }

    /// The smallest box covering both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Returns true when `other` lies entirely inside this box (edges may
    /// touch).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// Returns true when this box's vertical span covers `other`'s.
    pub fn brackets_vertically(&self, other: &BoundingBox) -> bool {
        self.top <= other.top && self.bottom >= other.bottom
    }

    /// Intersection over union of two boxes, in `[0, 1]`.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let inter = self.intersection(other).map_or(0, |b| b.area());
        let union = self.area() + other.area() - inter;
        if union > 0 {
            inter as f64 / union as f64
        } else {
            0.0
        }
    }

    /// Horizontal overlap as a fraction of the narrower box,
    /// `(min(right) - max(left)) / min(width)`.
    ///
    /// Negative when the boxes are separated by a horizontal gap.
    pub fn horizontal_overlap(&self, other: &BoundingBox) -> f64 {
        let max_left = self.left.max(other.left) as i64;
        let min_right = self.right.min(other.right) as i64;
        let min_width = self.wide_width().min(other.wide_width()).max(1);
        (min_right - max_left) as f64 / min_width as f64
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}
