//! Font sizing and straightened layout for reconstructed labels.
//!
//! Each merged box gets the largest font size at which its text still fits
//! inside the box's original footprint. Rows are then laid out as horizontal
//! bands stacked from the top of a blank canvas, so skewed or curved source
//! rows come out straight. The original geometry is never modified; results
//! are returned as [`ArrangedBox`]es that refer to the merged boxes by index.

use crate::core::constants::{DEFAULT_BASE_FONT_SIZE, DEFAULT_GUTTER, DEFAULT_MIN_FONT_SIZE};
use crate::core::validation::{validate_min_size_u32, validate_size_range};
use crate::domain::MergedBox;
use crate::processors::{BoundingBox, RowLayout};
use serde::{Deserialize, Serialize};

/// Rendered size of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    /// Advance width in pixels.
    pub width: u32,
    /// Line height in pixels.
    pub height: u32,
}

/// Measures how large text renders at a given font size.
///
/// Implemented with a real font for image output; [`MonospaceMeasure`] is a
/// font-free approximation.
pub trait TextMeasure {
    /// Returns the extent of `text` at `font_size` pixels.
    fn measure(&self, text: &str, font_size: u32) -> TextExtent;
}

/// Treats every character as the same fraction of the font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMeasure {
    /// Numerator of the character advance as a fraction of the font size.
    pub advance_num: u32,
    /// Denominator of the character advance.
    pub advance_den: u32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self {
            advance_num: 3,
            advance_den: 5,
        }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font_size: u32) -> TextExtent {
        let chars = text.chars().count() as u32;
        TextExtent {
            width: (chars * font_size * self.advance_num).div_ceil(self.advance_den.max(1)),
            height: font_size,
        }
    }
}

/// Settings for font sizing and row layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrangeConfig {
    /// Largest font size tried.
    #[serde(default = "ArrangeConfig::default_base_font_size")]
    pub base_font_size: u32,
    /// Smallest font size; text that never fits uses it.
    #[serde(default = "ArrangeConfig::default_min_font_size")]
    pub min_font_size: u32,
    /// Space above the first row, between rows and around the canvas.
    #[serde(default = "ArrangeConfig::default_gutter")]
    pub gutter: u32,
}

impl ArrangeConfig {
    fn default_base_font_size() -> u32 {
        DEFAULT_BASE_FONT_SIZE
    }

    fn default_min_font_size() -> u32 {
        DEFAULT_MIN_FONT_SIZE
    }

    fn default_gutter() -> u32 {
        DEFAULT_GUTTER
    }

    /// Sets the gutter.
    pub fn with_gutter(mut self, gutter: u32) -> Self {
        self.gutter = gutter;
        self
    }

    /// Sets the font size range.
    pub fn with_font_sizes(mut self, min_font_size: u32, base_font_size: u32) -> Self {
        self.min_font_size = min_font_size;
        self.base_font_size = base_font_size;
        self
    }

    /// Makes the font sizes positive and ordered.
    pub fn validated(mut self) -> Self {
        let min = validate_min_size_u32(self.min_font_size, "min_font_size");
        let base = validate_min_size_u32(self.base_font_size, "base_font_size");
        (self.min_font_size, self.base_font_size) = validate_size_range(min, base, "font size");
        self
    }
}

impl Default for ArrangeConfig {
    fn default() -> Self {
        Self {
            base_font_size: DEFAULT_BASE_FONT_SIZE,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            gutter: DEFAULT_GUTTER,
        }
    }
}

/// Where and how large one merged box's text is drawn on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrangedBox {
    /// Index of the merged box.
    pub index: usize,
    /// Row number.
    pub row: usize,
    /// Chosen font size.
    pub font_size: u32,
    /// Text width at the chosen size.
    pub text_width: u32,
    /// Text height at the chosen size.
    pub text_height: u32,
    /// Left edge of the text on the canvas.
    pub new_left: i32,
    /// Top of the row's band.
    pub new_top: i32,
    /// Right edge of the text, `new_left + text_width`.
    pub new_right: i32,
    /// Bottom of the row's band.
    pub new_bottom: i32,
}

/// The straightened layout of one label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arrangement {
    /// Boxes in reading order.
    pub boxes: Vec<ArrangedBox>,
    /// Canvas width including the right gutter.
    pub width: u32,
    /// Canvas height, `max(new_bottom)` plus the gutter.
    pub height: u32,
}

impl Arrangement {
    /// Returns true when nothing is drawn.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Largest font size in the configured range at which `text` fits inside
/// `bbox`, with its measured extent. Falls back to the minimum size.
pub fn fit_font_size<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    bbox: &BoundingBox,
    config: &ArrangeConfig,
) -> (u32, TextExtent) {
    for size in (config.min_font_size..=config.base_font_size).rev() {
        let extent = measure.measure(text, size);
        let fits_right = bbox.left as i64 + extent.width as i64 <= bbox.right as i64;
        let fits_bottom = bbox.top as i64 + extent.height as i64 <= bbox.bottom as i64;
        if fits_right && fits_bottom {
            return (size, extent);
        }
    }
    let size = config.min_font_size;
    (size, measure.measure(text, size))
}

/// Sizes fonts and lays rows out as straight bands.
///
/// Boxes are visited in the layout's reading order. Each row's band is as tall
/// as its tallest text and starts one gutter below the previous band. Within a
/// row, text keeps its original left offset from the leftmost box on the
/// label, but is pushed right when it would collide with the previous text.
pub fn arrange_rows<M: TextMeasure + ?Sized>(
    boxes: &[MergedBox],
    layout: &RowLayout,
    measure: &M,
    config: &ArrangeConfig,
) -> Arrangement {
    let gutter = config.gutter as i32;
    if layout.is_empty() {
        return Arrangement {
            boxes: Vec::new(),
            width: config.gutter,
            height: config.gutter,
        };
    }

    let origin = layout
        .order()
        .iter()
        .filter_map(|a| boxes.get(a.index))
        .map(|b| b.bbox.left)
        .min()
        .unwrap_or(0);

    let mut arranged = Vec::with_capacity(layout.order().len());
    let mut cursor = gutter;

    for row in layout.rows() {
        let sized: Vec<(usize, usize, &MergedBox, u32, TextExtent)> = row
            .iter()
            .filter_map(|a| {
                let merged = boxes.get(a.index)?;
                let (size, extent) = fit_font_size(measure, &merged.text, &merged.bbox, config);
                Some((a.index, a.row, merged, size, extent))
            })
            .collect();
        if sized.is_empty() {
            continue;
        }

        let band = sized.iter().map(|s| s.4.height).max().unwrap_or(0) as i32;
        let new_top = cursor;
        let new_bottom = new_top + band;
        let mut prev_right: Option<i32> = None;

        for (index, row, merged, font_size, extent) in sized {
            let mut new_left = merged.bbox.left - origin + gutter;
            if let Some(prev) = prev_right {
                let space = measure.measure(" ", font_size).width as i32;
                new_left = new_left.max(prev + space);
            }
            let new_right = new_left + extent.width as i32;
            prev_right = Some(new_right);

            arranged.push(ArrangedBox {
                index,
                row,
                font_size,
                text_width: extent.width,
                text_height: extent.height,
                new_left,
                new_top,
                new_right,
                new_bottom,
            });
        }

        cursor = new_bottom + gutter;
    }

    let max_right = arranged.iter().map(|b| b.new_right).max().unwrap_or(0);
    let max_bottom = arranged.iter().map(|b| b.new_bottom).max().unwrap_or(0);
    Arrangement {
        boxes: arranged,
        width: (max_right + gutter).max(0) as u32,
        height: (max_bottom + gutter).max(0) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{RowConfig, find_rows_of_text};

    fn merged(l: i32, t: i32, r: i32, b: i32, text: &str) -> MergedBox {
        MergedBox::new(BoundingBox::new(l, t, r, b), text, 0.9)
    }

    #[test]
    fn test_fit_picks_largest_size_that_fits() {
        let measure = MonospaceMeasure::default();
        let config = ArrangeConfig::default();
        // 5 chars at 3/5 of the size each; 90 px wide allows size 30.
        let bbox = BoundingBox::new(0, 0, 90, 100);
        let (size, extent) = fit_font_size(&measure, "Texas", &bbox, &config);
        assert_eq!(size, 30);
        assert_eq!(extent, TextExtent { width: 90, height: 30 });
    }

    #[test]
    fn test_fit_capped_at_base_size() {
        let (size, _) = fit_font_size(
            &MonospaceMeasure::default(),
            "a",
            &BoundingBox::new(0, 0, 1000, 1000),
            &ArrangeConfig::default(),
        );
        assert_eq!(size, DEFAULT_BASE_FONT_SIZE);
    }

    #[test]
    fn test_fit_clamps_to_minimum() {
        let config = ArrangeConfig::default();
        let (size, extent) = fit_font_size(
            &MonospaceMeasure::default(),
            "a very long line of text",
            &BoundingBox::new(0, 0, 20, 10),
            &config,
        );
        assert_eq!(size, config.min_font_size);
        assert_eq!(extent.height, config.min_font_size);
    }

    #[test]
    fn test_rows_become_straight_bands() {
        let boxes = vec![
            merged(100, 100, 280, 140, "Quercus"),
            merged(300, 110, 400, 150, "alba"),
            merged(100, 200, 300, 230, "Texas"),
        ];
        let layout = find_rows_of_text(&boxes, &RowConfig::default());
        let measure = MonospaceMeasure::default();
        let config = ArrangeConfig::default();
        let arrangement = arrange_rows(&boxes, &layout, &measure, &config);

        assert_eq!(arrangement.boxes.len(), 3);
        let first = arrangement.boxes[0];
        let second = arrangement.boxes[1];
        let third = arrangement.boxes[2];

        assert_eq!(first.row, second.row);
        assert_eq!(first.new_top, 12);
        assert_eq!(first.new_top, second.new_top);
        assert_eq!(first.new_bottom, second.new_bottom);
        assert_eq!(
            first.new_bottom - first.new_top,
            first.text_height.max(second.text_height) as i32
        );
        assert_eq!(third.new_top, first.new_bottom + 12);

        assert_eq!(first.new_left, 12);
        assert_eq!(third.new_left, 12);
        assert!(second.new_left > first.new_right);
        assert_eq!(arrangement.height as i32, third.new_bottom + 12);

        // Original geometry is untouched.
        assert_eq!(boxes[0].bbox, BoundingBox::new(100, 100, 280, 140));
    }

    #[test]
    fn test_colliding_text_is_pushed_right() {
        // Second box starts inside where the first box's minimum-size text ends.
        let boxes = vec![
            merged(0, 0, 30, 20, "Herbarium of Texas"),
            merged(40, 0, 80, 20, "1901"),
        ];
        let layout = find_rows_of_text(&boxes, &RowConfig::default());
        let measure = MonospaceMeasure::default();
        let arrangement = arrange_rows(&boxes, &layout, &measure, &ArrangeConfig::default());
        let (a, b) = (arrangement.boxes[0], arrangement.boxes[1]);
        let space = measure.measure(" ", b.font_size).width as i32;
        assert_eq!(b.new_left, a.new_right + space);
    }

    #[test]
    fn test_empty_layout() {
        let arrangement = arrange_rows(
            &[],
            &RowLayout::default(),
            &MonospaceMeasure::default(),
            &ArrangeConfig::default().with_gutter(8),
        );
        assert!(arrangement.is_empty());
        assert_eq!(arrangement.height, 8);
    }

    #[test]
    fn test_validated_orders_sizes() {
        let config = ArrangeConfig::default().with_font_sizes(40, 0).validated();
        assert_eq!((config.min_font_size, config.base_font_size), (1, 40));
    }
}
