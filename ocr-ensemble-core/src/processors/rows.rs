//! Reading-order rows by marching center lines.
//!
//! Boxes are scanned left to right. Every open row remembers only the last
//! box it accepted, so a row follows a baseline that drifts up or down across
//! a slanted or curved label instead of staying pinned to its first box.
//!
//! For each box, in `(left, top)` order:
//!
//! 1. The first row (in creation order) whose last box vertically brackets the
//!    box takes it. This keeps punctuation inside a tall word on its line.
//! 2. Otherwise, among rows whose last box's center line lies within the box's
//!    vertical span, the row with the nearest center line is chosen. Equal
//!    distances go to the row created first. The box joins that row when its
//!    horizontal overlap with the row's last box is below the width threshold;
//!    a larger overlap means stacked text, not a continuation.
//! 3. Otherwise the box opens a new row.
//!
//! Rows are then numbered from 0 in order of the top edge of their last box.

use crate::core::constants::DEFAULT_ROW_WIDTH_THRESHOLD;
use crate::core::validation::validate_threshold;
use crate::domain::MergedBox;
use crate::processors::BoundingBox;
use serde::{Deserialize, Serialize};

/// Settings for row finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowConfig {
    /// Horizontal overlap, as a fraction of the narrower box, from which a box
    /// no longer continues a row.
    #[serde(default = "RowConfig::default_width_threshold")]
    pub width_threshold: f32,
}

impl RowConfig {
    fn default_width_threshold() -> f32 {
        DEFAULT_ROW_WIDTH_THRESHOLD
    }

    /// Sets the width threshold.
    pub fn with_width_threshold(mut self, width_threshold: f32) -> Self {
        self.width_threshold = width_threshold;
        self
    }

    /// Clamps the threshold into `[0, 1]`.
    pub fn validated(mut self) -> Self {
        self.width_threshold = validate_threshold(self.width_threshold, "width_threshold");
        self
    }
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            width_threshold: DEFAULT_ROW_WIDTH_THRESHOLD,
        }
    }
}

/// The row of one input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAssignment {
    /// Position of the box in the slice handed to the row finder.
    pub index: usize,
    /// Row number, 0 for the top row.
    pub row: usize,
}

/// Row assignments for every input box, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLayout {
    order: Vec<RowAssignment>,
    row_tops: Vec<i32>,
}

impl RowLayout {
    /// Every box, ordered by row and then by left edge.
    pub fn order(&self) -> &[RowAssignment] {
        &self.order
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_tops.len()
    }

    /// Top edge of a row's last box, which is the key rows are ordered by.
    pub fn row_top(&self, row: usize) -> Option<i32> {
        self.row_tops.get(row).copied()
    }

    /// The assignments of each row, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[RowAssignment]> {
        self.order.chunk_by(|a, b| a.row == b.row)
    }

    /// The row of the box at `index`.
    pub fn row_of(&self, index: usize) -> Option<usize> {
        self.order.iter().find(|a| a.index == index).map(|a| a.row)
    }

    /// Returns true when there are no boxes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// An open row during the scan.
struct Row {
    last: BoundingBox,
}

/// Assigns each box to a reading-order row.
pub fn find_rows(boxes: &[BoundingBox], config: &RowConfig) -> RowLayout {
    if boxes.is_empty() {
        return RowLayout::default();
    }

    let mut scan: Vec<usize> = (0..boxes.len()).collect();
    scan.sort_by_key(|&i| {
        let b = &boxes[i];
        (b.left, b.top, b.bottom, b.right, i)
    });

    let threshold = config.width_threshold as f64;
    let mut rows: Vec<Row> = Vec::new();
    let mut created: Vec<usize> = vec![0; boxes.len()];

    for &i in &scan {
        let bbox = boxes[i];
        let row_id = match choose_row(&rows, &bbox, threshold) {
            Some(id) => {
                rows[id].last = bbox;
                id
            }
            None => {
                rows.push(Row { last: bbox });
                rows.len() - 1
            }
        };
        created[i] = row_id;
    }

    let mut ranked: Vec<usize> = (0..rows.len()).collect();
    ranked.sort_by_key(|&id| (rows[id].last.top, id));
    let mut renumbered = vec![0; rows.len()];
    for (row, &id) in ranked.iter().enumerate() {
        renumbered[id] = row;
    }

    let mut order: Vec<RowAssignment> = (0..boxes.len())
        .map(|index| RowAssignment {
            index,
            row: renumbered[created[index]],
        })
        .collect();
    order.sort_by_key(|a| {
        let b = &boxes[a.index];
        (a.row, b.left, b.top, a.index)
    });

    RowLayout {
        order,
        row_tops: ranked.iter().map(|&id| rows[id].last.top).collect(),
    }
}

/// Row finding over merged boxes; assignment indices refer to `boxes`.
pub fn find_rows_of_text(boxes: &[MergedBox], config: &RowConfig) -> RowLayout {
    let bboxes: Vec<BoundingBox> = boxes.iter().map(|b| b.bbox).collect();
    find_rows(&bboxes, config)
}

fn choose_row(rows: &[Row], bbox: &BoundingBox, threshold: f64) -> Option<usize> {
    if let Some(id) = rows.iter().position(|row| row.last.brackets_vertically(bbox)) {
        return Some(id);
    }

    let center = bbox.center_y();
    let (id, row) = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| (bbox.top..=bbox.bottom).contains(&row.last.center_y()))
        .min_by_key(|(id, row)| ((row.last.center_y() as i64 - center as i64).abs(), *id))?;

    (row.last.horizontal_overlap(bbox) < threshold).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(l: i32, t: i32, r: i32, b: i32) -> BoundingBox {
        BoundingBox::new(l, t, r, b)
    }

    fn rows_by_index(layout: &RowLayout, len: usize) -> Vec<usize> {
        (0..len).map(|i| layout.row_of(i).unwrap()).collect()
    }

    #[test]
    fn test_empty_input() {
        let layout = find_rows(&[], &RowConfig::default());
        assert!(layout.is_empty());
        assert_eq!(layout.row_count(), 0);
        assert_eq!(layout.rows().count(), 0);
    }

    #[test]
    fn test_punctuation_joins_containing_row() {
        let boxes = [
            bb(0, 100, 200, 140),
            bb(205, 110, 208, 115),
            bb(0, 200, 200, 240),
        ];
        let layout = find_rows(&boxes, &RowConfig::default());
        assert_eq!(layout.row_count(), 2);
        assert_eq!(layout.row_of(0), layout.row_of(1));
        assert_ne!(layout.row_of(0), layout.row_of(2));
    }

    #[test]
    fn test_equal_center_distance_prefers_earlier_row() {
        // Rows centered on 50 and 90; the wide third box is centered on 70 and
        // both center lines fall inside its span.
        let boxes = [bb(0, 40, 100, 60), bb(10, 80, 110, 100), bb(300, 40, 400, 100)];
        let layout = find_rows(&boxes, &RowConfig::default());
        assert_eq!(rows_by_index(&layout, 3), vec![0, 1, 0]);

        // Same geometry with the 90 row opened first.
        let boxes = [bb(0, 80, 100, 100), bb(10, 40, 110, 60), bb(300, 40, 400, 100)];
        let layout = find_rows(&boxes, &RowConfig::default());
        assert_eq!(layout.row_of(2), layout.row_of(0));
        assert_ne!(layout.row_of(2), layout.row_of(1));
    }

    #[test]
    fn test_nearest_center_line_wins() {
        let boxes = [bb(0, 40, 100, 60), bb(10, 76, 110, 96), bb(300, 50, 400, 100)];
        // Centers 50 and 86 against 75: the lower row is nearer.
        let layout = find_rows(&boxes, &RowConfig::default());
        assert_eq!(layout.row_of(2), layout.row_of(1));
    }

    #[test]
    fn test_marching_follows_slanted_line() {
        let boxes = [
            bb(0, 100, 100, 130),
            bb(110, 108, 210, 138),
            bb(220, 116, 320, 146),
            bb(330, 124, 430, 154),
            bb(0, 200, 100, 230),
        ];
        let layout = find_rows(&boxes, &RowConfig::default());
        assert_eq!(layout.row_count(), 2);
        assert_eq!(rows_by_index(&layout, 5), vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_stacked_text_starts_new_row() {
        // Same column, overlapping vertically but fully overlapping horizontally.
        let boxes = [bb(0, 0, 100, 30), bb(0, 10, 100, 40)];
        let layout = find_rows(&boxes, &RowConfig::default());
        assert_eq!(layout.row_count(), 2);
        assert_eq!(rows_by_index(&layout, 2), vec![0, 1]);

        let permissive = RowConfig::default().with_width_threshold(1.0);
        assert_eq!(find_rows(&boxes, &permissive).row_count(), 1);
    }

    fn sample() -> Vec<BoundingBox> {
        vec![
            bb(10, 10, 90, 40),
            bb(100, 12, 180, 42),
            bb(190, 15, 260, 44),
            bb(12, 60, 70, 90),
            bb(80, 58, 200, 92),
            bb(150, 65, 153, 70),
            bb(5, 120, 300, 160),
            bb(310, 125, 330, 150),
            bb(20, 200, 60, 230),
        ]
    }

    #[test]
    fn test_rows_are_monotonic_and_in_reading_order() {
        let boxes = sample();
        let layout = find_rows(&boxes, &RowConfig::default());
        assert_eq!(layout.order().len(), boxes.len());

        for pair in layout.order().windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert!(a.row <= b.row);
            assert!(layout.row_top(a.row).unwrap() <= layout.row_top(b.row).unwrap());
            if a.row == b.row {
                assert!(boxes[a.index].left <= boxes[b.index].left);
            }
        }
        let rows: Vec<usize> = layout.rows().map(|r| r[0].row).collect();
        assert_eq!(rows, (0..layout.row_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffled_input_gives_same_rows() {
        let boxes = sample();
        let layout = find_rows(&boxes, &RowConfig::default());
        let expected: Vec<(BoundingBox, usize)> = layout
            .order()
            .iter()
            .map(|a| (boxes[a.index], a.row))
            .collect();

        let mut shuffled = boxes.clone();
        shuffled.reverse();
        shuffled.swap(1, 5);
        shuffled.rotate_left(3);
        let layout = find_rows(&shuffled, &RowConfig::default());
        let actual: Vec<(BoundingBox, usize)> = layout
            .order()
            .iter()
            .map(|a| (shuffled[a.index], a.row))
            .collect();
        assert_eq!(expected, actual);
    }
}
