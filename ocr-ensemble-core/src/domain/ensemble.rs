//! The set of all OCR boxes for one label.

use crate::domain::{BoxRecordStore, OcrBox};
use std::cmp::Ordering;
use tracing::warn;

/// Every OCR box read for one physical label, across all pipelines and
/// engines.
///
/// Stores are concatenated as-is; duplicates are left for the merger.
#[derive(Debug, Clone, Default)]
pub struct Ensemble {
    key: String,
    boxes: Vec<OcrBox>,
}

impl Ensemble {
    /// Creates an empty ensemble for the label `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            boxes: Vec::new(),
        }
    }

    /// Creates an ensemble from boxes already in memory.
    pub fn from_boxes(key: impl Into<String>, boxes: Vec<OcrBox>) -> Self {
        Self {
            key: key.into(),
            boxes,
        }
    }

    /// The label key, usually the OCR file stem.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The boxes in the order they were added.
    pub fn boxes(&self) -> &[OcrBox] {
        &self.boxes
    }

    /// Appends every box of one pipeline/engine store.
    pub fn extend(&mut self, store: BoxRecordStore) {
        self.boxes.extend(store.into_boxes());
    }

    /// Appends one box.
    pub fn push(&mut self, ocr_box: OcrBox) {
        self.boxes.push(ocr_box);
    }

    /// Number of boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Returns true when there are no boxes.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Consumes the ensemble, returning its boxes.
    pub fn into_boxes(self) -> Vec<OcrBox> {
        self.boxes
    }

    /// Keeps at most `max_boxes` boxes, preferring higher confidence.
    ///
    /// Returns how many boxes were dropped. Ties are broken on geometry so the
    /// survivors do not depend on file read order.
    pub fn truncate(&mut self, max_boxes: usize) -> usize {
        if self.boxes.len() <= max_boxes {
            return 0;
        }
        let dropped = self.boxes.len() - max_boxes;
        warn!(
            "label {}: {} boxes exceeds the cap of {}; dropping {} lowest-confidence boxes",
            self.key,
            self.boxes.len(),
            max_boxes,
            dropped
        );
        self.boxes.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.bbox.cmp(&b.bbox))
                .then_with(|| a.source.cmp(&b.source))
                .then_with(|| a.text.cmp(&b.text))
        });
        self.boxes.truncate(max_boxes);
        self.boxes.sort_by(reading_cmp);
        dropped
    }
}

fn reading_cmp(a: &OcrBox, b: &OcrBox) -> Ordering {
    (a.bbox.left, a.bbox.top).cmp(&(b.bbox.left, b.bbox.top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoxSource;
    use crate::processors::BoundingBox;

    fn ocr(left: i32, conf: f32) -> OcrBox {
        OcrBox::new(
            BoundingBox::new(left, 0, left + 10, 10),
            "x",
            conf,
            BoxSource::pipeline("p"),
        )
    }

    #[test]
    fn test_truncate_keeps_most_confident() {
        let mut ensemble =
            Ensemble::from_boxes("a", vec![ocr(0, 0.1), ocr(20, 0.9), ocr(40, 0.5)]);
        assert_eq!(ensemble.truncate(2), 1);
        let lefts: Vec<i32> = ensemble.boxes().iter().map(|b| b.bbox.left).collect();
        assert_eq!(lefts, vec![20, 40]);
    }

    #[test]
    fn test_truncate_noop_under_cap() {
        let mut ensemble = Ensemble::from_boxes("a", vec![ocr(0, 0.1)]);
        assert_eq!(ensemble.truncate(5), 0);
        assert_eq!(ensemble.len(), 1);
    }
}
