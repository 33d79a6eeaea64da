//! Removal of problem boxes before merging.

use crate::core::validation::{validate_positive_f32, validate_threshold};
use crate::domain::OcrBox;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds for dropping boxes that are unlikely to be real text.
///
/// The defaults keep every box; production digitisation runs used a
/// confidence floor of 0.25, a height ratio of 4.0 and minimum sides of 10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterConfig {
    /// Boxes below this engine confidence are dropped.
    #[serde(default)]
    pub min_confidence: f32,
    /// Boxes taller than this multiple of their width are dropped.
    #[serde(default)]
    pub max_height_ratio: Option<f32>,
    /// Boxes narrower than this many pixels are dropped.
    #[serde(default)]
    pub min_width: u32,
    /// Boxes shorter than this many pixels are dropped.
    #[serde(default)]
    pub min_height: u32,
}

impl FilterConfig {
    /// Creates a filter that keeps everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the confidence floor.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Sets the largest allowed height/width ratio.
    pub fn with_max_height_ratio(mut self, ratio: Option<f32>) -> Self {
        self.max_height_ratio = ratio;
        self
    }

    /// Sets the minimum box width and height.
    pub fn with_min_size(mut self, min_width: u32, min_height: u32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    /// Clamps the confidence floor and drops a non-positive height ratio.
    pub fn validated(mut self) -> Self {
        self.min_confidence = validate_threshold(self.min_confidence, "min_confidence");
        self.max_height_ratio = self
            .max_height_ratio
            .map(|ratio| validate_positive_f32(ratio, "max_height_ratio", f32::INFINITY));
        self
    }

    fn keeps(&self, ocr_box: &OcrBox) -> bool {
        let width = ocr_box.bbox.width();
        let height = ocr_box.bbox.height();

        if ocr_box.confidence < self.min_confidence {
            return false;
        }
        if width < self.min_width as i32 || height < self.min_height as i32 {
            return false;
        }
        match self.max_height_ratio {
            Some(ratio) => height as f32 / width as f32 <= ratio,
            None => true,
        }
    }
}

/// Drops boxes that fail the filter thresholds.
///
/// With fewer than two boxes there is nothing to compare against, so the
/// input is returned unchanged.
pub fn filter_boxes(boxes: Vec<OcrBox>, config: &FilterConfig) -> Vec<OcrBox> {
    if boxes.len() < 2 {
        return boxes;
    }
    let before = boxes.len();
    let kept: Vec<OcrBox> = boxes.into_iter().filter(|b| config.keeps(b)).collect();
    if kept.len() < before {
        debug!("filter dropped {} of {} boxes", before - kept.len(), before);
    }
    kept
}
