//! Reduction of an ensemble of OCR boxes to consensus boxes.
//!
//! Boxes are grouped transitively: two boxes share a group when their IoU is
//! above the threshold or, with containment enabled, when one lies entirely
//! inside the other. Each group becomes one [`MergedBox`] whose geometry is
//! the union of its members and whose text is voted on by
//! [`vote_text`](super::vote::vote_text), one candidate per source.
//!
//! The input is sorted before any decision is taken, so the result is the
//! same for every permutation of the input.

use crate::core::constants::{DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_BOXES_PER_LABEL};
use crate::core::validation::{validate_min_size_usize, validate_threshold};
use crate::domain::{BoxSource, MergedBox, OcrBox};
use crate::processors::vote::{Candidate, Vocabulary, vote_text};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Settings for grouping boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// IoU above which two boxes are the same fragment.
    #[serde(default = "MergeConfig::default_iou_threshold")]
    pub iou_threshold: f32,
    /// Whether a box fully inside another joins its group.
    #[serde(default = "MergeConfig::default_use_containment")]
    pub use_containment: bool,
    /// Most boxes considered per label; the rest are dropped by confidence.
    #[serde(default = "MergeConfig::default_max_boxes")]
    pub max_boxes: usize,
}

impl MergeConfig {
    fn default_iou_threshold() -> f32 {
        DEFAULT_IOU_THRESHOLD
    }

    fn default_use_containment() -> bool {
        true
    }

    fn default_max_boxes() -> usize {
        DEFAULT_MAX_BOXES_PER_LABEL
    }

    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the IoU threshold.
    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = iou_threshold;
        self
    }

    /// Enables or disables containment grouping.
    pub fn with_containment(mut self, use_containment: bool) -> Self {
        self.use_containment = use_containment;
        self
    }

    /// Sets the per-label box cap.
    pub fn with_max_boxes(mut self, max_boxes: usize) -> Self {
        self.max_boxes = max_boxes;
        self
    }

    /// Clamps out-of-range values.
    pub fn validated(mut self) -> Self {
        self.iou_threshold = validate_threshold(self.iou_threshold, "iou_threshold");
        self.max_boxes = validate_min_size_usize(self.max_boxes, "max_boxes");
        self
    }

    fn overlaps(&self, a: &OcrBox, b: &OcrBox) -> bool {
        if a.bbox.iou(&b.bbox) > self.iou_threshold as f64 {
            return true;
        }
        self.use_containment && (a.bbox.contains(&b.bbox) || b.bbox.contains(&a.bbox))
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            use_containment: true,
            max_boxes: DEFAULT_MAX_BOXES_PER_LABEL,
        }
    }
}

/// Disjoint sets over box indices.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Joins two sets; the smaller index becomes the root.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

/// Merges overlapping boxes and votes on their text.
pub fn merge_boxes(boxes: &[OcrBox], config: &MergeConfig) -> Vec<MergedBox> {
    merge_boxes_with_vocab(boxes, config, None)
}

/// Like [`merge_boxes`], breaking votes without a majority with `vocab`.
pub fn merge_boxes_with_vocab(
    boxes: &[OcrBox],
    config: &MergeConfig,
    vocab: Option<&Vocabulary>,
) -> Vec<MergedBox> {
    if boxes.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&OcrBox> = boxes.iter().collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .cmp(&b.bbox)
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.text.cmp(&b.text))
            .then_with(|| a.confidence.total_cmp(&b.confidence))
    });

    let mut sets = DisjointSet::new(sorted.len());
    for i in 0..sorted.len() {
        for j in (i + 1)..sorted.len() {
            if config.overlaps(sorted[i], sorted[j]) {
                sets.union(i, j);
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<&OcrBox>> = BTreeMap::new();
    for (i, ocr_box) in sorted.iter().enumerate() {
        groups.entry(sets.find(i)).or_default().push(ocr_box);
    }

    let total_groups = groups.len();
    let mut merged: Vec<MergedBox> = groups
        .into_values()
        .filter_map(|members| merge_group(&members, vocab))
        .collect();

    merged.sort_by(|a, b| {
        (a.bbox.left, a.bbox.top)
            .cmp(&(b.bbox.left, b.bbox.top))
            .then_with(|| a.bbox.cmp(&b.bbox))
            .then_with(|| a.text.cmp(&b.text))
    });

    debug!(
        "merged {} boxes into {} groups, {} with text",
        boxes.len(),
        total_groups,
        merged.len()
    );
    merged
}

fn merge_group(members: &[&OcrBox], vocab: Option<&Vocabulary>) -> Option<MergedBox> {
    let bbox = members
        .iter()
        .map(|b| b.bbox)
        .reduce(|acc, b| acc.union(&b))?;

    let mut by_source: BTreeMap<&BoxSource, Vec<&OcrBox>> = BTreeMap::new();
    for ocr_box in members.iter().filter(|b| b.has_text()) {
        by_source.entry(&ocr_box.source).or_default().push(ocr_box);
    }

    let candidates: Vec<Candidate> = by_source
        .into_values()
        .map(|mut fragments| {
            fragments.sort_by_key(|b| (b.bbox.left, b.bbox.top));
            let text = fragments.iter().map(|b| b.text.trim()).join(" ");
            let confidence =
                fragments.iter().map(|b| b.confidence).sum::<f32>() / fragments.len() as f32;
            Candidate::new(text, confidence)
        })
        .collect();

    let vote = vote_text(&candidates, vocab)?;
    Some(
        MergedBox::new(bbox, vote.text, vote.confidence)
            .with_support(members.len(), candidates.len()),
    )
}
