//! Consensus boxes produced by the merger.

use crate::processors::BoundingBox;

/// One physical text fragment reconciled from overlapping OCR boxes.
///
/// Merged boxes are immutable. Later stages refer to them by their index in
/// the merger's output and return their own per-box results
/// ([`RowAssignment`](crate::processors::RowAssignment),
/// [`ArrangedBox`](crate::processors::ArrangedBox)) instead of mutating them.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedBox {
    /// Union of the member boxes' geometry.
    pub bbox: BoundingBox,
    /// The voted text; never empty.
    pub text: String,
    /// Confidence of the source whose text won the vote.
    pub confidence: f32,
    /// Number of OCR boxes in the group.
    pub support: usize,
    /// Number of distinct sources that contributed text.
    pub sources: usize,
}

impl MergedBox {
    /// Creates a merged box.
    pub fn new(bbox: BoundingBox, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
            support: 1,
            sources: 1,
        }
    }

    /// Sets how many boxes and sources back this fragment.
    pub fn with_support(mut self, support: usize, sources: usize) -> Self {
        self.support = support;
        self.sources = sources;
        self
    }
}
