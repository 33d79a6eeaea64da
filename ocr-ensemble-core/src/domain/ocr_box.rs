//! OCR fragments as read from one pipeline/engine run.

use crate::processors::BoundingBox;
use std::fmt;
use std::sync::Arc;

/// Identifies which preprocessing pipeline and OCR engine produced a box.
///
/// Boxes from the same source are concatenated before voting, so two
/// fragments one engine split apart still count as a single vote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxSource {
    /// The image-preprocessing pipeline, usually the OCR output directory name.
    pub pipeline: Arc<str>,
    /// The OCR engine, empty when the output does not say.
    pub engine: Arc<str>,
}

impl BoxSource {
    /// Creates a source identity.
    pub fn new(pipeline: impl Into<Arc<str>>, engine: impl Into<Arc<str>>) -> Self {
        Self {
            pipeline: pipeline.into(),
            engine: engine.into(),
        }
    }

    /// Creates a source identity that only names a pipeline.
    pub fn pipeline(pipeline: impl Into<Arc<str>>) -> Self {
        Self::new(pipeline, "")
    }
}

impl fmt::Display for BoxSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.engine.is_empty() {
            write!(f, "{}", self.pipeline)
        } else {
            write!(f, "{}/{}", self.pipeline, self.engine)
        }
    }
}

/// One detected text fragment from one OCR run.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrBox {
    /// Where the fragment is on the label.
    pub bbox: BoundingBox,
    /// The recognised text, trimmed; may be empty.
    pub text: String,
    /// Engine confidence in `[0, 1]`.
    pub confidence: f32,
    /// The pipeline/engine that produced the fragment.
    pub source: BoxSource,
}

impl OcrBox {
    /// Creates a box, clamping the confidence into `[0, 1]`.
    pub fn new(
        bbox: BoundingBox,
        text: impl Into<String>,
        confidence: f32,
        source: BoxSource,
    ) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    /// Returns true when the box carries any non-whitespace text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
