//! # OCR Ensemble Core
//!
//! Geometry, box merging, text voting, row finding and layout for reconciling
//! several OCR runs over the same label into one reading.
//!
//! The stages are pure functions over in-memory boxes. Each one returns its
//! own result type keyed by box index, so nothing is mutated between stages:
//!
//! ```text
//! BoxRecordStore* -> Ensemble -> filter_boxes -> merge_boxes -> find_rows_of_text -> arrange_rows
//! ```
//!
//! ## Modules
//!
//! * [`core`] - Errors, defaults and configuration validation
//! * [`domain`] - OCR boxes, CSV ingestion, ensembles and merged boxes
//! * [`processors`] - The merge, row and layout stages

pub mod core;
pub mod domain;
pub mod processors;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error Handling
    pub use crate::core::{EnsembleError, EnsembleResult, ProcessingStage};

    // Domain types
    pub use crate::domain::{BoxRecordStore, BoxSource, Ensemble, MergedBox, OcrBox};

    // Geometry types
    pub use crate::processors::BoundingBox;

    // Stages
    pub use crate::processors::{
        ArrangeConfig, ArrangedBox, Arrangement, FilterConfig, MergeConfig, MonospaceMeasure,
        RowAssignment, RowConfig, RowLayout, TextExtent, TextMeasure, Vocabulary, arrange_rows,
        filter_boxes, find_rows, find_rows_of_text, merge_boxes, merge_boxes_with_vocab,
    };
}
