//! Domain types for OCR ensembles.
//!
//! Records flow one way: [`BoxRecordStore`]s are read per OCR output file and
//! concatenated into an [`Ensemble`], which the merger reduces to
//! [`MergedBox`]es.

pub mod ensemble;
pub mod merged_box;
pub mod ocr_box;
pub mod records;

pub use ensemble::Ensemble;
pub use merged_box::MergedBox;
pub use ocr_box::{BoxSource, OcrBox};
pub use records::{BoxRecordStore, IngestStats};
