//! The ensemble pipeline.
//!
//! Groups OCR output files by label, reconciles each label and writes its
//! text and reconstructed image, one label per unit of work.

mod config;
pub mod ensemble;
pub mod grouping;
pub mod orchestration;
pub mod stats;

pub use config::{ConfigFormat, ConfigLoader, EnsembleConfig, OutputConfig};
pub use ensemble::{LabelReading, build_label, read_ensemble, reconcile};
pub use grouping::{LabelFiles, group_files};
pub use orchestration::{EnsembleBuilder, LabelOutcome, ProcessingStrategy};
pub use stats::{BatchReport, ImageStatus, LabelSummary};
