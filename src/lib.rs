//! # OCR Ensemble
//!
//! Reconciles the output of several OCR runs over the same herbarium label
//! into one best-guess reading, ordered top to bottom and left to right, and
//! optionally renders it as a clean text band under the original label crop.
//!
//! ## Features
//!
//! - CSV ingestion per pipeline/engine with tolerant row handling
//! - Box merging by IoU and containment with per-source text voting
//! - Row finding that follows slanted and curved lines
//! - Font fitting and straightened row layout for reconstructed images
//! - Batch processing on a thread pool with per-label failure isolation
//!
//! ## Modules
//!
//! * [`core`] - Errors, defaults, run configuration and logging setup
//! * [`pipeline`] - Label grouping, per-label reconciliation and the batch driver
//! * [`utils`] - Image I/O, rendering and atomic output
//!
//! The algorithms themselves live in `ocr-ensemble-core` and are re-exported
//! as [`domain`] and [`processors`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr_ensemble::prelude::*;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = EnsembleConfig::new();
//! config.ocr_dirs = vec![PathBuf::from("ocr/easyocr"), PathBuf::from("ocr/tesseract")];
//! config.output.text_dir = Some(PathBuf::from("ensemble/text"));
//!
//! let builder = EnsembleBuilder::new(config)?;
//! let report = builder.run_all()?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pipeline;
pub mod utils;

pub use ocr_ensemble_core::domain;
pub use ocr_ensemble_core::processors;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use ocr_ensemble_core::prelude::*;

    pub use crate::core::{ParallelPolicy, init_tracing};
    pub use crate::pipeline::{
        BatchReport, ConfigLoader, EnsembleBuilder, EnsembleConfig, LabelFiles, LabelReading,
        OutputConfig, build_label, group_files,
    };
    pub use crate::utils::LabelFont;
}
