//! Error types for the OCR ensemble pipeline.
//!
//! Row-level problems (a malformed CSV row, a box with negative extent) are
//! never errors: they are dropped and counted during ingestion. The types here
//! cover failures that stop one label from being processed, plus configuration
//! problems that stop a run before it starts.

use std::path::PathBuf;
use thiserror::Error;

/// The stage of the ensemble pipeline in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Reading OCR output files into box records.
    Ingestion,
    /// Clustering boxes and voting on their text.
    Merge,
    /// Assigning merged boxes to reading-order rows.
    RowFinding,
    /// Font sizing and straightening rows.
    Arrangement,
    /// Drawing the reconstructed label image.
    Rendering,
    /// Writing text or image output.
    Output,
    /// Batch scheduling.
    Batch,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Ingestion => write!(f, "ingestion"),
            ProcessingStage::Merge => write!(f, "box merge"),
            ProcessingStage::RowFinding => write!(f, "row finding"),
            ProcessingStage::Arrangement => write!(f, "arrangement"),
            ProcessingStage::Rendering => write!(f, "rendering"),
            ProcessingStage::Output => write!(f, "output"),
            ProcessingStage::Batch => write!(f, "batch processing"),
        }
    }
}

/// Errors that can occur while building label ensembles.
#[derive(Error, Debug)]
pub enum EnsembleError {
    /// A stage failed because of an underlying error.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        kind: ProcessingStage,
        /// What was being done when it failed.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The label crop needed for image output does not exist.
    #[error("missing label image: {}", path.display())]
    MissingImage {
        /// Where the image was expected.
        path: PathBuf,
    },

    /// Invalid input was handed to a stage.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A description of the problem.
        message: String,
    },

    /// A configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A description of the problem.
        message: String,
    },

    /// CSV reader failure that is not confined to one row.
    #[error("csv")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Convenient result alias for ensemble operations.
pub type EnsembleResult<T> = Result<T, EnsembleError>;

impl EnsembleError {
    /// Creates an error for a failure while ingesting OCR output.
    pub fn ingestion(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing_error(ProcessingStage::Ingestion, context, error)
    }

    /// Creates an error for a failure while rendering a reconstruction.
    pub fn rendering(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing_error(ProcessingStage::Rendering, context, error)
    }

    /// Creates an error for a failure while writing output.
    pub fn output(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing_error(ProcessingStage::Output, context, error)
    }

    /// Creates an error for any stage.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Returns the stage an error belongs to, when it carries one.
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            Self::Processing { kind, .. } => Some(*kind),
            Self::MissingImage { .. } => Some(ProcessingStage::Rendering),
            Self::Csv(_) => Some(ProcessingStage::Ingestion),
            _ => None,
        }
    }
}
