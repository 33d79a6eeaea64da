//! Errors, defaults and configuration validation shared by every stage.

pub mod constants;
pub mod errors;
pub mod validation;

pub use constants::*;
pub use errors::{EnsembleError, EnsembleResult, ProcessingStage};
