//! The core module of the ensemble pipeline.
//!
//! Re-exports the errors, defaults and validation helpers of
//! `ocr-ensemble-core` and adds the run-level configuration types and logging
//! setup used by the batch driver.

pub mod config;

pub use ocr_ensemble_core::core::*;

pub use config::ParallelPolicy;

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
