//! Utility functions for the ensemble pipeline.
//!
//! Image loading and encoding, reconstruction rendering and atomic output
//! writing.

pub mod image;
pub mod output;
pub mod render;

pub use image::{encode_image, load_image};
pub use output::write_atomic;
pub use render::{LabelFont, compose_label_image, render_reconstruction};
