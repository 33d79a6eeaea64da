//! Validation helpers for configuration values.
//!
//! Thresholds and sizes that arrive out of range are clamped with a warning
//! rather than rejected, so one bad value in a config file never stops a run.
//! The strict check at the bottom is for values that have no sensible clamp.

use crate::core::EnsembleError;
use tracing::warn;

/// Validates and clamps a threshold value to the range [0.0, 1.0].
pub fn validate_threshold(threshold: f32, param_name: &str) -> f32 {
    if (0.0..=1.0).contains(&threshold) {
        threshold
    } else if threshold.is_nan() {
        warn!("{param_name} is NaN; using 0.0");
        0.0
    } else {
        warn!("{param_name} out of range [{threshold}], clamping to [0.0, 1.0]");
        threshold.clamp(0.0, 1.0)
    }
}

/// Validates and ensures a size value is at least 1.
pub fn validate_min_size_u32(size: u32, param_name: &str) -> u32 {
    if size >= 1 {
        size
    } else {
        warn!("{param_name} must be >= 1, got {size}; using 1");
        1
    }
}

/// Validates and ensures a size value is at least 1.
pub fn validate_min_size_usize(size: usize, param_name: &str) -> usize {
    if size >= 1 {
        size
    } else {
        warn!("{param_name} must be >= 1, got {size}; using 1");
        1
    }
}

/// Validates and ensures a positive float value.
pub fn validate_positive_f32(value: f32, param_name: &str, default: f32) -> f32 {
    if value > 0.0 {
        value
    } else {
        warn!("{param_name} must be > 0.0, got {value}; using {default}");
        default
    }
}

/// Orders a `(min, max)` pair, swapping them with a warning when reversed.
pub fn validate_size_range(min: u32, max: u32, param_name: &str) -> (u32, u32) {
    if min <= max {
        (min, max)
    } else {
        warn!("{param_name}: minimum {min} exceeds maximum {max}; swapping");
        (max, min)
    }
}

/// Validates that a collection is not empty.
#[inline]
pub fn validate_non_empty<T>(items: &[T], param_name: &str) -> Result<(), EnsembleError> {
    if items.is_empty() {
        return Err(EnsembleError::InvalidInput {
            message: format!("Parameter '{}' cannot be empty", param_name),
        });
    }
    Ok(())
}
