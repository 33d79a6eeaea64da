//! Default values shared across the ensemble stages.

/// Default IoU above which two OCR boxes are treated as the same fragment.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.3;

/// Default horizontal-overlap fraction below which a box may continue a row.
///
/// A box whose horizontal overlap with a row's last box reaches this fraction
/// of the narrower width is stacked text, not a continuation.
pub const DEFAULT_ROW_WIDTH_THRESHOLD: f32 = 0.5;

/// Default largest font size tried when fitting reconstructed text.
pub const DEFAULT_BASE_FONT_SIZE: u32 = 42;

/// Default smallest font size; text that does not fit is drawn at this size.
pub const DEFAULT_MIN_FONT_SIZE: u32 = 17;

/// Default spacing between reconstructed rows, in pixels.
pub const DEFAULT_GUTTER: u32 = 12;

/// Largest absolute pixel coordinate accepted from OCR output, the widest
/// image a JPEG can hold.
pub const MAX_COORDINATE: i32 = 65_535;

/// Default cap on boxes per label before the ensemble is truncated.
pub const DEFAULT_MAX_BOXES_PER_LABEL: usize = 2000;

/// Default number of labels at or below which a batch runs sequentially.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1;
