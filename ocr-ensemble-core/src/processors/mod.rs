//! The reconciliation stages for one label's OCR boxes.
//!
//! # Modules
//!
//! * `geometry` - Integer bounding boxes, IoU and overlap measures
//! * `filter` - Removal of implausible boxes before merging
//! * `vote` - Text voting among the sources of one fragment
//! * `merge` - Grouping overlapping boxes into consensus boxes
//! * `rows` - Reading-order rows by marching center lines
//! * `arrange` - Font sizing and straightened row layout

pub mod arrange;
pub mod filter;
mod geometry;
pub mod merge;
pub mod rows;
pub mod vote;

pub use arrange::*;
pub use filter::{FilterConfig, filter_boxes};
pub use geometry::*;
pub use merge::{MergeConfig, merge_boxes, merge_boxes_with_vocab};
pub use rows::*;
pub use vote::{Candidate, Vocabulary, Vote, VoteRule, normalize_text, vote_text};
