//! Run-level configuration shared by the pipeline and the binary.

pub mod parallel;

pub use parallel::ParallelPolicy;
