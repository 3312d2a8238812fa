//! Test partitioning
//!
//! Splits discovered units into at most `k` groups with a longest-processing-
//! time-first heuristic, and optionally narrows the result down to a subset
//! of groups chosen by position.

mod lpt;
mod selector;

pub use lpt::partition;
pub use selector::select;

use thiserror::Error;

/// Partitioning errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PartitionError {
    #[error("Invalid group count: {0} (must be at least 1)")]
    InvalidGroupCount(usize),
}
