//! Results reporting and persistence
//!
//! Turns dispatcher outcomes into the per-group report and stores finished
//! runs for later inspection.

pub(crate) mod report;
mod storage;

pub use report::{composition, GroupComposition, ResultAggregator, RunReport};
pub use storage::{ResultsStorage, StoredRun};
