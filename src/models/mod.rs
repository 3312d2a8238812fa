//! Data models for partitioned test runs
//!
//! This module contains the test unit abstraction, the suite file format and
//! the group/outcome types that flow between partitioning, dispatch and
//! reporting.

mod group;
mod unit;

pub use group::{GroupOutcome, GroupStatus, Partition, TestGroup};
pub use unit::{CaseDef, SuiteFile, TestUnit};
