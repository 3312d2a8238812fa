//! Group and outcome models
//!
//! A partition is an ordered list of groups; every dispatched group yields
//! exactly one outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TestUnit;

/// Ordered sequence of groups produced by the partitioner
pub type Partition<U> = Vec<TestGroup<U>>;

/// Units assigned to run together in one worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestGroup<U> {
    index: usize,
    units: Vec<U>,
    total_cost: u64,
}

impl<U: TestUnit> TestGroup<U> {
    /// Build a group, deriving its total cost from the members
    pub fn new(index: usize, units: Vec<U>) -> Self {
        let total_cost = units.iter().map(TestUnit::cost).sum();
        Self {
            index,
            units,
            total_cost,
        }
    }
}

impl<U> TestGroup<U> {
    /// Position of the group in the partition, stable for the whole run
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn units(&self) -> &[U] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Sum of member costs
    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }
}

impl<U> fmt::Display for TestGroup<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Group-{}: {} classes, {} cases",
            self.index,
            self.units.len(),
            self.total_cost
        )
    }
}

/// Pass/fail state of a whole group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupStatus {
    Ok,
    Ng,
}

impl GroupStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, GroupStatus::Ok)
    }
}

impl From<bool> for GroupStatus {
    fn from(success: bool) -> Self {
        if success {
            GroupStatus::Ok
        } else {
            GroupStatus::Ng
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupStatus::Ok => write!(f, "OK"),
            GroupStatus::Ng => write!(f, "NG"),
        }
    }
}

/// Result of dispatching one group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOutcome {
    /// Index of the originating group
    pub index: usize,
    pub success: bool,
}

impl GroupOutcome {
    pub fn new(index: usize, success: bool) -> Self {
        Self { index, success }
    }

    pub fn status(&self) -> GroupStatus {
        GroupStatus::from(self.success)
    }
}
