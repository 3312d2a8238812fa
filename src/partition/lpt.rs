//! Longest-processing-time-first partitioning
//!
//! Units are sorted by descending cost and each one is handed to the group
//! with the smallest running cost. Ties between equally loaded groups go to
//! the group that has waited longest since its last assignment, which keeps
//! the result deterministic for identical input.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

use super::PartitionError;
use crate::models::{Partition, TestGroup, TestUnit};

/// Heap key: running cost, then assignment sequence, then group slot
type Slot = Reverse<(u64, u64, usize)>;

/// Partition `units` into at most `num_groups` groups minimizing the largest
/// group cost.
///
/// When there are no more units than groups, every unit gets its own group in
/// input order. Otherwise the result has exactly `num_groups` groups, emitted
/// in slot order.
pub fn partition<U: TestUnit>(
    units: Vec<U>,
    num_groups: usize,
) -> Result<Partition<U>, PartitionError> {
    if num_groups == 0 {
        return Err(PartitionError::InvalidGroupCount(num_groups));
    }

    if units.len() <= num_groups {
        return Ok(units
            .into_iter()
            .enumerate()
            .map(|(index, unit)| TestGroup::new(index, vec![unit]))
            .collect());
    }

    let mut units = units;
    // Stable, so equal costs keep their input order
    units.sort_by_key(|unit| Reverse(unit.cost()));

    let mut members: Vec<Vec<U>> = (0..num_groups).map(|_| Vec::new()).collect();
    let mut heap: BinaryHeap<Slot> = (0..num_groups)
        .map(|slot| Reverse((0, slot as u64, slot)))
        .collect();
    let mut sequence = num_groups as u64;

    for unit in units {
        // The heap always holds `num_groups` entries, so the top is present
        if let Some(mut top) = heap.peek_mut() {
            let Reverse((load, _, slot)) = *top;
            let load = load + unit.cost();
            members[slot].push(unit);
            *top = Reverse((load, sequence, slot));
            sequence += 1;
        }
    }

    let groups: Partition<U> = members
        .into_iter()
        .enumerate()
        .map(|(index, units)| TestGroup::new(index, units))
        .collect();

    debug!(
        "Partitioned into {} groups, max cost {}",
        groups.len(),
        groups.iter().map(TestGroup::total_cost).max().unwrap_or(0)
    );

    Ok(groups)
}
