//! Group selection by position
//!
//! Lets a caller run a fixed subset of groups (for example one CI shard per
//! machine) against a partition whose size depends on what was discovered.

use tracing::debug;

use crate::models::Partition;

/// Keep only the groups at `indices`, in the order the indices are given.
///
/// `None` or an empty list means no filter. Indices past the end of the
/// partition are dropped and a repeated index selects its group only once.
/// Either is only visible in debug logs.
pub fn select<U>(partition: Partition<U>, indices: Option<&[usize]>) -> Partition<U> {
    let indices = match indices {
        Some(indices) if !indices.is_empty() => indices,
        _ => return partition,
    };

    let available = partition.len();
    let mut slots: Vec<Option<_>> = partition.into_iter().map(Some).collect();
    let mut selected: Partition<U> = Vec::with_capacity(indices.len());

    for &index in indices {
        match slots.get_mut(index) {
            None => debug!("Ignoring group index {} ({} groups)", index, available),
            Some(slot) => match slot.take() {
                Some(group) => selected.push(group),
                None => debug!("Ignoring repeated group index {}", index),
            },
        }
    }

    debug!(
        "Selected {} of {} groups with indices {:?}",
        selected.len(),
        available,
        indices
    );

    selected
}
