//! Lowest-free-index slot allocation.
//!
//! A group's occupied indices always stay inside `[0, capacity)` but need
//! not be contiguous; deletes leave holes, and holes are handed out before
//! the occupied set is ever extended upward. The computation here is only a
//! candidate: the slot store's conflict-checked insert is what makes the
//! result stick under concurrency.

use std::collections::BTreeSet;

/// First index in `[0, capacity)` not present in `occupied`, or None when
/// the group is at capacity.
pub fn next_free_index(occupied: &BTreeSet<u32>, capacity: u32) -> Option<u32> {
    if occupied.len() as u64 >= capacity as u64 {
        return None;
    }
    (0..capacity).find(|i| !occupied.contains(i))
}

/// Read-only quota probe: true while the group can take one more slot.
pub fn has_capacity(occupied: &BTreeSet<u32>, capacity: u32) -> bool {
    (occupied.len() as u64) < capacity as u64
}
