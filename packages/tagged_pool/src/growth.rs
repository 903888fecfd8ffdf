use std::iter;
use std::ops::Range;

use crate::metrics::GROW_SLOTS;

/// Bytes the allocator is assumed to keep in front of every allocation. Capacity classes are
/// chosen so that the slot array plus this header fill a power-of-two sized block.
const ALLOCATION_HEADER_BYTES: usize = 12;

/// Smallest and (exclusive) largest power-of-two exponent of the capacity classes.
const SIZE_CLASS_SHIFTS: Range<u32> = 4..32;

/// Returns the number of slots of type `S` to allocate when at least `need` slots are required.
///
/// The result is the largest slot count whose byte size still fits in the smallest
/// "power of two minus allocator header" class that holds `need` slots. Requests beyond the
/// largest class are returned unchanged.
#[must_use]
pub(crate) fn ideal_capacity<S>(need: usize) -> usize {
    let slot_size = size_of::<S>().max(1);

    let Some(need_bytes) = need.checked_mul(slot_size) else {
        return need;
    };

    for shift in SIZE_CLASS_SHIFTS {
        let Some(class_bytes) = 1_usize
            .checked_shl(shift)
            .and_then(|bytes| bytes.checked_sub(ALLOCATION_HEADER_BYTES))
        else {
            break;
        };

        if need_bytes <= class_bytes {
            return class_bytes.checked_div(slot_size).unwrap_or(need);
        }
    }

    need
}

/// The capacity to grow a full slot array of `current` slots to.
#[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use and/or infinite loop.
#[must_use]
pub(crate) fn next_capacity<S>(current: usize) -> usize {
    ideal_capacity::<S>(current.saturating_mul(2).max(1))
}

/// Allocates a slot array of `capacity` vacant slots.
#[must_use]
pub(crate) fn vacant_slots<S: Default>(capacity: usize) -> Box<[S]> {
    iter::repeat_with(S::default).take(capacity).collect()
}

/// Replaces `slots` with a larger array, keeping existing slots in their original order and
/// filling the new tail with vacant slots.
///
/// # Panics
///
/// Panics if `new_capacity` is smaller than the current capacity. Slot arrays never shrink.
#[must_use]
pub(crate) fn grow_slots<S: Default>(slots: Box<[S]>, new_capacity: usize) -> Box<[S]> {
    assert!(
        new_capacity >= slots.len(),
        "slot arrays only grow: cannot go from {} to {new_capacity} slots",
        slots.len()
    );

    let mut grown = Vec::with_capacity(new_capacity);
    grown.extend(slots.into_vec());
    grown.resize_with(new_capacity, S::default);

    GROW_SLOTS.with(|e| e.observe(new_capacity));

    grown.into_boxed_slice()
}
