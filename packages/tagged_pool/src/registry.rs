use std::mem;
use std::num::NonZero;
use std::ptr;
use std::sync::{Arc, Weak};

use crate::Tag;
use crate::growth::{grow_slots, next_capacity, vacant_slots};

/// Records which tag every live (borrowed) object was acquired as.
///
/// Entries are kept in two parallel slot arrays that always have the same length: one holding
/// the identity of the object and one holding its tag. Lookup is a linear scan comparing
/// allocation addresses, so the equality and hashing behavior of `T` never come into play.
///
/// The identity is stored as a [`Weak`] reference. It pins the allocation address so that no
/// other object can take over the address while the entry exists, without keeping the value
/// alive. An object dropped by its borrower without being released is detectable as abandoned.
///
/// A vacant slot has `None` as its identity.
#[derive(Debug)]
pub(crate) struct LiveRegistry<T> {
    identities: Box<[Option<Weak<T>>]>,

    /// The tag of the entry at the same index in `identities`. Meaningless for vacant slots.
    tags: Box<[Tag]>,

    /// Number of occupied slots.
    len: usize,
}

impl<T> LiveRegistry<T> {
    #[must_use]
    pub(crate) fn new(capacity: NonZero<usize>) -> Self {
        Self {
            identities: vacant_slots(capacity.get()),
            tags: vacant_slots(capacity.get()),
            len: 0,
        }
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use and/or infinite loop.
    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        debug_assert_eq!(self.identities.len(), self.tags.len());

        self.identities.len()
    }

    /// Records `object` as live under `tag`, growing the registry if it is full.
    ///
    /// # Panics
    ///
    /// Panics if no vacant slot can be found even after growing, which means the size
    /// accounting of the registry is corrupt.
    pub(crate) fn record(&mut self, object: &Arc<T>, tag: Tag) {
        debug_assert!(
            self.find_index(object).is_none(),
            "an object can only be live once at a time"
        );

        let index = match self.vacant_index() {
            Some(index) => index,
            None => {
                self.grow();

                self.vacant_index().unwrap_or_else(|| {
                    panic!(
                        "live registry has no vacant slot after growing to {} slots while tracking {} entries; size accounting is corrupt",
                        self.capacity(),
                        self.len
                    )
                })
            }
        };

        let (Some(identity), Some(slot_tag)) =
            (self.identities.get_mut(index), self.tags.get_mut(index))
        else {
            panic!("live registry slot arrays are out of sync at index {index}");
        };

        *identity = Some(Arc::downgrade(object));
        *slot_tag = tag;

        // Cannot overflow: there are at most as many entries as slots.
        self.len = self.len.wrapping_add(1);
    }

    /// Finds the slot recording `object`, comparing by allocation address.
    #[must_use]
    pub(crate) fn find_index(&self, object: &Arc<T>) -> Option<usize> {
        let address = Arc::as_ptr(object);

        self.identities.iter().position(|identity| {
            identity
                .as_ref()
                .is_some_and(|weak| ptr::eq(weak.as_ptr(), address))
        })
    }

    /// Vacates the slot at `index` and returns the tag that was recorded in it.
    ///
    /// # Panics
    ///
    /// Panics if the slot is vacant.
    pub(crate) fn remove_at(&mut self, index: usize) -> Tag {
        let removed = self.identities.get_mut(index).and_then(Option::take);
        assert!(
            removed.is_some(),
            "attempted to remove vacant live registry slot {index}"
        );

        self.len = self
            .len
            .checked_sub(1)
            .expect("live registry length underflow means the size accounting is corrupt");

        *self
            .tags
            .get(index)
            .expect("tag array has the same length as the identity array")
    }

    /// Vacates every slot whose object has been dropped by its borrower without being released.
    ///
    /// Returns the number of slots vacated.
    pub(crate) fn clear_abandoned(&mut self) -> usize {
        let mut removed: usize = 0;

        for identity in &mut self.identities {
            if identity.as_ref().is_some_and(|weak| weak.strong_count() == 0) {
                *identity = None;
                removed = removed.wrapping_add(1);
            }
        }

        self.len = self
            .len
            .checked_sub(removed)
            .expect("cannot remove more abandoned entries than there are entries");

        removed
    }

    fn vacant_index(&self) -> Option<usize> {
        self.identities.iter().position(Option::is_none)
    }

    fn grow(&mut self) {
        let new_capacity = next_capacity::<Option<Weak<T>>>(self.capacity());

        // Both arrays grow in lockstep so that indexes keep pairing identities with tags.
        self.identities = grow_slots(mem::take(&mut self.identities), new_capacity);
        self.tags = grow_slots(mem::take(&mut self.tags), new_capacity);
    }

    #[cfg(test)]
    pub(crate) fn integrity_check(&self) {
        assert_eq!(
            self.identities.len(),
            self.tags.len(),
            "live registry identity and tag arrays must have the same length"
        );

        let occupied = self
            .identities
            .iter()
            .filter(|identity| identity.is_some())
            .count();

        assert_eq!(
            occupied, self.len,
            "live registry tracks {} entries but holds {occupied}",
            self.len
        );
    }
}
