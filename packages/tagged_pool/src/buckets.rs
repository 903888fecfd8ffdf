use std::mem;
use std::num::NonZero;
use std::sync::Arc;

use foldhash::{HashMap, HashMapExt};

use crate::Tag;
use crate::growth::{grow_slots, next_capacity, vacant_slots};

/// A growable slot array holding the idle objects of one tag.
///
/// Every occupied slot holds an object that is eligible for reuse. The order of slots carries no
/// meaning. The capacity only ever grows, even when the idle objects are evicted.
#[derive(Debug)]
pub(crate) struct Bucket<T> {
    slots: Box<[Option<Arc<T>>]>,

    /// Number of occupied slots. We track this explicitly to avoid scanning the slots on every
    /// count query.
    len: usize,
}

impl<T> Bucket<T> {
    #[must_use]
    pub(crate) fn with_capacity(capacity: NonZero<usize>) -> Self {
        Self {
            slots: vacant_slots(capacity.get()),
            len: 0,
        }
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Removes and returns one idle object, if there is any.
    pub(crate) fn take(&mut self) -> Option<Arc<T>> {
        if self.len == 0 {
            return None;
        }

        let object = self.slots.iter_mut().find_map(Option::take)?;

        self.len = self
            .len
            .checked_sub(1)
            .expect("bucket length underflow means the slot accounting is corrupt");

        Some(object)
    }

    /// Stores an idle object in a vacant slot, growing the bucket if it is full.
    pub(crate) fn put(&mut self, object: Arc<T>) {
        let index = match self.slots.iter().position(Option::is_none) {
            Some(index) => index,
            None => {
                let index = self.slots.len();
                let slots = mem::take(&mut self.slots);
                self.slots = grow_slots(slots, next_capacity::<Option<Arc<T>>>(index));
                index
            }
        };

        let slot = self
            .slots
            .get_mut(index)
            .expect("vacant slot index is always within the slot array");
        debug_assert!(slot.is_none());
        *slot = Some(object);

        // Cannot overflow: there are at most as many objects as slots.
        self.len = self.len.wrapping_add(1);
    }

    /// Removes all idle objects and hands them to the caller. The capacity is retained.
    ///
    /// The bucket is already empty by the time the caller drops the evicted objects, so a
    /// panicking `Drop` of an object cannot leave the length out of step with the slots.
    #[must_use]
    pub(crate) fn evict(&mut self) -> Vec<Arc<T>> {
        let evicted = self
            .slots
            .iter_mut()
            .filter_map(Option::take)
            .collect::<Vec<_>>();

        self.len = 0;

        evicted
    }

    /// Verifies that the tracked length matches the occupied slots.
    #[cfg(test)]
    pub(crate) fn integrity_check(&self) {
        let occupied = self.slots.iter().filter(|slot| slot.is_some()).count();

        assert_eq!(
            occupied, self.len,
            "bucket tracks {} idle objects but holds {occupied}",
            self.len
        );
    }
}

/// The idle objects of the pool, one [`Bucket`] per tag.
///
/// Buckets are created lazily on first use of a tag and are never removed.
#[derive(Debug)]
pub(crate) struct TypeBucketStore<T> {
    /// We use foldhash for better performance with small hash tables.
    buckets: HashMap<Tag, Bucket<T>>,

    /// Capacity of every newly created bucket.
    bucket_capacity: NonZero<usize>,
}

impl<T> TypeBucketStore<T> {
    #[must_use]
    pub(crate) fn new(bucket_capacity: NonZero<usize>) -> Self {
        Self {
            buckets: HashMap::new(),
            bucket_capacity,
        }
    }

    pub(crate) fn get_or_create_bucket(&mut self, tag: Tag) -> &mut Bucket<T> {
        let capacity = self.bucket_capacity;

        self.buckets
            .entry(tag)
            .or_insert_with(|| Bucket::with_capacity(capacity))
    }

    /// Removes and returns one idle object of the given tag.
    ///
    /// The bucket for the tag is created if it does not exist yet, so that a first miss on a tag
    /// leaves behind an empty bucket ready to receive the object once it is released.
    pub(crate) fn take(&mut self, tag: Tag) -> Option<Arc<T>> {
        self.get_or_create_bucket(tag).take()
    }

    /// Stores an idle object in the bucket of the given tag, creating the bucket if needed.
    pub(crate) fn put(&mut self, tag: Tag, object: Arc<T>) {
        self.get_or_create_bucket(tag).put(object);
    }

    #[must_use]
    pub(crate) fn count(&self, tag: Tag) -> usize {
        self.buckets.get(&tag).map_or(0, Bucket::len)
    }

    #[must_use]
    pub(crate) fn capacity(&self, tag: Tag) -> usize {
        self.buckets.get(&tag).map_or(0, Bucket::capacity)
    }

    /// Tags that have a bucket, in ascending order.
    #[must_use]
    pub(crate) fn tags(&self) -> Vec<Tag> {
        let mut tags = self.buckets.keys().copied().collect::<Vec<_>>();
        tags.sort_unstable();
        tags
    }

    /// Removes all idle objects of the given tag and hands them to the caller.
    ///
    /// Evicting an unknown tag does not create a bucket for it.
    #[must_use]
    pub(crate) fn evict(&mut self, tag: Tag) -> Vec<Arc<T>> {
        self.buckets
            .get_mut(&tag)
            .map_or_else(Vec::new, Bucket::evict)
    }

    /// Removes the idle objects of every tag and hands them to the caller.
    #[must_use]
    pub(crate) fn evict_all(&mut self) -> Vec<Arc<T>> {
        self.buckets.values_mut().flat_map(Bucket::evict).collect()
    }

    #[cfg(test)]
    pub(crate) fn integrity_check(&self) {
        for bucket in self.buckets.values() {
            bucket.integrity_check();
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn new_bucket_is_empty() {
        let bucket = Bucket::<u32>::with_capacity(nz!(4));

        assert_eq!(bucket.len(), 0);
        assert_eq!(bucket.capacity(), 4);
        bucket.integrity_check();
    }

    #[test]
    fn take_from_empty_bucket_is_none() {
        let mut bucket = Bucket::<u32>::with_capacity(nz!(4));
        assert!(bucket.take().is_none());
    }

    #[test]
    fn put_then_take_returns_same_object() {
        let mut bucket = Bucket::with_capacity(nz!(4));
        let object = Arc::new(42_u32);

        bucket.put(Arc::clone(&object));
        assert_eq!(bucket.len(), 1);

        let taken = bucket.take().expect("bucket holds one object");
        assert!(Arc::ptr_eq(&taken, &object));
        assert_eq!(bucket.len(), 0);
        bucket.integrity_check();
    }

    #[test]
    fn put_beyond_capacity_grows() {
        let mut bucket = Bucket::with_capacity(nz!(2));
        let objects = (0..10_u32).map(Arc::new).collect::<Vec<_>>();

        for object in &objects {
            bucket.put(Arc::clone(object));
        }

        assert_eq!(bucket.len(), 10);
        assert!(bucket.capacity() >= 10);
        bucket.integrity_check();

        // Every object put in comes back out exactly once.
        let mut taken = Vec::new();
        while let Some(object) = bucket.take() {
            taken.push(object);
        }

        assert_eq!(taken.len(), 10);
        for object in &objects {
            assert_eq!(taken.iter().filter(|t| Arc::ptr_eq(t, object)).count(), 1);
        }
    }

    #[test]
    fn put_reuses_vacated_slots() {
        let mut bucket = Bucket::with_capacity(nz!(2));

        bucket.put(Arc::new(1_u32));
        bucket.put(Arc::new(2_u32));
        _ = bucket.take();
        bucket.put(Arc::new(3_u32));

        assert_eq!(bucket.capacity(), 2);
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn evict_keeps_capacity() {
        let mut bucket = Bucket::with_capacity(nz!(1));

        for value in 0..20_u32 {
            bucket.put(Arc::new(value));
        }

        let capacity = bucket.capacity();
        let evicted = bucket.evict();

        assert_eq!(evicted.len(), 20);
        assert_eq!(bucket.len(), 0);
        assert_eq!(bucket.capacity(), capacity);
        assert!(bucket.take().is_none());
        bucket.integrity_check();
    }

    #[test]
    fn evict_hands_over_references() {
        let mut bucket = Bucket::with_capacity(nz!(4));
        let object = Arc::new(String::from("idle"));

        bucket.put(Arc::clone(&object));
        assert_eq!(Arc::strong_count(&object), 2);

        let evicted = bucket.evict();
        assert_eq!(bucket.len(), 0);
        bucket.integrity_check();

        // The bucket no longer holds a reference; only the evicted copy does.
        assert_eq!(Arc::strong_count(&object), 2);
        assert_eq!(evicted.len(), 1);
        assert!(evicted.iter().all(|held| Arc::ptr_eq(held, &object)));

        drop(evicted);
        assert_eq!(Arc::strong_count(&object), 1);
    }

    #[test]
    fn store_take_creates_bucket() {
        let mut store = TypeBucketStore::<u32>::new(nz!(4));
        let tag = Tag::new(5);

        assert!(store.take(tag).is_none());

        assert_eq!(store.tags(), vec![tag]);
        assert_eq!(store.count(tag), 0);
        assert_eq!(store.capacity(tag), 4);
    }

    #[test]
    fn store_unknown_tag_counts_are_zero() {
        let store = TypeBucketStore::<u32>::new(nz!(4));

        assert_eq!(store.count(Tag::new(1)), 0);
        assert_eq!(store.capacity(Tag::new(1)), 0);
        assert!(store.tags().is_empty());
    }

    #[test]
    fn store_keeps_tags_apart() {
        let mut store = TypeBucketStore::new(nz!(4));
        let a = Tag::new(1);
        let b = Tag::new(2);

        store.put(a, Arc::new("a"));
        store.put(a, Arc::new("a"));
        store.put(b, Arc::new("b"));

        assert_eq!(store.count(a), 2);
        assert_eq!(store.count(b), 1);

        assert_eq!(*store.take(b).expect("b has one object"), "b");
        assert!(store.take(b).is_none());
        assert_eq!(store.count(a), 2);
    }

    #[test]
    fn store_evict_one_tag() {
        let mut store = TypeBucketStore::new(nz!(4));
        let a = Tag::new(1);
        let b = Tag::new(2);

        store.put(a, Arc::new(1_u8));
        store.put(b, Arc::new(2_u8));

        let evicted = store.evict(a);
        assert_eq!(evicted.iter().map(|object| **object).collect::<Vec<_>>(), vec![1]);
        assert_eq!(store.count(a), 0);
        assert_eq!(store.count(b), 1);

        // Evicting an unknown tag does not create a bucket.
        assert!(store.evict(Tag::new(99)).is_empty());
        assert_eq!(store.tags(), vec![a, b]);
    }

    #[test]
    fn store_evict_all() {
        let mut store = TypeBucketStore::new(nz!(4));

        for tag in 0..5 {
            store.put(Tag::new(tag), Arc::new(tag));
        }

        let mut evicted = store
            .evict_all()
            .iter()
            .map(|object| **object)
            .collect::<Vec<_>>();
        evicted.sort_unstable();
        assert_eq!(evicted, vec![0, 1, 2, 3, 4]);

        for tag in 0..5 {
            assert_eq!(store.count(Tag::new(tag)), 0);
            assert_eq!(store.capacity(Tag::new(tag)), 4);
        }

        store.integrity_check();
    }
}
