use std::fmt;
use std::num::NonZero;
use std::sync::Arc;

use crate::metrics::{
    ACQUIRE_CREATED, ACQUIRE_FAILED, ACQUIRE_REUSED, RELEASE_IGNORED, RELEASE_RETURNED,
};
use crate::{Error, LiveRegistry, Result, Tag, TaggedPoolBuilder, TypeBucketStore};

/// The object creation callback, with the factory contract already mapped to [`Error`].
pub(crate) type FactoryFn<T> = dyn Fn(Tag) -> Result<T> + Send + Sync;

/// An object pool that hands out reusable objects grouped by caller-defined [`Tag`]s.
///
/// Objects are handed out as [`Arc<T>`] and are identified by their allocation address. The pool
/// remembers the tag every live object was acquired as and returns the object to the idle bucket
/// of that tag when it is released.
///
/// This type requires exclusive access for every mutating operation. For a pool that can be
/// shared between threads, use [`TaggedPool`][crate::TaggedPool], which wraps this type behind a
/// single lock.
///
/// # Example
///
/// ```rust
/// use tagged_pool::{RawTaggedPool, Tag};
///
/// const A: Tag = Tag::new(1);
///
/// let mut pool = RawTaggedPool::builder()
///     .factory(|_| Some(String::new()))
///     .build_raw();
///
/// let object = pool.acquire(A).unwrap();
/// assert_eq!(pool.live_count(), 1);
///
/// pool.release(object);
/// assert_eq!(pool.live_count(), 0);
/// assert_eq!(pool.idle_count(A), 1);
/// ```
///
/// # Resource usage
///
/// The pool never shrinks. Buckets and the live object registry grow as needed and keep their
/// capacity even after [`clear()`](Self::clear) or [`clear_all()`](Self::clear_all).
///
/// # Thread safety
///
/// This type is thread-mobile ([`Send`]) when `T` is [`Send`] and [`Sync`].
pub struct RawTaggedPool<T> {
    buckets: TypeBucketStore<T>,
    live: LiveRegistry<T>,
    factory: Option<Box<FactoryFn<T>>>,
}

impl<T> RawTaggedPool<T> {
    /// Creates a new pool with no factory and default capacities.
    ///
    /// Use [`builder()`](Self::builder) to configure a factory.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build_raw()
    }

    /// Creates a builder for configuring and constructing a [`RawTaggedPool`].
    ///
    /// Finish with [`build_raw()`](TaggedPoolBuilder::build_raw).
    pub fn builder() -> TaggedPoolBuilder<T> {
        TaggedPoolBuilder::new()
    }

    #[must_use]
    pub(crate) fn new_inner(
        factory: Option<Box<FactoryFn<T>>>,
        bucket_capacity: NonZero<usize>,
        registry_capacity: NonZero<usize>,
    ) -> Self {
        Self {
            buckets: TypeBucketStore::new(bucket_capacity),
            live: LiveRegistry::new(registry_capacity),
            factory,
        }
    }

    /// Borrows an object of the given tag from the pool.
    ///
    /// An idle object of the tag is reused if there is one; otherwise the factory is asked to
    /// create a new object. Either way, the object is recorded as live under exactly `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if a new object was needed and the factory did not produce one. The
    /// pool state is unchanged in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tagged_pool::{RawTaggedPool, Tag};
    ///
    /// let mut pool = RawTaggedPool::builder()
    ///     .factory(|tag: Tag| Some(tag.get()))
    ///     .build_raw();
    ///
    /// let object = pool.acquire(Tag::new(5)).unwrap();
    /// assert_eq!(*object, 5);
    /// ```
    pub fn acquire(&mut self, tag: Tag) -> Result<Arc<T>> {
        let object = if let Some(object) = self.buckets.take(tag) {
            ACQUIRE_REUSED.with(|e| e.observe_once());
            object
        } else {
            match self.create(tag) {
                Ok(value) => {
                    ACQUIRE_CREATED.with(|e| e.observe_once());
                    Arc::new(value)
                }
                Err(error) => {
                    ACQUIRE_FAILED.with(|e| e.observe_once());
                    return Err(error);
                }
            }
        };

        self.live.record(&object, tag);

        Ok(object)
    }

    /// Borrows an object of [`Tag::DEFAULT`] from the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if a new object was needed and the factory did not produce one.
    pub fn acquire_default(&mut self) -> Result<Arc<T>> {
        self.acquire(Tag::DEFAULT)
    }

    /// Returns a borrowed object to the pool.
    ///
    /// The object becomes idle in the bucket of the tag it was acquired as. Releasing an object
    /// that is not currently live in this pool (one already released, or one that never came
    /// from this pool) does nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use tagged_pool::RawTaggedPool;
    ///
    /// let mut pool = RawTaggedPool::builder().factory(|_| Some(1_u8)).build_raw();
    ///
    /// let object = pool.acquire_default().unwrap();
    /// pool.release(Arc::clone(&object));
    ///
    /// // Releasing again is harmless.
    /// pool.release(object);
    /// assert_eq!(pool.idle_count_default(), 1);
    ///
    /// // So is releasing something the pool never handed out.
    /// pool.release(Arc::new(2));
    /// assert_eq!(pool.idle_count_default(), 1);
    /// ```
    pub fn release(&mut self, object: Arc<T>) {
        drop(self.release_inner(object));
    }

    /// Releases the object and returns it back if the pool did not take it.
    ///
    /// The pool state is fully updated before this returns, so the caller decides where the
    /// returned object is dropped.
    #[must_use]
    pub(crate) fn release_inner(&mut self, object: Arc<T>) -> Option<Arc<T>> {
        let Some(index) = self.live.find_index(&object) else {
            RELEASE_IGNORED.with(|e| e.observe_once());
            return Some(object);
        };

        let tag = self.live.remove_at(index);

        // If the bucket is gone, it is recreated. The tag is never reinterpreted.
        self.buckets.put(tag, object);

        RELEASE_RETURNED.with(|e| e.observe_once());

        None
    }

    /// Drops the pool's references to all idle objects of the given tag.
    ///
    /// Live objects are not affected and return to the (now empty) bucket when released.
    pub fn clear(&mut self, tag: Tag) {
        drop(self.evict(tag));
    }

    /// Drops the pool's references to all idle objects of every tag.
    ///
    /// Live objects are not affected.
    pub fn clear_all(&mut self) {
        drop(self.evict_all());
    }

    /// Removes the idle objects of the given tag and hands them to the caller to drop.
    #[must_use]
    pub(crate) fn evict(&mut self, tag: Tag) -> Vec<Arc<T>> {
        self.buckets.evict(tag)
    }

    /// Removes the idle objects of every tag and hands them to the caller to drop.
    #[must_use]
    pub(crate) fn evict_all(&mut self) -> Vec<Arc<T>> {
        self.buckets.evict_all()
    }

    /// Stops tracking live objects that were dropped by their borrower without being released.
    ///
    /// Such objects can never be released, so their registry entries only occupy space and
    /// count towards [`live_count()`](Self::live_count). Returns the number of entries removed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tagged_pool::RawTaggedPool;
    ///
    /// let mut pool = RawTaggedPool::builder().factory(|_| Some(0_u32)).build_raw();
    ///
    /// let kept = pool.acquire_default().unwrap();
    /// drop(pool.acquire_default().unwrap());
    /// assert_eq!(pool.live_count(), 2);
    ///
    /// assert_eq!(pool.clear_abandoned(), 1);
    /// assert_eq!(pool.live_count(), 1);
    /// # drop(kept);
    /// ```
    pub fn clear_abandoned(&mut self) -> usize {
        self.live.clear_abandoned()
    }

    /// The number of objects currently borrowed from the pool.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// The number of idle objects of the given tag held by the pool.
    ///
    /// Returns zero for tags the pool has never seen.
    #[must_use]
    pub fn idle_count(&self, tag: Tag) -> usize {
        self.buckets.count(tag)
    }

    /// The number of idle objects of [`Tag::DEFAULT`] held by the pool.
    #[must_use]
    pub fn idle_count_default(&self) -> usize {
        self.idle_count(Tag::DEFAULT)
    }

    /// The number of idle objects of the given tag the pool can hold without growing.
    ///
    /// Returns zero for tags the pool has never seen.
    #[must_use]
    pub fn idle_capacity(&self, tag: Tag) -> usize {
        self.buckets.capacity(tag)
    }

    /// The number of live objects the pool can track without growing.
    #[must_use]
    pub fn live_capacity(&self) -> usize {
        self.live.capacity()
    }

    /// The tags the pool has a bucket of idle objects for, in ascending order.
    ///
    /// A bucket is created the first time a tag is acquired or released.
    #[must_use]
    pub fn tags(&self) -> Vec<Tag> {
        self.buckets.tags()
    }

    fn create(&self, tag: Tag) -> Result<T> {
        match &self.factory {
            Some(factory) => factory(tag),
            None => Err(Error::NoFactory { tag }),
        }
    }

    /// Verifies the internal bookkeeping, panicking on any inconsistency.
    #[cfg(test)]
    pub(crate) fn integrity_check(&self) {
        self.buckets.integrity_check();
        self.live.integrity_check();
    }
}

impl<T> Default for RawTaggedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RawTaggedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawTaggedPool")
            .field("live_count", &self.live.len())
            .field("tags", &self.buckets.tags())
            .field("has_factory", &self.factory.is_some())
            .finish_non_exhaustive()
    }
}
