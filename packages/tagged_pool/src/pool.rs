use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{RawTaggedPool, Result, Tag, TaggedPoolBuilder};

/// A thread-safe object pool that hands out reusable objects grouped by caller-defined [`Tag`]s.
///
/// This type acts as a cloneable handle to a shared [`RawTaggedPool`]. Every operation, including
/// the read-only counts, takes a single lock covering the whole pool, so all pool traffic is
/// serialized across every tag. The factory also runs under this lock and must therefore be fast
/// and must not block.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use tagged_pool::{Tag, TaggedPool};
///
/// const A: Tag = Tag::new(1);
/// const B: Tag = Tag::new(2);
///
/// let pool = TaggedPool::builder()
///     .factory(|tag: Tag| Some(format!("object of tag {tag}")))
///     .build();
///
/// let worker_pool = pool.clone();
/// thread::spawn(move || {
///     let object = worker_pool.acquire(B).unwrap();
///     worker_pool.release(object);
/// })
/// .join()
/// .unwrap();
///
/// let a = pool.acquire(A).unwrap();
/// assert_eq!(pool.live_count(), 1);
/// assert_eq!(pool.idle_count(B), 1);
///
/// pool.release(a);
/// assert_eq!(pool.idle_count(A), 1);
/// ```
///
/// # Lock poisoning
///
/// A panicking factory poisons the lock, but it does so before the pool state is touched. The
/// pool therefore keeps working after a factory panic instead of propagating the poison.
///
/// Objects the pool lets go of in [`clear()`](Self::clear), [`clear_all()`](Self::clear_all)
/// or an ignored [`release()`](Self::release) are dropped after the lock is released. Their
/// `Drop` may panic or call back into the pool without affecting it.
///
/// # Thread safety
///
/// This type is thread-safe ([`Send`] and [`Sync`]) when `T` is [`Send`] and [`Sync`].
pub struct TaggedPool<T> {
    inner: Arc<Mutex<RawTaggedPool<T>>>,
}

impl<T> TaggedPool<T> {
    /// Creates a new pool with no factory and default capacities.
    ///
    /// Use [`builder()`](Self::builder) to configure a factory.
    #[must_use]
    pub fn new() -> Self {
        Self::from(RawTaggedPool::new())
    }

    /// Creates a builder for configuring and constructing a [`TaggedPool`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use tagged_pool::TaggedPool;
    ///
    /// let pool = TaggedPool::builder().factory(|_| Some(0_u64)).build();
    /// assert_eq!(*pool.acquire_default().unwrap(), 0);
    /// ```
    pub fn builder() -> TaggedPoolBuilder<T> {
        TaggedPoolBuilder::new()
    }

    /// Borrows an object of the given tag from the pool.
    ///
    /// See [`RawTaggedPool::acquire()`].
    ///
    /// # Errors
    ///
    /// Returns an error if a new object was needed and the factory did not produce one. The
    /// pool state is unchanged in that case.
    pub fn acquire(&self, tag: Tag) -> Result<Arc<T>> {
        self.lock().acquire(tag)
    }

    /// Borrows an object of [`Tag::DEFAULT`] from the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if a new object was needed and the factory did not produce one.
    pub fn acquire_default(&self) -> Result<Arc<T>> {
        self.acquire(Tag::DEFAULT)
    }

    /// Returns a borrowed object to the pool.
    ///
    /// Releasing an object that is not currently live in this pool does nothing.
    /// See [`RawTaggedPool::release()`].
    pub fn release(&self, object: Arc<T>) {
        let ignored = self.lock().release_inner(object);

        // May be the last reference, so it is dropped only after the lock is released.
        drop(ignored);
    }

    /// Drops the pool's references to all idle objects of the given tag.
    ///
    /// Live objects are not affected. The evicted objects are dropped after the lock is
    /// released, so their `Drop` may use the pool.
    pub fn clear(&self, tag: Tag) {
        let evicted = self.lock().evict(tag);
        drop(evicted);
    }

    /// Drops the pool's references to all idle objects of every tag.
    ///
    /// Live objects are not affected. The evicted objects are dropped after the lock is
    /// released, so their `Drop` may use the pool.
    pub fn clear_all(&self) {
        let evicted = self.lock().evict_all();
        drop(evicted);
    }

    /// Stops tracking live objects that were dropped by their borrower without being released.
    ///
    /// Returns the number of entries removed. See [`RawTaggedPool::clear_abandoned()`].
    pub fn clear_abandoned(&self) -> usize {
        self.lock().clear_abandoned()
    }

    /// The number of objects currently borrowed from the pool.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.lock().live_count()
    }

    /// The number of idle objects of the given tag held by the pool.
    #[must_use]
    pub fn idle_count(&self, tag: Tag) -> usize {
        self.lock().idle_count(tag)
    }

    /// The number of idle objects of [`Tag::DEFAULT`] held by the pool.
    #[must_use]
    pub fn idle_count_default(&self) -> usize {
        self.lock().idle_count_default()
    }

    /// The number of idle objects of the given tag the pool can hold without growing.
    #[must_use]
    pub fn idle_capacity(&self, tag: Tag) -> usize {
        self.lock().idle_capacity(tag)
    }

    /// The number of live objects the pool can track without growing.
    #[must_use]
    pub fn live_capacity(&self) -> usize {
        self.lock().live_capacity()
    }

    /// The tags the pool has a bucket of idle objects for, in ascending order.
    #[must_use]
    pub fn tags(&self) -> Vec<Tag> {
        self.lock().tags()
    }

    fn lock(&self) -> MutexGuard<'_, RawTaggedPool<T>> {
        // The only foreign code run under the lock is the factory, and it returns before the
        // pool state is mutated. Objects leaving the pool are dropped outside the lock. A
        // poisoned lock therefore still guards consistent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> From<RawTaggedPool<T>> for TaggedPool<T> {
    /// Wraps an existing pool, including any objects it holds, for shared use.
    fn from(pool: RawTaggedPool<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }
}

impl<T> Clone for TaggedPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for TaggedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TaggedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedPool")
            .field("inner", &self.inner)
            .finish()
    }
}
