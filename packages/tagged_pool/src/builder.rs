use std::fmt;
use std::num::NonZero;

use new_zealand::nz;

use crate::{Error, FactoryFn, RawTaggedPool, Tag, TaggedPool};

/// Capacity of every bucket when it is first created, unless configured otherwise.
pub(crate) const DEFAULT_BUCKET_CAPACITY: NonZero<usize> = nz!(4);

/// Capacity of the live object registry when the pool is created, unless configured otherwise.
pub(crate) const DEFAULT_REGISTRY_CAPACITY: NonZero<usize> = nz!(4);

/// Builder for creating an instance of [`TaggedPool`] or [`RawTaggedPool`].
///
/// All settings are optional. Without a factory, the pool can only hand out objects that were
/// previously released into it, which in practice means every acquire fails with
/// [`Error::NoFactory`]. Most pools therefore configure a factory.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use tagged_pool::{Tag, TaggedPool};
///
/// const SMALL: Tag = Tag::new(1);
///
/// let pool = TaggedPool::builder()
///     .factory(|tag| {
///         Some(if tag == SMALL {
///             Vec::<u8>::with_capacity(64)
///         } else {
///             Vec::with_capacity(4096)
///         })
///     })
///     .bucket_capacity(NonZero::new(16).unwrap())
///     .build();
///
/// let buffer = pool.acquire(SMALL).unwrap();
/// assert!(buffer.capacity() >= 64);
/// ```
#[must_use]
pub struct TaggedPoolBuilder<T> {
    factory: Option<Box<FactoryFn<T>>>,
    bucket_capacity: NonZero<usize>,
    registry_capacity: NonZero<usize>,
}

impl<T> TaggedPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            factory: None,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
        }
    }

    /// Sets the factory used to create a new object when the pool has no idle object for the
    /// requested tag.
    ///
    /// The factory receives the requested tag. Returning `None` violates the factory contract
    /// and causes the acquire to fail with [`Error::EmptyResult`].
    ///
    /// The factory is called while the pool lock is held, so it must be fast and must not
    /// access the same pool.
    ///
    /// Replaces any previously configured factory.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagged_pool::{Tag, TaggedPool};
    ///
    /// let pool = TaggedPool::builder()
    ///     .factory(|tag: Tag| Some(format!("object for tag {tag}")))
    ///     .build();
    ///
    /// let object = pool.acquire(Tag::new(3)).unwrap();
    /// assert_eq!(*object, "object for tag 3");
    /// ```
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(Tag) -> Option<T> + Send + Sync + 'static,
        T: 'static,
    {
        self.factory = Some(Box::new(move |tag| {
            factory(tag).ok_or(Error::EmptyResult { tag })
        }));
        self
    }

    /// Sets a fallible factory used to create a new object when the pool has no idle object
    /// for the requested tag.
    ///
    /// An error returned by the factory is propagated to the caller of the acquire operation
    /// as [`Error::FactoryFailed`]. The pool does not retry.
    ///
    /// Replaces any previously configured factory.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// use tagged_pool::{Error, Tag, TaggedPool};
    ///
    /// let pool = TaggedPool::builder()
    ///     .try_factory(|tag: Tag| {
    ///         if tag.get() < 10 {
    ///             Ok(tag.get())
    ///         } else {
    ///             Err(io::Error::other("tag out of range"))
    ///         }
    ///     })
    ///     .build();
    ///
    /// assert_eq!(*pool.acquire(Tag::new(2)).unwrap(), 2);
    /// assert!(matches!(
    ///     pool.acquire(Tag::new(20)),
    ///     Err(Error::FactoryFailed { .. })
    /// ));
    /// ```
    pub fn try_factory<F, E>(mut self, factory: F) -> Self
    where
        F: Fn(Tag) -> Result<T, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        T: 'static,
    {
        self.factory = Some(Box::new(move |tag| {
            factory(tag).map_err(|source| Error::FactoryFailed {
                tag,
                source: Box::new(source),
            })
        }));
        self
    }

    /// Sets the initial number of slots of every bucket of idle objects.
    ///
    /// Buckets grow automatically when they run out of slots; this only affects how early the
    /// first growth happens.
    pub fn bucket_capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.bucket_capacity = capacity;
        self
    }

    /// Sets the initial number of slots of the registry that tracks live objects.
    ///
    /// The registry grows automatically when more objects are live at the same time.
    pub fn registry_capacity(mut self, capacity: NonZero<usize>) -> Self {
        self.registry_capacity = capacity;
        self
    }

    /// Builds a thread-safe pool with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagged_pool::TaggedPool;
    ///
    /// let pool = TaggedPool::<String>::builder().build();
    /// assert_eq!(pool.live_count(), 0);
    /// ```
    pub fn build(self) -> TaggedPool<T> {
        TaggedPool::from(self.build_raw())
    }

    /// Builds a single-owner pool with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagged_pool::RawTaggedPool;
    ///
    /// let mut pool = RawTaggedPool::builder()
    ///     .factory(|_| Some(0_u64))
    ///     .build_raw();
    ///
    /// let object = pool.acquire_default().unwrap();
    /// pool.release(object);
    /// assert_eq!(pool.idle_count_default(), 1);
    /// ```
    pub fn build_raw(self) -> RawTaggedPool<T> {
        RawTaggedPool::new_inner(self.factory, self.bucket_capacity, self.registry_capacity)
    }
}

impl<T> fmt::Debug for TaggedPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedPoolBuilder")
            .field("has_factory", &self.factory.is_some())
            .field("bucket_capacity", &self.bucket_capacity)
            .field("registry_capacity", &self.registry_capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(TaggedPoolBuilder<String>: Send, Sync, fmt::Debug);

    #[test]
    fn builder_new_creates_default_state() {
        let builder = TaggedPoolBuilder::<u32>::new();

        assert!(builder.factory.is_none());
        assert_eq!(builder.bucket_capacity, DEFAULT_BUCKET_CAPACITY);
        assert_eq!(builder.registry_capacity, DEFAULT_REGISTRY_CAPACITY);
    }

    #[test]
    fn capacities_are_applied() {
        let pool = TaggedPoolBuilder::<u32>::new()
            .bucket_capacity(nz!(32))
            .registry_capacity(nz!(64))
            .build_raw();

        assert_eq!(pool.live_capacity(), 64);
        assert_eq!(pool.idle_capacity(Tag::DEFAULT), 0);
    }

    #[test]
    fn capacities_can_be_overridden() {
        let builder = TaggedPoolBuilder::<u32>::new()
            .bucket_capacity(nz!(8))
            .bucket_capacity(nz!(2));

        assert_eq!(builder.bucket_capacity, nz!(2));
    }

    #[test]
    fn factory_none_becomes_empty_result() {
        let builder = TaggedPoolBuilder::<u32>::new().factory(|_| None);
        let factory = builder.factory.expect("factory was set");

        let error = factory(Tag::new(6)).expect_err("factory produced nothing");
        assert!(matches!(error, Error::EmptyResult { tag } if tag == Tag::new(6)));
    }

    #[test]
    fn try_factory_error_becomes_factory_failed() {
        let builder = TaggedPoolBuilder::<u32>::new()
            .try_factory(|_| Err(std::io::Error::other("nope")));
        let factory = builder.factory.expect("factory was set");

        let error = factory(Tag::new(2)).expect_err("factory failed");
        assert!(matches!(error, Error::FactoryFailed { tag, .. } if tag == Tag::new(2)));
    }

    #[test]
    fn later_factory_replaces_earlier() {
        let builder = TaggedPoolBuilder::<u32>::new()
            .factory(|_| Some(1))
            .factory(|_| Some(2));
        let factory = builder.factory.expect("factory was set");

        assert_eq!(factory(Tag::DEFAULT).expect("factory succeeds"), 2);
    }

    #[test]
    fn builder_is_debug() {
        let builder = TaggedPoolBuilder::<u32>::new().factory(|_| Some(0));
        let debug_output = format!("{builder:?}");

        assert!(debug_output.contains("TaggedPoolBuilder"));
        assert!(debug_output.contains("has_factory: true"));
    }
}
