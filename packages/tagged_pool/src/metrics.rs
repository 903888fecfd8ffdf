//! Metrics for the tagged object pool.
//!
//! Events are per-thread instances, as required by `nm`, and are aggregated by `nm::Report`.

use nm::{Event, Magnitude};

/// Histogram buckets for the slot capacity reached when a bucket or the live registry grows.
///
/// Capacities follow the allocator size classes, so most growth lands well below 1000 slots.
const GROW_SLOTS_BUCKETS: &[Magnitude] = &[4, 16, 32, 64, 128, 256, 512, 1024, 4096, 16384];

thread_local! {
    /// An acquire that was satisfied by an idle object from a bucket.
    pub(crate) static ACQUIRE_REUSED: Event = Event::builder()
        .name("tagged_pool_acquire_reused")
        .build();

    /// An acquire that was satisfied by calling the factory.
    pub(crate) static ACQUIRE_CREATED: Event = Event::builder()
        .name("tagged_pool_acquire_created")
        .build();

    /// An acquire that failed because the factory could not produce an object.
    pub(crate) static ACQUIRE_FAILED: Event = Event::builder()
        .name("tagged_pool_acquire_failed")
        .build();

    /// A release that returned a live object to its bucket.
    pub(crate) static RELEASE_RETURNED: Event = Event::builder()
        .name("tagged_pool_release_returned")
        .build();

    /// A release of an object that is not live in the pool (double release or foreign object).
    pub(crate) static RELEASE_IGNORED: Event = Event::builder()
        .name("tagged_pool_release_ignored")
        .build();

    /// Growth of a bucket or of the live registry.
    ///
    /// The magnitude is the new slot capacity.
    pub(crate) static GROW_SLOTS: Event = Event::builder()
        .name("tagged_pool_grow_slots")
        .histogram(GROW_SLOTS_BUCKETS)
        .build();
}
