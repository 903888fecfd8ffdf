//! Verifies the `nm` events reported by the pool.
//!
//! This is a separate test binary with a single test so that no other test in the same process
//! contributes to the collected metrics.

use std::num::NonZero;
use std::sync::Arc;

use nm::Report;
use tagged_pool::{Tag, TaggedPool};

fn event_count(report: &Report, name: &str) -> u64 {
    report
        .events()
        .find(|event| event.name() == name)
        .map_or(0, nm::EventMetrics::count)
}

#[test]
fn pool_activity_is_reported() {
    let pool = TaggedPool::<u32>::builder()
        .factory(|tag| (tag != Tag::new(9)).then_some(0))
        .bucket_capacity(NonZero::new(1).unwrap())
        .build();

    let first = pool.acquire(Tag::new(1)).unwrap();
    let second = pool.acquire(Tag::new(1)).unwrap();
    pool.release(first);
    pool.release(Arc::clone(&second));
    pool.release(second);
    let _reused = pool.acquire(Tag::new(1)).unwrap();
    let error = pool.acquire(Tag::new(9)).unwrap_err();
    assert_eq!(error.tag(), Tag::new(9));

    let report = Report::collect();

    assert_eq!(event_count(&report, "tagged_pool_acquire_created"), 2);
    assert_eq!(event_count(&report, "tagged_pool_acquire_reused"), 1);
    assert_eq!(event_count(&report, "tagged_pool_acquire_failed"), 1);
    assert_eq!(event_count(&report, "tagged_pool_release_returned"), 2);
    assert_eq!(event_count(&report, "tagged_pool_release_ignored"), 1);

    // The bucket of tag 1 started with a single slot and had to grow to hold both objects.
    assert!(event_count(&report, "tagged_pool_grow_slots") >= 1);
}
