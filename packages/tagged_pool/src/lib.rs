#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A thread-safe object pool that hands out reusable objects grouped by caller-defined tags.
//!
//! This crate provides [`TaggedPool`], a pool that lets callers borrow an object of a given
//! logical category, use it and return it, avoiding repeated construction of short-lived objects
//! under high churn. The category is a [`Tag`], an opaque number chosen by the caller. The pool
//! never inspects the objects themselves to decide where they belong.
//!
//! # Key Features
//!
//! - **Per-tag reuse**: Idle objects are kept in one bucket per tag and are only ever handed out
//!   again under the tag they were first acquired as.
//! - **Factory on miss**: A caller-supplied factory creates a new object when no idle object of
//!   the requested tag is available. Factory failures are returned as [`Error`].
//! - **Lenient release**: Releasing an object twice, or releasing an object that never came from
//!   the pool, does nothing.
//! - **Identity, not equality**: Objects are recognized by their allocation address, so the
//!   `PartialEq` and `Hash` behavior of the pooled type never matters.
//! - **Thread safety**: [`TaggedPool`] serializes all operations behind a single lock and can be
//!   cloned and shared freely. [`RawTaggedPool`] is the lock-free, single-owner variant.
//! - **Grow only**: Capacity grows on demand and is never given back, not even when the pool is
//!   cleared. There is no upper bound on the number of pooled objects.
//!
//! # Example
//!
//! ```rust
//! use tagged_pool::{Tag, TaggedPool};
//!
//! const SMALL: Tag = Tag::new(1);
//! const LARGE: Tag = Tag::new(2);
//!
//! let pool = TaggedPool::builder()
//!     .factory(|tag| {
//!         let capacity = if tag == LARGE { 64 * 1024 } else { 1024 };
//!         Some(Vec::<u8>::with_capacity(capacity))
//!     })
//!     .build();
//!
//! let small = pool.acquire(SMALL).unwrap();
//! let large = pool.acquire(LARGE).unwrap();
//! assert_eq!(pool.live_count(), 2);
//!
//! pool.release(small);
//! pool.release(large);
//! assert_eq!(pool.live_count(), 0);
//! assert_eq!(pool.idle_count(SMALL), 1);
//! assert_eq!(pool.idle_count(LARGE), 1);
//!
//! // The idle large buffer is reused; the small one is not handed out in its place.
//! let large = pool.acquire(LARGE).unwrap();
//! assert!(large.capacity() >= 64 * 1024);
//! assert_eq!(pool.idle_count(SMALL), 1);
//! # pool.release(large);
//! ```
//!
//! # Mutating pooled objects
//!
//! Objects are handed out as [`std::sync::Arc<T>`]. Objects that need to be modified while
//! borrowed should use interior mutability, for example by pooling `Mutex<Vec<u8>>` instead of
//! `Vec<u8>`.
//!
//! # Metrics
//!
//! The pool reports its activity through [`nm`] events named `tagged_pool_*`, for example the
//! number of acquires satisfied by reuse versus by the factory. Use `nm::Report::collect()` to
//! inspect them.

mod buckets;
mod builder;
mod error;
mod growth;
mod metrics;
mod pool;
mod raw;
mod registry;
mod tag;

pub(crate) use buckets::*;
pub use builder::*;
pub use error::*;
pub use pool::*;
pub use raw::*;
pub(crate) use registry::*;
pub use tag::*;
