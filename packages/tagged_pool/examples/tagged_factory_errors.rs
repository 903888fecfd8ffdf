//! Example of a fallible factory and of tidying up objects that were never released.

use std::error::Error as _;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};

use tagged_pool::{Error, RawTaggedPool, Tag};

const CONNECTION: Tag = Tag::new(1);
const UNSUPPORTED: Tag = Tag::new(7);

#[derive(Debug)]
struct Connection {
    id: u32,
}

fn main() {
    let next_id = AtomicU32::new(1);

    let mut pool = RawTaggedPool::builder()
        .try_factory(move |tag| {
            if tag == CONNECTION {
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                Ok(Connection { id })
            } else {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "only connections can be pooled",
                ))
            }
        })
        .build_raw();

    let connection = pool.acquire(CONNECTION).expect("connections are supported");
    println!("Acquired connection {}", connection.id);
    pool.release(connection);

    match pool.acquire(UNSUPPORTED) {
        Ok(object) => println!("Unexpectedly acquired {object:?}"),
        Err(error @ Error::FactoryFailed { .. }) => {
            println!("Acquire of tag {} failed: {error}", error.tag());
            if let Some(source) = error.source() {
                println!("Caused by: {source}");
            }
        }
        Err(error) => println!("Acquire failed: {error}"),
    }

    // A borrower that forgets to release leaves a stale registry entry behind.
    drop(pool.acquire(CONNECTION).expect("connections are supported"));
    println!("Live objects before tidying up: {}", pool.live_count());

    let removed = pool.clear_abandoned();
    println!("Removed {removed} abandoned entries; live objects: {}", pool.live_count());
}
