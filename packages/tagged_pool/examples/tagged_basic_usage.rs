//! Basic usage example for `TaggedPool`.
//!
//! This example demonstrates reusing scratch buffers of two different size classes from
//! multiple threads, keeping the two classes apart with tags.

use std::sync::Mutex;
use std::thread;

use tagged_pool::{Tag, TaggedPool};

const SMALL: Tag = Tag::new(1);
const LARGE: Tag = Tag::new(2);

fn main() {
    // Buffers are mutated while borrowed, so the pooled type carries its own lock.
    let pool = TaggedPool::builder()
        .factory(|tag| {
            let capacity = if tag == LARGE { 64 * 1024 } else { 256 };
            Some(Mutex::new(Vec::<u8>::with_capacity(capacity)))
        })
        .build();

    let workers = (0..4_u8)
        .map(|worker| {
            let pool = pool.clone();

            thread::spawn(move || {
                for round in 0..100_u8 {
                    let tag = if round % 10 == 0 { LARGE } else { SMALL };
                    let buffer = pool.acquire(tag).expect("factory always produces a buffer");

                    {
                        let mut bytes = buffer.lock().expect("buffer lock is never poisoned");
                        bytes.clear();
                        bytes.extend_from_slice(&[worker, round]);
                    }

                    pool.release(buffer);
                }
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        worker.join().expect("worker thread does not panic");
    }

    println!("Live buffers after all workers finished: {}", pool.live_count());
    println!("Idle small buffers: {}", pool.idle_count(SMALL));
    println!("Idle large buffers: {}", pool.idle_count(LARGE));

    // Drop the idle large buffers but keep the small ones around for later reuse.
    pool.clear(LARGE);
    println!("Idle large buffers after clear: {}", pool.idle_count(LARGE));
    println!(
        "Large bucket keeps its capacity of {} slots",
        pool.idle_capacity(LARGE)
    );

    // Releasing something the pool never handed out is harmless.
    pool.release(std::sync::Arc::new(Mutex::new(Vec::new())));
    println!("Live buffers after foreign release: {}", pool.live_count());

    println!("Tags seen by the pool: {:?}", pool.tags());
}
