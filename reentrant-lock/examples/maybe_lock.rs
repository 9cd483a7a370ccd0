//! Demonstrates `MaybeLock` for code that is only sometimes shared.
//!
//! The same type serves a single-threaded build step with no locking cost and
//! a multi-threaded server with full locking. `#[locked]` works on both.
//!
//! Run with: `cargo run --example maybe_lock`

use reentrant_lock::{locked, MaybeLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

struct Registry {
    lock: MaybeLock,
    generation: AtomicU64,
    entries: AtomicU64,
}

impl Registry {
    fn new(shared: bool) -> Self {
        Self {
            lock: MaybeLock::new(shared),
            generation: AtomicU64::new(0),
            entries: AtomicU64::new(0),
        }
    }

    /// Both counters move together or not at all.
    #[locked(write)]
    fn register(&self) {
        self.entries.fetch_add(1, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    #[locked(read)]
    fn consistent(&self) -> bool {
        self.entries.load(Ordering::Relaxed) == self.generation.load(Ordering::Relaxed)
    }
}

fn main() {
    // Single owner: no synchronization needed
    let local = Registry::new(false);
    for _ in 0..100 {
        local.register();
    }
    println!(
        "local: synchronized = {}, consistent = {}",
        local.lock.is_synchronized(),
        local.consistent()
    );

    // Shared across threads: every call takes the lock
    let shared = Arc::new(Registry::new(true));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    shared.register();
                    assert!(shared.consistent());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    println!(
        "shared: {} entries, consistent = {}",
        shared.entries.load(Ordering::Relaxed),
        shared.consistent()
    );
}
