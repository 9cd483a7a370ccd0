//! Minimal reentrant-lock example.
//!
//! Run with: `cargo run --example basic`

use reentrant_lock::Lock;

static LOCK: Lock = Lock::new();

fn audit() {
    // Re-entering from the same thread never blocks
    let _read = LOCK.read();
    println!("audit: held exclusively = {}", LOCK.is_held_exclusively());
}

fn main() {
    // Manual lock/unlock, nested
    LOCK.lock();
    LOCK.lock();
    println!("writer depth: {}", LOCK.raw().snapshot().writer_depth);
    LOCK.unlock();
    LOCK.unlock();

    // Guards release on drop
    {
        let _write = LOCK.write();
        audit();
    }

    // Non-blocking attempts
    assert!(LOCK.try_lock_shared());
    LOCK.unlock_shared();

    println!("locked after all releases: {}", LOCK.raw().is_locked());
}
