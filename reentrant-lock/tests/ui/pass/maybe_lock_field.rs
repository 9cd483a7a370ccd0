use reentrant_lock::{locked, MaybeLock};
use std::sync::atomic::{AtomicUsize, Ordering};

struct Cache {
    guard: MaybeLock,
    misses: AtomicUsize,
}

impl Cache {
    #[locked(write, lock = guard)]
    pub fn miss(&self) -> usize {
        self.misses.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn main() {
    let cache = Cache {
        guard: MaybeLock::unsynchronized(),
        misses: AtomicUsize::new(0),
    };
    assert_eq!(cache.miss(), 1);
}
