//! A concurrent session store built from reentrant `#[locked]` methods.
//!
//! Each method takes the store lock on its own, so public operations compose:
//! `rotate` calls `revoke` and `create` while already holding exclusive
//! access, and `lookup` upgrades in place to evict an expired session.
//! None of these nested calls deadlock, because the lock knows its owner.
//!
//! Run with: `cargo run --example session_store`

use parking_lot::Mutex;
use reentrant_lock::{locked, Lock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
struct Session {
    user_id: u64,
    expires_at: u64,
}

#[derive(Default)]
struct Stats {
    lookups: AtomicU64,
    hits: AtomicU64,
    evictions: AtomicU64,
}

struct SessionStore {
    lock: Lock,
    sessions: Mutex<HashMap<String, Session>>,
    clock: AtomicU64,
    stats: Stats,
}

impl SessionStore {
    fn new() -> Self {
        Self {
            lock: Lock::new(),
            sessions: Mutex::new(HashMap::new()),
            clock: AtomicU64::new(0),
            stats: Stats::default(),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    #[locked(write)]
    fn create(&self, token: &str, user_id: u64, ttl: u64) {
        let expires_at = self.tick() + ttl;
        self.sessions
            .lock()
            .insert(token.to_owned(), Session { user_id, expires_at });
    }

    #[locked(write)]
    fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions.lock().remove(token)
    }

    /// Swaps a session for a fresh token; nobody observes the gap.
    #[locked(write)]
    fn rotate(&self, old: &str, new: &str, ttl: u64) -> bool {
        match self.revoke(old) {
            Some(session) => {
                self.create(new, session.user_id, ttl);
                true
            }
            None => false,
        }
    }

    #[locked(read)]
    fn lookup(&self, token: &str) -> Option<u64> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);
        let now = self.tick();
        let session = self.sessions.lock().get(token).cloned()?;
        if session.expires_at < now {
            // upgrades: our read is held across the nested write
            if self.revoke(token).is_some() {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
            return None;
        }
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        Some(session.user_id)
    }

    #[locked(read)]
    fn len(&self) -> usize {
        self.sessions.lock().len()
    }
}

fn main() {
    let store = Arc::new(SessionStore::new());

    let mut handles = vec![];

    // 2 "login" threads create sessions
    for task_id in 0..2u64 {
        let s = store.clone();
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                s.create(&format!("token-{task_id}-{i}"), task_id * 1000 + i, 500);
            }
        }));
    }

    // 4 "request" threads look sessions up, evicting expired ones
    for task_id in 0..4u64 {
        let s = store.clone();
        handles.push(thread::spawn(move || {
            for i in 0..1000 {
                let _ = s.lookup(&format!("token-{}-{}", task_id % 2, i % 200));
            }
        }));
    }

    // 1 "security" thread rotates tokens
    {
        let s = store.clone();
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                s.rotate(&format!("token-0-{i}"), &format!("rotated-{i}"), 5000);
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    let stats = &store.stats;
    println!("Sessions: {}", store.len());
    println!(
        "Stats: {} lookups, {} hits, {} evictions",
        stats.lookups.load(Ordering::Relaxed),
        stats.hits.load(Ordering::Relaxed),
        stats.evictions.load(Ordering::Relaxed)
    );
    println!("Lock idle: {}", !store.lock.raw().is_locked());
}
