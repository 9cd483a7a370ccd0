//! Demonstrates upgrading a read to a write and downgrading back.
//!
//! Read first, take exclusive access only when a change is actually needed,
//! and fall back to shared access when the change is done.
//!
//! Run with: `cargo run --example upgradable`

use parking_lot::Mutex;
use reentrant_lock::Lock;
use std::sync::Arc;
use std::thread;

struct Inventory {
    lock: Lock,
    items: Mutex<Vec<String>>,
}

impl Inventory {
    fn add_if_missing(&self, item: &str) -> bool {
        let read = self.lock.read();
        if self.items.lock().iter().any(|i| i == item) {
            println!("'{item}' already exists, no write needed");
            return false;
        }

        // Waits for every other reader to leave; our read comes back when the write drops.
        let _write = read.upgrade();
        // another upgrader may have been admitted first
        let mut items = self.items.lock();
        if items.iter().any(|i| i == item) {
            return false;
        }
        items.push(item.into());
        println!("added '{item}'");
        true
    }
}

fn main() {
    let inventory = Arc::new(Inventory {
        lock: Lock::new(),
        items: Mutex::new(vec!["apple".into(), "banana".into()]),
    });

    let handles: Vec<_> = ["cherry", "apple", "cherry", "date"]
        .into_iter()
        .map(|item| {
            let inventory = inventory.clone();
            thread::spawn(move || inventory.add_if_missing(item))
        })
        .collect();
    let added = handles
        .into_iter()
        .filter_map(|h| h.join().ok())
        .filter(|added| *added)
        .count();
    println!("{added} items added");

    // Write, then keep reading without letting another writer in between
    let write = inventory.lock.write();
    inventory.items.lock().sort();
    let _read = write.downgrade();
    println!("after downgrade: {:?}", inventory.items.lock());
}
