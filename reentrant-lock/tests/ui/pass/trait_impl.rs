use reentrant_lock::{locked, Lock};
use std::cell::Cell;

trait Store {
    fn get(&self) -> u32;
    fn set(&self, value: u32);
}

struct Slot {
    lock: Lock,
    value: Cell<u32>,
}

impl Store for Slot {
    #[locked(read)]
    fn get(&self) -> u32 {
        self.value.get()
    }

    #[locked(write)]
    fn set(&self, value: u32) {
        self.value.set(value);
    }
}

fn main() {
    let slot = Slot {
        lock: Lock::new(),
        value: Cell::new(0),
    };
    slot.set(4);
    assert_eq!(slot.get(), 4);
}
