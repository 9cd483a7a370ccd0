use reentrant_lock::{locked, Identity, IdentitySource, Lock};
use std::sync::Arc;

struct Fixed;

impl IdentitySource for Fixed {
    fn current(&self) -> Identity {
        Identity::new(7).unwrap()
    }
}

struct Registry<S: IdentitySource> {
    lock: Arc<Lock<S>>,
    names: Vec<&'static str>,
}

impl<S: IdentitySource> Registry<S> {
    #[locked(read)]
    fn len(&self) -> usize {
        self.names.len()
    }

    #[locked(write)]
    fn first<'a>(&'a self) -> Option<&'a str> {
        self.names.first().copied()
    }
}

fn main() {
    let registry = Registry {
        lock: Arc::new(Lock::with_source(Fixed)),
        names: vec!["a", "b"],
    };
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.first(), Some("a"));
}
